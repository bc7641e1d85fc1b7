//! Component state carried by controlled combatants.
//!
//! Only the player and allies have a [`ControlState`]. Bosses, minions,
//! dummies, and duelists are damage sinks with a ledger and a position.

use serde::{Deserialize, Serialize};

use crate::cooldown::CooldownBank;
use crate::modifier::{CombatStats, Stance};
use crate::phase::PhaseState;
use crate::resource::{Attunements, ResourceColor};

/// Base movement speed in world units per second.
pub const BASE_MOVE_SPEED: f32 = 7.0;

/// Ability-execution state for a player-controlled or allied unit.
///
/// Every controlled combatant gets its own independent cooldowns, phase,
/// stance, and attunements. Nothing here is shared between units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlState {
    /// Per-slot and global cooldown timers.
    pub cooldowns: CooldownBank,
    /// Active stance.
    pub stance: Stance,
    /// Haste and cooldown reduction.
    pub stats: CombatStats,
    /// Colors this unit may spend.
    pub attunements: Attunements,
    /// Current phase.
    pub phase: PhaseState,
    /// Pending free-cast buff: the next ability of this color costs nothing.
    pub free_cast: Option<ResourceColor>,
    /// Consecutive melee hits without a miss.
    pub melee_streak: u32,
    /// Unmodified movement speed.
    pub base_move_speed: f32,
}

impl ControlState {
    /// Creates an idle control state with `slot_count` ready slots.
    #[must_use]
    pub fn new(slot_count: usize) -> Self {
        Self {
            cooldowns: CooldownBank::new(slot_count),
            stance: Stance::neutral(),
            stats: CombatStats::default(),
            attunements: Attunements::empty(),
            phase: PhaseState::Idle,
            free_cast: None,
            melee_streak: 0,
            base_move_speed: BASE_MOVE_SPEED,
        }
    }

    /// Movement speed after stance and windup modifiers.
    #[must_use]
    pub fn movement_speed(&self) -> f32 {
        self.base_move_speed * self.stance.movement_speed_multiplier * self.phase.movement_modifier()
    }
}

impl Default for ControlState {
    fn default() -> Self {
        Self::new(crate::cooldown::DEFAULT_SLOT_COUNT)
    }
}
