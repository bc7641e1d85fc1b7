//! Combat resolution: turning strikes into damage, kills, and events.
//!
//! # Architecture
//!
//! [`CombatResolver`] is a short-lived view over the arena and the feedback
//! bundle. The simulation builds one whenever an executor, projectile, or
//! channel tick needs to land a hit, so resolution never outlives a single
//! call into the core.
//!
//! Player-initiated strikes check targets in a fixed order:
//!
//! 1. the practice dummy, only if it is the current target
//! 2. the boss
//! 3. the first living minion (one hit per call)
//!
//! Enemy-initiated strikes check the player, then allies in id order.
//!
//! # Invariants
//!
//! - A kill is reported only when health crosses from above zero to zero
//! - The dummy never dies; every strike aimed at it is a recorded hit or miss
//! - Kill events come from a before/after census of living enemies
//!
//! # Available Pieces
//!
//! - [`CombatResolver`]: strike resolution and targeted damage
//! - [`EventRecorder`]: in-memory progression event buffer

mod combat;
mod event;

pub use combat::CombatResolver;
pub use event::{EventRecorder, DEFAULT_EVENT_CAP, DEFAULT_EVENT_TRIM_TO};

use serde::{Deserialize, Serialize};

use crate::arena::Arena;
use crate::entity::{CombatantId, CombatantKind};

/// Who and what produced a strike.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrikeMeta {
    /// Ability name, used in log lines.
    pub ability: String,
    /// Attacking combatant, if any.
    pub attacker: Option<CombatantId>,
    /// Counts toward the melee streak and generates red mana.
    pub melee: bool,
}

impl StrikeMeta {
    /// Metadata for a strike with no attacker.
    #[must_use]
    pub fn new(ability: impl Into<String>) -> Self {
        Self {
            ability: ability.into(),
            attacker: None,
            melee: false,
        }
    }

    /// Builder: attacker.
    #[must_use]
    pub fn by(mut self, attacker: CombatantId) -> Self {
        self.attacker = Some(attacker);
        self
    }

    /// Builder: melee flag.
    #[must_use]
    pub fn melee(mut self, melee: bool) -> Self {
        self.melee = melee;
        self
    }
}

/// Outcome of a strike that connected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitReport {
    /// Who was hit.
    pub target: CombatantId,
    /// Their kind.
    pub kind: CombatantKind,
    /// Damage applied.
    pub damage: f32,
    /// Health crossed from above zero to zero in this hit.
    pub killed: bool,
}

/// Snapshot of living enemies, compared before and after a hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EnemyCensus {
    pub(crate) living_boss: Option<CombatantId>,
    pub(crate) minions_alive: usize,
    pub(crate) duelists_alive: Vec<CombatantId>,
}

impl EnemyCensus {
    pub(crate) fn take(arena: &Arena) -> Self {
        Self {
            living_boss: arena
                .boss()
                .filter(|id| arena.get(*id).is_some_and(crate::entity::Combatant::is_alive)),
            minions_alive: arena.alive_count(CombatantKind::Minion),
            duelists_alive: arena.alive_of(CombatantKind::Duelist),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceLedger;
    use glam::Vec3;

    #[test]
    fn strike_meta_builder() {
        let meta = StrikeMeta::new("Sword").by(CombatantId::new(3)).melee(true);
        assert_eq!(meta.attacker, Some(CombatantId::new(3)));
        assert!(meta.melee);
    }

    #[test]
    fn census_counts_living_enemies() {
        let mut arena = Arena::new();
        let boss = arena.spawn(CombatantKind::Boss, Vec3::ZERO, ResourceLedger::new(10.0));
        arena.spawn(CombatantKind::Minion, Vec3::ZERO, ResourceLedger::new(10.0));
        let dead = arena.spawn(CombatantKind::Minion, Vec3::ZERO, ResourceLedger::new(10.0));
        arena.get_mut(dead).unwrap().ledger.set_health(0.0);

        let census = EnemyCensus::take(&arena);
        assert_eq!(census.living_boss, Some(boss));
        assert_eq!(census.minions_alive, 1);
        assert!(census.duelists_alive.is_empty());

        arena.get_mut(boss).unwrap().ledger.set_health(0.0);
        assert_eq!(EnemyCensus::take(&arena).living_boss, None);
    }
}
