//! Phase state machine for a single controlled combatant.
//!
//! ```text
//! Idle ──cast_time>0──▶ Casting ────────complete──▶ Idle
//! Idle ──windup>0─────▶ WindingUp ──────complete──▶ Idle
//! Idle ──channel exec─▶ Channeling ─────complete──▶ Idle
//! Channeling ──cancel / new cast / new windup─────▶ Idle
//! ```
//!
//! At most one phase is active at a time. Casting and winding up block all
//! other activations; channeling does not.
//!
//! Costs for cast and windup phases are captured as a [`PendingCharge`] when
//! the phase begins and debited only on completion. Cooldown, global
//! cooldown, and the stance damage multiplier are captured in [`Captured`]
//! at the same moment, so stat changes mid-phase have no effect.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PhaseError;
use crate::resource::{ResourceColor, ResourceLedger};

/// Tolerance used when counting whole channel seconds.
const TICK_EPSILON: f32 = 1e-4;

/// Discriminant of [`PhaseState`], used in logs and rejections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhaseKind {
    /// No phase active.
    Idle,
    /// Casting a spell.
    Casting,
    /// Winding up a strike.
    WindingUp,
    /// Channeling.
    Channeling,
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Casting => write!(f, "casting"),
            Self::WindingUp => write!(f, "winding up"),
            Self::Channeling => write!(f, "channeling"),
        }
    }
}

/// A single debit of one color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Charge {
    /// Color to debit.
    pub color: ResourceColor,
    /// Amount to debit.
    pub amount: f32,
}

/// Everything an activation owes, resolved at gate time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PendingCharge {
    /// Primary mana cost (absent in health-as-resource mode).
    pub primary: Option<Charge>,
    /// Secondary mana cost for dual-currency abilities.
    pub secondary: Option<Charge>,
    /// Health cost in health-as-resource mode.
    pub health: Option<f32>,
    /// A matching free-cast buff zeroed the primary cost and must be consumed.
    pub consumes_free_cast: bool,
}

impl PendingCharge {
    /// Debits the charge from `ledger` and consumes the free-cast buff if used.
    pub fn settle(&self, ledger: &mut ResourceLedger, free_cast: &mut Option<ResourceColor>) {
        if let Some(cost) = self.health {
            ledger.spend_health(cost);
        }
        for charge in [self.primary, self.secondary].into_iter().flatten() {
            ledger.spend(charge.color, charge.amount);
        }
        if self.consumes_free_cast {
            *free_cast = None;
        }
    }
}

/// Modifier results captured when a phase starts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Captured {
    /// Slot cooldown to arm.
    pub cooldown: f32,
    /// Global cooldown to arm.
    pub global_cooldown: f32,
    /// Stance damage multiplier.
    pub damage_multiplier: f32,
}

impl Default for Captured {
    fn default() -> Self {
        Self {
            cooldown: 0.0,
            global_cooldown: 0.0,
            damage_multiplier: 1.0,
        }
    }
}

/// A cast or windup in progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedPhase {
    /// Slot the ability was activated from.
    pub slot: usize,
    /// Ability name.
    pub ability: String,
    /// Seconds elapsed.
    pub elapsed: f32,
    /// Seconds required.
    pub total: f32,
    /// Cost to debit on completion.
    pub charge: PendingCharge,
    /// Modifiers captured at start.
    pub captured: Captured,
}

impl TimedPhase {
    /// Creates a phase with zero elapsed time.
    #[must_use]
    pub fn new(slot: usize, ability: impl Into<String>, total: f32, charge: PendingCharge, captured: Captured) -> Self {
        Self {
            slot,
            ability: ability.into(),
            elapsed: 0.0,
            total,
            charge,
            captured,
        }
    }

    /// Completion fraction in `[0, 1]`.
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.total > 0.0 {
            (self.elapsed / self.total).min(1.0)
        } else {
            1.0
        }
    }
}

/// What each channel tick does.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ChannelEffect {
    /// Damage the current target.
    Damage(f32),
    /// Heal the channeler.
    Heal(f32),
}

/// A channel in progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelState {
    /// Slot the channel was started from.
    pub slot: usize,
    /// Ability name.
    pub ability: String,
    /// Seconds elapsed.
    pub elapsed: f32,
    /// Total duration.
    pub total: f32,
    /// Time accumulated toward the next tick.
    pub tick_clock: f32,
    /// Ticks already delivered.
    pub ticks_fired: u32,
    /// Ticks this channel will deliver at most.
    pub tick_count: u32,
    /// Effect of each tick (already divided per tick).
    pub per_tick: ChannelEffect,
}

impl ChannelState {
    /// Builds a channel that spreads `total_effect` over one tick per second.
    ///
    /// A non-positive duration is treated as one second. The tick count is
    /// `round(duration)`, never less than one; ticks left over when the
    /// channel ends are delivered on completion.
    #[must_use]
    pub fn new(slot: usize, ability: impl Into<String>, duration: f32, total_effect: ChannelEffect) -> Self {
        let duration = if duration > 0.0 { duration } else { 1.0 };
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let tick_count = (duration.round() as u32).max(1);
        #[allow(clippy::cast_precision_loss)]
        let divisor = tick_count as f32;
        let per_tick = match total_effect {
            ChannelEffect::Damage(total) => ChannelEffect::Damage(total / divisor),
            ChannelEffect::Heal(total) => ChannelEffect::Heal(total / divisor),
        };
        Self {
            slot,
            ability: ability.into(),
            elapsed: 0.0,
            total: duration,
            tick_clock: 0.0,
            ticks_fired: 0,
            tick_count,
            per_tick,
        }
    }
}

/// Current phase of a controlled combatant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum PhaseState {
    /// Free to act.
    #[default]
    Idle,
    /// Casting; blocks other activations.
    Casting(TimedPhase),
    /// Winding up; blocks other activations and slows movement.
    WindingUp {
        /// Timing and pending cost.
        phase: TimedPhase,
        /// Movement speed factor while winding up.
        movement_modifier: f32,
    },
    /// Channeling; ticks once per second.
    Channeling(ChannelState),
}

/// A phase that finished during [`PhaseState::advance`].
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// A cast finished; its effect should execute now.
    Cast(TimedPhase),
    /// A windup finished; its strike should execute now.
    Windup(TimedPhase),
    /// A channel ran its full duration.
    Channel {
        /// Ability name.
        ability: String,
    },
}

/// Result of advancing a phase by one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Advance {
    /// Channel ticks that fired this step, with their per-tick effect.
    pub channel_ticks: Option<(String, ChannelEffect, u32)>,
    /// The phase that finished this step, if any.
    pub completed: Option<Completion>,
}

impl PhaseState {
    /// Discriminant of the current phase.
    #[must_use]
    pub fn kind(&self) -> PhaseKind {
        match self {
            Self::Idle => PhaseKind::Idle,
            Self::Casting(_) => PhaseKind::Casting,
            Self::WindingUp { .. } => PhaseKind::WindingUp,
            Self::Channeling(_) => PhaseKind::Channeling,
        }
    }

    /// Returns true when no phase is active.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Returns true while channeling.
    #[must_use]
    pub fn is_channeling(&self) -> bool {
        matches!(self, Self::Channeling(_))
    }

    /// Casting and winding up block new activations. Channeling does not.
    #[must_use]
    pub fn blocks_activation(&self) -> bool {
        matches!(self, Self::Casting(_) | Self::WindingUp { .. })
    }

    /// Movement speed factor imposed by the phase (1.0 outside a windup).
    #[must_use]
    pub fn movement_modifier(&self) -> f32 {
        match self {
            Self::WindingUp { movement_modifier, .. } => *movement_modifier,
            _ => 1.0,
        }
    }

    /// Name of the ability driving the current phase.
    #[must_use]
    pub fn ability(&self) -> Option<&str> {
        match self {
            Self::Idle => None,
            Self::Casting(phase) | Self::WindingUp { phase, .. } => Some(&phase.ability),
            Self::Channeling(channel) => Some(&channel.ability),
        }
    }

    /// Enters `Casting`.
    ///
    /// # Errors
    ///
    /// Returns [`PhaseError::NotIdle`] unless the state is `Idle`.
    pub fn begin_cast(&mut self, phase: TimedPhase) -> Result<(), PhaseError> {
        self.ensure_idle()?;
        *self = Self::Casting(phase);
        Ok(())
    }

    /// Enters `WindingUp`.
    ///
    /// # Errors
    ///
    /// Returns [`PhaseError::NotIdle`] unless the state is `Idle`.
    pub fn begin_windup(&mut self, phase: TimedPhase, movement_modifier: f32) -> Result<(), PhaseError> {
        self.ensure_idle()?;
        *self = Self::WindingUp {
            phase,
            movement_modifier,
        };
        Ok(())
    }

    /// Enters `Channeling`.
    ///
    /// # Errors
    ///
    /// Returns [`PhaseError::NotIdle`] unless the state is `Idle`.
    pub fn begin_channel(&mut self, channel: ChannelState) -> Result<(), PhaseError> {
        self.ensure_idle()?;
        *self = Self::Channeling(channel);
        Ok(())
    }

    /// Stops an active channel. Returns its ability name, or `None` if the
    /// state was not channeling (in which case nothing changes).
    pub fn cancel_channel(&mut self) -> Option<String> {
        if !self.is_channeling() {
            return None;
        }
        match std::mem::take(self) {
            Self::Channeling(channel) => Some(channel.ability),
            _ => None,
        }
    }

    fn ensure_idle(&self) -> Result<(), PhaseError> {
        if self.is_idle() {
            Ok(())
        } else {
            Err(PhaseError::NotIdle(self.kind()))
        }
    }

    /// Advances the active phase by `dt`.
    ///
    /// A completed phase returns the state to `Idle`. Channel ticks fire
    /// before the completion check, and never exceed the tick count. A
    /// channel that runs to completion delivers every tick, including any
    /// its fractional duration did not reach.
    pub fn advance(&mut self, dt: f32) -> Advance {
        let mut out = Advance::default();
        if dt <= 0.0 {
            return out;
        }
        let finished = match self {
            Self::Idle => false,
            Self::Casting(phase) | Self::WindingUp { phase, .. } => {
                phase.elapsed += dt;
                phase.elapsed >= phase.total
            }
            Self::Channeling(channel) => {
                channel.elapsed += dt;
                channel.tick_clock += dt;
                let mut fired = 0;
                while channel.ticks_fired < channel.tick_count && channel.tick_clock >= 1.0 - TICK_EPSILON {
                    channel.tick_clock -= 1.0;
                    channel.ticks_fired += 1;
                    fired += 1;
                }
                let finished = channel.elapsed >= channel.total;
                if finished {
                    // A fractional duration ends before its last whole second
                    fired += channel.tick_count - channel.ticks_fired;
                    channel.ticks_fired = channel.tick_count;
                }
                if fired > 0 {
                    out.channel_ticks = Some((channel.ability.clone(), channel.per_tick, fired));
                }
                finished
            }
        };
        if finished {
            out.completed = match std::mem::take(self) {
                Self::Idle => None,
                Self::Casting(phase) => Some(Completion::Cast(phase)),
                Self::WindingUp { phase, .. } => Some(Completion::Windup(phase)),
                Self::Channeling(channel) => Some(Completion::Channel {
                    ability: channel.ability,
                }),
            };
        }
        out
    }
}
