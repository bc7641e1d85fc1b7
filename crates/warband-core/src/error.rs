//! Error types for the ability and combat core.
//!
//! Two families of errors exist:
//! - [`ConfigError`]: malformed or inconsistent configuration and catalog data
//! - [`Rejection`]: reasons the dispatch gate refused an activation
//!
//! Rejections never escape the public dispatch API. They are rendered into
//! warning-level combat log lines, and the caller only sees
//! [`DispatchOutcome::Rejected`](crate::dispatch::DispatchOutcome::Rejected).

use crate::entity::CombatantId;
use crate::phase::PhaseKind;
use crate::resource::ResourceColor;

/// Errors raised while loading or validating configuration data.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The JSON document could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// A field holds a value outside its legal range.
    #[error("invalid value for `{field}`: {reason}")]
    Invalid {
        /// Name of the offending field.
        field: &'static str,
        /// Human-readable explanation.
        reason: String,
    },

    /// Two abilities in a catalog share the same name.
    #[error("duplicate ability definition `{0}`")]
    DuplicateAbility(String),
}

/// Why the dispatch gate refused an ability activation.
///
/// The `Display` text is what lands in the combat log.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Rejection {
    /// The acting combatant does not exist or is not a controlled unit.
    #[error("no controllable combatant {0} to act")]
    UnknownActor(CombatantId),

    /// There is no active unit to receive player input.
    #[error("no active unit selected")]
    NoActiveUnit,

    /// The slot index does not exist on the acting combatant.
    #[error("{ability} cannot be bound to slot {slot} (only {slot_count} slots)")]
    InvalidSlot {
        /// Ability name.
        ability: String,
        /// Requested slot.
        slot: usize,
        /// Number of slots the combatant has.
        slot_count: usize,
    },

    /// The requested slot is still cooling down.
    #[error("{ability} is on cooldown ({remaining:.1}s remaining)")]
    OnCooldown {
        /// Ability name.
        ability: String,
        /// Seconds until the slot is ready.
        remaining: f32,
    },

    /// A cast or windup is already in progress.
    #[error("cannot use {ability} while {phase}")]
    PhaseLocked {
        /// Ability name.
        ability: String,
        /// The phase currently occupying the combatant.
        phase: PhaseKind,
    },

    /// The shared global cooldown has not elapsed.
    #[error("global cooldown active ({remaining:.2}s remaining)")]
    GlobalCooldown {
        /// Seconds until the global cooldown ends.
        remaining: f32,
    },

    /// The current target is farther away than the ability reaches.
    #[error("{ability} out of range ({distance:.1} > {range:.1})")]
    OutOfRange {
        /// Ability name.
        ability: String,
        /// Distance to the current target.
        distance: f32,
        /// Maximum range of the ability.
        range: f32,
    },

    /// The combatant lacks the attunement required to spend a color.
    #[error("{ability} requires {color} attunement")]
    NotAttuned {
        /// Ability name.
        ability: String,
        /// The color the combatant is not attuned to.
        color: ResourceColor,
    },

    /// The ledger does not hold enough of a color.
    #[error("not enough {color} mana for {ability} (need {needed:.0}, have {available:.0})")]
    InsufficientResource {
        /// Ability name.
        ability: String,
        /// Color that is short.
        color: ResourceColor,
        /// Amount required.
        needed: f32,
        /// Amount held.
        available: f32,
    },

    /// The health-as-resource stance cannot pay without dropping to zero.
    #[error("not enough health for {ability} (need more than {needed:.0}, have {available:.0})")]
    InsufficientHealth {
        /// Ability name.
        ability: String,
        /// Health cost that must be strictly exceeded.
        needed: f32,
        /// Current health.
        available: f32,
    },
}

/// Errors raised by the phase state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PhaseError {
    /// A new phase may only begin from `Idle`.
    #[error("cannot enter a new phase while {0}")]
    NotIdle(PhaseKind),
}
