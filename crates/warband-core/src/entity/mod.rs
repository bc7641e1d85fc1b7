//! Combatants taking part in an encounter.
//!
//! - [`CombatantId`]: unique, ordered identifier
//! - [`CombatantKind`]: role in the encounter (player, ally, boss, ...)
//! - [`Combatant`]: position, facing, resource ledger, and optional control state
//!
//! # Architecture
//!
//! The kind decides how the combat resolver treats a combatant. Only the
//! player and allies carry a [`ControlState`]; everyone else is a target.
//!
//! # Example
//!
//! ```
//! use glam::Vec3;
//! use warband_core::entity::{Combatant, CombatantId, CombatantKind};
//! use warband_core::resource::ResourceLedger;
//!
//! let boss = Combatant::new(
//!     CombatantId::new(7),
//!     CombatantKind::Boss,
//!     Vec3::new(0.0, 0.0, 5.0),
//!     ResourceLedger::new(500.0),
//! );
//!
//! assert_eq!(boss.id().as_u64(), 7);
//! assert!(boss.as_controlled().is_none());
//! assert!(boss.is_alive());
//! ```

pub mod components;

use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::phase::PendingCharge;
use crate::resource::ResourceLedger;

pub use components::ControlState;

/// Unique identifier for a combatant.
///
/// Ordered by numeric value; arenas iterate in this order so resolution is
/// deterministic.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CombatantId(u64);

impl CombatantId {
    /// Creates a new `CombatantId` from a raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for CombatantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CombatantId({})", self.0)
    }
}

impl fmt::Display for CombatantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for CombatantId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<CombatantId> for u64 {
    fn from(id: CombatantId) -> Self {
        id.0
    }
}

/// Role of a combatant in the encounter.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatantKind {
    /// The locally controlled hero.
    Player,
    /// A friendly unit that can be switched to or driven by a planner.
    Ally,
    /// The encounter boss.
    Boss,
    /// A boss add.
    Minion,
    /// Invulnerable practice target feeding the DPS meter.
    Dummy,
    /// A one-on-one opponent.
    Duelist,
}

impl CombatantKind {
    /// Player and allies carry a control state.
    #[must_use]
    pub const fn is_controlled(self) -> bool {
        matches!(self, Self::Player | Self::Ally)
    }

    /// Player-side combatants are struck by enemy attacks.
    #[must_use]
    pub const fn is_player_side(self) -> bool {
        self.is_controlled()
    }
}

impl fmt::Display for CombatantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player => write!(f, "player"),
            Self::Ally => write!(f, "ally"),
            Self::Boss => write!(f, "boss"),
            Self::Minion => write!(f, "minion"),
            Self::Dummy => write!(f, "target dummy"),
            Self::Duelist => write!(f, "duelist"),
        }
    }
}

/// A participant in the encounter.
///
/// # Invariants
///
/// - `control` is `Some` exactly when `kind.is_controlled()`
/// - `facing` is a unit vector (or zero when unknown)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    id: CombatantId,
    kind: CombatantKind,
    /// World position.
    pub position: Vec3,
    /// Unit facing direction.
    pub facing: Vec3,
    /// Health and mana.
    pub ledger: ResourceLedger,
    control: Option<ControlState>,
}

impl Combatant {
    /// Creates a combatant facing +Z.
    ///
    /// Controlled kinds receive a default [`ControlState`].
    #[must_use]
    pub fn new(id: CombatantId, kind: CombatantKind, position: Vec3, ledger: ResourceLedger) -> Self {
        Self {
            id,
            kind,
            position,
            facing: Vec3::Z,
            ledger,
            control: kind.is_controlled().then(ControlState::default),
        }
    }

    /// Returns the identifier.
    #[must_use]
    pub const fn id(&self) -> CombatantId {
        self.id
    }

    /// Returns the kind.
    #[must_use]
    pub const fn kind(&self) -> CombatantKind {
        self.kind
    }

    /// Returns true while health is above zero.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.ledger.is_alive()
    }

    /// Control state, if this is a player or ally.
    #[must_use]
    pub const fn as_controlled(&self) -> Option<&ControlState> {
        self.control.as_ref()
    }

    /// Mutable control state, if this is a player or ally.
    #[must_use]
    pub fn as_controlled_mut(&mut self) -> Option<&mut ControlState> {
        self.control.as_mut()
    }

    /// Settles an activation's cost against the ledger and consumes the
    /// free-cast buff if the charge used it.
    pub fn pay(&mut self, charge: &PendingCharge) {
        match self.control.as_mut() {
            Some(control) => charge.settle(&mut self.ledger, &mut control.free_cast),
            None => charge.settle(&mut self.ledger, &mut None),
        }
    }

    /// Turns to face `point`. Ignored when `point` is directly above or below.
    pub fn face_towards(&mut self, point: Vec3) {
        let flat = Vec3::new(point.x - self.position.x, 0.0, point.z - self.position.z);
        let dir = flat.normalize_or_zero();
        if dir != Vec3::ZERO {
            self.facing = dir;
        }
    }
}

impl fmt::Display for Combatant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}
