//! Arena holding every combatant in an encounter.
//!
//! The arena provides:
//! - Combatant storage with deterministic iteration order (`BTreeMap`)
//! - Lifecycle management (spawn/despawn)
//! - Role queries (player, boss, dummy, allies, minions)
//! - Proximity queries
//!
//! # Architecture
//!
//! Ids are handed out monotonically and the `BTreeMap` keeps them sorted, so
//! "first alive minion" or "allies in order" always means the same combatant
//! for the same sequence of spawns.
//!
//! # Example
//!
//! ```
//! use glam::Vec3;
//! use warband_core::arena::Arena;
//! use warband_core::entity::CombatantKind;
//! use warband_core::resource::ResourceLedger;
//!
//! let mut arena = Arena::new();
//! let player = arena.spawn(CombatantKind::Player, Vec3::ZERO, ResourceLedger::new(100.0));
//! let boss = arena.spawn(CombatantKind::Boss, Vec3::new(0.0, 0.0, 4.0), ResourceLedger::new(500.0));
//!
//! assert_eq!(arena.player(), Some(player));
//! assert_eq!(arena.boss(), Some(boss));
//! assert_eq!(arena.query_radius(Vec3::ZERO, 5.0), vec![player, boss]);
//! ```

use std::collections::BTreeMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::entity::{Combatant, CombatantId, CombatantKind, ControlState};
use crate::resource::ResourceLedger;

/// Container for all combatants.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Arena {
    next_id: u64,
    combatants: BTreeMap<CombatantId, Combatant>,
}

impl Arena {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: 0,
            combatants: BTreeMap::new(),
        }
    }

    /// Spawns a combatant and returns its new id.
    ///
    /// # Arguments
    ///
    /// * `kind` - Role in the encounter
    /// * `position` - Initial world position
    /// * `ledger` - Initial health and mana
    pub fn spawn(&mut self, kind: CombatantKind, position: Vec3, ledger: ResourceLedger) -> CombatantId {
        let id = CombatantId::new(self.next_id);
        self.next_id += 1;
        self.combatants.insert(id, Combatant::new(id, kind, position, ledger));
        id
    }

    /// Removes a combatant, returning it if it existed.
    pub fn despawn(&mut self, id: CombatantId) -> Option<Combatant> {
        self.combatants.remove(&id)
    }

    /// Looks up a combatant.
    #[must_use]
    pub fn get(&self, id: CombatantId) -> Option<&Combatant> {
        self.combatants.get(&id)
    }

    /// Looks up a combatant mutably.
    #[must_use]
    pub fn get_mut(&mut self, id: CombatantId) -> Option<&mut Combatant> {
        self.combatants.get_mut(&id)
    }

    /// Control state of a player or ally.
    #[must_use]
    pub fn control(&self, id: CombatantId) -> Option<&ControlState> {
        self.get(id).and_then(Combatant::as_controlled)
    }

    /// Mutable control state of a player or ally.
    #[must_use]
    pub fn control_mut(&mut self, id: CombatantId) -> Option<&mut ControlState> {
        self.get_mut(id).and_then(Combatant::as_controlled_mut)
    }

    /// Returns true if `id` is present.
    #[must_use]
    pub fn contains(&self, id: CombatantId) -> bool {
        self.combatants.contains_key(&id)
    }

    /// Number of combatants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.combatants.len()
    }

    /// Returns true if the arena is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.combatants.is_empty()
    }

    /// Iterates combatants in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Combatant> {
        self.combatants.values()
    }

    /// Iterates combatants mutably in id order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Combatant> {
        self.combatants.values_mut()
    }

    /// Ids of every combatant of `kind`, alive or not, in id order.
    #[must_use]
    pub fn ids_of(&self, kind: CombatantKind) -> Vec<CombatantId> {
        self.iter().filter(|c| c.kind() == kind).map(Combatant::id).collect()
    }

    /// Ids of living combatants of `kind`, in id order.
    #[must_use]
    pub fn alive_of(&self, kind: CombatantKind) -> Vec<CombatantId> {
        self.iter()
            .filter(|c| c.kind() == kind && c.is_alive())
            .map(Combatant::id)
            .collect()
    }

    /// Number of living combatants of `kind`.
    #[must_use]
    pub fn alive_count(&self, kind: CombatantKind) -> usize {
        self.iter().filter(|c| c.kind() == kind && c.is_alive()).count()
    }

    fn first_of(&self, kind: CombatantKind) -> Option<CombatantId> {
        self.iter().find(|c| c.kind() == kind).map(Combatant::id)
    }

    /// The player, if one was spawned.
    #[must_use]
    pub fn player(&self) -> Option<CombatantId> {
        self.first_of(CombatantKind::Player)
    }

    /// The boss, if one was spawned.
    #[must_use]
    pub fn boss(&self) -> Option<CombatantId> {
        self.first_of(CombatantKind::Boss)
    }

    /// The target dummy, if one was spawned.
    #[must_use]
    pub fn dummy(&self) -> Option<CombatantId> {
        self.first_of(CombatantKind::Dummy)
    }

    /// Ids of every controlled combatant (player first, then allies).
    #[must_use]
    pub fn controlled(&self) -> Vec<CombatantId> {
        let mut ids = self.ids_of(CombatantKind::Player);
        ids.extend(self.ids_of(CombatantKind::Ally));
        ids
    }

    /// Position of a combatant.
    #[must_use]
    pub fn position(&self, id: CombatantId) -> Option<Vec3> {
        self.get(id).map(|c| c.position)
    }

    /// Combatants within `radius` of `center`, sorted by id.
    #[must_use]
    pub fn query_radius(&self, center: Vec3, radius: f32) -> Vec<CombatantId> {
        let radius_sq = radius * radius;
        self.iter()
            .filter(|c| center.distance_squared(c.position) <= radius_sq)
            .map(Combatant::id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> ResourceLedger {
        ResourceLedger::new(100.0)
    }

    mod lifecycle {
        use super::*;

        #[test]
        fn ids_are_monotonic() {
            let mut arena = Arena::new();
            let a = arena.spawn(CombatantKind::Minion, Vec3::ZERO, ledger());
            let b = arena.spawn(CombatantKind::Minion, Vec3::ZERO, ledger());
            arena.despawn(a);
            let c = arena.spawn(CombatantKind::Minion, Vec3::ZERO, ledger());
            assert!(a < b && b < c);
            assert_eq!(arena.len(), 2);
        }

        #[test]
        fn despawn_missing_returns_none() {
            let mut arena = Arena::new();
            assert!(arena.despawn(CombatantId::new(9)).is_none());
            assert!(arena.is_empty());
        }
    }

    mod queries {
        use super::*;

        #[test]
        fn role_lookup() {
            let mut arena = Arena::new();
            let ally = arena.spawn(CombatantKind::Ally, Vec3::ZERO, ledger());
            let player = arena.spawn(CombatantKind::Player, Vec3::ZERO, ledger());
            let dummy = arena.spawn(CombatantKind::Dummy, Vec3::ZERO, ledger());

            assert_eq!(arena.player(), Some(player));
            assert_eq!(arena.dummy(), Some(dummy));
            assert_eq!(arena.boss(), None);
            assert_eq!(arena.controlled(), vec![player, ally]);
            assert!(arena.control(ally).is_some());
            assert!(arena.control(dummy).is_none());
        }

        #[test]
        fn alive_count_skips_dead() {
            let mut arena = Arena::new();
            let m1 = arena.spawn(CombatantKind::Minion, Vec3::ZERO, ledger());
            let m2 = arena.spawn(CombatantKind::Minion, Vec3::ZERO, ledger());
            arena.get_mut(m1).unwrap().ledger.set_health(0.0);

            assert_eq!(arena.alive_count(CombatantKind::Minion), 1);
            assert_eq!(arena.alive_of(CombatantKind::Minion), vec![m2]);
            assert_eq!(arena.ids_of(CombatantKind::Minion), vec![m1, m2]);
        }

        #[test]
        fn query_radius_is_sorted_and_inclusive() {
            let mut arena = Arena::new();
            let far = arena.spawn(CombatantKind::Minion, Vec3::new(10.0, 0.0, 0.0), ledger());
            let edge = arena.spawn(CombatantKind::Minion, Vec3::new(2.0, 0.0, 0.0), ledger());
            let near = arena.spawn(CombatantKind::Minion, Vec3::new(0.5, 0.0, 0.0), ledger());

            let hits = arena.query_radius(Vec3::ZERO, 2.0);
            assert_eq!(hits, vec![edge, near]);
            assert!(!hits.contains(&far));
        }
    }
}
