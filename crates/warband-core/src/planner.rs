//! Strategic planner contract.
//!
//! A planner is an external decision maker for allied units. The core hands
//! it a read-only [`PlannerContext`] and gets back a [`PlannerDecision`];
//! only `USE_ABILITY` decisions naming an ability are acted on, and those go
//! through the same dispatch gate as player input.
//!
//! # Example
//!
//! ```
//! use warband_core::planner::{PlannerContext, PlannerDecision, StrategicPlanner};
//!
//! struct AlwaysSword;
//!
//! impl StrategicPlanner for AlwaysSword {
//!     fn decide(&mut self, _ctx: &PlannerContext) -> PlannerDecision {
//!         PlannerDecision::use_ability("Sword", 0.9)
//!     }
//! }
//!
//! let decision = AlwaysSword.decide(&PlannerContext::default());
//! assert!(decision.wants_ability());
//! ```

use std::collections::BTreeMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::dispatch::DispatchOutcome;
use crate::entity::{CombatantId, CombatantKind};
use crate::simulation::Simulation;

/// Action tag that triggers an ability activation.
pub const USE_ABILITY: &str = "USE_ABILITY";

/// Health snapshot of an ally near the planning unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllySnapshot {
    /// Ally id.
    pub id: CombatantId,
    /// Ally position.
    pub position: Vec3,
    /// Current health.
    pub health: f32,
    /// Maximum health.
    pub max_health: f32,
}

/// Read-only view handed to a planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerContext {
    /// Unit being planned for.
    pub actor: CombatantId,
    /// Its position.
    pub position: Vec3,
    /// Its health.
    pub health: f32,
    /// Its maximum health.
    pub max_health: f32,
    /// Current target position, if any.
    pub target_position: Option<Vec3>,
    /// Current target health, if any.
    pub target_health: Option<f32>,
    /// Remaining cooldown per slot, only for slots still cooling down.
    pub cooldowns: BTreeMap<usize, f32>,
    /// Other living player-side units.
    pub nearby_allies: Vec<AllySnapshot>,
}

impl Default for PlannerContext {
    fn default() -> Self {
        Self {
            actor: CombatantId::new(0),
            position: Vec3::ZERO,
            health: 0.0,
            max_health: 0.0,
            target_position: None,
            target_health: None,
            cooldowns: BTreeMap::new(),
            nearby_allies: Vec::new(),
        }
    }
}

/// What a planner wants to do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerDecision {
    /// Action tag, e.g. [`USE_ABILITY`].
    pub action: String,
    /// Ability to use, for `USE_ABILITY`.
    pub ability: Option<String>,
    /// Slot to activate from. Defaults to the configured slot of the ability.
    pub slot: Option<usize>,
    /// Planner confidence in `[0, 1]`.
    pub confidence: f32,
    /// Free-form numeric parameters.
    pub parameters: BTreeMap<String, f32>,
}

impl PlannerDecision {
    /// A decision that does nothing the core acts on.
    #[must_use]
    pub fn idle() -> Self {
        Self {
            action: "IDLE".to_string(),
            ability: None,
            slot: None,
            confidence: 0.0,
            parameters: BTreeMap::new(),
        }
    }

    /// A `USE_ABILITY` decision for `ability`.
    #[must_use]
    pub fn use_ability(ability: impl Into<String>, confidence: f32) -> Self {
        Self {
            action: USE_ABILITY.to_string(),
            ability: Some(ability.into()),
            confidence,
            ..Self::idle()
        }
    }

    /// Builder: explicit slot.
    #[must_use]
    pub fn in_slot(mut self, slot: usize) -> Self {
        self.slot = Some(slot);
        self
    }

    /// Returns true for a `USE_ABILITY` decision naming an ability.
    #[must_use]
    pub fn wants_ability(&self) -> bool {
        self.action == USE_ABILITY && self.ability.is_some()
    }
}

/// External decision maker for a controlled unit.
pub trait StrategicPlanner {
    /// Chooses an action for the unit described by `ctx`.
    fn decide(&mut self, ctx: &PlannerContext) -> PlannerDecision;
}

impl<F> StrategicPlanner for F
where
    F: FnMut(&PlannerContext) -> PlannerDecision,
{
    fn decide(&mut self, ctx: &PlannerContext) -> PlannerDecision {
        self(ctx)
    }
}

impl Simulation {
    /// Snapshot of `actor` for a planner. `None` unless `actor` is a
    /// controlled combatant.
    #[must_use]
    pub fn planner_context(&self, actor: CombatantId) -> Option<PlannerContext> {
        let combatant = self.arena.get(actor)?;
        let control = combatant.as_controlled()?;
        let cooldowns = control
            .cooldowns
            .slots()
            .iter()
            .enumerate()
            .filter(|(_, remaining)| **remaining > 0.0)
            .map(|(slot, remaining)| (slot, *remaining))
            .collect();
        let target = self.current_target.and_then(|id| self.arena.get(id));
        let nearby_allies = self
            .arena
            .iter()
            .filter(|c| c.id() != actor && c.is_alive())
            .filter(|c| matches!(c.kind(), CombatantKind::Player | CombatantKind::Ally))
            .map(|c| AllySnapshot {
                id: c.id(),
                position: c.position,
                health: c.ledger.health(),
                max_health: c.ledger.max_health(),
            })
            .collect();

        Some(PlannerContext {
            actor,
            position: combatant.position,
            health: combatant.ledger.health(),
            max_health: combatant.ledger.max_health(),
            target_position: target.map(|t| t.position),
            target_health: target.map(|t| t.ledger.health()),
            cooldowns,
            nearby_allies,
        })
    }

    /// Asks `planner` what `actor` should do and dispatches a
    /// `USE_ABILITY` decision.
    ///
    /// Returns `None` when the actor is not controlled or the planner chose
    /// something other than an ability.
    pub fn consult_planner(
        &mut self,
        actor: CombatantId,
        planner: &mut dyn StrategicPlanner,
    ) -> Option<DispatchOutcome> {
        let ctx = self.planner_context(actor)?;
        let decision = planner.decide(&ctx);
        tracing::debug!(
            target: "warband::planner",
            %actor,
            action = %decision.action,
            ability = ?decision.ability,
            confidence = decision.confidence,
            "planner decision"
        );
        if !decision.wants_ability() {
            return None;
        }
        let ability = decision.ability?;
        let slot = decision
            .slot
            .or_else(|| self.config.slot_of(&ability))
            .unwrap_or(0);
        Some(self.dispatch(actor, &ability, slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_use_ability_with_name_is_actionable() {
        assert!(PlannerDecision::use_ability("Heal", 1.0).wants_ability());
        assert!(!PlannerDecision::idle().wants_ability());

        let mut nameless = PlannerDecision::use_ability("Heal", 1.0);
        nameless.ability = None;
        assert!(!nameless.wants_ability());
    }

    #[test]
    fn decision_serializes_with_action_tag() {
        let decision = PlannerDecision::use_ability("Fireball", 0.5).in_slot(1);
        let json = serde_json::to_value(&decision).unwrap();
        assert_eq!(json["action"], USE_ABILITY);
        assert_eq!(json["slot"], 1);
    }

    #[test]
    fn closures_are_planners() {
        let mut calls = 0;
        let mut planner = |_: &PlannerContext| {
            calls += 1;
            PlannerDecision::idle()
        };
        let _ = planner.decide(&PlannerContext::default());
        assert_eq!(calls, 1);
    }
}
