//! Ability dispatch gate.
//!
//! Every activation, whether from player input, the input queue, or a
//! strategic planner, passes through the same gate.
//!
//! # Architecture
//!
//! Dispatch is split in two so that a rejection can never leave state
//! half-mutated:
//!
//! 1. **Validate**: [`Gate::validate`] reads an immutable view of the actor
//!    and either rejects or produces an [`ActivationPlan`] holding the
//!    resolved charge, captured modifiers, and execution mode.
//! 2. **Commit**: the simulation applies the plan. Casts and windups enter
//!    their phase with the charge pending; instants pay, arm cooldowns, and
//!    execute immediately.
//!
//! Validation order (first failure wins):
//!
//! | Step | Check                                            |
//! |------|--------------------------------------------------|
//! | 0    | slot exists on the actor                         |
//! | 1    | slot cooldown                                    |
//! | 2    | cast or windup in progress                       |
//! | 3    | global cooldown                                  |
//! | 4    | range to the current target                      |
//! | 5-6  | primary and secondary cost resolution            |
//! | 7    | attunement for each paid color                   |
//! | 8    | stance cost multiplier                           |
//! | 9    | free-cast buff                                   |
//! | 10   | sufficiency (mana, or health in health mode)     |
//! | 11   | mode: cast, windup, or instant                   |

use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::ability::{AbilityDefinition, ResourceCost};
use crate::entity::{CombatantId, ControlState};
use crate::error::Rejection;
use crate::executor::{AbilityEffect, Execution, ExecutorTable};
use crate::modifier::{effective_cooldown, effective_phase_time, effective_resource_cost, global_cooldown, health_cost};
use crate::phase::{Captured, Charge, PendingCharge, TimedPhase};
use crate::resource::{ResourceColor, ResourceLedger};
use crate::simulation::Simulation;

/// What a dispatch attempt did.
///
/// Rejections carry no reason; the reason is written to the combat log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DispatchOutcome {
    /// The gate refused the activation. Nothing changed.
    Rejected,
    /// A cast began; its cost is pending until completion.
    CastStarted,
    /// A windup began; its cost is pending until completion.
    WindupStarted,
    /// An instant ability executed.
    Executed,
}

impl DispatchOutcome {
    /// Returns true unless the activation was rejected.
    #[must_use]
    pub const fn is_accepted(self) -> bool {
        !matches!(self, Self::Rejected)
    }
}

impl fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected => write!(f, "rejected"),
            Self::CastStarted => write!(f, "cast started"),
            Self::WindupStarted => write!(f, "windup started"),
            Self::Executed => write!(f, "executed"),
        }
    }
}

/// How an accepted activation proceeds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ActivationMode {
    /// Execute now.
    Instant,
    /// Enter `Casting` for `seconds`.
    Cast {
        /// Modified cast time.
        seconds: f32,
    },
    /// Enter `WindingUp` for `seconds`.
    Windup {
        /// Modified windup time.
        seconds: f32,
        /// Movement factor while winding up.
        movement_factor: f32,
    },
}

/// Result of a successful validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivationPlan {
    /// Slot being activated.
    pub slot: usize,
    /// Cost to settle, now or at phase completion.
    pub charge: PendingCharge,
    /// Cooldown, global cooldown, and damage multiplier.
    pub captured: Captured,
    /// Execution mode.
    pub mode: ActivationMode,
}

/// Read-only view of one activation attempt.
///
/// # Example
///
/// ```
/// use glam::Vec3;
/// use warband_core::ability::AbilityDefinition;
/// use warband_core::dispatch::{ActivationMode, Gate};
/// use warband_core::entity::ControlState;
/// use warband_core::resource::{Attunements, ResourceColor, ResourceLedger};
///
/// let definition = AbilityDefinition::new("Greater Fireball")
///     .with_damage(60.0)
///     .with_cast_time(2.0)
///     .with_cooldown(5.0);
/// let mut control = ControlState::new(10);
/// control.attunements = Attunements::BLUE;
/// let ledger = ResourceLedger::new(100.0).with_pool(ResourceColor::Blue, 100.0, 100.0);
///
/// let gate = Gate {
///     definition: &definition,
///     slot: 1,
///     position: Vec3::ZERO,
///     target_position: None,
///     ledger: &ledger,
///     control: &control,
///     base_global_cooldown: 1.0,
/// };
/// let plan = gate.validate().unwrap();
/// assert_eq!(plan.mode, ActivationMode::Cast { seconds: 2.0 });
/// assert_eq!(plan.charge.primary.unwrap().amount, 20.0);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Gate<'a> {
    /// Effective definition of the ability.
    pub definition: &'a AbilityDefinition,
    /// Slot being activated.
    pub slot: usize,
    /// Actor position.
    pub position: Vec3,
    /// Current target position, if a target exists.
    pub target_position: Option<Vec3>,
    /// Actor ledger.
    pub ledger: &'a ResourceLedger,
    /// Actor control state.
    pub control: &'a ControlState,
    /// Global cooldown before haste and stance.
    pub base_global_cooldown: f32,
}

impl Gate<'_> {
    /// Runs every check in order.
    ///
    /// # Errors
    ///
    /// Returns the first [`Rejection`] encountered.
    pub fn validate(&self) -> Result<ActivationPlan, Rejection> {
        let definition = self.definition;
        let control = self.control;
        let stance = &control.stance;
        let ability = || definition.name.clone();

        if !control.cooldowns.has_slot(self.slot) {
            return Err(Rejection::InvalidSlot {
                ability: ability(),
                slot: self.slot,
                slot_count: control.cooldowns.len(),
            });
        }
        let remaining = control.cooldowns.remaining(self.slot);
        if remaining > 0.0 {
            return Err(Rejection::OnCooldown {
                ability: ability(),
                remaining,
            });
        }
        if control.phase.blocks_activation() {
            return Err(Rejection::PhaseLocked {
                ability: ability(),
                phase: control.phase.kind(),
            });
        }
        let global = control.cooldowns.global_remaining();
        if global > 0.0 {
            return Err(Rejection::GlobalCooldown { remaining: global });
        }
        if !definition.self_cast && definition.range > 0.0 {
            if let Some(target) = self.target_position {
                let distance = self.position.distance(target);
                if distance > definition.range {
                    return Err(Rejection::OutOfRange {
                        ability: ability(),
                        distance,
                        range: definition.range,
                    });
                }
            }
        }

        let mut primary = definition.primary_cost();
        let mut secondary = definition.secondary();
        for cost in std::iter::once(primary).chain(secondary) {
            if !cost.is_free() && !control.attunements.permits(cost.color) {
                return Err(Rejection::NotAttuned {
                    ability: ability(),
                    color: cost.color,
                });
            }
        }

        primary.amount = effective_resource_cost(primary.amount, stance);
        if let Some(cost) = secondary.as_mut() {
            cost.amount = effective_resource_cost(cost.amount, stance);
        }

        let free = !primary.is_free() && control.free_cast == Some(primary.color);
        if free {
            primary.amount = 0.0;
        }

        let charge = self.charge(primary, secondary, free)?;

        let mode = if definition.cast_time > 0.0 && !free {
            ActivationMode::Cast {
                seconds: effective_phase_time(definition.cast_time, &control.stats, stance),
            }
        } else if definition.cast_time <= 0.0 && definition.windup_time > 0.0 {
            ActivationMode::Windup {
                seconds: effective_phase_time(definition.windup_time, &control.stats, stance),
                movement_factor: definition.windup_movement_factor,
            }
        } else {
            ActivationMode::Instant
        };

        Ok(ActivationPlan {
            slot: self.slot,
            charge,
            captured: Captured {
                cooldown: effective_cooldown(definition.cooldown, &control.stats, stance),
                global_cooldown: global_cooldown(self.base_global_cooldown, &control.stats, stance),
                damage_multiplier: stance.damage_multiplier,
            },
            mode,
        })
    }

    /// Sufficiency check and charge construction.
    fn charge(
        &self,
        primary: ResourceCost,
        secondary: Option<ResourceCost>,
        free: bool,
    ) -> Result<PendingCharge, Rejection> {
        let stance = &self.control.stance;
        let ability = || self.definition.name.clone();

        if stance.uses_health_as_resource {
            let mut charge = PendingCharge {
                consumes_free_cast: free,
                ..PendingCharge::default()
            };
            if primary.amount > 0.0 {
                let needed = health_cost(primary.amount, stance);
                let available = self.ledger.health();
                if available <= needed {
                    return Err(Rejection::InsufficientHealth {
                        ability: ability(),
                        needed,
                        available,
                    });
                }
                charge.health = Some(needed);
            }
            return Ok(charge);
        }

        let paid = |cost: ResourceCost| (cost.amount > 0.0 && cost.color != ResourceColor::None).then_some(cost);
        for cost in [Some(primary), secondary].into_iter().flatten().filter_map(paid) {
            if !self.ledger.has(cost.color, cost.amount) {
                return Err(Rejection::InsufficientResource {
                    ability: ability(),
                    color: cost.color,
                    needed: cost.amount,
                    available: self.ledger.amount(cost.color),
                });
            }
        }
        let to_charge = |cost: ResourceCost| Charge {
            color: cost.color,
            amount: cost.amount,
        };
        Ok(PendingCharge {
            primary: paid(primary).map(to_charge),
            secondary: secondary.and_then(paid).map(to_charge),
            health: None,
            consumes_free_cast: free,
        })
    }
}

// =============================================================================
// Input queue
// =============================================================================

/// A buffered activation, processed during the next step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedActivation {
    /// Acting combatant, or `None` for whoever is active when drained.
    pub actor: Option<CombatantId>,
    /// Ability name.
    pub ability: String,
    /// Slot index.
    pub slot: usize,
}

// =============================================================================
// Simulation entry points
// =============================================================================

impl Simulation {
    /// Activates `name` from `slot` on the active unit.
    pub fn activate(&mut self, name: &str, slot: usize) -> DispatchOutcome {
        match self.active_unit {
            Some(actor) => self.dispatch(actor, name, slot),
            None => {
                self.feedback.warn(Rejection::NoActiveUnit.to_string());
                DispatchOutcome::Rejected
            }
        }
    }

    /// Activates `name` from `slot` on `actor`.
    ///
    /// A name with neither a definition nor an executor logs an error and
    /// dispatches the slot's default ability instead, through the same gate.
    pub fn dispatch(&mut self, actor: CombatantId, name: &str, slot: usize) -> DispatchOutcome {
        let definition = self.effective_definition(name);
        if definition.is_none() && !self.has_instant_executor(name) {
            self.feedback.error(format!("Unknown ability {name}"));
            return match self.fallback_for_slot(slot, name) {
                Some(fallback) => self.dispatch(actor, &fallback.name, slot),
                None => DispatchOutcome::Rejected,
            };
        }
        match self.plan(actor, name, slot, definition.as_ref()) {
            Ok(plan) => self.commit(actor, name, definition, plan),
            Err(rejection) => {
                tracing::debug!(target: "warband::dispatch", ability = name, %actor, slot, ?rejection, "rejected");
                self.feedback.warn(rejection.to_string());
                DispatchOutcome::Rejected
            }
        }
    }

    /// Buffers an activation for the active unit at the time of the next step.
    pub fn queue_activation(&mut self, name: impl Into<String>, slot: usize) {
        self.queued.push_back(QueuedActivation {
            actor: None,
            ability: name.into(),
            slot,
        });
    }

    /// Buffers an activation for a specific combatant.
    pub fn queue_activation_for(&mut self, actor: CombatantId, name: impl Into<String>, slot: usize) {
        self.queued.push_back(QueuedActivation {
            actor: Some(actor),
            ability: name.into(),
            slot,
        });
    }

    /// Activations waiting for the next step.
    #[must_use]
    pub fn queued(&self) -> impl Iterator<Item = &QueuedActivation> {
        self.queued.iter()
    }

    /// Outcomes of the activations drained by the last step, in queue order.
    #[must_use]
    pub fn drained(&self) -> &[(QueuedActivation, DispatchOutcome)] {
        &self.drained
    }

    pub(crate) fn drain_queue(&mut self) {
        self.drained.clear();
        while let Some(input) = self.queued.pop_front() {
            let outcome = match input.actor {
                Some(actor) => self.dispatch(actor, &input.ability, input.slot),
                None => self.activate(&input.ability, input.slot),
            };
            tracing::debug!(
                target: "warband::dispatch",
                ability = %input.ability,
                slot = input.slot,
                %outcome,
                "queued activation"
            );
            self.drained.push((input, outcome));
        }
    }

    fn plan(
        &self,
        actor: CombatantId,
        name: &str,
        slot: usize,
        definition: Option<&AbilityDefinition>,
    ) -> Result<ActivationPlan, Rejection> {
        let combatant = self.arena.get(actor).ok_or(Rejection::UnknownActor(actor))?;
        let control = combatant.as_controlled().ok_or(Rejection::UnknownActor(actor))?;
        let unknown;
        let definition = match definition {
            Some(definition) => definition,
            None => {
                unknown = AbilityDefinition::new(name);
                &unknown
            }
        };
        Gate {
            definition,
            slot,
            position: combatant.position,
            target_position: self.current_target_position(),
            ledger: &combatant.ledger,
            control,
            base_global_cooldown: self.config.base_global_cooldown,
        }
        .validate()
    }

    fn commit(
        &mut self,
        actor: CombatantId,
        name: &str,
        definition: Option<AbilityDefinition>,
        plan: ActivationPlan,
    ) -> DispatchOutcome {
        match plan.mode {
            ActivationMode::Cast { seconds } => {
                self.interrupt_channel(actor);
                let phase = TimedPhase::new(plan.slot, name, seconds, plan.charge, plan.captured);
                let Some(control) = self.arena.control_mut(actor) else {
                    return DispatchOutcome::Rejected;
                };
                if let Err(err) = control.phase.begin_cast(phase) {
                    self.feedback.error(format!("{name}: {err}"));
                    return DispatchOutcome::Rejected;
                }
                self.feedback.info(format!("Begin casting {name} ({seconds:.2}s)"));
                DispatchOutcome::CastStarted
            }
            ActivationMode::Windup {
                seconds,
                movement_factor,
            } => {
                self.interrupt_channel(actor);
                let phase = TimedPhase::new(plan.slot, name, seconds, plan.charge, plan.captured);
                let Some(control) = self.arena.control_mut(actor) else {
                    return DispatchOutcome::Rejected;
                };
                if let Err(err) = control.phase.begin_windup(phase, movement_factor) {
                    self.feedback.error(format!("{name}: {err}"));
                    return DispatchOutcome::Rejected;
                }
                self.feedback.info(format!("Winding up {name} ({seconds:.2}s)"));
                DispatchOutcome::WindupStarted
            }
            ActivationMode::Instant => {
                self.execute_instant(actor, name, definition, &plan);
                DispatchOutcome::Executed
            }
        }
    }

    fn execute_instant(
        &mut self,
        actor: CombatantId,
        name: &str,
        definition: Option<AbilityDefinition>,
        plan: &ActivationPlan,
    ) {
        let Some(combatant) = self.arena.get_mut(actor) else {
            return;
        };
        combatant.pay(&plan.charge);
        let who = combatant.to_string();
        if let Some(control) = combatant.as_controlled_mut() {
            control.cooldowns.arm_global(plan.captured.global_cooldown);
            control.cooldowns.arm(plan.slot, plan.captured.cooldown);
        }
        self.feedback.info(format!("{who} used {name}"));

        let effect = self
            .executors
            .lookup(ExecutorTable::Instant, name)
            .or_else(|| self.executors.lookup(ExecutorTable::CastCompletion, name))
            .unwrap_or(AbilityEffect::Generic);
        let definition = definition.unwrap_or_else(|| AbilityDefinition::new(name));

        let execution = Execution {
            actor,
            slot: plan.slot,
            definition,
            damage_multiplier: plan.captured.damage_multiplier,
        };
        self.execute_effect(&execution, effect);
    }

    fn has_instant_executor(&self, name: &str) -> bool {
        self.executors.lookup(ExecutorTable::Instant, name).is_some()
            || self.executors.lookup(ExecutorTable::CastCompletion, name).is_some()
    }

    /// Default ability bound to `slot`, unless it is `name` itself or unknown.
    fn fallback_for_slot(&self, slot: usize, name: &str) -> Option<AbilityDefinition> {
        let fallback = self.config.default_slot_ability(slot).filter(|f| *f != name)?;
        self.effective_definition(fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifier::{CombatStats, Stance};
    use crate::phase::{PhaseKind, PhaseState};
    use crate::resource::Attunements;

    fn control() -> ControlState {
        let mut control = ControlState::new(10);
        control.attunements = Attunements::all();
        control
    }

    fn ledger() -> ResourceLedger {
        ResourceLedger::new(100.0).with_all_pools(100.0)
    }

    fn gate<'a>(
        definition: &'a AbilityDefinition,
        control: &'a ControlState,
        ledger: &'a ResourceLedger,
    ) -> Gate<'a> {
        Gate {
            definition,
            slot: 0,
            position: Vec3::ZERO,
            target_position: None,
            ledger,
            control,
            base_global_cooldown: 1.0,
        }
    }

    mod ordering {
        use super::*;

        #[test]
        fn missing_slot_is_checked_first() {
            let def = AbilityDefinition::new("Sword");
            let mut control = control();
            control.cooldowns.arm_global(1.0);
            let ledger = ledger();
            for slot in [10, 1 << 40, usize::MAX] {
                let gate = Gate { slot, ..gate(&def, &control, &ledger) };
                let err = gate.validate().unwrap_err();
                assert!(matches!(err, Rejection::InvalidSlot { slot_count: 10, .. }));
            }
        }

        #[test]
        fn cooldown_is_checked_before_phase() {
            let def = AbilityDefinition::new("Sword").with_cooldown(1.5);
            let mut control = control();
            control.cooldowns.arm(0, 1.0);
            control.phase = PhaseState::Casting(TimedPhase::new(
                3,
                "Greater Heal",
                2.0,
                PendingCharge::default(),
                Captured::default(),
            ));
            let ledger = ledger();
            let err = gate(&def, &control, &ledger).validate().unwrap_err();
            assert!(matches!(err, Rejection::OnCooldown { .. }));
        }

        #[test]
        fn casting_blocks_but_channeling_does_not() {
            let def = AbilityDefinition::new("Sword");
            let ledger = ledger();

            let mut control = control();
            control.phase = PhaseState::Casting(TimedPhase::new(
                3,
                "Greater Heal",
                2.0,
                PendingCharge::default(),
                Captured::default(),
            ));
            let err = gate(&def, &control, &ledger).validate().unwrap_err();
            assert_eq!(
                err,
                Rejection::PhaseLocked {
                    ability: "Sword".to_string(),
                    phase: PhaseKind::Casting,
                }
            );

            let mut channeling = control;
            channeling.phase = PhaseState::Channeling(crate::phase::ChannelState::new(
                5,
                "Drain Life",
                3.0,
                crate::phase::ChannelEffect::Damage(30.0),
            ));
            assert!(gate(&def, &channeling, &ledger).validate().is_ok());
        }

        #[test]
        fn global_cooldown_rejects() {
            let def = AbilityDefinition::new("Sword");
            let mut control = control();
            control.cooldowns.arm_global(0.5);
            let ledger = ledger();
            let err = gate(&def, &control, &ledger).validate().unwrap_err();
            assert_eq!(err, Rejection::GlobalCooldown { remaining: 0.5 });
        }
    }

    mod range {
        use super::*;

        #[test]
        fn far_target_is_out_of_range() {
            let def = AbilityDefinition::new("Fireball").with_range(30.0);
            let control = control();
            let ledger = ledger();
            let mut g = gate(&def, &control, &ledger);
            g.target_position = Some(Vec3::new(40.0, 0.0, 0.0));
            assert!(matches!(g.validate(), Err(Rejection::OutOfRange { .. })));
        }

        #[test]
        fn self_cast_and_missing_target_skip_range() {
            let ledger = ledger();
            let control = control();

            let heal = AbilityDefinition::new("Mend").with_range(5.0).self_cast();
            let mut g = gate(&heal, &control, &ledger);
            g.target_position = Some(Vec3::new(40.0, 0.0, 0.0));
            assert!(g.validate().is_ok());

            let bolt = AbilityDefinition::new("Bolt").with_range(5.0);
            assert!(gate(&bolt, &control, &ledger).validate().is_ok());
        }
    }

    mod costs {
        use super::*;

        #[test]
        fn missing_attunement_rejects() {
            let def = AbilityDefinition::new("Whirlwind").with_cost(15.0, ResourceColor::Red);
            let mut control = control();
            control.attunements = Attunements::BLUE;
            let ledger = ledger();
            let err = gate(&def, &control, &ledger).validate().unwrap_err();
            assert_eq!(
                err,
                Rejection::NotAttuned {
                    ability: "Whirlwind".to_string(),
                    color: ResourceColor::Red,
                }
            );
        }

        #[test]
        fn secondary_needs_its_own_attunement() {
            let def = AbilityDefinition::new("Chaos Bolt");
            let mut control = control();
            control.attunements = Attunements::RED;
            let ledger = ledger();
            let err = gate(&def, &control, &ledger).validate().unwrap_err();
            assert!(matches!(
                err,
                Rejection::NotAttuned {
                    color: ResourceColor::Black,
                    ..
                }
            ));
        }

        #[test]
        fn stance_scales_mana_costs() {
            let def = AbilityDefinition::new("Bolt").with_cost(10.0, ResourceColor::Blue);
            let mut control = control();
            control.stance = Stance::fury();
            let ledger = ledger();
            let plan = gate(&def, &control, &ledger).validate().unwrap();
            assert_eq!(plan.charge.primary.map(|c| c.amount), Some(15.0));
            assert_eq!(plan.captured.damage_multiplier, 1.25);
        }

        #[test]
        fn insufficient_mana_rejects() {
            let def = AbilityDefinition::new("Bolt").with_cost(30.0, ResourceColor::Green);
            let control = control();
            let ledger = ResourceLedger::new(100.0).with_pool(ResourceColor::Green, 20.0, 100.0);
            let err = gate(&def, &control, &ledger).validate().unwrap_err();
            assert!(matches!(err, Rejection::InsufficientResource { needed, available, .. }
                if needed == 30.0 && available == 20.0));
        }

        #[test]
        fn free_cast_zeroes_matching_color_and_skips_cast() {
            let def = AbilityDefinition::new("Greater Fireball")
                .with_cast_time(2.0)
                .with_cost(20.0, ResourceColor::Blue);
            let mut control = control();
            control.free_cast = Some(ResourceColor::Blue);
            let ledger = ResourceLedger::new(100.0);
            let plan = gate(&def, &control, &ledger).validate().unwrap();
            assert_eq!(plan.mode, ActivationMode::Instant);
            assert!(plan.charge.consumes_free_cast);
            assert_eq!(plan.charge.primary, None);
        }

        #[test]
        fn free_cast_ignores_other_colors() {
            let def = AbilityDefinition::new("Bolt").with_cost(10.0, ResourceColor::Green);
            let mut control = control();
            control.free_cast = Some(ResourceColor::Blue);
            let ledger = ledger();
            let plan = gate(&def, &control, &ledger).validate().unwrap();
            assert!(!plan.charge.consumes_free_cast);
            assert_eq!(plan.charge.primary.map(|c| c.amount), Some(10.0));
        }

        #[test]
        fn health_mode_needs_strictly_more_health() {
            let def = AbilityDefinition::new("Bolt").with_cost(20.0, ResourceColor::Blue);
            let mut control = control();
            control.stance = Stance::blood_pact(2.0);

            let ledger = ResourceLedger::new(40.0);
            let err = gate(&def, &control, &ledger).validate().unwrap_err();
            assert!(matches!(err, Rejection::InsufficientHealth { needed, .. } if needed == 40.0));

            let ledger = ResourceLedger::new(41.0);
            let plan = gate(&def, &control, &ledger).validate().unwrap();
            assert_eq!(plan.charge.health, Some(40.0));
            assert_eq!(plan.charge.primary, None);
        }
    }

    mod modes {
        use super::*;

        #[test]
        fn haste_shortens_windup() {
            let def = AbilityDefinition::new("Heavy Strike").with_windup(0.75, 0.5);
            let mut control = control();
            control.stats = CombatStats {
                haste_percent: 50.0,
                cooldown_reduction_percent: 0.0,
            };
            let ledger = ledger();
            let plan = gate(&def, &control, &ledger).validate().unwrap();
            assert_eq!(
                plan.mode,
                ActivationMode::Windup {
                    seconds: 0.5,
                    movement_factor: 0.5,
                }
            );
        }

        #[test]
        fn captured_cooldowns_use_stats() {
            let def = AbilityDefinition::new("Sword").with_cooldown(3.0);
            let mut control = control();
            control.stats = CombatStats {
                haste_percent: 100.0,
                cooldown_reduction_percent: 50.0,
            };
            let ledger = ledger();
            let plan = gate(&def, &control, &ledger).validate().unwrap();
            assert_eq!(plan.mode, ActivationMode::Instant);
            assert_eq!(plan.captured.cooldown, 2.0);
            assert_eq!(plan.captured.global_cooldown, 0.5);
        }
    }

    #[test]
    fn outcome_display() {
        assert_eq!(DispatchOutcome::CastStarted.to_string(), "cast started");
        assert!(!DispatchOutcome::Rejected.is_accepted());
        assert!(DispatchOutcome::Executed.is_accepted());
    }
}
