//! Per-session simulation context and the tick loop.
//!
//! The `Simulation` owns everything a combat session needs: combatants,
//! ability data, executor tables, collaborators, feedback outputs, and
//! in-flight effects. Nothing is global; every operation goes through a
//! `&mut Simulation`.
//!
//! # Tick order
//!
//! Each [`Simulation::step`] runs, in order:
//!
//! 1. **COOLDOWNS**: slot and global cooldowns tick for every controlled unit
//! 2. **PHASES**: channel ticks fire, then finished casts, windups, and
//!    channels complete (paying deferred costs and arming cooldowns)
//! 3. **INPUT**: queued activations are dispatched
//! 4. **EFFECTS**: projectiles, damage-over-time, then indicators advance
//! 5. **METERS**: the DPS tracker clock advances
//!
//! A cooldown armed by a completion in step 2 is therefore already visible
//! to a queued activation of the same slot in step 3.
//!
//! # Example
//!
//! ```
//! use glam::Vec3;
//! use warband_core::dispatch::DispatchOutcome;
//! use warband_core::resource::{Attunements, ResourceLedger};
//! use warband_core::simulation::Simulation;
//!
//! let mut sim = Simulation::default();
//! let player = sim.spawn_player(Vec3::ZERO, ResourceLedger::new(100.0).with_all_pools(100.0));
//! let boss = sim.spawn_boss(Vec3::new(0.0, 0.0, 10.0), ResourceLedger::new(500.0));
//! sim.arena_mut().control_mut(player).unwrap().attunements = Attunements::all();
//! sim.set_target(Some(boss));
//!
//! assert_eq!(sim.activate("Greater Fireball", 1), DispatchOutcome::CastStarted);
//! for _ in 0..8 {
//!     sim.step(0.25);
//! }
//! assert_eq!(sim.projectiles().len(), 1);
//! ```

use std::collections::VecDeque;
use std::fmt;

use glam::Vec3;

use crate::ability::{AbilityCatalog, AbilityDefinition, AbilityOverride};
use crate::arena::Arena;
use crate::collab::{DpsTracker, FlatTerrain, ProgressionSink, TerrainOracle};
use crate::config::SimConfig;
use crate::dispatch::{DispatchOutcome, QueuedActivation};
use crate::entity::{CombatantId, CombatantKind, ControlState};
use crate::executor::{Execution, ExecutorRegistry, ExecutorTable};
use crate::output::{CombatLog, DamageIndicator, Feedback, GameEvent};
use crate::phase::{ChannelEffect, Completion, TimedPhase};
use crate::projectile::{DamageOverTime, Projectile};
use crate::resolver::{CombatResolver, StrikeMeta};
use crate::resource::ResourceLedger;

// =============================================================================
// Simulation
// =============================================================================

/// One combat session.
///
/// Owns the arena, the ability catalog and executor tables, collaborators,
/// the feedback bundle (log, indicators, events, DPS), and in-flight
/// projectiles and damage-over-time effects.
pub struct Simulation {
    pub(crate) arena: Arena,
    pub(crate) catalog: AbilityCatalog,
    pub(crate) executors: ExecutorRegistry,
    pub(crate) overrides: Option<Box<dyn AbilityOverride>>,
    pub(crate) terrain: Box<dyn TerrainOracle>,
    pub(crate) config: SimConfig,
    pub(crate) feedback: Feedback,
    pub(crate) projectiles: Vec<Projectile>,
    pub(crate) dots: Vec<DamageOverTime>,
    pub(crate) current_target: Option<CombatantId>,
    pub(crate) active_unit: Option<CombatantId>,
    pub(crate) queued: VecDeque<QueuedActivation>,
    pub(crate) drained: Vec<(QueuedActivation, DispatchOutcome)>,
    pub(crate) next_projectile_id: u64,
    elapsed: f32,
    tick: u64,
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("arena", &self.arena)
            .field("catalog", &format!("[{} abilities]", self.catalog.len()))
            .field("has_overrides", &self.overrides.is_some())
            .field("config", &self.config)
            .field("feedback", &self.feedback)
            .field("projectiles", &self.projectiles.len())
            .field("dots", &self.dots.len())
            .field("current_target", &self.current_target)
            .field("active_unit", &self.active_unit)
            .field("queued", &self.queued.len())
            .field("drained", &self.drained.len())
            .field("elapsed", &self.elapsed)
            .field("tick", &self.tick)
            .finish_non_exhaustive()
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}

impl Simulation {
    /// Creates a session with the built-in catalog and executor tables.
    #[must_use]
    pub fn new(config: SimConfig) -> Self {
        Self::with_catalog(config, AbilityCatalog::builtin())
    }

    /// Creates a session with a custom catalog and the built-in executor tables.
    #[must_use]
    pub fn with_catalog(config: SimConfig, catalog: AbilityCatalog) -> Self {
        Self {
            arena: Arena::new(),
            catalog,
            executors: ExecutorRegistry::builtin(),
            overrides: None,
            terrain: Box::new(FlatTerrain::default()),
            feedback: Feedback::new(&config),
            config,
            projectiles: Vec::new(),
            dots: Vec::new(),
            current_target: None,
            active_unit: None,
            queued: VecDeque::new(),
            drained: Vec::new(),
            next_projectile_id: 0,
            elapsed: 0.0,
            tick: 0,
        }
    }

    // =========================================================================
    // Combatants
    // =========================================================================

    /// Adds a combatant.
    ///
    /// Controlled kinds get an idle control state sized to the configured
    /// slot count. The first player spawned becomes the active unit.
    pub fn spawn(&mut self, kind: CombatantKind, position: Vec3, ledger: ResourceLedger) -> CombatantId {
        let id = self.arena.spawn(kind, position, ledger);
        if let Some(control) = self.arena.control_mut(id) {
            *control = ControlState::new(self.config.slot_count);
        }
        if kind == CombatantKind::Player && self.active_unit.is_none() {
            self.active_unit = Some(id);
        }
        tracing::debug!(target: "warband::simulation", %id, %kind, "spawn");
        id
    }

    /// Adds the player.
    pub fn spawn_player(&mut self, position: Vec3, ledger: ResourceLedger) -> CombatantId {
        self.spawn(CombatantKind::Player, position, ledger)
    }

    /// Adds an ally.
    pub fn spawn_ally(&mut self, position: Vec3, ledger: ResourceLedger) -> CombatantId {
        self.spawn(CombatantKind::Ally, position, ledger)
    }

    /// Adds the boss.
    pub fn spawn_boss(&mut self, position: Vec3, ledger: ResourceLedger) -> CombatantId {
        self.spawn(CombatantKind::Boss, position, ledger)
    }

    /// Adds a minion.
    pub fn spawn_minion(&mut self, position: Vec3, ledger: ResourceLedger) -> CombatantId {
        self.spawn(CombatantKind::Minion, position, ledger)
    }

    /// Adds the practice dummy.
    pub fn spawn_dummy(&mut self, position: Vec3, ledger: ResourceLedger) -> CombatantId {
        self.spawn(CombatantKind::Dummy, position, ledger)
    }

    /// Adds a duel opponent.
    pub fn spawn_duelist(&mut self, position: Vec3, ledger: ResourceLedger) -> CombatantId {
        self.spawn(CombatantKind::Duelist, position, ledger)
    }

    /// Selects the current target. `None` clears it.
    pub fn set_target(&mut self, target: Option<CombatantId>) {
        self.current_target = target;
    }

    /// Current target.
    #[must_use]
    pub fn target(&self) -> Option<CombatantId> {
        self.current_target
    }

    /// Selects which controlled unit receives [`activate`](Self::activate).
    ///
    /// Returns false (and changes nothing) unless `id` is a controlled combatant.
    pub fn set_active_unit(&mut self, id: CombatantId) -> bool {
        if self.arena.control(id).is_none() {
            return false;
        }
        self.active_unit = Some(id);
        true
    }

    /// Unit receiving player input.
    #[must_use]
    pub fn active_unit(&self) -> Option<CombatantId> {
        self.active_unit
    }

    /// Read-only arena.
    #[must_use]
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Mutable arena, for moving combatants or changing stances.
    pub fn arena_mut(&mut self) -> &mut Arena {
        &mut self.arena
    }

    /// Movement speed factor of `id` from stance and windup, `1.0` if not controlled.
    #[must_use]
    pub fn movement_speed_multiplier(&self, id: CombatantId) -> f32 {
        self.arena.control(id).map_or(1.0, |control| {
            control.stance.movement_speed_multiplier * control.phase.movement_modifier()
        })
    }

    // =========================================================================
    // Abilities and collaborators
    // =========================================================================

    /// Ability catalog.
    #[must_use]
    pub fn catalog(&self) -> &AbilityCatalog {
        &self.catalog
    }

    /// Mutable ability catalog.
    pub fn catalog_mut(&mut self) -> &mut AbilityCatalog {
        &mut self.catalog
    }

    /// Mutable executor tables, for wiring up new abilities.
    pub fn executors_mut(&mut self) -> &mut ExecutorRegistry {
        &mut self.executors
    }

    /// Installs the ability override decorator.
    pub fn set_overrides(&mut self, overrides: impl AbilityOverride + 'static) {
        self.overrides = Some(Box::new(overrides));
    }

    /// Removes the ability override decorator.
    pub fn clear_overrides(&mut self) {
        self.overrides = None;
    }

    /// Definition after overrides, or `None` for an unknown name.
    #[must_use]
    pub fn effective_definition(&self, name: &str) -> Option<AbilityDefinition> {
        let raw = self.catalog.get(name)?;
        Some(match &self.overrides {
            Some(overrides) => overrides.effective(raw),
            None => raw.clone(),
        })
    }

    /// Installs an external progression sink.
    pub fn set_progression_sink(&mut self, sink: impl ProgressionSink + 'static) {
        self.feedback.sink = Some(Box::new(sink));
    }

    /// Replaces the DPS tracker.
    pub fn set_dps_tracker(&mut self, tracker: impl DpsTracker + 'static) {
        self.feedback.dps = Box::new(tracker);
    }

    /// Replaces the terrain oracle.
    pub fn set_terrain(&mut self, terrain: impl TerrainOracle + 'static) {
        self.terrain = Box::new(terrain);
    }

    // =========================================================================
    // Outputs
    // =========================================================================

    /// Combat log.
    #[must_use]
    pub fn log(&self) -> &CombatLog {
        &self.feedback.log
    }

    /// Live floating indicators.
    #[must_use]
    pub fn indicators(&self) -> &[DamageIndicator] {
        &self.feedback.indicators
    }

    /// Progression events recorded since the last drain.
    #[must_use]
    pub fn events(&self) -> &[GameEvent] {
        self.feedback.events.events()
    }

    /// Drains recorded progression events, oldest first.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        self.feedback.events.take_events()
    }

    /// DPS tracker.
    #[must_use]
    pub fn dps(&self) -> &dyn DpsTracker {
        self.feedback.dps.as_ref()
    }

    /// Session configuration.
    #[must_use]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Seconds simulated so far.
    #[must_use]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Steps taken so far.
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    // =========================================================================
    // Combat helpers
    // =========================================================================

    pub(crate) fn resolver(&mut self) -> CombatResolver<'_> {
        CombatResolver::new(&mut self.arena, &mut self.feedback, &self.config, self.current_target)
    }

    pub(crate) fn current_target_position(&self) -> Option<Vec3> {
        self.current_target.and_then(|id| self.arena.position(id))
    }

    /// Resolves an enemy attack at `origin` against the player side.
    ///
    /// Returns true if the player or an ally was hit.
    pub fn enemy_strike(&mut self, attacker: Option<CombatantId>, origin: Vec3, damage: f32, ability: &str) -> bool {
        let mut meta = StrikeMeta::new(ability);
        meta.attacker = attacker;
        self.resolver()
            .resolve_strike_against_player_side(origin, damage, &meta, None)
    }

    /// Stops `actor`'s channel, if any. Returns true if one was running.
    pub fn cancel_channel(&mut self, actor: CombatantId) -> bool {
        self.interrupt_channel(actor)
    }

    pub(crate) fn interrupt_channel(&mut self, actor: CombatantId) -> bool {
        let cancelled = self
            .arena
            .control_mut(actor)
            .and_then(|control| control.phase.cancel_channel());
        match cancelled {
            Some(ability) => {
                self.feedback.info(format!("{ability} interrupted"));
                true
            }
            None => false,
        }
    }

    // =========================================================================
    // Tick loop
    // =========================================================================

    /// Advances the session by `dt` seconds. Negative `dt` counts as zero.
    pub fn step(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        self.elapsed += dt;
        self.tick += 1;
        self.feedback.clock = self.elapsed;

        // COOLDOWNS
        for id in self.arena.controlled() {
            if let Some(control) = self.arena.control_mut(id) {
                control.cooldowns.tick(dt);
            }
        }

        // PHASES
        self.advance_phases(dt);

        // INPUT
        self.drain_queue();

        // EFFECTS
        self.update_projectiles(dt);
        self.update_damage_over_time(dt);
        self.feedback.update_indicators(dt, self.config.indicator_rise_speed);

        // METERS
        self.feedback.dps.advance(dt);
    }

    fn advance_phases(&mut self, dt: f32) {
        for actor in self.arena.controlled() {
            let Some(control) = self.arena.control_mut(actor) else {
                continue;
            };
            let advance = control.phase.advance(dt);

            if let Some((ability, effect, ticks)) = advance.channel_ticks {
                for _ in 0..ticks {
                    self.channel_tick(actor, &ability, effect);
                }
            }

            match advance.completed {
                None => {}
                Some(Completion::Cast(phase)) => {
                    self.feedback.info(format!("Finished casting {}", phase.ability));
                    self.complete_phase(actor, phase, ExecutorTable::CastCompletion);
                }
                Some(Completion::Windup(phase)) => {
                    self.feedback.info(format!("{} lands", phase.ability));
                    self.complete_phase(actor, phase, ExecutorTable::WindupCompletion);
                }
                Some(Completion::Channel { ability }) => {
                    self.feedback.info(format!("{ability} channel complete"));
                }
            }
        }
    }

    fn channel_tick(&mut self, actor: CombatantId, ability: &str, effect: ChannelEffect) {
        match effect {
            ChannelEffect::Damage(amount) => {
                let meta = StrikeMeta::new(ability).by(actor);
                self.resolver().damage_current_target(amount, &meta);
            }
            ChannelEffect::Heal(amount) => {
                self.resolver().restore_health(actor, amount, ability);
            }
        }
    }

    /// Pays the deferred charge, arms captured cooldowns, and runs the effect.
    fn complete_phase(&mut self, actor: CombatantId, phase: TimedPhase, table: ExecutorTable) {
        let Some(combatant) = self.arena.get_mut(actor) else {
            return;
        };
        combatant.pay(&phase.charge);
        if let Some(control) = combatant.as_controlled_mut() {
            control.cooldowns.arm(phase.slot, phase.captured.cooldown);
            control.cooldowns.arm_global(phase.captured.global_cooldown);
        }

        let effect = self.executors.resolve(table, &phase.ability);
        let definition = self
            .effective_definition(&phase.ability)
            .unwrap_or_else(|| AbilityDefinition::new(phase.ability.clone()));
        let execution = Execution {
            actor,
            slot: phase.slot,
            definition,
            damage_multiplier: phase.captured.damage_multiplier,
        };
        self.execute_effect(&execution, effect);
    }
}
