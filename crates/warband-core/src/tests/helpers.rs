//! Test helper functions for setting up encounters.
//!
//! This module provides factory functions and accessors that keep the
//! scenario tests short and consistent.

use glam::Vec3;

use crate::entity::CombatantId;
use crate::modifier::Stance;
use crate::resource::{Attunements, ResourceColor, ResourceLedger};
use crate::simulation::Simulation;

// =============================================================================
// Tracing
// =============================================================================

/// Routes `tracing` output through the test harness. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

// =============================================================================
// Encounter Setup
// =============================================================================

/// A player facing a boss, with ids for everything spawned.
pub struct Encounter {
    pub sim: Simulation,
    pub player: CombatantId,
    pub boss: CombatantId,
}

/// Ledger with 100 health and 100 of every color.
pub fn full_ledger() -> ResourceLedger {
    ResourceLedger::new(100.0).with_all_pools(100.0)
}

/// Spawns a player at the origin attuned to every color and a 500 hp boss
/// at `boss_at`, targeted.
pub fn setup_encounter(boss_at: Vec3) -> Encounter {
    init_tracing();
    let mut sim = Simulation::default();
    let player = sim.spawn_player(Vec3::ZERO, full_ledger());
    attune(&mut sim, player, Attunements::all());
    let boss = sim.spawn_boss(boss_at, ResourceLedger::new(500.0));
    sim.set_target(Some(boss));
    Encounter { sim, player, boss }
}

/// Boss in melee range, two units in front of the player.
pub fn setup_melee_encounter() -> Encounter {
    setup_encounter(Vec3::new(0.0, 0.0, 2.0))
}

/// Boss at spell range, ten units in front of the player.
pub fn setup_ranged_encounter() -> Encounter {
    setup_encounter(Vec3::new(0.0, 0.0, 10.0))
}

// =============================================================================
// State Accessors
// =============================================================================

/// Replaces the attunements of a controlled combatant.
pub fn attune(sim: &mut Simulation, id: CombatantId, attunements: Attunements) {
    if let Some(control) = sim.arena_mut().control_mut(id) {
        control.attunements = attunements;
    }
}

/// Replaces the stance of a controlled combatant.
pub fn set_stance(sim: &mut Simulation, id: CombatantId, stance: Stance) {
    if let Some(control) = sim.arena_mut().control_mut(id) {
        control.stance = stance;
    }
}

/// Current health, `NaN` if the combatant is missing.
pub fn health(sim: &Simulation, id: CombatantId) -> f32 {
    sim.arena().get(id).map_or(f32::NAN, |c| c.ledger.health())
}

/// Current mana of one color.
pub fn mana(sim: &Simulation, id: CombatantId, color: ResourceColor) -> f32 {
    sim.arena().get(id).map_or(f32::NAN, |c| c.ledger.amount(color))
}

/// Remaining cooldown of a slot.
pub fn cooldown(sim: &Simulation, id: CombatantId, slot: usize) -> f32 {
    sim.arena().control(id).map_or(f32::NAN, |c| c.cooldowns.remaining(slot))
}

/// Remaining global cooldown.
pub fn global_cooldown(sim: &Simulation, id: CombatantId) -> f32 {
    sim.arena().control(id).map_or(f32::NAN, |c| c.cooldowns.global_remaining())
}

/// Number of log lines containing `needle`.
pub fn log_count(sim: &Simulation, needle: &str) -> usize {
    sim.log().entries().iter().filter(|e| e.message.contains(needle)).count()
}

// =============================================================================
// Time
// =============================================================================

/// Steps `count` times with a fixed `dt`.
pub fn run_steps(sim: &mut Simulation, count: usize, dt: f32) {
    for _ in 0..count {
        sim.step(dt);
    }
}
