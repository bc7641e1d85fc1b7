//! # Warband Core
//!
//! Ability execution and combat resolution core for Warband.
//!
//! This crate is the deterministic, tick-driven heart of an encounter: it
//! decides whether an ability may be used, runs cast, windup, and channel
//! phases, settles resource costs, and turns strikes into damage, kills,
//! and progression events.
//!
//! ## Architecture
//!
//! - **Entities**: player, allies, boss, minions, practice dummy, duelists
//! - **Dispatch**: a single validation gate for every activation
//! - **Phases**: per-combatant cast/windup/channel state machine
//! - **Executors**: name-keyed effect tables with generic fallbacks
//! - **Resolvers**: strike targeting, damage, kills, and events
//!
//! Everything lives in one [`Simulation`] per session; there is no global
//! state.
//!
//! ## Usage
//!
//! ```
//! use glam::Vec3;
//! use warband_core::{DispatchOutcome, ResourceLedger, Simulation};
//!
//! let mut sim = Simulation::default();
//! let player = sim.spawn_player(Vec3::ZERO, ResourceLedger::new(100.0));
//! let boss = sim.spawn_boss(Vec3::new(0.0, 0.0, 2.0), ResourceLedger::new(500.0));
//! sim.set_target(Some(boss));
//!
//! assert_eq!(sim.activate("Sword", 0), DispatchOutcome::Executed);
//! assert_eq!(sim.arena().get(boss).unwrap().ledger.health(), 475.0);
//! assert_eq!(sim.activate("Sword", 0), DispatchOutcome::Rejected);
//! # let _ = player;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod ability;
pub mod arena;
pub mod collab;
pub mod config;
pub mod cooldown;
pub mod dispatch;
pub mod entity;
pub mod error;
pub mod executor;
pub mod modifier;
pub mod output;
pub mod phase;
pub mod planner;
pub mod projectile;
pub mod resolver;
pub mod resource;
pub mod simulation;

#[cfg(test)]
mod tests;

pub use ability::{AbilityCatalog, AbilityDefinition, AbilityOverride, AbilityPatch, PatchSet};
pub use config::SimConfig;
pub use dispatch::DispatchOutcome;
pub use entity::{CombatantId, CombatantKind};
pub use error::{ConfigError, Rejection};
pub use output::{GameEvent, LogLevel};
pub use planner::{PlannerContext, PlannerDecision, StrategicPlanner};
pub use resource::{Attunements, ResourceColor, ResourceLedger};
pub use simulation::Simulation;
