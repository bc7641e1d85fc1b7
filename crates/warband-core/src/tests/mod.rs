//! Crate-level scenario, determinism, and property tests.
//!
//! # Test Structure
//!
//! - `integration.rs`: end-to-end scenarios through `Simulation`
//! - `determinism.rs`: identical inputs give identical sessions
//! - `properties.rs`: proptest invariants over random input sequences
//! - `helpers.rs`: encounter setup and state accessors

mod determinism;
mod helpers;

pub use helpers::*;
