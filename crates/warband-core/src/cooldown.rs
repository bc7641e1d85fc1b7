//! Per-slot cooldown timers and the global cooldown.

use serde::{Deserialize, Serialize};

/// Default number of ability slots on a controlled combatant.
pub const DEFAULT_SLOT_COUNT: usize = 10;

/// Cooldown timers owned by one controlled combatant.
///
/// Timers are decremented unconditionally every tick, independent of what
/// phase the combatant is in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CooldownBank {
    slots: Vec<f32>,
    global: f32,
}

impl CooldownBank {
    /// Creates a bank with `slot_count` ready slots.
    #[must_use]
    pub fn new(slot_count: usize) -> Self {
        Self {
            slots: vec![0.0; slot_count],
            global: 0.0,
        }
    }

    /// Seconds remaining on `slot` (zero for slots never armed).
    #[must_use]
    pub fn remaining(&self, slot: usize) -> f32 {
        self.slots.get(slot).copied().unwrap_or(0.0)
    }

    /// Returns true if `slot` is ready.
    #[must_use]
    pub fn is_ready(&self, slot: usize) -> bool {
        self.remaining(slot) <= 0.0
    }

    /// Number of slots in the bank.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if the bank has no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns true if `slot` exists in this bank.
    #[must_use]
    pub fn has_slot(&self, slot: usize) -> bool {
        slot < self.slots.len()
    }

    /// Arms `slot` for `seconds`. Slots outside the bank are ignored.
    pub fn arm(&mut self, slot: usize, seconds: f32) {
        if let Some(remaining) = self.slots.get_mut(slot) {
            *remaining = seconds.max(0.0);
        }
    }

    /// Seconds remaining on the global cooldown.
    #[must_use]
    pub fn global_remaining(&self) -> f32 {
        self.global
    }

    /// Arms the global cooldown.
    pub fn arm_global(&mut self, seconds: f32) {
        self.global = seconds.max(0.0);
    }

    /// Advances every timer by `dt`. Non-positive `dt` changes nothing.
    pub fn tick(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        for remaining in &mut self.slots {
            *remaining = (*remaining - dt).max(0.0);
        }
        self.global = (self.global - dt).max(0.0);
    }

    /// All slot timers, in slot order.
    #[must_use]
    pub fn slots(&self) -> &[f32] {
        &self.slots
    }
}

impl Default for CooldownBank {
    fn default() -> Self {
        Self::new(DEFAULT_SLOT_COUNT)
    }
}
