//! Multi-currency resource ledger.
//!
//! Every combatant owns a [`ResourceLedger`] holding five independent mana
//! pools (one per [`ResourceColor`]) plus current and maximum health.
//!
//! The ledger is a pure bookkeeping layer: it answers `has` queries and
//! performs `spend`s without ever raising an error. Deciding whether an
//! ability may be paid for happens earlier, in the dispatch gate.
//!
//! # Invariants
//!
//! - Pool values never go negative and never exceed their maximum.
//! - Paying an ability cost with health never drops health below 1.

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// One of the five mana colors, or `None` for abilities that cost nothing.
///
/// `None` always satisfies [`ResourceLedger::has`] and is a no-op on
/// [`ResourceLedger::spend`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ResourceColor {
    /// No resource.
    #[default]
    None,
    /// Blue mana (arcane casting).
    Blue,
    /// Red mana (generated by melee hits).
    Red,
    /// White mana (restoration).
    White,
    /// Green mana (nature).
    Green,
    /// Black mana (shadow).
    Black,
}

impl ResourceColor {
    /// The five colors that have a backing pool, in ledger order.
    pub const POOLED: [Self; 5] = [Self::Blue, Self::Red, Self::White, Self::Green, Self::Black];

    const fn pool_index(self) -> Option<usize> {
        match self {
            Self::None => None,
            Self::Blue => Some(0),
            Self::Red => Some(1),
            Self::White => Some(2),
            Self::Green => Some(3),
            Self::Black => Some(4),
        }
    }

    /// Returns the attunement flag gating this color.
    #[must_use]
    pub const fn attunement(self) -> Attunements {
        match self {
            Self::None => Attunements::empty(),
            Self::Blue => Attunements::BLUE,
            Self::Red => Attunements::RED,
            Self::White => Attunements::WHITE,
            Self::Green => Attunements::GREEN,
            Self::Black => Attunements::BLACK,
        }
    }
}

impl fmt::Display for ResourceColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Blue => write!(f, "blue"),
            Self::Red => write!(f, "red"),
            Self::White => write!(f, "white"),
            Self::Green => write!(f, "green"),
            Self::Black => write!(f, "black"),
        }
    }
}

bitflags! {
    /// Capability set: which colors a combatant is allowed to spend.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Attunements: u8 {
        /// May spend blue mana.
        const BLUE = 1 << 0;
        /// May spend red mana.
        const RED = 1 << 1;
        /// May spend white mana.
        const WHITE = 1 << 2;
        /// May spend green mana.
        const GREEN = 1 << 3;
        /// May spend black mana.
        const BLACK = 1 << 4;
    }
}

impl Attunements {
    /// Returns true if this set permits spending `color`.
    ///
    /// `ResourceColor::None` never needs an attunement.
    #[must_use]
    pub fn permits(self, color: ResourceColor) -> bool {
        self.contains(color.attunement())
    }
}

/// A bounded quantity with a current and maximum value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pool {
    /// Current amount.
    pub current: f32,
    /// Upper bound.
    pub max: f32,
}

impl Pool {
    /// Creates a full pool.
    #[must_use]
    pub const fn full(max: f32) -> Self {
        Self { current: max, max }
    }

    /// Creates a pool with an explicit current value, clamped to `[0, max]`.
    #[must_use]
    pub fn new(current: f32, max: f32) -> Self {
        let max = max.max(0.0);
        Self {
            current: current.clamp(0.0, max),
            max,
        }
    }

    /// Ratio of current to maximum, `0.0` for an empty-capacity pool.
    #[must_use]
    pub fn fraction(&self) -> f32 {
        if self.max > 0.0 {
            self.current / self.max
        } else {
            0.0
        }
    }
}

impl Default for Pool {
    fn default() -> Self {
        Self::full(0.0)
    }
}

/// Per-combatant multi-currency ledger.
///
/// # Example
///
/// ```
/// use warband_core::resource::{ResourceColor, ResourceLedger};
///
/// let mut ledger = ResourceLedger::new(100.0).with_pool(ResourceColor::Blue, 50.0, 100.0);
/// assert!(ledger.has(ResourceColor::Blue, 20.0));
/// ledger.spend(ResourceColor::Blue, 20.0);
/// assert_eq!(ledger.amount(ResourceColor::Blue), 30.0);
/// assert!(ledger.has(ResourceColor::None, 1_000.0));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceLedger {
    pools: [Pool; 5],
    health: Pool,
}

impl ResourceLedger {
    /// Creates a ledger at full health with every mana pool empty.
    #[must_use]
    pub fn new(max_health: f32) -> Self {
        Self {
            pools: [Pool::default(); 5],
            health: Pool::full(max_health.max(0.0)),
        }
    }

    /// Builder: sets the current and maximum value of one color.
    #[must_use]
    pub fn with_pool(mut self, color: ResourceColor, current: f32, max: f32) -> Self {
        if let Some(idx) = color.pool_index() {
            self.pools[idx] = Pool::new(current, max);
        }
        self
    }

    /// Builder: fills every color to the same maximum.
    #[must_use]
    pub fn with_all_pools(mut self, max: f32) -> Self {
        self.pools = [Pool::full(max.max(0.0)); 5];
        self
    }

    /// Returns true if the ledger can pay `amount` of `color`.
    ///
    /// Always true for `ResourceColor::None` and for non-positive amounts.
    #[must_use]
    pub fn has(&self, color: ResourceColor, amount: f32) -> bool {
        if amount <= 0.0 {
            return true;
        }
        match color.pool_index() {
            Some(idx) => self.pools[idx].current >= amount,
            None => true,
        }
    }

    /// Debits `amount` of `color`. No-op for `None` or non-positive amounts.
    ///
    /// The pool floors at zero; callers gate on [`has`](Self::has) first.
    pub fn spend(&mut self, color: ResourceColor, amount: f32) {
        if amount <= 0.0 {
            return;
        }
        if let Some(idx) = color.pool_index() {
            let pool = &mut self.pools[idx];
            pool.current = (pool.current - amount).max(0.0);
        }
    }

    /// Credits `amount` of `color`, capped at the pool maximum.
    pub fn gain(&mut self, color: ResourceColor, amount: f32) {
        if amount <= 0.0 {
            return;
        }
        if let Some(idx) = color.pool_index() {
            let pool = &mut self.pools[idx];
            pool.current = (pool.current + amount).min(pool.max);
        }
    }

    /// Current amount of `color` (zero for `None`).
    #[must_use]
    pub fn amount(&self, color: ResourceColor) -> f32 {
        color.pool_index().map_or(0.0, |idx| self.pools[idx].current)
    }

    /// Full pool for `color`, if it has one.
    #[must_use]
    pub fn pool(&self, color: ResourceColor) -> Option<Pool> {
        color.pool_index().map(|idx| self.pools[idx])
    }

    /// Current health.
    #[must_use]
    pub fn health(&self) -> f32 {
        self.health.current
    }

    /// Maximum health.
    #[must_use]
    pub fn max_health(&self) -> f32 {
        self.health.max
    }

    /// Sets current health, clamped to `[0, max]`.
    pub fn set_health(&mut self, value: f32) {
        self.health.current = value.clamp(0.0, self.health.max);
    }

    /// Returns true while health is above zero.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.health.current > 0.0
    }

    /// Pays an ability cost out of health.
    ///
    /// Health is clamped to `[1, max]` afterwards, so a cost can leave the
    /// combatant at 1 but never kill it. Returns the health actually lost.
    pub fn spend_health(&mut self, amount: f32) -> f32 {
        if amount <= 0.0 {
            return 0.0;
        }
        let before = self.health.current;
        self.health.current = (before - amount).max(1.0).min(self.health.max);
        (before - self.health.current).max(0.0)
    }

    /// Applies incoming damage, flooring health at zero.
    ///
    /// Returns `(before, after)` health so callers can detect a kill.
    pub fn take_damage(&mut self, amount: f32) -> (f32, f32) {
        let before = self.health.current;
        self.health.current = (before - amount).clamp(0.0, self.health.max);
        (before, self.health.current)
    }

    /// Restores health, capped at the maximum. Returns the amount restored.
    pub fn heal(&mut self, amount: f32) -> f32 {
        if amount <= 0.0 {
            return 0.0;
        }
        let before = self.health.current;
        self.health.current = (before + amount).min(self.health.max);
        self.health.current - before
    }
}

impl Default for ResourceLedger {
    fn default() -> Self {
        Self::new(100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod color_tests {
        use super::*;

        #[test]
        fn display_is_lowercase() {
            assert_eq!(ResourceColor::Blue.to_string(), "blue");
            assert_eq!(ResourceColor::None.to_string(), "none");
        }

        #[test]
        fn serde_uses_snake_case() {
            let json = serde_json::to_string(&ResourceColor::Green).unwrap();
            assert_eq!(json, "\"green\"");
            let back: ResourceColor = serde_json::from_str("\"black\"").unwrap();
            assert_eq!(back, ResourceColor::Black);
        }

        #[test]
        fn none_needs_no_attunement() {
            assert!(Attunements::empty().permits(ResourceColor::None));
            assert!(!Attunements::empty().permits(ResourceColor::Red));
            assert!(Attunements::RED.permits(ResourceColor::Red));
            assert!(!(Attunements::RED | Attunements::BLUE).permits(ResourceColor::Black));
        }
    }

    mod ledger_tests {
        use super::*;

        fn ledger() -> ResourceLedger {
            ResourceLedger::new(100.0).with_pool(ResourceColor::Blue, 50.0, 100.0)
        }

        #[test]
        fn has_checks_the_matching_pool() {
            let ledger = ledger();
            assert!(ledger.has(ResourceColor::Blue, 50.0));
            assert!(!ledger.has(ResourceColor::Blue, 50.1));
            assert!(!ledger.has(ResourceColor::Red, 1.0));
        }

        #[test]
        fn none_color_always_satisfied() {
            let mut ledger = ledger();
            assert!(ledger.has(ResourceColor::None, 9999.0));
            ledger.spend(ResourceColor::None, 9999.0);
            assert_eq!(ledger.amount(ResourceColor::Blue), 50.0);
        }

        #[test]
        fn spend_ignores_non_positive_amounts() {
            let mut ledger = ledger();
            ledger.spend(ResourceColor::Blue, 0.0);
            ledger.spend(ResourceColor::Blue, -10.0);
            assert_eq!(ledger.amount(ResourceColor::Blue), 50.0);
        }

        #[test]
        fn spend_floors_at_zero() {
            let mut ledger = ledger();
            ledger.spend(ResourceColor::Blue, 80.0);
            assert_eq!(ledger.amount(ResourceColor::Blue), 0.0);
        }

        #[test]
        fn gain_caps_at_max() {
            let mut ledger = ledger();
            ledger.gain(ResourceColor::Blue, 500.0);
            assert_eq!(ledger.amount(ResourceColor::Blue), 100.0);
        }

        #[test]
        fn health_cost_never_kills() {
            let mut ledger = ResourceLedger::new(100.0);
            let lost = ledger.spend_health(250.0);
            assert_eq!(ledger.health(), 1.0);
            assert!((lost - 99.0).abs() < 1e-4);
        }

        #[test]
        fn take_damage_reports_crossing() {
            let mut ledger = ResourceLedger::new(30.0);
            let (before, after) = ledger.take_damage(45.0);
            assert_eq!(before, 30.0);
            assert_eq!(after, 0.0);
            assert!(!ledger.is_alive());
        }

        #[test]
        fn heal_returns_actual_amount() {
            let mut ledger = ResourceLedger::new(100.0);
            ledger.set_health(90.0);
            assert_eq!(ledger.heal(25.0), 10.0);
            assert_eq!(ledger.heal(5.0), 0.0);
        }

        #[test]
        fn serialization_roundtrip() {
            let ledger = ledger().with_pool(ResourceColor::Black, 10.0, 40.0);
            let json = serde_json::to_string(&ledger).unwrap();
            let back: ResourceLedger = serde_json::from_str(&json).unwrap();
            assert_eq!(ledger, back);
        }
    }
}
