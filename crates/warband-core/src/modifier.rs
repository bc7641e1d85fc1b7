//! Modifier pipeline: stances, haste, and cooldown reduction.
//!
//! Everything here is pure. The dispatch gate calls these functions exactly
//! once when a phase starts (or when an instant ability executes) and
//! captures the results; nothing is recomputed mid-phase.

use serde::{Deserialize, Serialize};

/// Smallest divisor allowed in the haste/reduction formulas.
const MIN_DIVISOR: f32 = 0.01;

/// A named bundle of multipliers applied to a controlled combatant.
///
/// Exactly one stance is active per controlled combatant. Switching stances
/// is an external concern; this core only reads the active one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stance {
    /// Display name.
    pub name: String,
    /// Multiplier on outgoing damage.
    pub damage_multiplier: f32,
    /// Multiplier on slot cooldowns and the global cooldown.
    pub cooldown_multiplier: f32,
    /// Multiplier on cast and windup times.
    pub cast_time_multiplier: f32,
    /// Multiplier on mana costs (ignored in health-as-resource mode).
    pub resource_cost_multiplier: f32,
    /// Multiplier on movement speed.
    pub movement_speed_multiplier: f32,
    /// Costs are paid from health instead of mana.
    pub uses_health_as_resource: bool,
    /// Health paid per point of mana cost in health-as-resource mode.
    pub health_cost_ratio: f32,
}

impl Stance {
    /// The neutral stance: every multiplier is 1.0.
    #[must_use]
    pub fn neutral() -> Self {
        Self {
            name: "neutral".to_string(),
            damage_multiplier: 1.0,
            cooldown_multiplier: 1.0,
            cast_time_multiplier: 1.0,
            resource_cost_multiplier: 1.0,
            movement_speed_multiplier: 1.0,
            uses_health_as_resource: false,
            health_cost_ratio: 1.0,
        }
    }

    /// Aggressive stance: more damage, pricier spells, faster casting.
    #[must_use]
    pub fn fury() -> Self {
        Self {
            name: "fury".to_string(),
            damage_multiplier: 1.25,
            cast_time_multiplier: 0.8,
            resource_cost_multiplier: 1.5,
            ..Self::neutral()
        }
    }

    /// Blood pact: abilities are paid with health at the given ratio.
    #[must_use]
    pub fn blood_pact(ratio: f32) -> Self {
        Self {
            name: "blood pact".to_string(),
            damage_multiplier: 1.1,
            uses_health_as_resource: true,
            health_cost_ratio: ratio,
            ..Self::neutral()
        }
    }
}

impl Default for Stance {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Haste and flat cooldown-reduction stats, both in percent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CombatStats {
    /// Shortens cast time, windup time, and the global cooldown.
    pub haste_percent: f32,
    /// Shortens slot cooldowns.
    pub cooldown_reduction_percent: f32,
}

fn percent_divisor(percent: f32) -> f32 {
    (1.0 + percent / 100.0).max(MIN_DIVISOR)
}

/// `base / (1 + reduction/100) * stance.cooldown_multiplier`
#[must_use]
pub fn effective_cooldown(base: f32, stats: &CombatStats, stance: &Stance) -> f32 {
    base / percent_divisor(stats.cooldown_reduction_percent) * stance.cooldown_multiplier
}

/// `base / (1 + haste/100) * stance.cast_time_multiplier`
///
/// Used for both cast times and windup times.
#[must_use]
pub fn effective_phase_time(base: f32, stats: &CombatStats, stance: &Stance) -> f32 {
    base / percent_divisor(stats.haste_percent) * stance.cast_time_multiplier
}

/// `base * stance.resource_cost_multiplier`, untouched in health-as-resource mode.
#[must_use]
pub fn effective_resource_cost(base: f32, stance: &Stance) -> f32 {
    if stance.uses_health_as_resource {
        base
    } else {
        base * stance.resource_cost_multiplier
    }
}

/// Global cooldown after a successful activation.
///
/// `base / (1 + haste/100) * stance.cooldown_multiplier`
#[must_use]
pub fn global_cooldown(base: f32, stats: &CombatStats, stance: &Stance) -> f32 {
    base / percent_divisor(stats.haste_percent) * stance.cooldown_multiplier
}

/// Health owed for a cost in health-as-resource mode.
#[must_use]
pub fn health_cost(cost: f32, stance: &Stance) -> f32 {
    cost * stance.health_cost_ratio
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn neutral_stance_is_identity() {
        let stats = CombatStats::default();
        let stance = Stance::neutral();
        assert!(approx(effective_cooldown(5.0, &stats, &stance), 5.0));
        assert!(approx(effective_phase_time(2.0, &stats, &stance), 2.0));
        assert!(approx(effective_resource_cost(20.0, &stance), 20.0));
        assert!(approx(global_cooldown(1.0, &stats, &stance), 1.0));
    }

    #[test]
    fn haste_shortens_phase_and_gcd() {
        let stats = CombatStats {
            haste_percent: 25.0,
            ..CombatStats::default()
        };
        let stance = Stance::neutral();
        assert!(approx(effective_phase_time(2.5, &stats, &stance), 2.0));
        assert!(approx(global_cooldown(1.0, &stats, &stance), 0.8));
        // Haste does not touch slot cooldowns
        assert!(approx(effective_cooldown(5.0, &stats, &stance), 5.0));
    }

    #[test]
    fn reduction_and_stance_compose() {
        let stats = CombatStats {
            cooldown_reduction_percent: 100.0,
            ..CombatStats::default()
        };
        let stance = Stance {
            cooldown_multiplier: 1.5,
            ..Stance::neutral()
        };
        assert!(approx(effective_cooldown(8.0, &stats, &stance), 6.0));
    }

    #[test]
    fn cost_multiplier_skipped_in_health_mode() {
        let mut stance = Stance::blood_pact(0.5);
        stance.resource_cost_multiplier = 3.0;
        assert!(approx(effective_resource_cost(20.0, &stance), 20.0));
        assert!(approx(health_cost(20.0, &stance), 10.0));
    }

    #[test]
    fn fury_scales_costs() {
        let stance = Stance::fury();
        assert!(approx(effective_resource_cost(20.0, &stance), 30.0));
    }

    #[test]
    fn extreme_negative_haste_does_not_divide_by_zero() {
        let stats = CombatStats {
            haste_percent: -100.0,
            ..CombatStats::default()
        };
        let t = effective_phase_time(1.0, &stats, &Stance::neutral());
        assert!(t.is_finite());
    }

    #[test]
    fn stance_deserializes_with_defaults() {
        let stance: Stance = serde_json::from_str(r#"{"name":"glass","damage_multiplier":2.0}"#).unwrap();
        assert_eq!(stance.name, "glass");
        assert!(approx(stance.damage_multiplier, 2.0));
        assert!(approx(stance.cooldown_multiplier, 1.0));
        assert!(!stance.uses_health_as_resource);
    }
}
