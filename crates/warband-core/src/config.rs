//! Simulation tunables.
//!
//! Every field has a serde default, so a partial JSON document only needs
//! to name what it changes.
//!
//! ```
//! use warband_core::config::SimConfig;
//!
//! let config = SimConfig::from_json(r#"{"collision_threshold": 2.5}"#).unwrap();
//! assert_eq!(config.collision_threshold, 2.5);
//! assert_eq!(config.base_global_cooldown, 1.0);
//! ```

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tunable constants for one simulation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Default hit radius for strikes.
    pub collision_threshold: f32,
    /// Global cooldown before haste and stance.
    pub base_global_cooldown: f32,
    /// Combat log size that triggers a trim.
    pub combat_log_cap: usize,
    /// Combat log size after a trim.
    pub combat_log_trim_to: usize,
    /// Buffered progression events that trigger a trim.
    pub event_buffer_cap: usize,
    /// Buffered progression events kept after a trim.
    pub event_buffer_trim_to: usize,
    /// Height above a target at which indicators spawn.
    pub indicator_offset: f32,
    /// Seconds an indicator stays visible.
    pub indicator_lifetime: f32,
    /// Upward drift of indicators per second.
    pub indicator_rise_speed: f32,
    /// Reach of melee strikes in front of the attacker.
    pub melee_reach: f32,
    /// Red mana gained per melee hit.
    pub red_mana_per_melee_hit: f32,
    /// Melee streak length between milestone events.
    pub melee_streak_milestone: u32,
    /// Seconds a projectile lives without hitting anything.
    pub projectile_lifetime: f32,
    /// Projectile speed in units per second.
    pub projectile_speed: f32,
    /// Maximum homing turn in radians per second.
    pub homing_turn_rate: f32,
    /// Acceleration applied to non-homing projectiles.
    pub wind: Vec3,
    /// Number of ability slots per controlled combatant.
    pub slot_count: usize,
    /// Ability executed when a slot is activated with an unknown name.
    pub default_slot_abilities: Vec<String>,
}

impl SimConfig {
    /// Parses and validates a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::Invalid`] when a value is out of range.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.collision_threshold <= 0.0 {
            return Err(invalid("collision_threshold", "must be positive"));
        }
        if self.base_global_cooldown < 0.0 {
            return Err(invalid("base_global_cooldown", "must not be negative"));
        }
        if self.combat_log_cap == 0 {
            return Err(invalid("combat_log_cap", "must be at least 1"));
        }
        if self.combat_log_trim_to > self.combat_log_cap {
            return Err(invalid("combat_log_trim_to", "must not exceed combat_log_cap"));
        }
        if self.event_buffer_cap == 0 {
            return Err(invalid("event_buffer_cap", "must be at least 1"));
        }
        if self.event_buffer_trim_to > self.event_buffer_cap {
            return Err(invalid("event_buffer_trim_to", "must not exceed event_buffer_cap"));
        }
        if self.indicator_lifetime <= 0.0 {
            return Err(invalid("indicator_lifetime", "must be positive"));
        }
        if self.projectile_speed <= 0.0 {
            return Err(invalid("projectile_speed", "must be positive"));
        }
        if self.projectile_lifetime <= 0.0 {
            return Err(invalid("projectile_lifetime", "must be positive"));
        }
        if self.melee_streak_milestone == 0 {
            return Err(invalid("melee_streak_milestone", "must be at least 1"));
        }
        Ok(())
    }

    /// Default ability bound to `slot`, if any.
    #[must_use]
    pub fn default_slot_ability(&self, slot: usize) -> Option<&str> {
        self.default_slot_abilities.get(slot).map(String::as_str)
    }

    /// First slot whose default ability is `name`.
    #[must_use]
    pub fn slot_of(&self, name: &str) -> Option<usize> {
        self.default_slot_abilities.iter().position(|a| a == name)
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            collision_threshold: 1.8,
            base_global_cooldown: 1.0,
            combat_log_cap: 250,
            combat_log_trim_to: 200,
            event_buffer_cap: crate::resolver::DEFAULT_EVENT_CAP,
            event_buffer_trim_to: crate::resolver::DEFAULT_EVENT_TRIM_TO,
            indicator_offset: 2.0,
            indicator_lifetime: 1.0,
            indicator_rise_speed: 1.5,
            melee_reach: 2.0,
            red_mana_per_melee_hit: 5.0,
            melee_streak_milestone: 5,
            projectile_lifetime: 5.0,
            projectile_speed: 20.0,
            homing_turn_rate: 6.0,
            wind: Vec3::ZERO,
            slot_count: crate::cooldown::DEFAULT_SLOT_COUNT,
            default_slot_abilities: ["Sword", "Fireball", "Heal", "Dash Attack", "Whirlwind"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SimConfig::default();
        config.validate().unwrap();
        assert_eq!(config.collision_threshold, 1.8);
        assert_eq!(config.combat_log_cap, 250);
        assert_eq!(config.combat_log_trim_to, 200);
        assert_eq!(config.default_slot_ability(0), Some("Sword"));
        assert_eq!(config.slot_of("Fireball"), Some(1));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = SimConfig::from_json(r#"{"wind":[1.0,0.0,0.0],"slot_count":4}"#).unwrap();
        assert_eq!(config.wind, Vec3::X);
        assert_eq!(config.slot_count, 4);
        assert_eq!(config.projectile_speed, 20.0);
    }

    #[test]
    fn trim_above_cap_is_rejected() {
        let err = SimConfig::from_json(r#"{"combat_log_cap":10,"combat_log_trim_to":20}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "combat_log_trim_to", .. }));
    }

    #[test]
    fn event_trim_above_cap_is_rejected() {
        let err = SimConfig::from_json(r#"{"event_buffer_cap":5,"event_buffer_trim_to":6}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "event_buffer_trim_to", .. }));
    }

    #[test]
    fn zero_threshold_is_rejected() {
        let err = SimConfig::from_json(r#"{"collision_threshold":0.0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "collision_threshold", .. }));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(SimConfig::from_json("{"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn serialization_roundtrip() {
        let config = SimConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(SimConfig::from_json(&json).unwrap(), config);
    }
}
