//! Traits for collaborators that live outside this crate.
//!
//! Each trait comes with a default implementation so a simulation works with
//! nothing configured:
//!
//! | Trait               | Default        |
//! |---------------------|----------------|
//! | [`ProgressionSink`] | none (events are still recorded internally) |
//! | [`DpsTracker`]      | [`DpsMeter`]   |
//! | [`TerrainOracle`]   | [`FlatTerrain`] |
//!
//! The ability override and strategic planner contracts live in
//! [`crate::ability`] and [`crate::planner`].

use crate::output::GameEvent;

/// Fire-and-forget receiver for progression events.
pub trait ProgressionSink {
    /// Receives one event. The core never inspects anything in return.
    fn emit(&mut self, event: &GameEvent);
}

impl<F> ProgressionSink for F
where
    F: FnMut(&GameEvent),
{
    fn emit(&mut self, event: &GameEvent) {
        self(event);
    }
}

/// Hit/miss statistics for the practice dummy.
pub trait DpsTracker {
    /// Records a strike that reached the dummy.
    fn record_hit(&mut self, damage: f32);
    /// Records a strike aimed at the dummy that missed.
    fn record_miss(&mut self);
    /// Advances the measurement clock.
    fn advance(&mut self, dt: f32);
    /// Total damage recorded.
    fn total_damage(&self) -> f32;
    /// Number of hits.
    fn hits(&self) -> u32;
    /// Number of misses.
    fn misses(&self) -> u32;
    /// Clears every statistic.
    fn reset(&mut self);

    /// Fraction of strikes that hit, `0.0` with no strikes.
    fn hit_rate(&self) -> f32 {
        let total = self.hits() + self.misses();
        if total == 0 {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            let rate = self.hits() as f32 / total as f32;
            rate
        }
    }
}

/// Default [`DpsTracker`]: damage over the time since the first hit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DpsMeter {
    total_damage: f32,
    hits: u32,
    misses: u32,
    elapsed: f32,
    started: bool,
}

impl DpsMeter {
    /// Creates an empty meter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Damage per second since the first hit, `0.0` before any time passes.
    #[must_use]
    pub fn dps(&self) -> f32 {
        if self.elapsed > 0.0 {
            self.total_damage / self.elapsed
        } else {
            0.0
        }
    }
}

impl DpsTracker for DpsMeter {
    fn record_hit(&mut self, damage: f32) {
        self.total_damage += damage.max(0.0);
        self.hits += 1;
        self.started = true;
    }

    fn record_miss(&mut self) {
        self.misses += 1;
    }

    fn advance(&mut self, dt: f32) {
        if self.started && dt > 0.0 {
            self.elapsed += dt;
        }
    }

    fn total_damage(&self) -> f32 {
        self.total_damage
    }

    fn hits(&self) -> u32 {
        self.hits
    }

    fn misses(&self) -> u32 {
        self.misses
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Ground height lookup used to keep melee and dash strikes grounded.
pub trait TerrainOracle {
    /// Height of the terrain at `(x, z)`.
    fn terrain_height(&self, x: f32, z: f32) -> f32;
}

/// Perfectly flat ground at a fixed height.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlatTerrain {
    /// Ground height.
    pub height: f32,
}

impl TerrainOracle for FlatTerrain {
    fn terrain_height(&self, _x: f32, _z: f32) -> f32 {
        self.height
    }
}

impl<F> TerrainOracle for F
where
    F: Fn(f32, f32) -> f32,
{
    fn terrain_height(&self, x: f32, z: f32) -> f32 {
        self(x, z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::CombatantId;

    #[test]
    fn dps_meter_tracks_hit_rate() {
        let mut meter = DpsMeter::new();
        meter.record_hit(30.0);
        meter.record_hit(10.0);
        meter.record_miss();
        meter.record_miss();
        assert_eq!(meter.hits(), 2);
        assert_eq!(meter.misses(), 2);
        assert!((meter.hit_rate() - 0.5).abs() < 1e-6);
        assert_eq!(meter.total_damage(), 40.0);
    }

    #[test]
    fn dps_clock_starts_on_first_hit() {
        let mut meter = DpsMeter::new();
        meter.advance(5.0);
        assert_eq!(meter.dps(), 0.0);
        meter.record_hit(20.0);
        meter.advance(2.0);
        assert!((meter.dps() - 10.0).abs() < 1e-6);
        meter.reset();
        assert_eq!(meter, DpsMeter::new());
    }

    #[test]
    fn empty_meter_hit_rate_is_zero() {
        assert_eq!(DpsMeter::new().hit_rate(), 0.0);
    }

    #[test]
    fn closures_are_collaborators() {
        let mut names = Vec::new();
        {
            let mut sink = |event: &GameEvent| names.push(event.name());
            sink.emit(&GameEvent::PlayerDefeated {
                player: CombatantId::new(0),
            });
        }
        assert_eq!(names, vec!["player_defeated"]);

        let hills = |x: f32, z: f32| x + z;
        assert_eq!(hills.terrain_height(1.0, 2.0), 3.0);
        assert_eq!(FlatTerrain { height: 4.0 }.terrain_height(9.0, 9.0), 4.0);
    }
}
