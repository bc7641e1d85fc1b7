//! Presentation-facing output: combat log, damage indicators, and
//! progression events.
//!
//! # Architecture
//!
//! Everything here is append-only from the core's point of view:
//! - [`CombatLog`]: severity-tagged text lines, capped and trimmed in batches
//! - [`DamageIndicator`]: floating numbers that rise and expire
//! - [`GameEvent`]: fire-and-forget notifications for progression systems
//!
//! [`Feedback`] bundles these with the DPS tracker and the progression sink
//! so resolvers can borrow a single value.
//!
//! Every combat log line is mirrored to `tracing` at the matching level
//! under the `warband::combat` target.

use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::collab::{DpsMeter, DpsTracker, ProgressionSink};
use crate::config::SimConfig;
use crate::entity::CombatantId;
use crate::resolver::EventRecorder;

// =============================================================================
// Combat Log
// =============================================================================

/// Severity of a combat log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Successful actions.
    Info,
    /// Rejected actions.
    Warn,
    /// Unexpected data (unknown abilities).
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// One combat log line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatLogEntry {
    /// Simulation time in seconds.
    pub time: f32,
    /// Severity.
    pub level: LogLevel,
    /// Text.
    pub message: String,
}

/// Bounded, append-only combat log.
///
/// When the log grows past `cap` entries, the oldest are dropped until
/// `trim_to` remain.
///
/// # Example
///
/// ```
/// use warband_core::output::{CombatLog, LogLevel};
///
/// let mut log = CombatLog::new(4, 2);
/// for i in 0..5 {
///     log.push(0.0, LogLevel::Info, format!("line {i}"));
/// }
/// assert_eq!(log.len(), 2);
/// assert_eq!(log.entries()[0].message, "line 3");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatLog {
    entries: Vec<CombatLogEntry>,
    cap: usize,
    trim_to: usize,
}

impl CombatLog {
    /// Creates an empty log. `trim_to` is clamped to `cap`.
    #[must_use]
    pub fn new(cap: usize, trim_to: usize) -> Self {
        let cap = cap.max(1);
        Self {
            entries: Vec::new(),
            cap,
            trim_to: trim_to.min(cap),
        }
    }

    /// Appends a line and mirrors it to `tracing`.
    pub fn push(&mut self, time: f32, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            LogLevel::Info => tracing::info!(target: "warband::combat", time, "{message}"),
            LogLevel::Warn => tracing::warn!(target: "warband::combat", time, "{message}"),
            LogLevel::Error => tracing::error!(target: "warband::combat", time, "{message}"),
        }
        self.entries.push(CombatLogEntry { time, level, message });
        if self.entries.len() > self.cap {
            let excess = self.entries.len() - self.trim_to;
            self.entries.drain(..excess);
        }
    }

    /// All retained lines, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[CombatLogEntry] {
        &self.entries
    }

    /// Number of retained lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lines at `level`, oldest first.
    pub fn at_level(&self, level: LogLevel) -> impl Iterator<Item = &CombatLogEntry> {
        self.entries.iter().filter(move |e| e.level == level)
    }

    /// The most recent `n` lines, oldest first.
    #[must_use]
    pub fn recent(&self, n: usize) -> &[CombatLogEntry] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }

    /// Returns true if any line at `level` contains `needle`.
    #[must_use]
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.at_level(level).any(|e| e.message.contains(needle))
    }

    /// Removes every line.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

// =============================================================================
// Damage Indicators
// =============================================================================

/// What a floating indicator shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndicatorKind {
    /// Damage taken.
    Damage,
    /// Health restored.
    Heal,
}

/// A floating number above a combatant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageIndicator {
    /// Current world position.
    pub position: Vec3,
    /// Amount shown.
    pub amount: f32,
    /// Damage or heal.
    pub kind: IndicatorKind,
    /// Seconds since spawn.
    pub age: f32,
    /// Seconds until removal.
    pub lifetime: f32,
}

impl DamageIndicator {
    /// Returns true once the indicator has outlived its lifetime.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.age >= self.lifetime
    }
}

// =============================================================================
// Progression Events
// =============================================================================

/// Notification sent to progression collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    /// A melee strike connected.
    MeleeHit {
        /// Who struck.
        attacker: CombatantId,
        /// Streak length after this hit.
        streak: u32,
    },
    /// The melee streak reached a milestone.
    MeleeStreak {
        /// Who struck.
        attacker: CombatantId,
        /// Streak length.
        streak: u32,
    },
    /// A minion died.
    MinionKilled {
        /// Who landed the killing blow, if known.
        killer: Option<CombatantId>,
        /// Minions still alive.
        remaining: usize,
    },
    /// The boss died.
    BossKilled {
        /// The boss.
        boss: CombatantId,
        /// Who landed the killing blow, if known.
        killer: Option<CombatantId>,
    },
    /// A duel opponent was defeated.
    DuelWon {
        /// The defeated duelist.
        opponent: CombatantId,
    },
    /// An ally fell.
    AllyDefeated {
        /// The ally.
        ally: CombatantId,
    },
    /// The player fell.
    PlayerDefeated {
        /// The player.
        player: CombatantId,
    },
}

impl GameEvent {
    /// Event name as seen by progression collaborators.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::MeleeHit { .. } => "melee_hit",
            Self::MeleeStreak { .. } => "melee_streak",
            Self::MinionKilled { .. } => "minion_killed",
            Self::BossKilled { .. } => "boss_killed",
            Self::DuelWon { .. } => "duel_won",
            Self::AllyDefeated { .. } => "ally_defeated",
            Self::PlayerDefeated { .. } => "player_defeated",
        }
    }
}

// =============================================================================
// Feedback bundle
// =============================================================================

/// Everything combat resolution writes to besides combatant state.
pub struct Feedback {
    /// Combat log.
    pub log: CombatLog,
    /// Live indicators.
    pub indicators: Vec<DamageIndicator>,
    /// Recent events, drained by `take_events` and bounded like the log.
    pub events: EventRecorder,
    /// Optional external progression sink.
    pub sink: Option<Box<dyn ProgressionSink>>,
    /// DPS tracker fed by dummy hits and misses.
    pub dps: Box<dyn DpsTracker>,
    /// Simulation clock used to timestamp log lines.
    pub clock: f32,
}

impl Feedback {
    /// Creates an empty bundle sized from `config`.
    #[must_use]
    pub fn new(config: &SimConfig) -> Self {
        Self {
            log: CombatLog::new(config.combat_log_cap, config.combat_log_trim_to),
            indicators: Vec::new(),
            events: EventRecorder::bounded(config.event_buffer_cap, config.event_buffer_trim_to),
            sink: None,
            dps: Box::new(DpsMeter::new()),
            clock: 0.0,
        }
    }

    /// Logs at info level.
    pub fn info(&mut self, message: impl Into<String>) {
        self.log.push(self.clock, LogLevel::Info, message);
    }

    /// Logs at warn level.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.log.push(self.clock, LogLevel::Warn, message);
    }

    /// Logs at error level.
    pub fn error(&mut self, message: impl Into<String>) {
        self.log.push(self.clock, LogLevel::Error, message);
    }

    /// Records an event and forwards it to the external sink, if any.
    pub fn emit(&mut self, event: GameEvent) {
        tracing::debug!(target: "warband::progression", event = event.name());
        if let Some(sink) = self.sink.as_mut() {
            sink.emit(&event);
        }
        self.events.record(event);
    }

    /// Spawns a floating indicator.
    pub fn indicate(&mut self, position: Vec3, amount: f32, kind: IndicatorKind, lifetime: f32) {
        self.indicators.push(DamageIndicator {
            position,
            amount,
            kind,
            age: 0.0,
            lifetime,
        });
    }

    /// Ages indicators, drifts them upward, and drops expired ones.
    pub fn update_indicators(&mut self, dt: f32, rise_speed: f32) {
        for indicator in &mut self.indicators {
            indicator.age += dt;
            indicator.position.y += rise_speed * dt;
        }
        self.indicators.retain(|i| !i.is_expired());
    }
}

impl fmt::Debug for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Feedback")
            .field("log_len", &self.log.len())
            .field("indicators", &self.indicators.len())
            .field("events", &self.events.event_count())
            .field("has_sink", &self.sink.is_some())
            .field("clock", &self.clock)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
