//! In-memory buffer for progression events.
//!
//! The `EventRecorder` keeps [`GameEvent`]s emitted during a session until
//! they are drained with `take_events()`. It never touches combat state.
//! Like the combat log it is bounded: once it holds more than `cap` events
//! the oldest are dropped in one batch, down to `trim_to`.

use crate::collab::ProgressionSink;
use crate::output::GameEvent;

/// Buffered events that trigger a trim.
pub const DEFAULT_EVENT_CAP: usize = 1000;

/// Buffered events kept after a trim.
pub const DEFAULT_EVENT_TRIM_TO: usize = 800;

/// Records progression events in emission order.
///
/// # Example
///
/// ```
/// use warband_core::entity::CombatantId;
/// use warband_core::output::GameEvent;
/// use warband_core::resolver::EventRecorder;
///
/// let mut recorder = EventRecorder::new();
/// recorder.record(GameEvent::AllyDefeated { ally: CombatantId::new(2) });
///
/// assert_eq!(recorder.event_count(), 1);
/// let events = recorder.take_events();
/// assert_eq!(events[0].name(), "ally_defeated");
/// assert!(recorder.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecorder {
    events: Vec<GameEvent>,
    cap: usize,
    trim_to: usize,
    dropped: u64,
}

impl EventRecorder {
    /// Creates an empty recorder with the default bounds.
    #[must_use]
    pub fn new() -> Self {
        Self::bounded(DEFAULT_EVENT_CAP, DEFAULT_EVENT_TRIM_TO)
    }

    /// Creates an empty recorder. `trim_to` is clamped to `cap`.
    #[must_use]
    pub fn bounded(cap: usize, trim_to: usize) -> Self {
        let cap = cap.max(1);
        Self {
            events: Vec::new(),
            cap,
            trim_to: trim_to.min(cap),
            dropped: 0,
        }
    }

    /// Appends an event, dropping the oldest in a batch when over capacity.
    pub fn record(&mut self, event: GameEvent) {
        self.events.push(event);
        if self.events.len() > self.cap {
            let excess = self.events.len() - self.trim_to;
            self.events.drain(..excess);
            self.dropped += excess as u64;
        }
    }

    /// Events discarded by trimming since the recorder was created.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Drains and returns every recorded event, oldest first.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Recorded events without draining them.
    #[must_use]
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    /// Number of recorded events.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Returns true if nothing is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of recorded events named `name`.
    #[must_use]
    pub fn count_named(&self, name: &str) -> usize {
        self.events.iter().filter(|e| e.name() == name).count()
    }

    /// Discards every recorded event.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl Default for EventRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressionSink for EventRecorder {
    fn emit(&mut self, event: &GameEvent) {
        self.record(event.clone());
    }
}
