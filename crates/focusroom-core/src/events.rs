use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{Phase, PomodoroSession, TimerSettings};

/// Every state change in the timer produces an Event.
/// Presentation layers render them; the CLI prints them as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        phase: Phase,
        remaining_ms: i64,
        total_ms: i64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        phase: Phase,
        remaining_ms: i64,
        at: DateTime<Utc>,
    },
    /// Ticking resumed from a persisted running snapshot.
    TimerResumed {
        phase: Phase,
        remaining_ms: i64,
        at: DateTime<Utc>,
    },
    TimerReset {
        from: Phase,
        to: Phase,
        remaining_ms: i64,
        at: DateTime<Utc>,
    },
    PhaseCompleted {
        phase: Phase,
        next: Phase,
        at: DateTime<Utc>,
    },
    /// A new history record is available.
    SessionRecorded {
        session: PomodoroSession,
    },
    DistractionRecorded {
        count: u32,
        at: DateTime<Utc>,
    },
    SettingsApplied {
        settings: TimerSettings,
        /// False when the new durations wait for the next phase.
        immediate: bool,
        at: DateTime<Utc>,
    },
    Suspended {
        phase: Phase,
        remaining_ms: i64,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        phase: Phase,
        running: bool,
        remaining_ms: i64,
        total_ms: i64,
        distractions: u32,
        progress: f64,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::TimerStarted { .. } => "TimerStarted",
            Event::TimerPaused { .. } => "TimerPaused",
            Event::TimerResumed { .. } => "TimerResumed",
            Event::TimerReset { .. } => "TimerReset",
            Event::PhaseCompleted { .. } => "PhaseCompleted",
            Event::SessionRecorded { .. } => "SessionRecorded",
            Event::DistractionRecorded { .. } => "DistractionRecorded",
            Event::SettingsApplied { .. } => "SettingsApplied",
            Event::Suspended { .. } => "Suspended",
            Event::StateSnapshot { .. } => "StateSnapshot",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_tagged_by_type() {
        let event = Event::DistractionRecorded {
            count: 2,
            at: Utc::now(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "DistractionRecorded");
        assert_eq!(value["type"], event.name());
        assert_eq!(value["count"], 2);
    }
}
