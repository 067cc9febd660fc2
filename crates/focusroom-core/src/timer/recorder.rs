//! Session records produced when a focus phase ends.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::TimerState;

/// Immutable history entry for one finished or abandoned focus phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PomodoroSession {
    pub id: String,
    pub date: DateTime<Utc>,
    /// Planned focus length.
    pub focus_duration_sec: u64,
    /// Focus time actually spent when the session ended.
    pub actual_duration_sec: f64,
    pub break_duration_sec: u64,
    pub distractions: u32,
    pub completed: bool,
}

/// Hands out session ids derived from epoch milliseconds.
///
/// Ids are strictly increasing for the lifetime of the generator even if
/// the clock stalls or steps backwards.
#[derive(Debug, Default)]
pub struct SessionIdGenerator {
    last: Option<i64>,
}

impl SessionIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self, now_ms: i64) -> String {
        let id = match self.last {
            Some(last) if now_ms <= last => last + 1,
            _ => now_ms,
        };
        self.last = Some(id);
        id.to_string()
    }
}

/// Turn the engine state at the moment a focus phase ends into a record.
pub fn record(
    state: &TimerState,
    completed: bool,
    at: DateTime<Utc>,
    id: String,
) -> PomodoroSession {
    let actual_ms = (state.focus_ms - state.remaining_ms).max(0);
    PomodoroSession {
        id,
        date: at,
        focus_duration_sec: ms_to_whole_secs(state.focus_ms),
        actual_duration_sec: actual_ms as f64 / 1000.0,
        break_duration_sec: ms_to_whole_secs(state.break_ms),
        distractions: state.distractions,
        completed,
    }
}

fn ms_to_whole_secs(ms: i64) -> u64 {
    u64::try_from(ms.max(0) / 1000).unwrap_or(0)
}
