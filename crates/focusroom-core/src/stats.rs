//! Statistics over the session history.
//!
//! Records come straight from storage, so they are sanitized first:
//! negative or non-finite durations count as zero.

use serde::{Deserialize, Serialize};

use crate::timer::PomodoroSession;

/// Aggregate figures for a set of sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySummary {
    pub total_sessions: usize,
    pub completed_sessions: usize,
    /// Completed / total, 0.0-100.0
    pub completion_rate_pct: f64,
    /// Sum of actual focus time
    pub total_focus_sec: f64,
    pub avg_focus_min: f64,
    /// Mean distractions per session, rounded to the nearest whole number
    pub avg_distractions: u32,
}

impl HistorySummary {
    /// Summarize `sessions`. Returns `None` for an empty history.
    pub fn from_sessions(sessions: &[PomodoroSession]) -> Option<Self> {
        if sessions.is_empty() {
            return None;
        }

        let total = sessions.len();
        let completed = sessions.iter().filter(|s| s.completed).count();
        let total_focus_sec: f64 = sessions
            .iter()
            .map(|s| sanitize_secs(s.actual_duration_sec))
            .sum();
        let total_distractions: u64 = sessions.iter().map(|s| u64::from(s.distractions)).sum();

        Some(Self {
            total_sessions: total,
            completed_sessions: completed,
            completion_rate_pct: completed as f64 / total as f64 * 100.0,
            total_focus_sec,
            avg_focus_min: total_focus_sec / 60.0 / total as f64,
            avg_distractions: (total_distractions as f64 / total as f64).round() as u32,
        })
    }

    pub fn total_focus_hours(&self) -> f64 {
        self.total_focus_sec / 3600.0
    }
}

fn sanitize_secs(secs: f64) -> f64 {
    if secs.is_finite() {
        secs.max(0.0)
    } else {
        0.0
    }
}

/// Copy of `session` with impossible values clamped.
pub fn sanitize(session: &PomodoroSession) -> PomodoroSession {
    PomodoroSession {
        actual_duration_sec: sanitize_secs(session.actual_duration_sec),
        ..session.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order '{other}' (expected asc or desc)")),
        }
    }
}

/// Sessions ordered by their `date`. Ties keep creation order.
pub fn sorted_by_date(sessions: &[PomodoroSession], order: SortOrder) -> Vec<PomodoroSession> {
    let mut sorted: Vec<PomodoroSession> = sessions.iter().map(sanitize).collect();
    match order {
        SortOrder::Asc => sorted.sort_by(|a, b| a.date.cmp(&b.date)),
        SortOrder::Desc => sorted.sort_by(|a, b| b.date.cmp(&a.date)),
    }
    sorted
}

/// The last `n` sessions created, newest first.
pub fn recent(sessions: &[PomodoroSession], n: usize) -> Vec<PomodoroSession> {
    sessions.iter().rev().take(n).map(sanitize).collect()
}
