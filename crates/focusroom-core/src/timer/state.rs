use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Focus,
    Break,
}

impl Phase {
    pub fn flipped(self) -> Self {
        match self {
            Phase::Focus => Phase::Break,
            Phase::Break => Phase::Focus,
        }
    }

    pub fn is_break(self) -> bool {
        self == Phase::Break
    }

    pub fn from_is_break(is_break: bool) -> Self {
        if is_break {
            Phase::Break
        } else {
            Phase::Focus
        }
    }
}

/// User-configured phase lengths, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSettings {
    pub focus_seconds: u64,
    pub break_seconds: u64,
}

pub const DEFAULT_FOCUS_SECONDS: u64 = 25 * 60;
pub const DEFAULT_BREAK_SECONDS: u64 = 5 * 60;

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            focus_seconds: DEFAULT_FOCUS_SECONDS,
            break_seconds: DEFAULT_BREAK_SECONDS,
        }
    }
}

impl TimerSettings {
    pub fn new(focus_seconds: u64, break_seconds: u64) -> Result<Self, ValidationError> {
        let settings = Self {
            focus_seconds,
            break_seconds,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Build settings from whole minutes, as entered in a settings form.
    pub fn from_minutes(focus_min: u64, break_min: u64) -> Result<Self, ValidationError> {
        Self::new(focus_min.saturating_mul(60), break_min.saturating_mul(60))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.focus_seconds == 0 {
            return Err(ValidationError::InvalidValue {
                field: "focusSeconds".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.break_seconds == 0 {
            return Err(ValidationError::InvalidValue {
                field: "breakSeconds".into(),
                message: "must be greater than 0".into(),
            });
        }
        Ok(())
    }

    pub fn durations(&self) -> PhaseDurations {
        PhaseDurations {
            focus_ms: secs_to_ms(self.focus_seconds),
            break_ms: secs_to_ms(self.break_seconds),
        }
    }
}

fn secs_to_ms(secs: u64) -> i64 {
    i64::try_from(secs.saturating_mul(1000)).unwrap_or(i64::MAX)
}

/// Phase lengths in milliseconds, as captured by the engine for the phase
/// in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseDurations {
    pub focus_ms: i64,
    pub break_ms: i64,
}

impl PhaseDurations {
    pub fn for_phase(&self, phase: Phase) -> i64 {
        match phase {
            Phase::Focus => self.focus_ms,
            Phase::Break => self.break_ms,
        }
    }
}

/// Read-only view of the engine's in-memory state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub phase: Phase,
    pub running: bool,
    pub remaining_ms: i64,
    pub distractions: u32,
    pub focus_ms: i64,
    pub break_ms: i64,
}

impl TimerState {
    pub fn total_ms(&self) -> i64 {
        match self.phase {
            Phase::Focus => self.focus_ms,
            Phase::Break => self.break_ms,
        }
    }

    /// Time spent in the current phase so far.
    pub fn elapsed_ms(&self) -> i64 {
        self.total_ms() - self.remaining_ms
    }
}

/// Persisted record of an in-progress phase.
///
/// When `running` is true, `remaining_ms` was measured at `start_anchor_ms`,
/// so `now - start_anchor_ms` is the time that has passed since.
/// This is the write time, not the engine's in-memory anchor (the instant
/// the phase would have started had it never paused).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveSessionSnapshot {
    pub running: bool,
    pub is_break: bool,
    pub remaining_ms: i64,
    pub start_anchor_ms: i64,
    pub distractions: u32,
    pub focus_ms: i64,
    pub break_ms: i64,
}

impl ActiveSessionSnapshot {
    pub fn phase(&self) -> Phase {
        Phase::from_is_break(self.is_break)
    }

    pub fn durations(&self) -> PhaseDurations {
        PhaseDurations {
            focus_ms: self.focus_ms,
            break_ms: self.break_ms,
        }
    }

    /// Structural checks applied when reading a snapshot back from storage.
    pub fn is_well_formed(&self) -> bool {
        self.remaining_ms >= 0 && self.focus_ms > 0 && self.break_ms > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_flips_both_ways() {
        assert_eq!(Phase::Focus.flipped(), Phase::Break);
        assert_eq!(Phase::Break.flipped(), Phase::Focus);
    }

    #[test]
    fn settings_reject_zero() {
        assert!(TimerSettings::new(0, 300).is_err());
        assert!(TimerSettings::new(1500, 0).is_err());
        assert!(TimerSettings::new(1, 1).is_ok());
    }

    #[test]
    fn settings_from_minutes() {
        let settings = TimerSettings::from_minutes(50, 10).unwrap();
        assert_eq!(settings.focus_seconds, 3000);
        assert_eq!(settings.durations().break_ms, 600_000);
    }

    #[test]
    fn settings_use_camel_case_on_the_wire() {
        let json = serde_json::to_string(&TimerSettings::default()).unwrap();
        assert_eq!(json, r#"{"focusSeconds":1500,"breakSeconds":300}"#);
    }

    #[test]
    fn snapshot_shape() {
        let snapshot = ActiveSessionSnapshot {
            running: true,
            is_break: false,
            remaining_ms: 1000,
            start_anchor_ms: 42,
            distractions: 2,
            focus_ms: 1500_000,
            break_ms: 300_000,
        };
        let value = serde_json::to_value(snapshot).unwrap();
        assert_eq!(value["startAnchorMs"], 42);
        assert_eq!(value["isBreak"], false);
        assert!(snapshot.is_well_formed());
        assert_eq!(snapshot.phase(), Phase::Focus);
    }
}
