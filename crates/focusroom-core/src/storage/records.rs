//! Typed access to the three records the timer core persists.
//!
//! Every accessor comes in two flavours: a fallible one returning
//! [`StorageError`], and an `_or_default` one that logs the failure and
//! falls back to the safe value (absent snapshot, default settings, empty
//! history). The engine only ever uses the latter for reads.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{PersistenceGateway, ACTIVE_SESSION_KEY, SESSIONS_KEY, SETTINGS_KEY};
use crate::error::StorageError;
use crate::timer::{ActiveSessionSnapshot, PomodoroSession, TimerSettings};

#[derive(Clone)]
pub struct SessionStore {
    gateway: Arc<dyn PersistenceGateway>,
}

impl SessionStore {
    pub fn new(gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &Arc<dyn PersistenceGateway> {
        &self.gateway
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.gateway.get(key)? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| StorageError::invalid_shape(key, e)),
            None => Ok(None),
        }
    }

    fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value).map_err(|e| StorageError::write(key, e))?;
        self.gateway.set(key, &raw)
    }

    // ── Settings ─────────────────────────────────────────────────────

    pub fn load_settings(&self) -> Result<Option<TimerSettings>, StorageError> {
        let settings: Option<TimerSettings> = self.read(SETTINGS_KEY)?;
        match settings {
            Some(s) => s
                .validate()
                .map(|_| Some(s))
                .map_err(|e| StorageError::invalid_shape(SETTINGS_KEY, e)),
            None => Ok(None),
        }
    }

    pub fn settings_or_default(&self) -> TimerSettings {
        match self.load_settings() {
            Ok(Some(settings)) => settings,
            Ok(None) => TimerSettings::default(),
            Err(e) => {
                tracing::warn!(error = %e, "falling back to default timer settings");
                TimerSettings::default()
            }
        }
    }

    pub fn save_settings(&self, settings: &TimerSettings) -> Result<(), StorageError> {
        settings
            .validate()
            .map_err(|e| StorageError::write(SETTINGS_KEY, e))?;
        self.write(SETTINGS_KEY, settings)
    }

    /// Write the default settings if none are stored yet.
    ///
    /// A malformed record is left in place; readers already treat it as
    /// absent.
    pub fn initialize_settings(&self) -> Result<TimerSettings, StorageError> {
        match self.gateway.get(SETTINGS_KEY)? {
            Some(_) => Ok(self.settings_or_default()),
            None => {
                let defaults = TimerSettings::default();
                self.write(SETTINGS_KEY, &defaults)?;
                Ok(defaults)
            }
        }
    }

    // ── Active snapshot ──────────────────────────────────────────────

    pub fn load_snapshot(&self) -> Result<Option<ActiveSessionSnapshot>, StorageError> {
        let snapshot: Option<ActiveSessionSnapshot> = self.read(ACTIVE_SESSION_KEY)?;
        match snapshot {
            Some(s) if !s.is_well_formed() => Err(StorageError::invalid_shape(
                ACTIVE_SESSION_KEY,
                "durations must be positive and remaining time non-negative",
            )),
            other => Ok(other),
        }
    }

    pub fn snapshot_or_none(&self) -> Option<ActiveSessionSnapshot> {
        self.load_snapshot().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "ignoring unreadable active session snapshot");
            None
        })
    }

    pub fn save_snapshot(&self, snapshot: &ActiveSessionSnapshot) -> Result<(), StorageError> {
        self.write(ACTIVE_SESSION_KEY, snapshot)
    }

    pub fn clear_snapshot(&self) -> Result<(), StorageError> {
        self.gateway.remove(ACTIVE_SESSION_KEY)
    }

    // ── History ──────────────────────────────────────────────────────

    pub fn load_history(&self) -> Result<Vec<PomodoroSession>, StorageError> {
        Ok(self.read(SESSIONS_KEY)?.unwrap_or_default())
    }

    pub fn history_or_empty(&self) -> Vec<PomodoroSession> {
        self.load_history().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "session history unreadable; treating as empty");
            Vec::new()
        })
    }

    /// Append one record to the history list.
    ///
    /// An unreadable history is not overwritten: the append fails instead,
    /// so a transient read error cannot wipe earlier records.
    pub fn append_session(&self, session: &PomodoroSession) -> Result<usize, StorageError> {
        let mut sessions = match self.load_history() {
            Ok(sessions) => sessions,
            Err(StorageError::InvalidShape { key, message }) => {
                tracing::warn!(%key, %message, "replacing malformed session history");
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        sessions.push(session.clone());
        self.write(SESSIONS_KEY, &sessions)?;
        Ok(sessions.len())
    }
}
