mod config;
pub mod database;
mod dispatch;
mod memory;
pub mod records;

pub use config::{Config, EngineConfig, StorageConfig};
pub use database::Database;
pub use dispatch::{BackgroundWriter, Persistence, WriteJob};
pub use memory::MemoryGateway;
pub use records::SessionStore;

use std::path::PathBuf;

use crate::error::StorageError;

/// Key holding the ordered session history.
pub const SESSIONS_KEY: &str = "focusroom.sessions";
/// Key holding the snapshot of the phase in progress.
pub const ACTIVE_SESSION_KEY: &str = "focusroom.active_session";
/// Key holding the user's timer settings.
pub const SETTINGS_KEY: &str = "focusroom.settings";

/// Raw key-value contract the timer core persists through.
///
/// Values are whole JSON documents; every `set` overwrites the full record.
pub trait PersistenceGateway: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Returns the data directory.
///
/// `FOCUSROOM_DATA_DIR` wins when set. Otherwise `~/.config/focusroom[-dev]/`,
/// with FOCUSROOM_ENV=dev selecting the development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let dir = match std::env::var_os("FOCUSROOM_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("FOCUSROOM_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("focusroom-dev")
            } else {
                base_dir.join("focusroom")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
