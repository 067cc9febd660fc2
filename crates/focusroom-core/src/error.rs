//! Core error types for focusroom-core.
//!
//! Storage failures never escape the timer engine: they are logged and
//! converted to safe defaults at the persistence boundary. The error types
//! still exist so adapters and the CLI can report what went wrong.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for focusroom-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Key-value storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by a [`PersistenceGateway`](crate::storage::PersistenceGateway)
/// or while decoding the records it returns.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The backing store could not be read.
    #[error("Failed to read '{key}': {message}")]
    Read { key: String, message: String },

    /// The backing store rejected a write or remove.
    #[error("Failed to write '{key}': {message}")]
    Write { key: String, message: String },

    /// A stored value exists but does not decode to the expected record.
    /// Callers treat this exactly like an absent value.
    #[error("Malformed record under '{key}': {message}")]
    InvalidShape { key: String, message: String },

    /// The storage location could not be opened.
    #[error("Failed to open storage at {path}: {message}")]
    OpenFailed { path: PathBuf, message: String },
}

impl StorageError {
    pub fn read(key: &str, err: impl std::fmt::Display) -> Self {
        StorageError::Read {
            key: key.to_string(),
            message: err.to_string(),
        }
    }

    pub fn write(key: &str, err: impl std::fmt::Display) -> Self {
        StorageError::Write {
            key: key.to_string(),
            message: err.to_string(),
        }
    }

    pub fn invalid_shape(key: &str, err: impl std::fmt::Display) -> Self {
        StorageError::InvalidShape {
            key: key.to_string(),
            message: err.to_string(),
        }
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
