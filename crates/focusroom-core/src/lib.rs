//! # Focusroom Core Library
//!
//! Business logic for the Focusroom focus/break timer. The CLI binary is a
//! thin layer over this crate; any other front end would be too.
//!
//! ## Architecture
//!
//! - **Timer Engine**: A wall-clock-based state machine driven by scheduler
//!   ticks and host suspend/resume notifications
//! - **Session Recorder**: Turns finished or abandoned focus phases into
//!   immutable history records
//! - **Storage**: Key-value persistence of history, the in-flight snapshot,
//!   and settings (SQLite or in-memory), plus TOML configuration
//! - **Stats**: Aggregates over the session history
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`PersistenceGateway`]: Storage contract the engine writes through
//! - [`Database`]: SQLite-backed gateway
//! - [`Config`]: Application configuration management

pub mod clock;
pub mod error;
pub mod events;
pub mod stats;
pub mod storage;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, CoreError, StorageError, ValidationError};
pub use events::Event;
pub use stats::{HistorySummary, SortOrder};
pub use storage::{
    Config, Database, MemoryGateway, Persistence, PersistenceGateway, SessionStore,
};
pub use timer::{
    ActiveSessionSnapshot, EngineOptions, LifecycleEvent, Phase, PomodoroSession, TimerEngine,
    TimerSettings, TimerState,
};
