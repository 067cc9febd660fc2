//! Wiring shared by the commands: storage, configuration and engine setup.

use std::sync::Arc;

use focusroom_core::timer::{LifecycleSource, Scheduler};
use focusroom_core::{
    Config, Database, EngineOptions, Event, Persistence, SessionStore, SystemClock, TimerEngine,
};

/// Opened storage plus the configuration the engine runs with.
pub struct Host {
    pub config: Config,
    pub store: SessionStore,
}

impl Host {
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let config = Config::load_or_default();
        let db = Database::open()?;
        Ok(Self {
            config,
            store: SessionStore::new(Arc::new(db)),
        })
    }

    /// Build an engine over this host's storage. Nothing is restored yet;
    /// callers follow up with `resume_from_host`.
    pub fn engine(
        &self,
        scheduler: Box<dyn Scheduler>,
        lifecycle: Box<dyn LifecycleSource>,
    ) -> TimerEngine {
        let persistence = if self.config.storage.background_writes {
            Persistence::background(self.store.clone())
        } else {
            Persistence::inline(self.store.clone())
        };
        TimerEngine::new(Arc::new(SystemClock), scheduler, lifecycle, persistence)
            .with_options(EngineOptions::from(&self.config.engine))
    }
}

/// Print events as JSON lines.
pub fn emit(events: &[Event]) -> Result<(), serde_json::Error> {
    for event in events {
        println!("{}", serde_json::to_string(event)?);
    }
    Ok(())
}
