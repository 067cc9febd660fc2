mod engine;
pub mod lifecycle;
pub mod recorder;
pub mod scheduler;
mod state;

pub use engine::{EngineOptions, TimerEngine};
pub use lifecycle::{
    ChannelLifecycle, LifecycleEvent, LifecycleNotifier, LifecycleSource, NoopLifecycle,
    Subscription,
};
pub use recorder::{PomodoroSession, SessionIdGenerator};
pub use scheduler::{ManualScheduler, Scheduler, TickHandle, TokioScheduler};
pub use state::{
    ActiveSessionSnapshot, Phase, PhaseDurations, TimerSettings, TimerState,
    DEFAULT_BREAK_SECONDS, DEFAULT_FOCUS_SECONDS,
};
