use clap::Subcommand;
use focusroom_core::timer::{ManualScheduler, NoopLifecycle};
use focusroom_core::Event;

use crate::host::{emit, Host};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start the current phase, or pause it if it is running
    Start,
    /// Pause the running phase
    Pause,
    /// Abandon the current phase and switch to the other one
    Reset,
    /// Count an interruption
    Distract,
    /// Print current timer state as JSON
    Status,
}

/// Events that only restate where the timer already was.
fn is_bookkeeping(event: &Event) -> bool {
    matches!(
        event,
        Event::StateSnapshot { .. } | Event::TimerResumed { .. } | Event::Suspended { .. }
    )
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let host = Host::open()?;
    // Nothing ticks between invocations; the stored anchor carries the phase.
    let mut engine = host.engine(
        Box::new(ManualScheduler::new()),
        Box::new(NoopLifecycle::default()),
    );

    let mut events = engine.resume_from_host();
    events.retain(|e| !is_bookkeeping(e));

    events.extend(match action {
        TimerAction::Start => engine.start(),
        TimerAction::Pause => engine.pause(),
        TimerAction::Reset => engine.reset(),
        TimerAction::Distract => engine.record_distraction(),
        TimerAction::Status => vec![engine.snapshot()],
    });

    events.extend(engine.detach().into_iter().filter(|e| !is_bookkeeping(e)));
    emit(&events)?;
    Ok(())
}
