//! Interactive mode.
//!
//! Ticks come from a tokio interval per running phase; suspend/resume typed
//! on stdin go through the lifecycle channel the engine subscribes to, the
//! same path a windowing host would use.

use std::str::FromStr;

use focusroom_core::timer::{ChannelLifecycle, TokioScheduler};
use focusroom_core::LifecycleEvent;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::host::{emit, Host};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Start,
    Pause,
    Reset,
    Distract,
    Status,
    Suspend,
    Resume,
    Quit,
}

impl FromStr for Input {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" => Ok(Input::Start),
            "pause" => Ok(Input::Pause),
            "reset" => Ok(Input::Reset),
            "distract" => Ok(Input::Distract),
            "status" => Ok(Input::Status),
            "suspend" => Ok(Input::Suspend),
            "resume" => Ok(Input::Resume),
            "quit" | "exit" => Ok(Input::Quit),
            other => Err(format!(
                "unknown command '{other}' (start, pause, reset, distract, status, suspend, resume, quit)"
            )),
        }
    }
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(interactive(runtime.handle().clone()))
}

async fn interactive(handle: tokio::runtime::Handle) -> Result<(), Box<dyn std::error::Error>> {
    let host = Host::open()?;
    let (scheduler, mut ticks) = TokioScheduler::new(handle);
    let (lifecycle, notifier) = ChannelLifecycle::new();
    let mut engine = host.engine(Box::new(scheduler), Box::new(lifecycle));
    emit(&engine.resume_from_host())?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            Some(tick) = ticks.recv() => {
                emit(&engine.tick(tick))?;
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    // stdin closed: keep the phase for the next run.
                    emit(&engine.detach())?;
                    return Ok(());
                };
                if line.trim().is_empty() {
                    continue;
                }
                let input = match line.parse::<Input>() {
                    Ok(input) => input,
                    Err(message) => {
                        eprintln!("{message}");
                        continue;
                    }
                };
                tracing::debug!(?input, "command");
                let events = match input {
                    Input::Start => engine.start(),
                    Input::Pause => engine.pause(),
                    Input::Reset => engine.reset(),
                    Input::Distract => engine.record_distraction(),
                    Input::Status => vec![engine.snapshot()],
                    Input::Suspend => {
                        notifier.notify(LifecycleEvent::Suspended);
                        engine.pump_lifecycle()
                    }
                    Input::Resume => {
                        notifier.notify(LifecycleEvent::Resumed);
                        engine.pump_lifecycle()
                    }
                    Input::Quit => {
                        emit(&engine.teardown())?;
                        return Ok(());
                    }
                };
                emit(&events)?;
            }
            _ = &mut ctrl_c => {
                tracing::info!("interrupted; suspending");
                emit(&engine.detach())?;
                return Ok(());
            }
        }
    }
}
