//! Tick sources.
//!
//! A [`Scheduler`] hands out a [`TickHandle`] per tick stream. The host
//! delivers each firing to [`TimerEngine::tick`](super::TimerEngine::tick)
//! together with the handle, and the engine drops ticks from any stream it
//! has already cancelled.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TickHandle(pub u64);

pub trait Scheduler: Send {
    /// Begin firing every `period` until cancelled.
    fn schedule(&mut self, period: Duration) -> TickHandle;

    fn cancel(&mut self, handle: TickHandle);
}

/// Scheduler backed by tokio interval tasks.
///
/// Each firing is sent as the stream's handle over an unbounded channel;
/// the receiving side is returned by [`TokioScheduler::new`].
pub struct TokioScheduler {
    runtime: tokio::runtime::Handle,
    sender: mpsc::UnboundedSender<TickHandle>,
    tasks: HashMap<TickHandle, JoinHandle<()>>,
    next_id: u64,
}

impl TokioScheduler {
    pub fn new(runtime: tokio::runtime::Handle) -> (Self, mpsc::UnboundedReceiver<TickHandle>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let scheduler = Self {
            runtime,
            sender,
            tasks: HashMap::new(),
            next_id: 1,
        };
        (scheduler, receiver)
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&mut self, period: Duration) -> TickHandle {
        let handle = TickHandle(self.next_id);
        self.next_id += 1;

        let sender = self.sender.clone();
        let task = self.runtime.spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                if sender.send(handle).is_err() {
                    break;
                }
            }
        });
        self.tasks.insert(handle, task);
        handle
    }

    fn cancel(&mut self, handle: TickHandle) {
        if let Some(task) = self.tasks.remove(&handle) {
            task.abort();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}

#[derive(Debug, Default)]
struct ManualInner {
    next_id: u64,
    active: Vec<(TickHandle, Duration)>,
    cancelled: Vec<TickHandle>,
}

/// Scheduler that never fires on its own. Tests inspect which streams are
/// live and deliver ticks by hand. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    inner: Arc<Mutex<ManualInner>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles of streams that are scheduled and not yet cancelled.
    pub fn active(&self) -> Vec<TickHandle> {
        self.inner
            .lock()
            .map(|inner| inner.active.iter().map(|(h, _)| *h).collect())
            .unwrap_or_default()
    }

    pub fn period_of(&self, handle: TickHandle) -> Option<Duration> {
        let inner = self.inner.lock().ok()?;
        inner
            .active
            .iter()
            .find(|(h, _)| *h == handle)
            .map(|(_, period)| *period)
    }

    pub fn cancelled(&self) -> Vec<TickHandle> {
        self.inner
            .lock()
            .map(|inner| inner.cancelled.clone())
            .unwrap_or_default()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, period: Duration) -> TickHandle {
        let Ok(mut inner) = self.inner.lock() else {
            return TickHandle(0);
        };
        inner.next_id += 1;
        let handle = TickHandle(inner.next_id);
        inner.active.push((handle, period));
        handle
    }

    fn cancel(&mut self, handle: TickHandle) {
        if let Ok(mut inner) = self.inner.lock() {
            let before = inner.active.len();
            inner.active.retain(|(h, _)| *h != handle);
            if inner.active.len() != before {
                inner.cancelled.push(handle);
            }
        }
    }
}
