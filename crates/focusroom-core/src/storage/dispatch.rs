//! Write dispatch for the timer engine.
//!
//! The engine never waits on a write. With a [`BackgroundWriter`] the jobs
//! are queued to a worker thread and applied in submission order; without
//! one they run inline, which is what tests want. Failures are logged and
//! dropped; the next natural write trigger overwrites the whole record
//! anyway.

use std::sync::mpsc;
use std::thread::JoinHandle;

use super::SessionStore;
use crate::timer::{ActiveSessionSnapshot, PomodoroSession};

#[derive(Debug, Clone)]
pub enum WriteJob {
    SaveSnapshot(ActiveSessionSnapshot),
    ClearSnapshot,
    AppendSession(PomodoroSession),
}

impl WriteJob {
    fn apply(self, store: &SessionStore) {
        let result = match &self {
            WriteJob::SaveSnapshot(snapshot) => store.save_snapshot(snapshot),
            WriteJob::ClearSnapshot => store.clear_snapshot(),
            WriteJob::AppendSession(session) => store.append_session(session).map(|len| {
                tracing::debug!(id = %session.id, history_len = len, "session appended");
            }),
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, job = self.name(), "persistence write failed");
        }
    }

    fn name(&self) -> &'static str {
        match self {
            WriteJob::SaveSnapshot(_) => "save_snapshot",
            WriteJob::ClearSnapshot => "clear_snapshot",
            WriteJob::AppendSession(_) => "append_session",
        }
    }
}

enum Message {
    Job(WriteJob),
    Flush(mpsc::Sender<()>),
}

/// Worker thread that applies [`WriteJob`]s in order.
pub struct BackgroundWriter {
    sender: Option<mpsc::Sender<Message>>,
    worker: Option<JoinHandle<()>>,
}

impl BackgroundWriter {
    pub fn spawn(store: SessionStore) -> std::io::Result<Self> {
        let (sender, receiver) = mpsc::channel::<Message>();
        let worker = std::thread::Builder::new()
            .name("focusroom-writer".into())
            .spawn(move || {
                for message in receiver {
                    match message {
                        Message::Job(job) => job.apply(&store),
                        Message::Flush(done) => {
                            let _ = done.send(());
                        }
                    }
                }
            })?;
        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
        })
    }

    /// Queue a job. Returns the job back if the worker is gone.
    fn submit(&self, job: WriteJob) -> Result<(), WriteJob> {
        let Some(sender) = &self.sender else {
            return Err(job);
        };
        match sender.send(Message::Job(job)) {
            Ok(()) => Ok(()),
            Err(mpsc::SendError(Message::Job(job))) => Err(job),
            Err(mpsc::SendError(Message::Flush(_))) => Ok(()),
        }
    }

    /// Block until every job submitted so far has been applied.
    pub fn flush(&self) {
        let Some(sender) = &self.sender else {
            return;
        };
        let (done, wait) = mpsc::channel();
        if sender.send(Message::Flush(done)).is_ok() {
            let _ = wait.recv();
        }
    }
}

impl Drop for BackgroundWriter {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain the queue and exit.
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("persistence writer thread panicked");
            }
        }
    }
}

/// The engine's handle on storage: synchronous reads, dispatched writes.
pub struct Persistence {
    store: SessionStore,
    writer: Option<BackgroundWriter>,
}

impl Persistence {
    /// Writes run on the caller's thread.
    pub fn inline(store: SessionStore) -> Self {
        Self {
            store,
            writer: None,
        }
    }

    /// Writes are queued to a worker thread. Falls back to inline writes
    /// if the thread cannot be spawned.
    pub fn background(store: SessionStore) -> Self {
        let writer = match BackgroundWriter::spawn(store.clone()) {
            Ok(writer) => Some(writer),
            Err(e) => {
                tracing::warn!(error = %e, "could not start writer thread; writing inline");
                None
            }
        };
        Self { store, writer }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn submit(&self, job: WriteJob) {
        match &self.writer {
            Some(writer) => {
                if let Err(job) = writer.submit(job) {
                    job.apply(&self.store);
                }
            }
            None => job.apply(&self.store),
        }
    }

    /// Wait for queued writes so a following read sees them.
    pub fn flush(&self) {
        if let Some(writer) = &self.writer {
            writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryGateway, ACTIVE_SESSION_KEY};
    use std::sync::Arc;

    fn snapshot(remaining_ms: i64) -> ActiveSessionSnapshot {
        ActiveSessionSnapshot {
            running: false,
            is_break: false,
            remaining_ms,
            start_anchor_ms: 0,
            distractions: 0,
            focus_ms: 60_000,
            break_ms: 30_000,
        }
    }

    #[test]
    fn background_writes_apply_in_order() {
        let gateway = MemoryGateway::new();
        let persistence = Persistence::background(SessionStore::new(Arc::new(gateway.clone())));
        for remaining in [3, 2, 1] {
            persistence.submit(WriteJob::SaveSnapshot(snapshot(remaining)));
        }
        persistence.flush();
        let stored = persistence.store().load_snapshot().unwrap().unwrap();
        assert_eq!(stored.remaining_ms, 1);

        persistence.submit(WriteJob::ClearSnapshot);
        persistence.flush();
        assert!(gateway.raw(ACTIVE_SESSION_KEY).is_none());
    }

    #[test]
    fn failed_writes_are_swallowed() {
        let gateway = MemoryGateway::new();
        gateway.set_fail_writes(true);
        let persistence = Persistence::inline(SessionStore::new(Arc::new(gateway.clone())));
        persistence.submit(WriteJob::SaveSnapshot(snapshot(5)));
        assert!(gateway.raw(ACTIVE_SESSION_KEY).is_none());

        gateway.set_fail_writes(false);
        persistence.submit(WriteJob::SaveSnapshot(snapshot(4)));
        assert!(gateway.raw(ACTIVE_SESSION_KEY).is_some());
    }

    #[test]
    fn dropping_writer_drains_queue() {
        let gateway = MemoryGateway::new();
        {
            let persistence =
                Persistence::background(SessionStore::new(Arc::new(gateway.clone())));
            persistence.submit(WriteJob::SaveSnapshot(snapshot(9)));
        }
        assert!(gateway.raw(ACTIVE_SESSION_KEY).is_some());
    }
}
