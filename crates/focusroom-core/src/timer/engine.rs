//! Timer engine implementation.
//!
//! The engine is a wall-clock-based state machine. It owns no threads: a
//! [`Scheduler`] decides when ticks happen and the host forwards them to
//! [`TimerEngine::tick`]. Remaining time is always recomputed from an anchor
//! timestamp, never decremented per tick, so scheduler jitter and host
//! suspension cannot make it drift.
//!
//! ## State Transitions
//!
//! ```text
//! Idle(Focus) <-> Running(Focus) -> Idle(Break) <-> Running(Break) -> Idle(Focus) ...
//! ```
//!
//! `start()` toggles between Idle and Running. Completing a phase or calling
//! `reset()` flips to the other phase.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(clock, scheduler, lifecycle, persistence);
//! engine.resume_from_host(); // cold start: restore any in-flight phase
//! engine.start();
//! // Whenever the scheduler fires:
//! engine.tick(handle);
//! ```

use std::sync::Arc;
use std::time::Duration;

use super::lifecycle::{LifecycleEvent, LifecycleSource, Subscription};
use super::recorder::{self, PomodoroSession, SessionIdGenerator};
use super::scheduler::{Scheduler, TickHandle};
use super::state::{ActiveSessionSnapshot, Phase, PhaseDurations, TimerSettings, TimerState};
use crate::clock::Clock;
use crate::error::ValidationError;
use crate::events::Event;
use crate::storage::{EngineConfig, Persistence, WriteJob};

/// Tuning knobs, normally taken from [`EngineConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub tick_interval: Duration,
    /// Focus time that must pass before an abandoned phase is recorded.
    pub incomplete_threshold_ms: i64,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for EngineOptions {
    fn from(config: &EngineConfig) -> Self {
        Self {
            tick_interval: Duration::from_millis(config.tick_interval_ms.max(1)),
            incomplete_threshold_ms: config.incomplete_threshold_ms.max(0),
        }
    }
}

/// Core timer engine.
pub struct TimerEngine {
    clock: Arc<dyn Clock>,
    scheduler: Box<dyn Scheduler>,
    lifecycle: Box<dyn LifecycleSource>,
    subscription: Option<Subscription>,
    persistence: Persistence,
    options: EngineOptions,
    ids: SessionIdGenerator,

    phase: Phase,
    running: bool,
    /// Remaining time for the current phase. May briefly be <= 0 between a
    /// recomputation and the completion it triggers.
    remaining_ms: i64,
    distractions: u32,
    /// Durations the current phase runs against.
    durations: PhaseDurations,
    /// Settings applied while running; they take over at the next phase.
    pending_settings: Option<TimerSettings>,
    /// Clock reading at which the current phase would have started had it
    /// run without pauses. Only set while running.
    anchor_ms: Option<i64>,
    ticker: Option<TickHandle>,
    torn_down: bool,
}

impl TimerEngine {
    /// Create an engine in `Idle`, `Focus` with default durations and
    /// subscribe it to `lifecycle`.
    ///
    /// Nothing is read from storage here; call
    /// [`resume_from_host`](Self::resume_from_host) to restore settings and
    /// any in-flight phase.
    pub fn new(
        clock: Arc<dyn Clock>,
        scheduler: Box<dyn Scheduler>,
        mut lifecycle: Box<dyn LifecycleSource>,
        persistence: Persistence,
    ) -> Self {
        let durations = TimerSettings::default().durations();
        let subscription = Some(lifecycle.subscribe());
        Self {
            clock,
            scheduler,
            lifecycle,
            subscription,
            persistence,
            options: EngineOptions::default(),
            ids: SessionIdGenerator::new(),
            phase: Phase::Focus,
            running: false,
            remaining_ms: durations.focus_ms,
            distractions: 0,
            durations,
            pending_settings: None,
            anchor_ms: None,
            ticker: None,
            torn_down: false,
        }
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        TimerState {
            phase: self.phase,
            running: self.running,
            remaining_ms: self.remaining_ms,
            distractions: self.distractions,
            focus_ms: self.durations.focus_ms,
            break_ms: self.durations.break_ms,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn remaining_ms(&self) -> i64 {
        self.remaining_ms
    }

    pub fn distractions(&self) -> u32 {
        self.distractions
    }

    pub fn total_ms(&self) -> i64 {
        self.durations.for_phase(self.phase)
    }

    /// Live tick stream, if any.
    pub fn ticker(&self) -> Option<TickHandle> {
        self.ticker
    }

    pub fn pending_settings(&self) -> Option<TimerSettings> {
        self.pending_settings
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    /// 0.0 .. 1.0 progress within the current phase.
    pub fn progress(&self) -> f64 {
        let total = self.total_ms();
        if total <= 0 {
            return 0.0;
        }
        (1.0 - self.remaining_ms as f64 / total as f64).clamp(0.0, 1.0)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            phase: self.phase,
            running: self.running,
            remaining_ms: self.remaining_ms.max(0),
            total_ms: self.total_ms(),
            distractions: self.distractions,
            progress: self.progress(),
            at: self.clock.now(),
        }
    }

    /// Session history as currently persisted, oldest first.
    pub fn history(&self) -> Vec<PomodoroSession> {
        self.persistence.flush();
        self.persistence.store().history_or_empty()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start the current phase, or pause it if it is already running.
    pub fn start(&mut self) -> Vec<Event> {
        if self.running {
            return self.pause();
        }

        let now = self.clock.now_ms();
        let total = self.total_ms();
        self.anchor_ms = Some(now - (total - self.remaining_ms));
        self.running = true;
        self.start_ticking();
        self.persist_snapshot(now);

        tracing::debug!(phase = ?self.phase, remaining_ms = self.remaining_ms, "timer started");
        vec![Event::TimerStarted {
            phase: self.phase,
            remaining_ms: self.remaining_ms,
            total_ms: total,
            at: self.clock.now(),
        }]
    }

    /// Stop ticking and keep the remaining time. Does nothing when idle.
    pub fn pause(&mut self) -> Vec<Event> {
        if !self.running {
            return Vec::new();
        }

        let now = self.clock.now_ms();
        self.sync_remaining(now);
        if self.remaining_ms <= 0 {
            return self.complete_phase();
        }

        self.stop_ticking();
        self.running = false;
        self.anchor_ms = None;
        self.persist_snapshot(now);

        tracing::debug!(phase = ?self.phase, remaining_ms = self.remaining_ms, "timer paused");
        vec![Event::TimerPaused {
            phase: self.phase,
            remaining_ms: self.remaining_ms,
            at: self.clock.now(),
        }]
    }

    /// Abandon the current phase and switch to the other one.
    ///
    /// Leaving a focus phase that ran past the noise threshold records an
    /// incomplete session first.
    pub fn reset(&mut self) -> Vec<Event> {
        let now = self.clock.now_ms();
        self.sync_remaining(now);
        self.stop_ticking();

        let mut events = Vec::new();
        if self.phase == Phase::Focus && self.focus_elapsed_ms() > self.options.incomplete_threshold_ms {
            events.push(self.record_session(false));
        }

        let from = self.phase;
        self.running = false;
        self.anchor_ms = None;
        self.enter_phase(from.flipped());
        self.persistence.submit(WriteJob::ClearSnapshot);

        tracing::debug!(?from, to = ?self.phase, "timer reset");
        events.push(Event::TimerReset {
            from,
            to: self.phase,
            remaining_ms: self.remaining_ms,
            at: self.clock.now(),
        });
        events
    }

    /// Handle one scheduler firing. Ticks from cancelled streams, or while
    /// idle, are ignored.
    pub fn tick(&mut self, handle: TickHandle) -> Vec<Event> {
        if !self.running || self.ticker != Some(handle) {
            tracing::trace!(?handle, "ignoring stale tick");
            return Vec::new();
        }

        let now = self.clock.now_ms();
        self.sync_remaining(now);
        if self.remaining_ms <= 0 {
            return self.complete_phase();
        }
        Vec::new()
    }

    /// Count one interruption. Allowed in any state.
    pub fn record_distraction(&mut self) -> Vec<Event> {
        self.distractions = self.distractions.saturating_add(1);
        if self.running {
            let now = self.clock.now_ms();
            self.sync_remaining(now);
            self.persist_snapshot(now);
        }
        vec![Event::DistractionRecorded {
            count: self.distractions,
            at: self.clock.now(),
        }]
    }

    /// Change phase lengths.
    ///
    /// Idle: the current phase restarts with its new length right away.
    /// Running: the phase in progress keeps its length and the new settings
    /// take over at the next phase boundary.
    pub fn apply_settings(&mut self, settings: TimerSettings) -> Result<Vec<Event>, ValidationError> {
        settings.validate()?;

        let immediate = !self.running;
        if immediate {
            self.durations = settings.durations();
            self.pending_settings = None;
            self.remaining_ms = self.total_ms();
            let now = self.clock.now_ms();
            self.persist_snapshot(now);
        } else {
            self.pending_settings = Some(settings);
        }

        tracing::debug!(?settings, immediate, "settings applied");
        Ok(vec![Event::SettingsApplied {
            settings,
            immediate,
            at: self.clock.now(),
        }])
    }

    // ── Host lifecycle ───────────────────────────────────────────────

    /// Host is going to the background. A running phase is persisted and
    /// ticking stops; the in-memory anchor stays valid.
    pub fn suspend(&mut self) -> Vec<Event> {
        if !self.running {
            return Vec::new();
        }

        let now = self.clock.now_ms();
        self.sync_remaining(now);
        if self.remaining_ms <= 0 {
            return self.complete_phase();
        }
        self.persist_snapshot(now);
        self.stop_ticking();

        tracing::debug!(phase = ?self.phase, remaining_ms = self.remaining_ms, "suspended");
        vec![Event::Suspended {
            phase: self.phase,
            remaining_ms: self.remaining_ms,
            at: self.clock.now(),
        }]
    }

    /// Rebuild state from storage. Used on cold start and whenever the host
    /// returns to the foreground.
    ///
    /// A running snapshot resumes ticking with the time spent suspended
    /// subtracted; if the phase ran out meanwhile it completes immediately.
    pub fn resume_from_host(&mut self) -> Vec<Event> {
        if self.running && self.ticker.is_some() {
            tracing::debug!("resume while already ticking; ignoring");
            return Vec::new();
        }

        self.persistence.flush();
        let store = self.persistence.store();
        let settings = store.settings_or_default();
        let snapshot = store.snapshot_or_none();

        self.stop_ticking();
        self.anchor_ms = None;

        let Some(snapshot) = snapshot else {
            self.phase = Phase::Focus;
            self.running = false;
            self.distractions = 0;
            self.durations = settings.durations();
            self.pending_settings = None;
            self.remaining_ms = self.durations.focus_ms;
            return vec![self.snapshot()];
        };

        self.phase = snapshot.phase();
        self.distractions = snapshot.distractions;
        self.durations = snapshot.durations();
        self.pending_settings = (settings.durations() != self.durations).then_some(settings);

        let now = self.clock.now_ms();
        if !snapshot.running {
            self.running = false;
            self.remaining_ms = snapshot.remaining_ms;
            // Idle phases take changed settings right away.
            if let Some(settings) = self.pending_settings.take() {
                self.durations = settings.durations();
                self.remaining_ms = self.total_ms();
                self.persist_snapshot(now);
            }
            return vec![self.snapshot()];
        }

        // A clock that moved backwards counts as no time passed.
        let elapsed = (now - snapshot.start_anchor_ms).max(0);
        self.remaining_ms = snapshot.remaining_ms - elapsed;
        self.running = true;

        if self.remaining_ms <= 0 {
            tracing::info!(phase = ?self.phase, "phase expired while suspended");
            return self.complete_phase();
        }

        let total = self.total_ms();
        self.anchor_ms = Some(now - (total - self.remaining_ms));
        self.start_ticking();

        tracing::debug!(phase = ?self.phase, remaining_ms = self.remaining_ms, "resumed");
        vec![Event::TimerResumed {
            phase: self.phase,
            remaining_ms: self.remaining_ms,
            at: self.clock.now(),
        }]
    }

    pub fn on_lifecycle(&mut self, event: LifecycleEvent) -> Vec<Event> {
        if self.torn_down {
            return Vec::new();
        }
        match event {
            LifecycleEvent::Suspended => self.suspend(),
            LifecycleEvent::Resumed => self.resume_from_host(),
        }
    }

    /// Drain and handle every lifecycle notification queued for this engine.
    pub fn pump_lifecycle(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        while let Some(subscription) = self.subscription {
            let Some(event) = self.lifecycle.try_next(subscription) else {
                break;
            };
            events.extend(self.on_lifecycle(event));
        }
        events
    }

    /// Discard the engine. A running focus phase past the noise threshold is
    /// recorded as incomplete; the snapshot is left in place so a later
    /// `resume_from_host` can pick the phase up again.
    ///
    /// Called automatically on drop; calling it twice is harmless.
    pub fn teardown(&mut self) -> Vec<Event> {
        if self.torn_down {
            return Vec::new();
        }
        self.torn_down = true;

        let now = self.clock.now_ms();
        self.sync_remaining(now);
        self.stop_ticking();
        if let Some(subscription) = self.subscription.take() {
            self.lifecycle.unsubscribe(subscription);
        }

        let mut events = Vec::new();
        if self.running
            && self.phase == Phase::Focus
            && self.focus_elapsed_ms() > self.options.incomplete_threshold_ms
        {
            events.push(self.record_session(false));
        }
        events
    }

    /// Suspend and discard the engine without recording anything.
    ///
    /// For hosts that exit between commands: the current phase stays in the
    /// snapshot, running or idle, and the next `resume_from_host` carries on
    /// from it.
    pub fn detach(mut self) -> Vec<Event> {
        let events = self.suspend();
        if !self.running {
            let now = self.clock.now_ms();
            self.persist_snapshot(now);
        }
        self.torn_down = true;
        self.stop_ticking();
        if let Some(subscription) = self.subscription.take() {
            self.lifecycle.unsubscribe(subscription);
        }
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete_phase(&mut self) -> Vec<Event> {
        self.stop_ticking();
        self.running = false;
        self.anchor_ms = None;

        let completed = self.phase;
        let mut events = Vec::new();
        if completed == Phase::Focus {
            self.remaining_ms = 0;
            events.push(self.record_session(true));
        }
        self.persistence.submit(WriteJob::ClearSnapshot);
        self.enter_phase(completed.flipped());

        tracing::info!(?completed, next = ?self.phase, "phase completed");
        events.push(Event::PhaseCompleted {
            phase: completed,
            next: self.phase,
            at: self.clock.now(),
        });
        events
    }

    /// Switch to `phase` with a fresh duration and no distractions.
    fn enter_phase(&mut self, phase: Phase) {
        if let Some(settings) = self.pending_settings.take() {
            self.durations = settings.durations();
        }
        self.phase = phase;
        self.remaining_ms = self.total_ms();
        self.distractions = 0;
    }

    fn focus_elapsed_ms(&self) -> i64 {
        self.durations.focus_ms - self.remaining_ms
    }

    fn record_session(&mut self, completed: bool) -> Event {
        let now = self.clock.now_ms();
        let id = self.ids.next_id(now);
        let session = recorder::record(&self.state(), completed, self.clock.now(), id);
        tracing::info!(
            id = %session.id,
            completed,
            actual_sec = session.actual_duration_sec,
            distractions = session.distractions,
            "session recorded"
        );
        self.persistence
            .submit(WriteJob::AppendSession(session.clone()));
        Event::SessionRecorded { session }
    }

    fn sync_remaining(&mut self, now: i64) {
        if let (true, Some(anchor)) = (self.running, self.anchor_ms) {
            self.remaining_ms = self.total_ms() - (now - anchor);
        }
    }

    fn persist_snapshot(&self, now: i64) {
        let snapshot = ActiveSessionSnapshot {
            running: self.running,
            is_break: self.phase.is_break(),
            remaining_ms: self.remaining_ms.max(0),
            start_anchor_ms: now,
            distractions: self.distractions,
            focus_ms: self.durations.focus_ms,
            break_ms: self.durations.break_ms,
        };
        self.persistence.submit(WriteJob::SaveSnapshot(snapshot));
    }

    /// Replace any live tick stream with a fresh one.
    fn start_ticking(&mut self) {
        self.stop_ticking();
        self.ticker = Some(self.scheduler.schedule(self.options.tick_interval));
    }

    fn stop_ticking(&mut self) {
        if let Some(handle) = self.ticker.take() {
            self.scheduler.cancel(handle);
        }
    }
}

impl Drop for TimerEngine {
    fn drop(&mut self) {
        for event in self.teardown() {
            tracing::debug!(event = event.name(), "emitted during teardown");
        }
    }
}
