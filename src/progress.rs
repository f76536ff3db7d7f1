//! Observable, cancellable progress for an extraction run
//!
//! A [`ProgressMonitor`] is created by the caller, handed to an extraction
//! operation and read back while (or after) it runs. Clones share the same
//! state, so a background extraction and the foreground caller can each hold
//! one.
//!
//! All fields except the cancellation flag live behind one mutex: a
//! [`ProgressSnapshot`] is always internally consistent. The flag is an
//! atomic because the caller writes it while the worker polls it.
//!
//! # Lifecycle
//!
//! `Ready → Busy → {Success | Error | Cancelled} → Ready`. [`begin`] clears the
//! previous outcome; exactly one `end_*` call records the new one. Asynchronous
//! runs report failure only through this channel.
//!
//! [`begin`]: ProgressMonitor::begin

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum State {
    #[default]
    Ready,
    Busy,
}

/// What the current run is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ExtractAll,
    ExtractEntry,
}

/// Terminal result of a run.
#[derive(Debug, Clone)]
pub enum Outcome {
    Success,
    Error(Error),
    Cancelled,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub fn error(&self) -> Option<&Error> {
        match self {
            Self::Error(e) => Some(e),
            _ => None,
        }
    }
}

/// Point-in-time copy of the progress fields.
#[derive(Debug, Clone, Default)]
pub struct ProgressSnapshot {
    pub state: State,
    pub operation: Option<Operation>,
    pub total_work: u64,
    pub work_completed: u64,
    pub percent_done: u8,
    pub file_name: Option<String>,
    pub outcome: Option<Outcome>,
    pub cancel_requested: bool,
}

#[derive(Debug, Default)]
struct Inner {
    fields: Mutex<ProgressSnapshot>,
    finished: Condvar,
    cancel: AtomicBool,
}

#[derive(Debug, Clone, Default)]
pub struct ProgressMonitor {
    inner: Arc<Inner>,
}

impl ProgressMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    fn fields(&self) -> MutexGuard<'_, ProgressSnapshot> {
        // A panicking writer leaves plain data behind, still readable
        self.inner
            .fields
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a run: busy, zeroed counters, no outcome.
    pub fn begin(&self, operation: Operation, total_work: u64, file_name: Option<&str>) {
        let mut f = self.fields();
        f.state = State::Busy;
        f.operation = Some(operation);
        f.total_work = total_work;
        f.work_completed = 0;
        f.percent_done = 0;
        f.file_name = file_name.map(str::to_string);
        f.outcome = None;
    }

    pub fn set_file_name(&self, name: &str) {
        self.fields().file_name = Some(name.to_string());
    }

    /// Add `work` units to the completed count and refresh the percentage.
    pub fn update_work_completed(&self, work: u64) {
        let mut f = self.fields();
        f.work_completed = f.work_completed.saturating_add(work);
        f.percent_done = percent(f.work_completed, f.total_work);
    }

    /// Ask the running extraction to stop at the next entry boundary.
    ///
    /// The request is consumed when the run ends, whatever its outcome, so
    /// the next run on this monitor starts uncancelled. A request made while
    /// the monitor is idle applies to the next run.
    pub fn cancel_all_tasks(&self) {
        self.inner.cancel.store(true, Ordering::Release);
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.inner.cancel.load(Ordering::Acquire)
    }

    pub fn end_success(&self) {
        self.finish(Outcome::Success);
    }

    pub fn end_error(&self, error: Error) {
        self.finish(Outcome::Error(error));
    }

    pub fn end_cancelled(&self) {
        self.finish(Outcome::Cancelled);
    }

    fn finish(&self, outcome: Outcome) {
        {
            let mut f = self.fields();
            if outcome.is_success() {
                f.work_completed = f.total_work.max(f.work_completed);
                f.percent_done = 100;
            }
            f.state = State::Ready;
            f.operation = None;
            f.file_name = None;
            f.outcome = Some(outcome);
        }
        self.inner.cancel.store(false, Ordering::Release);
        self.inner.finished.notify_all();
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let mut snapshot = self.fields().clone();
        snapshot.cancel_requested = self.is_cancel_requested();
        snapshot
    }

    pub fn state(&self) -> State {
        self.fields().state
    }

    pub fn is_busy(&self) -> bool {
        self.state() == State::Busy
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.fields().outcome.clone()
    }

    /// Block until the current run records its outcome, or `timeout` passes.
    ///
    /// Returns `None` on timeout. Callers of asynchronous extraction can use
    /// this instead of polling [`snapshot`](Self::snapshot).
    pub fn wait(&self, timeout: Duration) -> Option<Outcome> {
        let guard = self.fields();
        let (guard, _) = self
            .inner
            .finished
            .wait_timeout_while(guard, timeout, |f| {
                f.state == State::Busy || f.outcome.is_none()
            })
            .unwrap_or_else(PoisonError::into_inner);
        guard.outcome.clone()
    }
}

fn percent(done: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = u128::from(done) * 100 / u128::from(total);
    pct.min(100) as u8
}
