//! Worker lifecycle state machine.
//!
//! ```text
//! Stopped ──ensure_started──▶ Starting ──spawn ok──▶ Running ◀──▶ Idle
//!    ▲                            │                     │          │
//!    │◀──────spawn fails──────────┘                     ▼          ▼
//!    │◀──────────────worker exits────────────────── Quitting ◀─ abort
//!    └◀──────────────idle grace exceeded──────────────────────────┘
//! ```
//!
//! The state lives behind its own lock, separate from the entry store, since
//! every enqueue consults it. Lock order is lifecycle before store.
//!
//! Enqueues wait out a `Quitting` worker before inserting, so a request made
//! after `abort` returns is never swept up by that abort's teardown.

use parking_lot::{Condvar, Mutex};
use std::io;
use std::thread::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Observable state of the transfer worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// No worker exists
    Stopped,
    /// Worker requested but not yet running its loop
    Starting,
    /// Worker has transfers in flight or work to start
    Running,
    /// Worker is counting down its idle grace period
    Idle,
    /// Abort requested, worker is tearing down
    Quitting,
}

impl WorkerState {
    /// States `wait_until_idle` keeps waiting through.
    pub fn is_busy(self) -> bool {
        matches!(self, WorkerState::Starting | WorkerState::Running)
    }
}

struct Inner {
    state: WorkerState,
    /// Cancelled on abort to cut the worker's sleeps short
    cancel: CancellationToken,
    worker: Option<JoinHandle<()>>,
}

pub(crate) struct Lifecycle {
    inner: Mutex<Inner>,
    /// Signalled whenever a run finishes
    stopped: Condvar,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: WorkerState::Stopped,
                cancel: CancellationToken::new(),
                worker: None,
            }),
            stopped: Condvar::new(),
        }
    }

    pub fn state(&self) -> WorkerState {
        self.inner.lock().state
    }

    pub fn is_quitting(&self) -> bool {
        self.state() == WorkerState::Quitting
    }

    /// `Stopped → Starting` for a worker driven by the caller's thread.
    ///
    /// Returns the cancellation token for the new run, or `None` if a worker
    /// already exists.
    pub fn begin_start(&self) -> Option<CancellationToken> {
        let mut inner = self.inner.lock();
        if inner.state != WorkerState::Stopped {
            return None;
        }
        inner.state = WorkerState::Starting;
        inner.cancel = CancellationToken::new();
        Some(inner.cancel.clone())
    }

    /// `Stopped → Starting`, then spawns a worker thread under the lock.
    ///
    /// Returns `Ok(false)` if a worker already exists. A spawn failure
    /// reverts to `Stopped`. The thread of the previous run, which has
    /// already left its loop, is joined once the lock is released.
    pub fn start_with<F>(&self, spawn: F) -> io::Result<bool>
    where
        F: FnOnce(CancellationToken) -> io::Result<JoinHandle<()>>,
    {
        let previous = {
            let mut inner = self.inner.lock();
            if inner.state != WorkerState::Stopped {
                return Ok(false);
            }

            inner.state = WorkerState::Starting;
            inner.cancel = CancellationToken::new();
            match spawn(inner.cancel.clone()) {
                Ok(handle) => inner.worker.replace(handle),
                Err(e) => {
                    inner.state = WorkerState::Stopped;
                    return Err(e);
                }
            }
        };

        if let Some(handle) = previous {
            join_worker(handle);
        }
        Ok(true)
    }

    /// Runs `insert` under the lifecycle lock once no abort is in progress.
    ///
    /// Blocks while the state is `Quitting`. An abort issued after `insert`
    /// returns sees the inserted entry; one already in progress never does.
    pub fn when_not_quitting<T, F: FnOnce() -> T>(&self, insert: F) -> T {
        let mut inner = self.inner.lock();
        while inner.state == WorkerState::Quitting {
            self.stopped.wait(&mut inner);
        }
        insert()
    }

    /// `Starting → Running`. Returns false if an abort arrived first.
    pub fn confirm_running(&self) -> bool {
        let mut inner = self.inner.lock();
        match inner.state {
            WorkerState::Quitting => false,
            _ => {
                inner.state = WorkerState::Running;
                true
            }
        }
    }

    /// Toggles between `Running` and `Idle`; ignored in any other state.
    pub fn set_active(&self, active: bool) {
        let mut inner = self.inner.lock();
        if matches!(inner.state, WorkerState::Running | WorkerState::Idle) {
            inner.state = if active {
                WorkerState::Running
            } else {
                WorkerState::Idle
            };
        }
    }

    /// Moves to `Quitting` and wakes the worker.
    ///
    /// With no worker there is nobody to tear down, so `when_stopped` runs
    /// under the lock instead and the state stays `Stopped`. Returns true if
    /// a worker was told to quit.
    pub fn request_quit<F: FnOnce()>(&self, when_stopped: F) -> bool {
        let mut inner = self.inner.lock();
        if inner.state == WorkerState::Stopped {
            when_stopped();
            return false;
        }
        inner.state = WorkerState::Quitting;
        inner.cancel.cancel();
        true
    }

    /// Idle exit: goes to `Stopped` if not quitting and `no_work` holds.
    ///
    /// `no_work` runs under the lifecycle lock so an enqueue cannot slip in
    /// between the check and the transition without seeing `Stopped`.
    pub fn stop_if<F: FnOnce() -> bool>(&self, no_work: F) -> bool {
        let mut inner = self.inner.lock();
        if inner.state == WorkerState::Quitting || !no_work() {
            return false;
        }
        inner.state = WorkerState::Stopped;
        true
    }

    /// Final transition of a worker run. `cleanup` sees the state being left.
    ///
    /// Wakes every enqueue blocked in [`Lifecycle::when_not_quitting`].
    pub fn finish<F: FnOnce(WorkerState)>(&self, cleanup: F) {
        let mut inner = self.inner.lock();
        cleanup(inner.state);
        inner.state = WorkerState::Stopped;
        self.stopped.notify_all();
    }

    pub fn take_worker(&self) -> Option<JoinHandle<()>> {
        self.inner.lock().worker.take()
    }
}

/// Waits for a worker thread to exit, logging a panic instead of resuming it.
pub(crate) fn join_worker(handle: JoinHandle<()>) {
    if let Err(e) = handle.join() {
        warn!("Download worker thread panicked: {:?}", e);
    }
}
