//! Transfer worker loop.
//!
//! One loop multiplexes up to `max_concurrent_transfers` transfers on a
//! `JoinSet`. Each pass it:
//!
//! 1. honours a pending abort
//! 2. drains finished transfers (commit or cleanup, then drop the entry)
//! 3. starts the head-most idle entry if there is spare capacity
//! 4. counts idle polls once nothing is queued or in flight
//! 5. sleeps for `loop_interval`
//!
//! In the background the loop exits after the idle grace period; in the
//! foreground it returns as soon as the queue drains.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{self, JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::commit;
use super::lifecycle::WorkerState;
use super::shared::Shared;
use super::transfer;
use crate::config::ExecutionMode;
use crate::http::{AsyncHttpClient, TransferError};
use crate::queue::{EntryState, TransferJob};

/// Why a worker run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WorkerExit {
    /// Idle grace period elapsed with nothing queued
    Idle,
    /// Foreground run emptied the queue
    Drained,
    /// Abort was requested
    Aborted,
}

pub(crate) struct TransferWorker<C> {
    shared: Arc<Shared<C>>,
    cancel: CancellationToken,
    mode: ExecutionMode,
    transfers: JoinSet<Result<u64, TransferError>>,
    in_flight: HashMap<task::Id, TransferJob>,
    idle_polls: u32,
}

impl<C: AsyncHttpClient> TransferWorker<C> {
    pub fn new(shared: Arc<Shared<C>>, cancel: CancellationToken, mode: ExecutionMode) -> Self {
        Self {
            shared,
            cancel,
            mode,
            transfers: JoinSet::new(),
            in_flight: HashMap::new(),
            idle_polls: 0,
        }
    }

    /// Runs until idle shutdown, queue drain (foreground) or abort.
    ///
    /// Must be polled inside a tokio runtime.
    pub async fn run(mut self) -> WorkerExit {
        if !self.shared.lifecycle.confirm_running() {
            return self.quit().await;
        }

        let mode = self.mode;
        info!(
            mode = ?mode,
            max_transfers = self.shared.config.max_concurrent_transfers(),
            "Download worker started"
        );

        let exit = loop {
            if self.shared.lifecycle.is_quitting() {
                break self.quit().await;
            }

            self.drain_completions().await;

            // At most one start per pass; the loop sleep paces new transfers
            if self.shared.config.has_transfer_capacity(self.transfers.len())
                && !self.start_next()
                && self.transfers.is_empty()
            {
                if let Some(exit) = self.on_empty_queue(mode).await {
                    break exit;
                }
                continue;
            }

            self.pause(self.shared.config.loop_interval()).await;
        };

        info!(reason = ?exit, "Download worker stopped");
        exit
    }

    /// Starts the head-most idle entry. Returns false if none was waiting.
    fn start_next(&mut self) -> bool {
        let next = self.shared.store.lock().take_next_idle();
        let Some(job) = next else {
            return false;
        };

        self.idle_polls = 0;
        self.shared.lifecycle.set_active(true);
        debug!(entry = %job.description, url = %job.url, "Starting transfer");

        let client = Arc::clone(&self.shared.client);
        let task_job = job.clone();
        let handle = self
            .transfers
            .spawn(async move { transfer::fetch_to_temp(client.as_ref(), &task_job).await });
        self.in_flight.insert(handle.id(), job);
        true
    }

    async fn drain_completions(&mut self) {
        while let Some(joined) = self.transfers.try_join_next_with_id() {
            match joined {
                Ok((id, result)) => {
                    if let Some(job) = self.in_flight.remove(&id) {
                        self.complete(job, result).await;
                    }
                }
                Err(join_error) => {
                    if let Some(job) = self.in_flight.remove(&join_error.id()) {
                        let err = interrupted(&job, &join_error);
                        self.complete(job, Err(err)).await;
                    }
                }
            }
        }
    }

    /// Commits or cleans up a finished transfer, then drops its entry.
    async fn complete(&self, job: TransferJob, result: Result<u64, TransferError>) {
        self.shared.store.lock().set_state(job.id, EntryState::Done);

        match result {
            Ok(bytes) => match commit::commit(&job.temp_path, &job.target_path).await {
                Ok(()) => {
                    debug!(
                        entry = %job.description,
                        bytes = bytes,
                        target = %job.target_path.display(),
                        "Download committed"
                    );
                    self.shared.notify_committed(&job);
                }
                Err(e) => {
                    // Temp file stays behind for inspection
                    error!(entry = %job.description, error = %e, "Download commit failed");
                    self.shared.notify_failed(&job, e.to_string());
                }
            },
            Err(e) => {
                warn!(entry = %job.description, url = %job.url, error = %e, "Download failed");
                commit::discard(&job.temp_path).await;
                self.shared.notify_failed(&job, e.to_string());
            }
        }

        let removed = self.shared.store.lock().remove(job.id);
        if let Err(reason) = removed {
            debug!(entry = %job.description, reason = ?reason, "Finished entry already gone");
        }
    }

    /// Handles a pass with nothing queued and nothing in flight.
    async fn on_empty_queue(&mut self, mode: ExecutionMode) -> Option<WorkerExit> {
        let shared = Arc::clone(&self.shared);

        if mode == ExecutionMode::Foreground {
            return shared
                .lifecycle
                .stop_if(|| shared.nothing_pending())
                .then_some(WorkerExit::Drained);
        }

        if self.idle_polls < shared.config.idle_polls_before_shutdown() {
            shared.lifecycle.set_active(false);
            self.idle_polls += 1;
            self.pause(shared.config.idle_poll_interval()).await;
            return None;
        }

        if shared.lifecycle.stop_if(|| shared.nothing_pending()) {
            return Some(WorkerExit::Idle);
        }
        // Work arrived during the last poll, or an abort is pending
        self.idle_polls = 0;
        None
    }

    /// Cancels everything in flight and drops the whole queue.
    ///
    /// Temp files of cancelled transfers are left in place; the next request
    /// for the same target overwrites them.
    async fn quit(&mut self) -> WorkerExit {
        self.transfers.abort_all();
        while self.transfers.join_next().await.is_some() {}
        let cancelled = self.in_flight.len();
        self.in_flight.clear();

        let shared = Arc::clone(&self.shared);
        shared.lifecycle.finish(|_| {
            let dropped = shared.store.lock().clear();
            info!(dropped = dropped, cancelled = cancelled, "Download queue aborted");
        });
        WorkerExit::Aborted
    }

    async fn pause(&self, duration: Duration) {
        tokio::select! {
            _ = tokio::time::sleep(duration) => {}
            _ = self.cancel.cancelled() => {}
        }
    }
}

fn interrupted(job: &TransferJob, join_error: &JoinError) -> TransferError {
    TransferError::Interrupted {
        url: job.url.clone(),
        message: join_error.to_string(),
    }
}

/// Entry point of the background worker thread.
pub(crate) fn run_background<C: AsyncHttpClient>(shared: Arc<Shared<C>>, cancel: CancellationToken) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Failed to build download worker runtime");
            abandon_start(&shared);
            return;
        }
    };

    runtime.block_on(TransferWorker::new(shared, cancel, ExecutionMode::Background).run());
}

/// Returns a worker that never got to run its loop to `Stopped`.
///
/// Queued entries stay for the next start, unless an abort arrived.
pub(crate) fn abandon_start<C: AsyncHttpClient>(shared: &Shared<C>) {
    shared.lifecycle.finish(|previous| {
        if previous == WorkerState::Quitting {
            shared.store.lock().clear();
        }
    });
}
