//! Download manager: queue front end plus the worker that drains it.
//!
//! Callers enqueue tiles and files from any thread. A single background
//! worker, started on demand, runs up to `max_concurrent_transfers`
//! transfers at once, commits each finished body with an atomic rename and
//! shuts itself down after an idle grace period. In foreground mode the
//! same loop runs on the caller's thread through [`DownloadManager::run_all_now`].
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use tilefetch::config::DownloadConfig;
//! use tilefetch::manager::DownloadManager;
//! use tilefetch::queue::TileCoord;
//!
//! let manager = DownloadManager::new(DownloadConfig::default())?;
//! manager.request_tile(
//!     "https://tile.example.org",
//!     TileCoord::new(20, 5, 10),
//!     "/var/cache/tiles",
//!     "png",
//! );
//! let remaining = manager.wait_until_idle(Duration::from_secs(30));
//! assert_eq!(remaining, 0);
//! # Ok::<(), tilefetch::manager::ManagerError>(())
//! ```

mod commit;
mod error;
mod event;
mod lifecycle;
mod shared;
mod transfer;
mod worker;

pub use error::{CommitError, ManagerError};
pub use event::DownloadEvent;
pub use lifecycle::WorkerState;

use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime};
use tokio::sync::broadcast;
use tracing::{debug, error, info, trace, warn};

use crate::config::{DownloadConfig, ExecutionMode};
use crate::http::{AsyncHttpClient, AsyncReqwestClient};
use crate::queue::{gate, EntryKind, EntrySnapshot, EntryStore, Expiry, QueueEntry, TileCoord};
use shared::Shared;
use worker::TransferWorker;

/// Name of the background worker thread.
pub const WORKER_THREAD_NAME: &str = "tilefetch-worker";

/// Handle to a download queue and its worker.
///
/// All methods take `&self` and may be called from any thread. Dropping the
/// manager aborts outstanding work and joins the worker thread.
pub struct DownloadManager<C: AsyncHttpClient = AsyncReqwestClient> {
    shared: Arc<Shared<C>>,
}

impl DownloadManager<AsyncReqwestClient> {
    /// Creates a manager backed by a reqwest client built from `config`.
    pub fn new(config: DownloadConfig) -> Result<Self, ManagerError> {
        let client = AsyncReqwestClient::new(&config)?;
        Ok(Self::with_client(config, client))
    }
}

impl<C: AsyncHttpClient> DownloadManager<C> {
    /// Creates a manager using `client` for every transfer.
    pub fn with_client(config: DownloadConfig, client: C) -> Self {
        if config.max_concurrent_transfers() == 0 {
            warn!("max_concurrent_transfers is 0; transfers will not be bounded");
        }
        debug!(
            mode = ?config.execution_mode(),
            max_transfers = config.max_concurrent_transfers(),
            "Download manager created"
        );
        Self {
            shared: Arc::new(Shared::new(config, client)),
        }
    }

    pub fn config(&self) -> &DownloadConfig {
        &self.shared.config
    }

    /// Queues map tile `tile` from `server_url` into `base_dir/z/x/y.ext`.
    ///
    /// Skipped if the same tile is already queued or a cached copy is within
    /// the freshness window. Empty inputs are ignored. If an abort is still
    /// tearing the worker down, this waits for it and then restarts the worker.
    pub fn request_tile(
        &self,
        server_url: &str,
        tile: TileCoord,
        base_dir: impl AsRef<Path>,
        ext: &str,
    ) {
        let Some(entry) = QueueEntry::tile(server_url, tile, base_dir.as_ref(), ext) else {
            debug!(server = server_url, tile = %tile, "Ignoring malformed tile request");
            return;
        };

        if self.already_queued(|store| store.contains_tile(tile)) {
            trace!(tile = %tile, "Tile already queued");
            return;
        }
        if gate::tile_is_fresh(
            &entry.target_path,
            self.shared.config.tile_freshness(),
            SystemTime::now(),
        ) {
            trace!(tile = %tile, "Cached tile is fresh");
            return;
        }

        self.enqueue(entry);
    }

    /// Queues `url` for download into `local_path`.
    ///
    /// Skipped if the target is already queued or an existing copy satisfies
    /// `expiry`. Empty inputs are ignored.
    pub fn request_file(&self, url: &str, local_path: impl AsRef<Path>, expiry: Expiry) {
        let local_path = local_path.as_ref();
        let Some(entry) = QueueEntry::file(url, local_path) else {
            debug!(url = url, path = %local_path.display(), "Ignoring malformed file request");
            return;
        };

        if self.already_queued(|store| store.contains_target(&entry.target_path)) {
            trace!(path = %local_path.display(), "File already queued");
            return;
        }
        if gate::file_is_fresh(&entry.target_path, expiry, SystemTime::now()) {
            trace!(path = %local_path.display(), expiry = ?expiry, "Local file still valid");
            return;
        }

        self.enqueue(entry);
    }

    /// Dedup check, made only after any abort in progress has emptied the store.
    fn already_queued<F: FnOnce(&EntryStore) -> bool>(&self, matches: F) -> bool {
        let shared = &self.shared;
        shared
            .lifecycle
            .when_not_quitting(|| matches(&*shared.store.lock()))
    }

    fn enqueue(&self, entry: QueueEntry) {
        let description = entry.description.clone();
        let shared = &self.shared;
        let inserted = shared
            .lifecycle
            .when_not_quitting(|| shared.store.lock().insert_unique(entry));
        let Some(id) = inserted else {
            trace!(entry = %description, "Lost enqueue race to an identical request");
            return;
        };
        debug!(id = %id, entry = %description, "Download queued");

        if self.shared.config.execution_mode() == ExecutionMode::Background {
            if let Err(e) = self.ensure_started() {
                // Entry stays queued; the next request retries the start
                error!(error = %e, "Failed to start download worker");
            }
        }
    }

    /// Spawns the background worker unless one already exists.
    ///
    /// Returns `Ok(true)` if a worker was spawned by this call.
    pub fn ensure_started(&self) -> Result<bool, ManagerError> {
        let shared = Arc::clone(&self.shared);
        let started = self
            .shared
            .lifecycle
            .start_with(move |cancel| {
                thread::Builder::new()
                    .name(WORKER_THREAD_NAME.to_string())
                    .spawn(move || worker::run_background(shared, cancel))
            })
            .map_err(ManagerError::WorkerSpawn)?;

        if started {
            debug!("Download worker spawned");
        }
        Ok(started)
    }

    /// Processes queued work now.
    ///
    /// In background mode this only makes sure the worker is running and
    /// returns at once. In foreground mode the worker loop runs on the
    /// calling thread until the queue is empty or an abort is observed;
    /// concurrency is still bounded by `max_concurrent_transfers`. A
    /// foreground call returns immediately if another thread is already
    /// draining the queue, and must not be made from inside an async runtime.
    pub fn run_all_now(&self) -> Result<(), ManagerError> {
        if self.shared.config.execution_mode() == ExecutionMode::Background {
            self.ensure_started()?;
            return Ok(());
        }

        let Some(cancel) = self.shared.lifecycle.begin_start() else {
            debug!(state = ?self.worker_state(), "Worker already active");
            return Ok(());
        };

        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                worker::abandon_start(&self.shared);
                return Err(ManagerError::Runtime(e));
            }
        };

        let worker = TransferWorker::new(Arc::clone(&self.shared), cancel, ExecutionMode::Foreground);
        let exit = runtime.block_on(worker.run());
        debug!(reason = ?exit, "Foreground download run finished");
        Ok(())
    }

    /// Blocks until the worker stops being busy or `timeout` elapses.
    ///
    /// Returns the number of entries still queued. In foreground mode any
    /// queued work is run first on this thread.
    pub fn wait_until_idle(&self, timeout: Duration) -> usize {
        if self.shared.config.execution_mode() == ExecutionMode::Foreground {
            if self.queue_length() > 0 {
                if let Err(e) = self.run_all_now() {
                    error!(error = %e, "Foreground download run failed");
                }
            }
            return self.queue_length();
        }

        let poll = self.shared.config.wait_poll_interval();
        let mut remaining = timeout;
        while !remaining.is_zero() && self.worker_state().is_busy() {
            let step = poll.min(remaining);
            thread::sleep(step);
            remaining = remaining.saturating_sub(step);
        }

        let queued = self.queue_length();
        if queued > 0 {
            debug!(queued = queued, state = ?self.worker_state(), "Stopped waiting with work queued");
        }
        queued
    }

    /// Entries queued, in flight or finishing.
    pub fn queue_length(&self) -> usize {
        self.shared.store.lock().len()
    }

    pub fn running_transfers(&self) -> usize {
        self.shared.store.lock().running_count()
    }

    /// True if anything was committed since the last call. Clears the flag.
    pub fn consume_progress_flag(&self) -> bool {
        self.shared.progress.swap(false, Ordering::AcqRel)
    }

    /// Subscribes to completion events from this point on.
    pub fn subscribe(&self) -> broadcast::Receiver<DownloadEvent> {
        self.shared.events.subscribe()
    }

    /// Drops every queued entry and cancels in-flight transfers.
    ///
    /// Cancellation is asynchronous: the worker tears down on its next pass.
    /// Nothing cancelled here is ever committed.
    pub fn abort(&self) {
        let shared = &self.shared;
        let signalled = shared.lifecycle.request_quit(|| {
            let dropped = shared.store.lock().clear();
            if dropped > 0 {
                info!(dropped = dropped, "Download queue cleared");
            }
        });
        if signalled {
            info!("Abort requested");
        }
    }

    /// Drops queued (not yet running) entries of `kind`. Returns the count.
    pub fn abort_kind(&self, kind: EntryKind) -> usize {
        let dropped = self.shared.store.lock().remove_idle_of_kind(kind);
        debug!(kind = ?kind, dropped = dropped, "Queued entries dropped");
        dropped
    }

    pub fn abort_tiles(&self) -> usize {
        self.abort_kind(EntryKind::Tile)
    }

    pub fn abort_files(&self) -> usize {
        self.abort_kind(EntryKind::File)
    }

    pub fn worker_state(&self) -> WorkerState {
        self.shared.lifecycle.state()
    }

    /// Head-to-tail view of the queue.
    pub fn snapshot(&self) -> Vec<EntrySnapshot> {
        self.shared.store.lock().snapshot()
    }

    /// Aborts outstanding work and waits for the worker thread to exit.
    pub fn shutdown(&self) {
        self.abort();
        if let Some(handle) = self.shared.lifecycle.take_worker() {
            lifecycle::join_worker(handle);
        }
    }
}

impl<C: AsyncHttpClient> Drop for DownloadManager<C> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{MockAsyncHttpClient, TransferError};
    use bytes::Bytes;
    use tempfile::TempDir;

    fn fast_config() -> DownloadConfig {
        DownloadConfig::default()
            .with_loop_interval(Duration::from_millis(1))
            .with_idle_shutdown(Duration::from_millis(5), 2)
            .with_wait_poll_interval(Duration::from_millis(5))
    }

    fn manager_with_body(config: DownloadConfig, body: &'static [u8]) -> DownloadManager<MockAsyncHttpClient> {
        DownloadManager::with_client(
            config,
            MockAsyncHttpClient {
                response: Ok(vec![Bytes::from_static(body)]),
            },
        )
    }

    #[test]
    fn test_new_manager_is_stopped_and_empty() {
        let manager = manager_with_body(fast_config(), b"x");
        assert_eq!(manager.worker_state(), WorkerState::Stopped);
        assert_eq!(manager.queue_length(), 0);
        assert!(!manager.consume_progress_flag());
    }

    #[test]
    fn test_malformed_requests_are_ignored() {
        let dir = TempDir::new().unwrap();
        let manager = manager_with_body(
            fast_config().with_execution_mode(ExecutionMode::Foreground),
            b"x",
        );

        manager.request_tile("", TileCoord::new(1, 1, 1), dir.path(), "png");
        manager.request_tile("http://t.example", TileCoord::new(1, 1, 1), dir.path(), "");
        manager.request_file("", dir.path().join("f"), Expiry::Always);
        manager.request_file("http://f.example/f", "", Expiry::Always);

        assert_eq!(manager.queue_length(), 0);
    }

    #[test]
    fn test_foreground_requests_wait_for_run_all_now() {
        let dir = TempDir::new().unwrap();
        let manager = manager_with_body(
            fast_config().with_execution_mode(ExecutionMode::Foreground),
            b"tile",
        );

        manager.request_tile("http://t.example", TileCoord::new(20, 5, 10), dir.path(), "png");
        assert_eq!(manager.queue_length(), 1);
        assert_eq!(manager.worker_state(), WorkerState::Stopped);

        manager.run_all_now().unwrap();

        assert_eq!(manager.queue_length(), 0);
        assert!(manager.consume_progress_flag());
        assert_eq!(std::fs::read(dir.path().join("10/20/5.png")).unwrap(), b"tile");
    }

    #[test]
    fn test_abort_while_stopped_clears_queue() {
        let dir = TempDir::new().unwrap();
        let manager = manager_with_body(
            fast_config().with_execution_mode(ExecutionMode::Foreground),
            b"tile",
        );
        manager.request_file("http://f.example/a", dir.path().join("a"), Expiry::Always);
        manager.request_file("http://f.example/b", dir.path().join("b"), Expiry::Always);

        manager.abort();

        assert_eq!(manager.queue_length(), 0);
        assert_eq!(manager.worker_state(), WorkerState::Stopped);
    }

    #[test]
    fn test_failed_transfer_emits_event_without_progress() {
        let dir = TempDir::new().unwrap();
        let manager = DownloadManager::with_client(
            fast_config().with_execution_mode(ExecutionMode::Foreground),
            MockAsyncHttpClient {
                response: Err(TransferError::Status {
                    url: "http://f.example/a".to_string(),
                    status: 503,
                }),
            },
        );
        let mut events = manager.subscribe();
        manager.request_file("http://f.example/a", dir.path().join("a"), Expiry::Always);

        manager.run_all_now().unwrap();

        let event = events.try_recv().unwrap();
        assert!(!event.is_committed());
        assert_eq!(event.kind(), EntryKind::File);
        assert!(!manager.consume_progress_flag());
        assert!(!dir.path().join("a").exists());
        assert!(!dir.path().join("a.part").exists());
    }

    #[test]
    fn test_background_worker_starts_on_request() {
        let dir = TempDir::new().unwrap();
        let manager = manager_with_body(fast_config(), b"bg");

        manager.request_tile("http://t.example", TileCoord::new(1, 2, 3), dir.path(), "png");

        assert_eq!(manager.wait_until_idle(Duration::from_secs(10)), 0);
        assert_eq!(std::fs::read(dir.path().join("3/1/2.png")).unwrap(), b"bg");
        manager.shutdown();
        assert_eq!(manager.worker_state(), WorkerState::Stopped);
    }
}
