//! State shared between the manager handle and its worker.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

use super::event::DownloadEvent;
use super::lifecycle::Lifecycle;
use crate::config::DownloadConfig;
use crate::http::AsyncHttpClient;
use crate::queue::{EntryStore, TransferJob};

pub(crate) struct Shared<C> {
    pub config: DownloadConfig,
    pub client: Arc<C>,
    pub store: Mutex<EntryStore>,
    pub lifecycle: Lifecycle,
    /// Set on every commit, cleared by `consume_progress_flag`
    pub progress: AtomicBool,
    pub events: broadcast::Sender<DownloadEvent>,
}

impl<C: AsyncHttpClient> Shared<C> {
    pub fn new(config: DownloadConfig, client: C) -> Self {
        let (events, _) = broadcast::channel(config.event_channel_capacity());
        Self {
            config,
            client: Arc::new(client),
            store: Mutex::new(EntryStore::new()),
            lifecycle: Lifecycle::new(),
            progress: AtomicBool::new(false),
            events,
        }
    }

    pub fn notify_committed(&self, job: &TransferJob) {
        self.progress.store(true, Ordering::Release);
        // No subscribers is fine
        let _ = self.events.send(DownloadEvent::Committed {
            kind: job.kind,
            description: job.description.clone(),
            target: job.target_path.clone(),
        });
    }

    pub fn notify_failed(&self, job: &TransferJob, error: String) {
        let _ = self.events.send(DownloadEvent::Failed {
            kind: job.kind,
            description: job.description.clone(),
            url: job.url.clone(),
            error,
        });
    }

    /// No entry is waiting to be started.
    pub fn nothing_pending(&self) -> bool {
        !self.store.lock().has_idle()
    }
}
