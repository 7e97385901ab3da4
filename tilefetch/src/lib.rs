//! tilefetch - background tile and file downloads
//!
//! Queues map tiles (`{server}/{z}/{x}/{y}.{ext}`) and arbitrary files for
//! download, skips requests whose local copy is still fresh, and drains the
//! queue on a single worker running a bounded number of concurrent HTTP
//! transfers. Every finished body is written to a temp file and renamed into
//! place, so readers never observe a partial file.
//!
//! # High-Level API
//!
//! The [`manager`] module provides the entry point:
//!
//! ```ignore
//! use tilefetch::config::ConfigFile;
//! use tilefetch::manager::DownloadManager;
//! use tilefetch::queue::{Expiry, TileCoord};
//!
//! let config = ConfigFile::load()?.download_config();
//! let manager = DownloadManager::new(config)?;
//!
//! manager.request_tile("https://tile.example.org", TileCoord::new(20, 5, 10), "tiles", "png");
//! manager.request_file("https://example.org/index.json", "index.json", Expiry::from_secs(3600));
//!
//! if manager.consume_progress_flag() {
//!     // redraw
//! }
//! ```

pub mod config;
pub mod http;
pub mod logging;
pub mod manager;
pub mod queue;

pub use manager::{DownloadEvent, DownloadManager, ManagerError, WorkerState};
pub use queue::{EntryKind, Expiry, TileCoord};

/// Version of the tilefetch library and CLI.
///
/// This is synchronized across all components in the workspace.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
