//! Manager error types.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::http::TransferError;

/// Errors surfaced by `DownloadManager` itself.
///
/// Per-entry failures never show up here; they are logged and reported as
/// `DownloadEvent::Failed`.
#[derive(Debug, Error)]
pub enum ManagerError {
    /// HTTP client could not be constructed
    #[error(transparent)]
    Client(#[from] TransferError),

    /// OS refused to create the worker thread
    #[error("Failed to spawn download worker: {0}")]
    WorkerSpawn(#[source] io::Error),

    /// Async runtime for the worker could not be built
    #[error("Failed to build download runtime: {0}")]
    Runtime(#[source] io::Error),
}

/// Rename of a finished temp file onto its target failed.
#[derive(Debug, Error)]
#[error("Failed to commit {} -> {}: {source}", temp.display(), target.display())]
pub struct CommitError {
    pub temp: PathBuf,
    pub target: PathBuf,
    #[source]
    pub source: io::Error,
}
