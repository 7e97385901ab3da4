//! Completion events broadcast to subscribers.
//!
//! Subscribers that only care whether anything changed can use
//! `DownloadManager::consume_progress_flag` instead.

use std::path::PathBuf;

use crate::queue::EntryKind;

/// Outcome of one finished entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadEvent {
    /// Bytes were committed to the target path
    Committed {
        kind: EntryKind,
        description: String,
        target: PathBuf,
    },
    /// Transfer or commit failed; the entry was dropped without retry
    Failed {
        kind: EntryKind,
        description: String,
        url: String,
        error: String,
    },
}

impl DownloadEvent {
    pub fn kind(&self) -> EntryKind {
        match self {
            DownloadEvent::Committed { kind, .. } | DownloadEvent::Failed { kind, .. } => *kind,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            DownloadEvent::Committed { description, .. }
            | DownloadEvent::Failed { description, .. } => description,
        }
    }

    pub fn is_committed(&self) -> bool {
        matches!(self, DownloadEvent::Committed { .. })
    }
}
