//! Newest-first entry store.
//!
//! One lock (held by the owner, see `DownloadManager`) covers both the
//! ordering and each entry's `state`. With a single worker and infrequent
//! enqueues there is nothing to gain from per-entry locks.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use super::entry::{EntryId, EntryIdentity, EntryKind, EntryState, QueueEntry, TileCoord};

/// Everything the worker needs to run one transfer, copied out of the store
/// so no lock is held across network I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferJob {
    pub id: EntryId,
    pub kind: EntryKind,
    pub url: String,
    pub temp_path: PathBuf,
    pub target_path: PathBuf,
    pub description: String,
}

/// Point-in-time view of one entry, for status reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySnapshot {
    pub id: EntryId,
    pub kind: EntryKind,
    /// Set for tile entries
    pub tile: Option<TileCoord>,
    pub state: EntryState,
    pub description: String,
    pub target_path: PathBuf,
}

/// Why an entry could not be removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RemoveRejected {
    NotFound,
    Running,
}

/// Ordered collection of queue entries, head = most recently added.
#[derive(Debug, Default)]
pub(crate) struct EntryStore {
    entries: VecDeque<QueueEntry>,
    next_id: u64,
}

impl EntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_tile(&self, tile: TileCoord) -> bool {
        self.entries
            .iter()
            .any(|e| e.identity == EntryIdentity::Tile(tile))
    }

    pub fn contains_target(&self, path: &Path) -> bool {
        self.entries.iter().any(|e| e.target_path == path)
    }

    /// True if an entry with the same identity is already queued.
    fn is_duplicate(&self, entry: &QueueEntry) -> bool {
        match entry.identity {
            EntryIdentity::Tile(tile) => self.contains_tile(tile),
            EntryIdentity::File => self.contains_target(&entry.target_path),
        }
    }

    /// Inserts at the head unless an equivalent entry is already present.
    ///
    /// The duplicate check is repeated here because the caller's first scan
    /// and this insert happen under separate lock acquisitions.
    pub fn insert_unique(&mut self, mut entry: QueueEntry) -> Option<EntryId> {
        if self.is_duplicate(&entry) {
            return None;
        }

        self.next_id += 1;
        let id = EntryId(self.next_id);
        entry.id = id;
        entry.state = EntryState::Idle;
        self.entries.push_front(entry);
        Some(id)
    }

    pub fn has_idle(&self) -> bool {
        self.entries.iter().any(|e| e.state == EntryState::Idle)
    }

    pub fn running_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.state == EntryState::Running)
            .count()
    }

    /// Marks the head-most idle entry `Running` and returns its transfer job.
    pub fn take_next_idle(&mut self) -> Option<TransferJob> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.state == EntryState::Idle)?;
        entry.state = EntryState::Running;

        Some(TransferJob {
            id: entry.id,
            kind: entry.kind(),
            url: entry.source_url.clone(),
            temp_path: entry.temp_path.clone(),
            target_path: entry.target_path.clone(),
            description: entry.description.clone(),
        })
    }

    #[cfg(test)]
    pub fn state_of(&self, id: EntryId) -> Option<EntryState> {
        self.entries.iter().find(|e| e.id == id).map(|e| e.state)
    }

    pub fn set_state(&mut self, id: EntryId, state: EntryState) -> bool {
        match self.entries.iter_mut().find(|e| e.id == id) {
            Some(entry) => {
                entry.state = state;
                true
            }
            None => false,
        }
    }

    /// Removes an `Idle` or `Done` entry. `Running` entries are refused.
    pub fn remove(&mut self, id: EntryId) -> Result<QueueEntry, RemoveRejected> {
        let index = self
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or(RemoveRejected::NotFound)?;

        if !self.entries[index].state.is_removable() {
            return Err(RemoveRejected::Running);
        }

        self.entries
            .remove(index)
            .ok_or(RemoveRejected::NotFound)
    }

    /// Drops every `Idle` entry of `kind`, leaving in-flight ones alone.
    pub fn remove_idle_of_kind(&mut self, kind: EntryKind) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|e| !(e.state == EntryState::Idle && e.kind() == kind));
        before - self.entries.len()
    }

    /// Drops every entry regardless of state. Only the abort path uses this,
    /// after the transfers writing those entries have been cancelled.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    /// Head-to-tail view of the queue.
    pub fn snapshot(&self) -> Vec<EntrySnapshot> {
        self.entries
            .iter()
            .map(|e| EntrySnapshot {
                id: e.id,
                kind: e.kind(),
                tile: e.tile_coord(),
                state: e.state,
                description: e.description.clone(),
                target_path: e.target_path.clone(),
            })
            .collect()
    }
}
