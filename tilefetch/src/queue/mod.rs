//! Download queue: entries, the newest-first store and the freshness gate.

mod entry;
pub(crate) mod gate;
mod store;

pub use entry::{temp_path_for, EntryId, EntryKind, EntryState, Expiry, TileCoord, TEMP_SUFFIX};
pub use store::{EntrySnapshot, TransferJob};

pub(crate) use entry::QueueEntry;
pub(crate) use store::{EntryStore, RemoveRejected};
