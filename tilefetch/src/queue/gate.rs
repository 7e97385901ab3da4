//! Freshness checks run at enqueue time.
//!
//! A request is skipped when a local copy exists and is young enough. Each
//! check costs at most one `stat`.

use std::path::Path;
use std::time::{Duration, SystemTime};

use super::entry::Expiry;

/// Age of the file at `path`, or `None` if it does not exist or has no mtime.
///
/// A modification time in the future counts as age zero.
fn local_age(path: &Path, now: SystemTime) -> Option<Duration> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    Some(now.duration_since(modified).unwrap_or(Duration::ZERO))
}

/// True if a cached tile is within the freshness window (inclusive).
pub(crate) fn tile_is_fresh(path: &Path, freshness: Duration, now: SystemTime) -> bool {
    local_age(path, now).is_some_and(|age| age <= freshness)
}

/// True if a cached file satisfies `expiry`.
pub(crate) fn file_is_fresh(path: &Path, expiry: Expiry, now: SystemTime) -> bool {
    match expiry {
        Expiry::Always => false,
        Expiry::Never => path.exists(),
        Expiry::After(max_age) => local_age(path, now).is_some_and(|age| age < max_age),
    }
}
