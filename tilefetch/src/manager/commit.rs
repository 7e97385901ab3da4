//! Promotion of finished temp files and cleanup of failed ones.
//!
//! The target path only ever appears through a single rename within one
//! directory, so readers see either the previous file or the complete new
//! one.

use std::io;
use std::path::Path;
use tracing::debug;

use super::error::CommitError;

/// Atomically replaces `target` with `temp`.
pub(crate) async fn commit(temp: &Path, target: &Path) -> Result<(), CommitError> {
    tokio::fs::rename(temp, target)
        .await
        .map_err(|source| CommitError {
            temp: temp.to_path_buf(),
            target: target.to_path_buf(),
            source,
        })
}

/// Deletes a temp file left by a failed transfer. A missing file is fine.
pub(crate) async fn discard(temp: &Path) {
    match tokio::fs::remove_file(temp).await {
        Ok(()) => debug!(path = %temp.display(), "Removed partial download"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => debug!(path = %temp.display(), error = %e, "Failed to remove partial download"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_commit_replaces_target() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("tile.png");
        let temp = dir.path().join("tile.png.part");
        std::fs::write(&target, b"old").unwrap();
        std::fs::write(&temp, b"new").unwrap();

        commit(&temp, &target).await.unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), b"new");
        assert!(!temp.exists());
    }

    #[tokio::test]
    async fn test_commit_failure_keeps_temp() {
        let dir = TempDir::new().unwrap();
        let temp = dir.path().join("tile.png.part");
        std::fs::write(&temp, b"new").unwrap();
        let target = dir.path().join("missing-dir").join("tile.png");

        let err = commit(&temp, &target).await.unwrap_err();

        assert_eq!(err.target, target);
        assert!(temp.exists());
    }

    #[tokio::test]
    async fn test_discard_missing_file_is_silent() {
        let dir = TempDir::new().unwrap();
        discard(&dir.path().join("never-written.part")).await;
    }

    #[tokio::test]
    async fn test_discard_removes_temp() {
        let dir = TempDir::new().unwrap();
        let temp = dir.path().join("f.part");
        std::fs::write(&temp, b"partial").unwrap();
        discard(&temp).await;
        assert!(!temp.exists());
    }
}
