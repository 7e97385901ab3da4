//! Single transfer: stream a response body into the entry's temp file.

use futures::StreamExt;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::trace;

use crate::http::{AsyncHttpClient, TransferError};
use crate::queue::TransferJob;

/// Downloads `job.url` into `job.temp_path`, returning the byte count.
///
/// The temp file (and any missing parent directories) is created when the
/// first chunk arrives, so a request that fails before sending a body leaves
/// nothing behind. An empty successful body still produces an empty file.
/// The caller owns commit and cleanup.
pub(crate) async fn fetch_to_temp<C: AsyncHttpClient>(
    client: &C,
    job: &TransferJob,
) -> Result<u64, TransferError> {
    let mut body = client.get_stream(&job.url).await?;
    let mut file: Option<File> = None;
    let mut written = 0u64;

    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        if file.is_none() {
            file = Some(create_temp(&job.temp_path).await?);
        }
        if let Some(out) = file.as_mut() {
            out.write_all(&chunk)
                .await
                .map_err(|e| TransferError::io(&job.temp_path, e))?;
        }
        written += chunk.len() as u64;
    }

    let mut out = match file {
        Some(out) => out,
        None => create_temp(&job.temp_path).await?,
    };
    out.flush()
        .await
        .map_err(|e| TransferError::io(&job.temp_path, e))?;

    trace!(entry = %job.description, bytes = written, "Transfer body complete");
    Ok(written)
}

async fn create_temp(path: &Path) -> Result<File, TransferError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| TransferError::io(parent, e))?;
    }
    File::create(path)
        .await
        .map_err(|e| TransferError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{ByteStream, MockAsyncHttpClient};
    use crate::queue::{EntryId, EntryKind};
    use bytes::Bytes;
    use futures::stream;
    use tempfile::TempDir;

    fn job_into(dir: &TempDir, relative: &str) -> TransferJob {
        let target = dir.path().join(relative);
        TransferJob {
            id: EntryId(1),
            kind: EntryKind::Tile,
            url: "http://tiles.example/5/10/20.png".to_string(),
            temp_path: crate::queue::temp_path_for(&target),
            target_path: target,
            description: "Tile:5/10/20".to_string(),
        }
    }

    /// Yields one chunk, then a body error.
    struct TruncatingClient;

    impl AsyncHttpClient for TruncatingClient {
        async fn get_stream(&self, url: &str) -> Result<ByteStream, TransferError> {
            let items = vec![
                Ok(Bytes::from_static(b"partial")),
                Err(TransferError::Body {
                    url: url.to_string(),
                    message: "connection reset".to_string(),
                }),
            ];
            Ok(stream::iter(items).boxed())
        }
    }

    #[tokio::test]
    async fn test_chunks_land_in_temp_file() {
        let dir = TempDir::new().unwrap();
        let job = job_into(&dir, "5/10/20.png");
        let client = MockAsyncHttpClient {
            response: Ok(vec![Bytes::from_static(b"ti"), Bytes::from_static(b"le")]),
        };

        let written = fetch_to_temp(&client, &job).await.unwrap();

        assert_eq!(written, 4);
        assert_eq!(std::fs::read(&job.temp_path).unwrap(), b"tile");
        assert!(!job.target_path.exists());
    }

    #[tokio::test]
    async fn test_empty_body_creates_empty_file() {
        let dir = TempDir::new().unwrap();
        let job = job_into(&dir, "nested/dir/empty.bin");
        let client = MockAsyncHttpClient {
            response: Ok(vec![]),
        };

        assert_eq!(fetch_to_temp(&client, &job).await.unwrap(), 0);
        assert_eq!(std::fs::metadata(&job.temp_path).unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_status_error_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let job = job_into(&dir, "5/10/20.png");
        let client = MockAsyncHttpClient {
            response: Err(TransferError::Status {
                url: job.url.clone(),
                status: 404,
            }),
        };

        let err = fetch_to_temp(&client, &job).await.unwrap_err();

        assert!(matches!(err, TransferError::Status { status: 404, .. }));
        assert!(!job.temp_path.exists());
        assert!(!dir.path().join("5").exists());
    }

    #[tokio::test]
    async fn test_body_error_leaves_partial_temp() {
        let dir = TempDir::new().unwrap();
        let job = job_into(&dir, "5/10/20.png");

        let err = fetch_to_temp(&TruncatingClient, &job).await.unwrap_err();

        assert!(matches!(err, TransferError::Body { .. }));
        // Cleanup is the worker's job
        assert_eq!(std::fs::read(&job.temp_path).unwrap(), b"partial");
    }

    #[tokio::test]
    async fn test_unwritable_parent_is_io_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("blocker"), b"not a dir").unwrap();
        let job = job_into(&dir, "blocker/20.png");
        let client = MockAsyncHttpClient {
            response: Ok(vec![Bytes::from_static(b"x")]),
        };

        let err = fetch_to_temp(&client, &job).await.unwrap_err();
        assert!(matches!(err, TransferError::Io { .. }));
    }
}
