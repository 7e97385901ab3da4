//! Transfer error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that end a single transfer.
///
/// Messages are captured as strings so the error can be cloned into
/// completion events and scripted by test clients.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    /// Failed to build the HTTP client
    #[error("Failed to create HTTP client: {0}")]
    ClientBuild(String),

    /// Connection, DNS, TLS or timeout failure before a response arrived
    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },

    /// Server answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// Response body was cut short
    #[error("Failed to read response from {url}: {message}")]
    Body { url: String, message: String },

    /// Local write to the temp file failed
    #[error("I/O error on {}: {message}", path.display())]
    Io { path: PathBuf, message: String },

    /// Transfer task ended without producing a result
    #[error("Transfer of {url} did not complete: {message}")]
    Interrupted { url: String, message: String },
}

impl TransferError {
    pub(crate) fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        TransferError::Io {
            path: path.into(),
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        let err = TransferError::Status {
            url: "https://tiles.example/5/10/20.png".to_string(),
            status: 404,
        };
        assert_eq!(
            err.to_string(),
            "HTTP 404 from https://tiles.example/5/10/20.png"
        );
    }

    #[test]
    fn test_io_display_contains_path() {
        let err = TransferError::io(
            "/tmp/cache/5/10/20.png.part",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let text = err.to_string();
        assert!(text.contains("/tmp/cache/5/10/20.png.part"));
        assert!(text.contains("denied"));
    }
}
