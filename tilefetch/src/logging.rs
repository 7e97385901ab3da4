//! Logging infrastructure for tilefetch.
//!
//! Provides structured logging with file output and optional console output:
//! - Writes to the configured log file (cleared on session start)
//! - Optionally prints to stdout for CLI tailing
//! - Configurable via RUST_LOG environment variable
//!
//! The library itself only emits `tracing` events; installing a subscriber
//! is left to the binary.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Guard that must be kept alive for the duration of logging.
///
/// Dropping this guard will flush and close the log file writer.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Initialize logging system.
///
/// Creates the log directory if needed, clears the previous log file and
/// installs the global subscriber.
///
/// # Arguments
///
/// * `log_path` - Log file path (e.g., "~/.tilefetch/logs/tilefetch.log", tilde already expanded)
/// * `stdout` - Also write human-readable output to stdout
///
/// # Errors
///
/// Returns error if the log directory cannot be created or the file cannot be cleared
pub fn init_logging(log_path: &Path, stdout: bool) -> Result<LoggingGuard, io::Error> {
    let (log_dir, log_file) = prepare_log_file(log_path)?;

    let file_appender = tracing_appender::rolling::never(log_dir, log_file);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_thread_names(true);

    let stdout_layer = stdout.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(io::stdout)
            .with_ansi(true)
            .compact()
    });

    // Defaults to INFO if RUST_LOG is not set
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

/// Creates the parent directory of `log_path` and truncates the file.
///
/// Returns the directory and file name for the appender.
fn prepare_log_file(log_path: &Path) -> Result<(PathBuf, PathBuf), io::Error> {
    let file_name = log_path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("log path has no file name: {}", log_path.display()),
        )
    })?;
    let dir = match log_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    fs::create_dir_all(&dir)?;
    fs::write(log_path, "")?;

    Ok((dir, PathBuf::from(file_name)))
}

/// Default log file path (`~/.tilefetch/logs/tilefetch.log`).
pub fn default_log_path() -> PathBuf {
    crate::config::config_directory()
        .join("logs")
        .join("tilefetch.log")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_path_layout() {
        let path = default_log_path();
        assert!(path.ends_with("logs/tilefetch.log"));
    }

    #[test]
    fn test_prepare_creates_nested_directory() {
        let temp = TempDir::new().unwrap();
        let log_path = temp.path().join("deep/nested/app.log");

        let (dir, file) = prepare_log_file(&log_path).unwrap();

        assert_eq!(dir, temp.path().join("deep/nested"));
        assert_eq!(file, PathBuf::from("app.log"));
        assert_eq!(fs::read_to_string(&log_path).unwrap(), "");
    }

    #[test]
    fn test_prepare_clears_existing_file() {
        let temp = TempDir::new().unwrap();
        let log_path = temp.path().join("app.log");
        fs::write(&log_path, "old log data").unwrap();

        prepare_log_file(&log_path).unwrap();

        assert_eq!(fs::read_to_string(&log_path).unwrap(), "");
    }

    #[test]
    fn test_prepare_rejects_path_without_file_name() {
        let err = prepare_log_file(Path::new("/")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_guard_structure() {
        use tracing_appender::non_blocking::NonBlocking;

        let (non_blocking, guard) = NonBlocking::new(std::io::sink());
        drop(non_blocking);

        let _logging_guard = LoggingGuard { _file_guard: guard };
    }

    // Actual log output needs a global subscriber, which can only be set once
    // per process; the CLI exercises that path.
}
