//! Common types and utilities shared across CLI commands.

use std::path::PathBuf;
use std::time::Duration;
use tilefetch::http::AsyncHttpClient;
use tilefetch::{DownloadEvent, DownloadManager};
use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::broadcast::Receiver;
use tracing::{info, warn};

use crate::error::CliError;

/// Options accepted by every command.
#[derive(Debug, Clone, Default)]
pub struct CommonArgs {
    pub config_path: Option<PathBuf>,
    pub max_transfers: Option<usize>,
    pub wait_secs: u64,
    pub foreground: bool,
    pub verbose: bool,
}

/// Counts of finished requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub committed: usize,
    pub failed: usize,
    pub remaining: usize,
}

impl Summary {
    /// Tally every event received so far.
    pub fn collect(events: &mut Receiver<DownloadEvent>, remaining: usize) -> Self {
        let mut summary = Summary {
            remaining,
            ..Summary::default()
        };
        loop {
            match events.try_recv() {
                Ok(event) if event.is_committed() => summary.committed += 1,
                Ok(event) => {
                    println!("  Failed: {}", event.description());
                    summary.failed += 1;
                }
                Err(TryRecvError::Lagged(missed)) => {
                    warn!(missed = missed, "Missed download events");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        summary
    }

    pub fn into_result(self) -> Result<(), CliError> {
        if self.failed > 0 || self.remaining > 0 {
            return Err(CliError::Incomplete {
                failed: self.failed,
                remaining: self.remaining,
            });
        }
        Ok(())
    }
}

/// Waits for the queue to drain, prints a summary and maps it to an exit status.
///
/// `events` must have been subscribed before the requests were made.
pub fn wait_and_report<C: AsyncHttpClient>(
    manager: &DownloadManager<C>,
    events: &mut Receiver<DownloadEvent>,
    common: &CommonArgs,
) -> Result<(), CliError> {
    let queued = manager.queue_length();
    if queued == 0 {
        println!("Nothing to download: everything requested is already up to date.");
        return Ok(());
    }

    println!("Downloading {} item(s)...", queued);
    let start = std::time::Instant::now();
    let remaining = manager.wait_until_idle(Duration::from_secs(common.wait_secs));
    if remaining > 0 {
        manager.abort();
    }

    let summary = Summary::collect(events, remaining);
    info!(
        committed = summary.committed,
        failed = summary.failed,
        remaining = summary.remaining,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Download run finished"
    );

    println!();
    println!("Committed: {}", summary.committed);
    println!("Failed:    {}", summary.failed);
    println!("Remaining: {}", summary.remaining);
    println!("Elapsed:   {:.2}s", start.elapsed().as_secs_f64());

    summary.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilefetch::queue::EntryKind;
    use tokio::sync::broadcast;

    fn committed(n: u64) -> DownloadEvent {
        DownloadEvent::Committed {
            kind: EntryKind::Tile,
            description: format!("Tile:1/1/{}", n),
            target: PathBuf::from(format!("/tmp/1/1/{}.png", n)),
        }
    }

    fn failed(n: u64) -> DownloadEvent {
        DownloadEvent::Failed {
            kind: EntryKind::File,
            description: format!("File:/tmp/{}", n),
            url: format!("http://f.test/{}", n),
            error: "HTTP 404".to_string(),
        }
    }

    #[test]
    fn test_summary_counts_events() {
        let (tx, mut rx) = broadcast::channel(8);
        tx.send(committed(1)).unwrap();
        tx.send(failed(2)).unwrap();
        tx.send(committed(3)).unwrap();

        let summary = Summary::collect(&mut rx, 0);

        assert_eq!(
            summary,
            Summary {
                committed: 2,
                failed: 1,
                remaining: 0
            }
        );
        assert!(summary.into_result().is_err());
    }

    #[test]
    fn test_clean_summary_is_ok() {
        let (tx, mut rx) = broadcast::channel(8);
        tx.send(committed(1)).unwrap();

        assert!(Summary::collect(&mut rx, 0).into_result().is_ok());
    }

    #[test]
    fn test_remaining_work_is_an_error() {
        let (_tx, mut rx) = broadcast::channel::<DownloadEvent>(8);

        let result = Summary::collect(&mut rx, 3).into_result();
        assert!(matches!(
            result,
            Err(CliError::Incomplete {
                failed: 0,
                remaining: 3
            })
        ));
    }
}
