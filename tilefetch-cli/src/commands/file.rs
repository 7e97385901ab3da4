//! File command - download a single file.

use std::path::PathBuf;
use tilefetch::queue::Expiry;

use super::common::{wait_and_report, CommonArgs};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the file command.
pub struct FileArgs {
    pub url: String,
    pub output: PathBuf,
    /// Signed seconds, see [`Expiry::from_secs`]
    pub expiry: i64,
}

/// Run the file command.
pub fn run(args: FileArgs, common: &CommonArgs) -> Result<(), CliError> {
    if args.url.trim().is_empty() {
        return Err(CliError::InvalidArgument("--url must not be empty".to_string()));
    }

    let runner = CliRunner::new(common)?;
    runner.log_startup("file");
    let manager = runner.create_manager(runner.download_config(common, 1))?;
    let mut events = manager.subscribe();

    let expiry = Expiry::from_secs(args.expiry);
    println!("Requesting {}", args.url);
    println!("  Output: {}", args.output.display());
    println!("  Expiry: {:?}", expiry);
    println!();

    manager.request_file(&args.url, &args.output, expiry);

    wait_and_report(&manager, &mut events, common)
}
