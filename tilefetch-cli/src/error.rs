//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;
use tilefetch::config::ConfigFileError;
use tilefetch::ManagerError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration file could not be loaded
    Config(ConfigFileError),
    /// Invalid command-line argument
    InvalidArgument(String),
    /// Download manager could not be created or run
    Manager(ManagerError),
    /// Some requests failed or were still queued when waiting stopped
    Incomplete { failed: usize, remaining: usize },
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Incomplete { remaining, .. } if *remaining > 0 => {
                eprintln!();
                eprintln!("The queue did not drain in time. Try a longer --wait,");
                eprintln!("or check the log file for slow or unreachable servers.");
            }
            CliError::Config(_) => {
                eprintln!();
                eprintln!("Check the [download] section of your config file.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            CliError::Manager(e) => write!(f, "Download manager error: {}", e),
            CliError::Incomplete { failed, remaining } => write!(
                f,
                "{} download(s) failed, {} still queued",
                failed, remaining
            ),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Manager(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<ManagerError> for CliError {
    fn from(e: ManagerError) -> Self {
        CliError::Manager(e)
    }
}
