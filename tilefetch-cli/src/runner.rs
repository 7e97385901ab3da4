//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading, logging initialization and manager creation
//! so each command handler only deals with its own requests.

use crate::commands::common::CommonArgs;
use crate::error::CliError;
use tilefetch::config::{ConfigFile, DownloadConfig, ExecutionMode};
use tilefetch::logging::{init_logging, LoggingGuard};
use tilefetch::DownloadManager;
use tracing::info;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
}

impl CliRunner {
    /// Create a new CLI runner, loading config and initializing logging.
    pub fn new(common: &CommonArgs) -> Result<Self, CliError> {
        // Load config file (or use defaults if not present)
        let config = match &common.config_path {
            Some(path) => ConfigFile::load_from(path)?,
            None => ConfigFile::load()?,
        };

        let logging_guard = init_logging(&config.logging.file, common.verbose)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("tilefetch v{}", tilefetch::VERSION);
        info!("tilefetch CLI: {} command", command);
    }

    /// Download settings from the config file with command-line overrides.
    pub fn download_config(&self, common: &CommonArgs, expected_requests: usize) -> DownloadConfig {
        let mut config = self.config.download_config();
        if let Some(max) = common.max_transfers {
            config = config.with_max_concurrent_transfers(max);
        }
        if common.foreground {
            config = config.with_execution_mode(ExecutionMode::Foreground);
        }
        // Every request yields one event; size the channel so none are lost
        let capacity = config.event_channel_capacity().max(expected_requests);
        config.with_event_channel_capacity(capacity)
    }

    /// Create a download manager with the given configuration.
    pub fn create_manager(&self, config: DownloadConfig) -> Result<DownloadManager, CliError> {
        DownloadManager::new(config)
            .map_err(CliError::Manager)
            .inspect(|_| info!("Download manager created"))
    }
}
