//! Configuration file handling for ~/.tilefetch/config.ini.
//!
//! Loads user configuration with sensible defaults. Parsing lives in
//! [`super::parser`].

use ini::Ini;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use super::defaults::*;
use super::download::{DownloadConfig, ExecutionMode};

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

/// `[download]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSettings {
    /// Maximum concurrent transfers (0 = unbounded)
    pub max_transfers: usize,
    /// Network timeout in seconds
    pub timeout: u64,
    /// Tile freshness window in days
    pub tile_freshness_days: u64,
    /// Idle grace period in seconds before the worker exits
    pub idle_shutdown_secs: u64,
    pub mode: ExecutionMode,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            max_transfers: DEFAULT_MAX_CONCURRENT_TRANSFERS,
            timeout: DEFAULT_NETWORK_TIMEOUT_SECS,
            tile_freshness_days: DEFAULT_TILE_FRESHNESS.as_secs() / 86_400,
            idle_shutdown_secs: DEFAULT_IDLE_POLL_INTERVAL.as_secs()
                * u64::from(DEFAULT_IDLE_POLLS_BEFORE_SHUTDOWN),
            mode: ExecutionMode::Background,
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub file: PathBuf,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            file: crate::logging::default_log_path(),
        }
    }
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub download: DownloadSettings,
    pub logging: LoggingSettings,
}

impl ConfigFile {
    /// Load configuration from the default path (~/.tilefetch/config.ini).
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Build the manager configuration from the `[download]` section.
    ///
    /// The idle grace period keeps the default one-second poll and rounds the
    /// configured seconds up to a whole number of polls.
    pub fn download_config(&self) -> DownloadConfig {
        let settings = &self.download;
        let poll = DEFAULT_IDLE_POLL_INTERVAL;
        let polls = settings
            .idle_shutdown_secs
            .div_ceil(poll.as_secs().max(1))
            .min(u64::from(u32::MAX)) as u32;

        let freshness = Duration::from_secs(settings.tile_freshness_days.saturating_mul(86_400));

        DownloadConfig::new()
            .with_max_concurrent_transfers(settings.max_transfers)
            .with_network_timeout(Duration::from_secs(settings.timeout))
            .with_tile_freshness(freshness)
            .with_idle_shutdown(poll, polls)
            .with_execution_mode(settings.mode)
    }
}

/// Get the path to the config directory (~/.tilefetch).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tilefetch")
}

/// Get the path to the config file (~/.tilefetch/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}
