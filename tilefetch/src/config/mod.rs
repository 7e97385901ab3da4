//! Configuration for the download manager.
//!
//! - [`DownloadConfig`] groups the tuning knobs used by
//!   [`crate::manager::DownloadManager`].
//! - [`ConfigFile`] loads the same knobs from `~/.tilefetch/config.ini`.
//!
//! # Example
//!
//! ```
//! use tilefetch::config::{ConfigFile, DownloadConfig};
//!
//! let from_file = ConfigFile::default().download_config();
//! assert_eq!(from_file, DownloadConfig::default());
//! ```

mod defaults;
mod download;
mod file;
mod parser;

pub use defaults::*;
pub use download::{DownloadConfig, ExecutionMode};
pub use file::{
    config_directory, config_file_path, ConfigFile, ConfigFileError, DownloadSettings,
    LoggingSettings,
};
