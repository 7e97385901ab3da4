//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::path::PathBuf;
use std::str::FromStr;

use super::file::{ConfigFile, ConfigFileError};

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [download] section
    if let Some(section) = ini.section(Some("download")) {
        if let Some(v) = section.get("max_transfers") {
            config.download.max_transfers = parse_value(
                "max_transfers",
                v,
                "must be a non-negative integer (0 = unbounded)",
            )?;
            if config.download.max_transfers == 0 {
                tracing::warn!(
                    "download.max_transfers = 0 allows an unbounded number of simultaneous transfers"
                );
            }
        }
        if let Some(v) = section.get("timeout") {
            config.download.timeout =
                parse_value("timeout", v, "must be a positive integer (seconds)")?;
            if config.download.timeout == 0 {
                return Err(invalid("timeout", v, "must be a positive integer (seconds)"));
            }
        }
        if let Some(v) = section.get("tile_freshness_days") {
            config.download.tile_freshness_days =
                parse_value("tile_freshness_days", v, "must be a non-negative integer (days)")?;
        }
        if let Some(v) = section.get("idle_shutdown_secs") {
            config.download.idle_shutdown_secs =
                parse_value("idle_shutdown_secs", v, "must be a non-negative integer (seconds)")?;
        }
        if let Some(v) = section.get("mode") {
            config.download.mode =
                parse_value("mode", v, "must be 'background' or 'foreground'")?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

fn parse_value<T: FromStr>(key: &str, value: &str, reason: &str) -> Result<T, ConfigFileError> {
    value.trim().parse().map_err(|_| invalid(key, value, reason))
}

fn invalid(key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: "download".to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Expand a leading `~` to the home directory.
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
