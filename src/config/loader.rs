//! Configuration loading from file system

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

use super::types::MenuConfig;
use crate::error::{ErrorSeverity, HistoryMenuError, Result};
use crate::logging;

const CONFIG_PATH: &str = "~/.clipmenu/config.json";

/// Location of the settings file (~/.clipmenu/config.json)
pub fn default_config_path() -> PathBuf {
    PathBuf::from(shellexpand::tilde(CONFIG_PATH).as_ref())
}

/// Read and parse a settings file. Fields missing from the file take defaults.
pub fn load_config_from(path: &Path) -> Result<MenuConfig> {
    let contents = fs::read_to_string(path).map_err(|source| HistoryMenuError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    let config = serde_json::from_str::<MenuConfig>(contents.trim())?;
    Ok(config)
}

/// Load configuration from ~/.clipmenu/config.json
///
/// Returns `MenuConfig::default()` if the file is missing or invalid.
#[instrument(name = "load_config")]
pub fn load_config() -> MenuConfig {
    let config_path = default_config_path();

    if !config_path.exists() {
        info!(path = %config_path.display(), "Config file not found, using defaults");
        return MenuConfig::default();
    }

    match load_config_from(&config_path) {
        Ok(config) => {
            info!(path = %config_path.display(), "Successfully loaded config");
            config
        }
        Err(e) => {
            match e.severity() {
                ErrorSeverity::Info => info!(
                    error = %e,
                    path = %config_path.display(),
                    "Config unreadable, using defaults"
                ),
                ErrorSeverity::Warning | ErrorSeverity::Error => {
                    let context = format!("{}, using defaults", e.user_message());
                    logging::log_error("CONFIG", &e.to_string(), Some(&context));
                }
            }
            MenuConfig::default()
        }
    }
}
