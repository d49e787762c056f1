mod config;

pub use config::{AppConfig, HydrationSettings, NotificationsConfig, RuntimeConfig};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/hydrate[-dev]/` based on HYDRATE_ENV.
///
/// Set HYDRATE_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("HYDRATE_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("hydrate-dev")
    } else {
        base_dir.join("hydrate")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(e.to_string()))?;
    Ok(dir)
}
