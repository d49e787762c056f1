//! TOML-based application configuration.
//!
//! Stores:
//! - Sleep window, daily goal and reminder interval
//! - Notification preferences
//! - The cadence the runtime ticks the engine at
//!
//! Configuration is stored at `~/.config/hydrate/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::{ConfigError, Result};
use crate::notify::DEFAULT_TITLE;
use crate::schedule::{HydrationConfig, TimeOfDay};

/// Hydration parameters as written in the file.
///
/// Times are checked on load; the numeric fields are checked by
/// [`AppConfig::hydration_config`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HydrationSettings {
    #[serde(default = "default_sleep_start")]
    pub sleep_start: TimeOfDay,
    #[serde(default = "default_sleep_end")]
    pub sleep_end: TimeOfDay,
    #[serde(default = "default_daily_goal_ml")]
    pub daily_goal_ml: u32,
    #[serde(default = "default_interval_min")]
    pub interval_min: u32,
}

/// Notification configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_title")]
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Seconds between engine ticks.
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/hydrate/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub hydration: HydrationSettings,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

// Default functions
fn default_sleep_start() -> TimeOfDay {
    HydrationConfig::default().sleep_start()
}
fn default_sleep_end() -> TimeOfDay {
    HydrationConfig::default().sleep_end()
}
fn default_daily_goal_ml() -> u32 {
    2000
}
fn default_interval_min() -> u32 {
    60
}
fn default_true() -> bool {
    true
}
fn default_title() -> String {
    DEFAULT_TITLE.into()
}
fn default_tick_secs() -> u64 {
    60
}

impl Default for HydrationSettings {
    fn default() -> Self {
        Self {
            sleep_start: default_sleep_start(),
            sleep_end: default_sleep_end(),
            daily_goal_ml: default_daily_goal_ml(),
            interval_min: default_interval_min(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            title: default_title(),
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self { tick_secs: 60 }
    }
}

impl From<&HydrationConfig> for HydrationSettings {
    fn from(config: &HydrationConfig) -> Self {
        Self {
            sleep_start: config.sleep_start(),
            sleep_end: config.sleep_end(),
            daily_goal_ml: config.daily_goal_ml(),
            interval_min: config.interval_min(),
        }
    }
}

impl AppConfig {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        return Err(invalid("only leaf values can be set".to_string()));
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing the defaults if no file exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: AppConfig = toml::from_str(&content)?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value in memory. The config is unchanged on error.
    ///
    /// # Errors
    ///
    /// Unknown key, unparsable value, or a hydration value that would make
    /// the schedule invalid (zero goal or interval, malformed time).
    pub fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: AppConfig =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.hydration_config()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and persist.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.apply(key, value)?;
        self.save()?;
        Ok(())
    }

    /// The validated hydration parameters.
    pub fn hydration_config(&self) -> Result<HydrationConfig> {
        HydrationConfig::new(
            self.hydration.sleep_start,
            self.hydration.sleep_end,
            self.hydration.daily_goal_ml,
            self.hydration.interval_min,
        )
    }
}
