//! Core error types for hydrate-core.
//!
//! Every error here is recoverable at the boundary where the offending input
//! was supplied. Nothing in this crate treats an error as fatal.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use thiserror::Error;

/// Core error type for hydrate-core.
#[derive(Error, Debug)]
pub enum ReminderError {
    /// Non-positive goal or interval. The prior config is kept.
    #[error("Invalid configuration value for '{field}': {message}")]
    InvalidConfig { field: String, message: String },

    /// Malformed time-of-day input. The prior value is kept.
    #[error("Cannot parse '{input}' as a time of day: {message}")]
    Parse { input: String, message: String },

    /// Toggle attempted on an event that is not yet due.
    ///
    /// Callers are expected to ignore this rather than surface it.
    #[error("Event {index} is not due until {due_at}")]
    NotYetDue { index: usize, due_at: NaiveDateTime },

    /// Toggle attempted on a slot the record does not have.
    #[error("Index {index} out of range for a day of {len} events")]
    IndexOutOfRange { index: usize, len: usize },

    /// No date is currently selected.
    #[error("No date selected")]
    NoDateSelected,

    /// The notification sink refused permission.
    #[error("Notification permission was denied")]
    PermissionDenied,

    /// The notification sink is not available on this host.
    #[error("Notifications are not supported on this host")]
    PermissionUnsupported,

    /// Application config errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReminderError {
    pub(crate) fn invalid_config(field: &str, message: impl Into<String>) -> Self {
        ReminderError::InvalidConfig {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// True for the errors the caller should drop without telling the user.
    pub fn is_silent(&self) -> bool {
        matches!(self, ReminderError::NotYetDue { .. })
    }
}

/// Errors from the on-disk application config.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dotted key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Data directory could not be resolved or created
    #[error("Failed to access data directory: {0}")]
    DataDir(String),

    #[error("Failed to parse configuration TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize configuration TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Result type alias for ReminderError
pub type Result<T, E = ReminderError> = std::result::Result<T, E>;
