use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::notify::Permission;

/// Every state change in the engine produces an Event.
/// The surrounding runtime drains them with `ReminderEngine::drain_events`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// Config accepted; every cached day was dropped.
    ConfigApplied {
        dose_ml: u32,
        interval_count: usize,
        at: NaiveDateTime,
    },
    DateSelected {
        date: NaiveDate,
        interval_count: usize,
        at: NaiveDateTime,
    },
    EventToggled {
        date: NaiveDate,
        index: usize,
        filled: bool,
        drunk_count: usize,
        pending_count: usize,
        at: NaiveDateTime,
    },
    /// A slot went from unfilled to filled.
    ProgressRecorded {
        drunk_count: usize,
        total: usize,
        message: String,
        at: NaiveDateTime,
    },
    ReminderFired {
        date: NaiveDate,
        index: usize,
        total: usize,
        message: String,
        at: NaiveDateTime,
    },
    RemindersArmed {
        date: NaiveDate,
        live_timers: usize,
        at: NaiveDateTime,
    },
    RemindersDisarmed {
        at: NaiveDateTime,
    },
    NotificationsEnabled {
        at: NaiveDateTime,
    },
    NotificationsDisabled {
        reason: String,
        at: NaiveDateTime,
    },
    /// Permission request did not come back granted.
    PermissionFailed {
        permission: Permission,
        at: NaiveDateTime,
    },
}
