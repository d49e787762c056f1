//! # Hydrate Core Library
//!
//! Core logic for a daily hydration schedule: split the waking day into evenly
//! spaced drink slots, track which were fulfilled, and drive one-shot reminder
//! timers for the ones still ahead.
//!
//! ## Architecture
//!
//! - **Schedule**: pure calculator from sleep window, daily goal and interval
//!   to dose, slot count and slot timestamps
//! - **Record**: per-date cache of slots with fulfillment state and the
//!   tracker that toggles it
//! - **Notify**: notification scheduler owning the live timers, on top of a
//!   pluggable timer host and notifier sink
//! - **Engine**: orchestrator driven by the caller's `tick()`, with no
//!   internal threads
//!
//! ## Key Components
//!
//! - [`ReminderEngine`]: operations a UI or service layer calls
//! - [`compute_schedule`]: the schedule arithmetic
//! - [`DailyRecordStore`]: date-keyed record cache
//! - [`NotificationScheduler`]: cancel-then-rearm timer set
//! - [`AppConfig`]: TOML application configuration

pub mod engine;
pub mod error;
pub mod events;
pub mod notify;
pub mod record;
pub mod schedule;
pub mod storage;

pub use engine::{DayView, ReminderEngine, SlotView, StoreSnapshot};
pub use error::{ConfigError, ReminderError, Result};
pub use events::Event;
pub use notify::{
    ArmState, LogNotifier, ManualTimerHost, Notification, NotificationScheduler, Notifier,
    Permission, TimerFire, TimerHost, TimerId, TokioTimerHost,
};
pub use record::{
    DailyRecord, DailyRecordStore, DayProgress, DrinkEvent, FulfillmentTracker, ToggleOutcome,
};
pub use schedule::{compute_schedule, ComputedSchedule, HydrationConfig, TimeOfDay};
pub use storage::AppConfig;
