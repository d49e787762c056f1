mod calculator;
mod time_of_day;

pub use calculator::{awake_minutes, compute_schedule, ComputedSchedule, MINUTES_PER_DAY};
pub use time_of_day::TimeOfDay;

use serde::Serialize;

use crate::error::{ReminderError, Result};

/// The four user-editable parameters every schedule is derived from.
///
/// Construction validates; a value of this type is always usable by
/// [`compute_schedule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HydrationConfig {
    sleep_start: TimeOfDay,
    sleep_end: TimeOfDay,
    daily_goal_ml: u32,
    interval_min: u32,
}

impl HydrationConfig {
    pub fn new(
        sleep_start: TimeOfDay,
        sleep_end: TimeOfDay,
        daily_goal_ml: u32,
        interval_min: u32,
    ) -> Result<Self> {
        let config = Self {
            sleep_start,
            sleep_end,
            daily_goal_ml,
            interval_min,
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse the two time-of-day strings and validate the numeric fields.
    pub fn parse(
        sleep_start: &str,
        sleep_end: &str,
        daily_goal_ml: u32,
        interval_min: u32,
    ) -> Result<Self> {
        Self::new(
            TimeOfDay::parse(sleep_start)?,
            TimeOfDay::parse(sleep_end)?,
            daily_goal_ml,
            interval_min,
        )
    }

    pub fn validate(&self) -> Result<()> {
        if self.daily_goal_ml == 0 {
            return Err(ReminderError::invalid_config(
                "daily_goal_ml",
                "daily goal must be a positive number of milliliters",
            ));
        }
        if self.interval_min == 0 {
            return Err(ReminderError::invalid_config(
                "interval_min",
                "reminder interval must be a positive number of minutes",
            ));
        }
        Ok(())
    }

    pub fn sleep_start(&self) -> TimeOfDay {
        self.sleep_start
    }

    pub fn sleep_end(&self) -> TimeOfDay {
        self.sleep_end
    }

    pub fn daily_goal_ml(&self) -> u32 {
        self.daily_goal_ml
    }

    pub fn interval_min(&self) -> u32 {
        self.interval_min
    }

    // ── Single-field edits ──────────────────────────────────────────
    //
    // Each returns a new validated config; `self` is untouched on error.

    pub fn with_sleep_start(&self, sleep_start: TimeOfDay) -> Result<Self> {
        Self::new(sleep_start, self.sleep_end, self.daily_goal_ml, self.interval_min)
    }

    pub fn with_sleep_end(&self, sleep_end: TimeOfDay) -> Result<Self> {
        Self::new(self.sleep_start, sleep_end, self.daily_goal_ml, self.interval_min)
    }

    pub fn with_daily_goal_ml(&self, daily_goal_ml: u32) -> Result<Self> {
        Self::new(self.sleep_start, self.sleep_end, daily_goal_ml, self.interval_min)
    }

    pub fn with_interval_min(&self, interval_min: u32) -> Result<Self> {
        Self::new(self.sleep_start, self.sleep_end, self.daily_goal_ml, interval_min)
    }
}

impl Default for HydrationConfig {
    /// 10:00 PM to 06:00 AM sleep, 2000 ml a day, a reminder every hour.
    fn default() -> Self {
        Self {
            sleep_start: TimeOfDay::from_hm(22, 0).unwrap_or_default(),
            sleep_end: TimeOfDay::from_hm(6, 0).unwrap_or_default(),
            daily_goal_ml: 2000,
            interval_min: 60,
        }
    }
}
