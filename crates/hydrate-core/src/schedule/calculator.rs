//! Schedule calculator.
//!
//! Pure derivation of a day's reminder slots from a [`HydrationConfig`].
//! No caching, no side effects; calling it twice with the same inputs gives
//! the same answer.
//!
//! ## Arithmetic
//!
//! ```text
//! end'   = sleep_end            if sleep_end > sleep_start
//!        = sleep_end + 24h      otherwise
//! awake  = (sleep_start - end') mod 24h, in [0, 1440)
//! count  = floor(awake / interval) + 1
//! dose   = round(goal / count)
//! slot_i = date @ sleep_end + i * interval,   i in [0, count)
//! ```
//!
//! The `+ 1` places a slot at the very start of the waking period. When
//! sleep start equals sleep end the waking period is empty and the day has a
//! single slot carrying the whole goal.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;

use super::{HydrationConfig, TimeOfDay};
use crate::error::{ReminderError, Result};

pub const MINUTES_PER_DAY: i64 = 24 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComputedSchedule {
    pub date: NaiveDate,
    /// Target volume for each slot, milliliters.
    pub dose_ml: u32,
    pub interval_count: usize,
    pub awake_minutes: i64,
    /// Strictly increasing; the first equals `date` at sleep end.
    pub timestamps: Vec<NaiveDateTime>,
}

/// Length of the waking period between `sleep_end` and the next `sleep_start`.
pub fn awake_minutes(sleep_start: TimeOfDay, sleep_end: TimeOfDay) -> i64 {
    let start = sleep_start.minute_of_day();
    let mut end = sleep_end.minute_of_day();
    if end <= start {
        end += MINUTES_PER_DAY;
    }
    (start - end).rem_euclid(MINUTES_PER_DAY)
}

pub fn compute_schedule(config: &HydrationConfig, date: NaiveDate) -> Result<ComputedSchedule> {
    config.validate()?;

    let interval = i64::from(config.interval_min());
    let awake = awake_minutes(config.sleep_start(), config.sleep_end());
    let interval_count = (awake / interval + 1) as usize;

    // Half-up rounding, the same as rounding the exact quotient.
    let goal = u64::from(config.daily_goal_ml());
    let count = interval_count as u64;
    let dose_ml = ((2 * goal + count) / (2 * count)) as u32;

    let first = date.and_time(config.sleep_end().as_naive());
    let timestamps = (0..interval_count as i64)
        .map(|i| {
            first
                .checked_add_signed(Duration::minutes(i * interval))
                .ok_or_else(|| {
                    ReminderError::invalid_config(
                        "date",
                        format!("slots for {date} run past the last representable day"),
                    )
                })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ComputedSchedule {
        date,
        dose_ml,
        interval_count,
        awake_minutes: awake,
        timestamps,
    })
}
