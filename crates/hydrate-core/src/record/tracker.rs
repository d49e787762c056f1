//! Fulfillment tracking.
//!
//! Only slots whose time has passed can be toggled. A toggle flips the slot
//! and recomputes both counters of the record from scratch.

use chrono::NaiveDateTime;
use serde::Serialize;

use super::DailyRecord;
use crate::error::{ReminderError, Result};

/// Result of a successful toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToggleOutcome {
    pub index: usize,
    pub filled: bool,
    pub drunk_count: usize,
    pub pending_count: usize,
    pub total: usize,
}

impl ToggleOutcome {
    /// Progress signal, only for an unfilled -> filled transition.
    pub fn progress_message(&self) -> Option<String> {
        self.filled.then(|| {
            format!(
                "Great job! You've drunk {} glasses of water today.",
                self.drunk_count
            )
        })
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FulfillmentTracker;

impl FulfillmentTracker {
    /// Flip slot `index` of `record` as of `now`.
    ///
    /// # Errors
    ///
    /// `NotYetDue` if the slot is at or after `now` (nothing changes), and
    /// `IndexOutOfRange` if the record has no such slot.
    pub fn toggle(
        &self,
        record: &mut DailyRecord,
        index: usize,
        now: NaiveDateTime,
    ) -> Result<ToggleOutcome> {
        let len = record.len();
        let event = record
            .event_mut(index)
            .ok_or(ReminderError::IndexOutOfRange { index, len })?;
        if !event.is_due(now) {
            return Err(ReminderError::NotYetDue {
                index,
                due_at: event.at,
            });
        }
        event.filled = !event.filled;
        let filled = event.filled;

        record.recount(now);
        Ok(ToggleOutcome {
            index,
            filled,
            drunk_count: record.drunk_count(),
            pending_count: record.pending_count(),
            total: len,
        })
    }
}
