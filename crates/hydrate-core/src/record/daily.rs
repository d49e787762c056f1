use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::schedule::ComputedSchedule;

/// One reminder slot: when to drink, and whether it happened.
///
/// `at` never changes after the record is built; `filled` is the only
/// mutable state and is owned by the fulfillment tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrinkEvent {
    pub at: NaiveDateTime,
    pub filled: bool,
}

impl DrinkEvent {
    /// Strictly before `now`, i.e. eligible for toggling.
    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        self.at < now
    }
}

/// How far through the day's slots the user is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayProgress {
    NotStarted,
    Partial,
    Complete,
}

/// Every slot for one calendar date plus the derived counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub dose_ml: u32,
    events: Vec<DrinkEvent>,
    drunk_count: usize,
    pending_count: usize,
}

impl DailyRecord {
    /// Fresh record: every slot unfilled, both counters zero.
    pub fn from_schedule(schedule: ComputedSchedule) -> Self {
        let events = schedule
            .timestamps
            .into_iter()
            .map(|at| DrinkEvent { at, filled: false })
            .collect();
        Self {
            date: schedule.date,
            dose_ml: schedule.dose_ml,
            events,
            drunk_count: 0,
            pending_count: 0,
        }
    }

    pub fn events(&self) -> &[DrinkEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn drunk_count(&self) -> usize {
        self.drunk_count
    }

    /// Unfilled slots whose time has already passed.
    pub fn pending_count(&self) -> usize {
        self.pending_count
    }

    /// Unfilled slots still in the future, as of `now`.
    pub fn upcoming_count(&self, now: NaiveDateTime) -> usize {
        self.events
            .iter()
            .filter(|e| !e.filled && !e.is_due(now))
            .count()
    }

    pub fn progress(&self) -> DayProgress {
        match self.drunk_count {
            0 => DayProgress::NotStarted,
            n if n == self.events.len() => DayProgress::Complete,
            _ => DayProgress::Partial,
        }
    }

    /// Recompute both counters from scratch. Never adjusted incrementally.
    pub fn recount(&mut self, now: NaiveDateTime) {
        self.drunk_count = self.events.iter().filter(|e| e.filled).count();
        self.pending_count = self
            .events
            .iter()
            .filter(|e| !e.filled && e.is_due(now))
            .count();
    }

    pub(crate) fn event_mut(&mut self, index: usize) -> Option<&mut DrinkEvent> {
        self.events.get_mut(index)
    }
}
