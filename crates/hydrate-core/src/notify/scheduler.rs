//! Notification scheduler.
//!
//! Owns the live one-shot timers for today's unfilled future slots.
//!
//! ## States
//!
//! ```text
//! Idle  --refresh(permitted, record for today)-->  Armed
//! Armed --refresh(otherwise) | disarm()-------->  Idle
//! Armed --refresh(...)------------------------->  Armed (fresh timer set)
//! ```
//!
//! Every refresh cancels the whole outstanding set before scheduling a single
//! new timer, with no suspension point in between. At most one timer is live
//! per slot index, and a fire is only honoured if its id is still the live
//! one for that index.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::timer::{TimerFire, TimerHost, TimerId};
use crate::record::DailyRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArmState {
    Idle,
    Armed,
}

#[derive(Debug, Clone, Copy)]
struct LiveTimer {
    id: TimerId,
    fire_at: NaiveDateTime,
}

pub struct NotificationScheduler {
    host: Box<dyn TimerHost>,
    live: BTreeMap<usize, LiveTimer>,
    armed_date: Option<NaiveDate>,
    next_id: u64,
}

impl NotificationScheduler {
    pub fn new(host: Box<dyn TimerHost>) -> Self {
        Self {
            host,
            live: BTreeMap::new(),
            armed_date: None,
            next_id: 1,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> ArmState {
        if self.armed_date.is_some() {
            ArmState::Armed
        } else {
            ArmState::Idle
        }
    }

    pub fn armed_date(&self) -> Option<NaiveDate> {
        self.armed_date
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// `(index, fire_at)` for every live timer, by index.
    pub fn live_timers(&self) -> Vec<(usize, NaiveDateTime)> {
        self.live.iter().map(|(i, t)| (*i, t.fire_at)).collect()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Re-derive the live timer set.
    ///
    /// Arms only when `permitted` and `record` is today's (by `now`'s
    /// calendar day); otherwise ends up Idle with no timers.
    pub fn refresh(
        &mut self,
        record: Option<&DailyRecord>,
        permitted: bool,
        now: NaiveDateTime,
    ) -> ArmState {
        self.cancel_all();

        let today = now.date();
        let record = match record {
            Some(r) if permitted && r.date == today => r,
            _ => {
                self.armed_date = None;
                return ArmState::Idle;
            }
        };

        for (index, event) in record.events().iter().enumerate() {
            if !event.filled && event.at > now {
                self.arm_one(index, event.at, now);
            }
        }
        self.armed_date = Some(today);
        debug!(date = %today, live = self.live.len(), "reminders armed");
        ArmState::Armed
    }

    pub fn disarm(&mut self) {
        self.cancel_all();
        self.armed_date = None;
    }

    /// Fires the host has released by `now`.
    pub fn poll_due(&mut self, now: NaiveDateTime) -> Vec<TimerFire> {
        self.host.poll_due(now)
    }

    /// Consume a fire. Returns the slot index if the fire is still live.
    pub fn accept(&mut self, fire: &TimerFire) -> Option<usize> {
        match self.live.get(&fire.index) {
            Some(timer) if timer.id == fire.id => {
                self.live.remove(&fire.index);
                Some(fire.index)
            }
            _ => {
                warn!(id = fire.id.0, index = fire.index, "dropping stale timer fire");
                None
            }
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn arm_one(&mut self, index: usize, fire_at: NaiveDateTime, now: NaiveDateTime) {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.host.schedule(id, index, fire_at, now);
        self.live.insert(index, LiveTimer { id, fire_at });
    }

    fn cancel_all(&mut self) {
        let live = std::mem::take(&mut self.live);
        if !live.is_empty() {
            debug!(cancelled = live.len(), "cancelling reminder timers");
        }
        for timer in live.into_values() {
            self.host.cancel(timer.id);
        }
    }
}

impl Drop for NotificationScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
