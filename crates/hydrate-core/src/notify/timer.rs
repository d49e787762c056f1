//! One-shot timer hosts.
//!
//! A [`TimerHost`] is the only asynchronous primitive the reminder core uses:
//! "fire at absolute time T". Two hosts ship with the crate:
//!
//! - [`ManualTimerHost`] keeps pending timers in memory and releases them
//!   when the caller's clock passes their fire time (`poll_due`). No
//!   threads; deterministic under test.
//! - [`TokioTimerHost`] spawns one sleeping task per timer and delivers
//!   fires over an `mpsc` channel for the runtime loop to hand back to the
//!   engine.
//!
//! Hosts do not decide whether a fire is still wanted. The notification
//! scheduler checks every fire against its live set and drops the stale ones.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimerId(pub u64);

/// A timer that reached its fire time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerFire {
    pub id: TimerId,
    /// Slot index within the day the timer was armed for.
    pub index: usize,
    pub fire_at: NaiveDateTime,
}

pub trait TimerHost {
    /// Arrange for a fire at `fire_at`. `now` is the caller's clock.
    fn schedule(&mut self, id: TimerId, index: usize, fire_at: NaiveDateTime, now: NaiveDateTime);

    /// Cancel a timer. Cancelling one that already fired is a no-op.
    fn cancel(&mut self, id: TimerId);

    /// Timers due at `now`, for hosts driven by the caller's clock.
    fn poll_due(&mut self, _now: NaiveDateTime) -> Vec<TimerFire> {
        Vec::new()
    }
}

// ── Manual host ──────────────────────────────────────────────────────

/// Caller-clocked host. Clones share the same pending set.
#[derive(Debug, Clone, Default)]
pub struct ManualTimerHost {
    pending: Arc<Mutex<BTreeMap<TimerId, TimerFire>>>,
}

impl ManualTimerHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_count(&self) -> usize {
        self.lock().len()
    }

    /// Pending fires ordered by fire time.
    pub fn pending(&self) -> Vec<TimerFire> {
        let mut fires: Vec<_> = self.lock().values().copied().collect();
        fires.sort_by_key(|f| (f.fire_at, f.index));
        fires
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<TimerId, TimerFire>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TimerHost for ManualTimerHost {
    fn schedule(&mut self, id: TimerId, index: usize, fire_at: NaiveDateTime, _now: NaiveDateTime) {
        self.lock().insert(id, TimerFire { id, index, fire_at });
    }

    fn cancel(&mut self, id: TimerId) {
        self.lock().remove(&id);
    }

    fn poll_due(&mut self, now: NaiveDateTime) -> Vec<TimerFire> {
        let mut pending = self.lock();
        let due: Vec<TimerId> = pending
            .values()
            .filter(|f| f.fire_at <= now)
            .map(|f| f.id)
            .collect();
        let mut fires: Vec<TimerFire> = due.iter().filter_map(|id| pending.remove(id)).collect();
        fires.sort_by_key(|f| (f.fire_at, f.index));
        fires
    }
}

// ── Tokio host ───────────────────────────────────────────────────────

/// One `tokio::time::sleep` task per timer.
///
/// Must be used from within a tokio runtime.
#[derive(Debug)]
pub struct TokioTimerHost {
    tx: mpsc::UnboundedSender<TimerFire>,
    tasks: HashMap<TimerId, JoinHandle<()>>,
}

impl TokioTimerHost {
    /// Host plus the receiving end the runtime loop reads fires from.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TimerFire>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                tasks: HashMap::new(),
            },
            rx,
        )
    }

    /// Timers whose task has not completed yet.
    pub fn active_count(&self) -> usize {
        self.tasks.values().filter(|h| !h.is_finished()).count()
    }
}

impl TimerHost for TokioTimerHost {
    fn schedule(&mut self, id: TimerId, index: usize, fire_at: NaiveDateTime, now: NaiveDateTime) {
        self.tasks.retain(|_, handle| !handle.is_finished());

        let delay = (fire_at - now).to_std().unwrap_or_default();
        let tx = self.tx.clone();
        let fire = TimerFire { id, index, fire_at };
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Receiver gone means the session ended.
            let _ = tx.send(fire);
        });
        if let Some(previous) = self.tasks.insert(id, handle) {
            previous.abort();
        }
    }

    fn cancel(&mut self, id: TimerId) {
        if let Some(handle) = self.tasks.remove(&id) {
            handle.abort();
        }
    }
}

impl Drop for TokioTimerHost {
    fn drop(&mut self) {
        for (_, handle) in self.tasks.drain() {
            handle.abort();
        }
    }
}
