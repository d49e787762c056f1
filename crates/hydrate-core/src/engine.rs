//! Reminder engine.
//!
//! Wires the schedule store, the fulfillment tracker and the notification
//! scheduler together behind the operations a UI or service layer calls.
//! Like the rest of the crate it has no internal thread: the caller drives the
//! wall clock with `tick(now)` and, for channel-based timer hosts, hands timer
//! fires back with `handle_fire`.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = ReminderEngine::new(config, Box::new(host), Box::new(notifier), now)?;
//! engine.set_notifications_enabled(true)?;
//! // Once a minute or so:
//! engine.tick(now);
//! for event in engine.drain_events() { /* render */ }
//! ```

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{ReminderError, Result};
use crate::events::Event;
use crate::notify::{
    ArmState, Notification, NotificationScheduler, Notifier, Permission, TimerFire, TimerHost,
    DEFAULT_TITLE,
};
use crate::record::{DailyRecord, DailyRecordStore, DayProgress, FulfillmentTracker, ToggleOutcome};
use crate::schedule::{compute_schedule, HydrationConfig};

/// One slot as the display layer sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotView {
    pub index: usize,
    pub at: NaiveDateTime,
    pub filled: bool,
    /// Time has passed, so the slot can be toggled.
    pub due: bool,
}

/// Everything the display layer renders for the selected date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayView {
    pub date: NaiveDate,
    pub is_today: bool,
    pub dose_ml: u32,
    pub interval_count: usize,
    pub drunk_count: usize,
    pub pending_count: usize,
    pub upcoming_count: usize,
    pub progress: DayProgress,
    pub armed: bool,
    pub live_timers: usize,
    pub events: Vec<SlotView>,
}

/// Serializable dump of the config and every materialized day.
#[derive(Debug, Serialize)]
pub struct StoreSnapshot<'a> {
    pub taken_at: NaiveDateTime,
    pub selected_date: Option<NaiveDate>,
    pub notifications_enabled: bool,
    #[serde(flatten)]
    pub store: &'a DailyRecordStore,
}

pub struct ReminderEngine {
    store: DailyRecordStore,
    tracker: FulfillmentTracker,
    scheduler: NotificationScheduler,
    notifier: Box<dyn Notifier>,
    title: String,
    notifications_enabled: bool,
    /// Last permission request that did not come back granted.
    permission_failure: Option<Permission>,
    selected: Option<NaiveDate>,
    /// Wall clock as of the last `tick` (or construction).
    clock: NaiveDateTime,
    outbox: Vec<Event>,
}

impl ReminderEngine {
    /// Create an engine with today (by `now`) selected.
    ///
    /// Notifications start enabled if the notifier already holds permission.
    pub fn new(
        config: HydrationConfig,
        host: Box<dyn TimerHost>,
        notifier: Box<dyn Notifier>,
        now: NaiveDateTime,
    ) -> Result<Self> {
        config.validate()?;
        let notifications_enabled = notifier.permission() == Permission::Granted;
        let mut engine = Self {
            store: DailyRecordStore::new(config),
            tracker: FulfillmentTracker,
            scheduler: NotificationScheduler::new(host),
            notifier,
            title: DEFAULT_TITLE.to_string(),
            notifications_enabled,
            permission_failure: None,
            selected: Some(now.date()),
            clock: now,
            outbox: Vec::new(),
        };
        engine.materialize_selected()?;
        engine.rearm();
        Ok(engine)
    }

    /// Title used on every delivered notification.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn config(&self) -> &HydrationConfig {
        self.store.config()
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock
    }

    pub fn selected_date(&self) -> Option<NaiveDate> {
        self.selected
    }

    pub fn arm_state(&self) -> ArmState {
        self.scheduler.state()
    }

    pub fn live_timer_count(&self) -> usize {
        self.scheduler.live_count()
    }

    pub fn notifications_enabled(&self) -> bool {
        self.notifications_enabled
    }

    pub fn permission_failure(&self) -> Option<Permission> {
        self.permission_failure
    }

    pub fn record(&self, date: NaiveDate) -> Option<&DailyRecord> {
        self.store.get(date)
    }

    /// Calendar colouring for `date`; `None` if the day was never opened.
    pub fn progress_for(&self, date: NaiveDate) -> Option<DayProgress> {
        self.store.get(date).map(DailyRecord::progress)
    }

    pub fn day_view(&self) -> Option<DayView> {
        let date = self.selected?;
        let record = self.store.get(date)?;
        let now = self.clock;
        Some(DayView {
            date,
            is_today: date == now.date(),
            dose_ml: record.dose_ml,
            interval_count: record.len(),
            drunk_count: record.drunk_count(),
            pending_count: record.pending_count(),
            upcoming_count: record.upcoming_count(now),
            progress: record.progress(),
            armed: self.scheduler.armed_date() == Some(date),
            live_timers: self.scheduler.live_count(),
            events: record
                .events()
                .iter()
                .enumerate()
                .map(|(index, e)| SlotView {
                    index,
                    at: e.at,
                    filled: e.filled,
                    due: e.is_due(now),
                })
                .collect(),
        })
    }

    pub fn snapshot(&self) -> StoreSnapshot<'_> {
        StoreSnapshot {
            taken_at: self.clock,
            selected_date: self.selected,
            notifications_enabled: self.notifications_enabled,
            store: &self.store,
        }
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.outbox)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Replace the hydration parameters.
    ///
    /// Drops every cached day (fulfillment history included), rebuilds the
    /// selected one and re-arms. Setting an identical config changes nothing.
    pub fn set_config(&mut self, config: HydrationConfig) -> Result<()> {
        let preview = compute_schedule(&config, self.clock.date())?;
        if config == *self.store.config() {
            return Ok(());
        }

        let was_armed = self.scheduler.state() == ArmState::Armed;
        self.scheduler.disarm();
        if was_armed {
            self.push(Event::RemindersDisarmed { at: self.clock });
        }

        self.store.replace_config(config);
        self.push(Event::ConfigApplied {
            dose_ml: preview.dose_ml,
            interval_count: preview.interval_count,
            at: self.clock,
        });
        self.materialize_selected()?;
        self.rearm();
        Ok(())
    }

    pub fn select_date(&mut self, date: NaiveDate) -> Result<()> {
        self.selected = Some(date);
        let interval_count = self.materialize_selected()?.unwrap_or(0);
        self.push(Event::DateSelected {
            date,
            interval_count,
            at: self.clock,
        });
        self.rearm();
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
        self.rearm();
    }

    /// Toggle slot `index` of the selected day.
    ///
    /// # Errors
    ///
    /// `NotYetDue` for a slot whose time has not passed; callers should just
    /// ignore it. `NoDateSelected` and `IndexOutOfRange` otherwise.
    pub fn toggle_event(&mut self, index: usize) -> Result<ToggleOutcome> {
        let date = self.selected.ok_or(ReminderError::NoDateSelected)?;
        let now = self.clock;
        let record = self.store.get_or_create(date)?;
        let outcome = match self.tracker.toggle(record, index, now) {
            Ok(outcome) => outcome,
            Err(e) => {
                debug!(%date, index, error = %e, "toggle rejected");
                return Err(e);
            }
        };

        self.push(Event::EventToggled {
            date,
            index,
            filled: outcome.filled,
            drunk_count: outcome.drunk_count,
            pending_count: outcome.pending_count,
            at: now,
        });
        if let Some(message) = outcome.progress_message() {
            self.push(Event::ProgressRecorded {
                drunk_count: outcome.drunk_count,
                total: outcome.total,
                message: message.clone(),
                at: now,
            });
            self.deliver(message);
        }
        Ok(outcome)
    }

    /// Turn reminders on or off.
    ///
    /// Enabling asks the notifier for permission. A denial (or a host with no
    /// notifications) is returned once and leaves the scheduler Idle; nothing
    /// asks again unless this is called again.
    pub fn set_notifications_enabled(&mut self, enabled: bool) -> Result<()> {
        if enabled == self.notifications_enabled {
            return Ok(());
        }

        if !enabled {
            self.notifications_enabled = false;
            self.push(Event::NotificationsDisabled {
                reason: "disabled by user".to_string(),
                at: self.clock,
            });
            self.rearm();
            return Ok(());
        }

        match self.notifier.request_permission() {
            Permission::Granted => {
                info!("notifications enabled");
                self.notifications_enabled = true;
                self.permission_failure = None;
                self.push(Event::NotificationsEnabled { at: self.clock });
                self.rearm();
                Ok(())
            }
            refused => {
                warn!(permission = ?refused, "notification permission not granted");
                self.permission_failure = Some(refused);
                self.push(Event::PermissionFailed {
                    permission: refused,
                    at: self.clock,
                });
                Err(match refused {
                    Permission::Unsupported => ReminderError::PermissionUnsupported,
                    _ => ReminderError::PermissionDenied,
                })
            }
        }
    }

    /// Periodic wall-clock refresh.
    ///
    /// Releases due timers, notices permission revoked out-of-band,
    /// recounts the selected day's pending slots and re-arms if the calendar
    /// day moved relative to the selection.
    pub fn tick(&mut self, now: NaiveDateTime) {
        self.clock = now;

        // Revocation disarms before anything due is released.
        if self.notifications_enabled && !self.permitted() {
            warn!("notification permission revoked");
            self.notifications_enabled = false;
            self.push(Event::NotificationsDisabled {
                reason: "permission revoked".to_string(),
                at: now,
            });
            self.rearm();
        }

        for fire in self.scheduler.poll_due(now) {
            self.handle_fire(fire);
        }

        if let Some(record) = self.selected.and_then(|d| self.store.get_mut(d)) {
            record.recount(now);
        }

        let should_arm = self.notifications_enabled && self.selected == Some(now.date());
        let stale = match self.scheduler.armed_date() {
            Some(date) => !should_arm || date != now.date(),
            None => should_arm,
        };
        if stale {
            self.rearm();
        }
    }

    /// Hand back a timer fire from a channel-based host.
    ///
    /// Fires that are no longer live (cancelled, re-armed, already handled)
    /// are dropped, as are fires for slots filled in the meantime.
    pub fn handle_fire(&mut self, fire: TimerFire) {
        let Some(index) = self.scheduler.accept(&fire) else {
            return;
        };
        if !self.notifications_enabled || !self.permitted() {
            debug!(index, "reminder fired without permission, dropping");
            return;
        }
        let Some(date) = self.scheduler.armed_date() else {
            return;
        };
        let Some(record) = self.store.get(date) else {
            return;
        };
        let total = record.len();
        match record.events().get(index) {
            Some(event) if !event.filled => {}
            _ => {
                debug!(%date, index, "slot already filled, skipping reminder");
                return;
            }
        }

        let message = format!("Time to drink water! Glass {} of {}", index + 1, total);
        info!(%date, index, total, "reminder fired");
        self.push(Event::ReminderFired {
            date,
            index,
            total,
            message: message.clone(),
            at: fire.fire_at,
        });
        self.deliver(message);
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Build (or fetch) the selected day and bring its counters up to date.
    fn materialize_selected(&mut self) -> Result<Option<usize>> {
        let Some(date) = self.selected else {
            return Ok(None);
        };
        let record = self.store.get_or_create(date)?;
        record.recount(self.clock);
        Ok(Some(record.len()))
    }

    /// Cancel every timer, then arm today's if allowed.
    fn rearm(&mut self) {
        let was = self.scheduler.state();
        let record = self.selected.and_then(|d| self.store.get(d));
        let state = self
            .scheduler
            .refresh(record, self.notifications_enabled, self.clock);

        match (was, state, self.scheduler.armed_date()) {
            (_, ArmState::Armed, Some(date)) => {
                let live_timers = self.scheduler.live_count();
                info!(%date, live_timers, "reminders armed");
                self.push(Event::RemindersArmed {
                    date,
                    live_timers,
                    at: self.clock,
                });
            }
            (ArmState::Armed, ArmState::Idle, _) => {
                info!("reminders disarmed");
                self.push(Event::RemindersDisarmed { at: self.clock });
            }
            _ => {}
        }
    }

    fn permitted(&self) -> bool {
        self.notifier.permission() == Permission::Granted
    }

    /// Best effort: dropped silently without permission.
    fn deliver(&mut self, body: String) {
        if !self.notifications_enabled || !self.permitted() {
            debug!(%body, "notification dropped");
            return;
        }
        self.notifier.notify(&Notification {
            title: self.title.clone(),
            body,
        });
    }

    fn push(&mut self, event: Event) {
        self.outbox.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::ManualTimerHost;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone)]
    struct TestNotifier {
        permission: Rc<RefCell<Permission>>,
        on_request: Permission,
        sent: Rc<RefCell<Vec<Notification>>>,
    }

    impl TestNotifier {
        fn new(current: Permission, on_request: Permission) -> Self {
            Self {
                permission: Rc::new(RefCell::new(current)),
                on_request,
                sent: Rc::default(),
            }
        }

        fn bodies(&self) -> Vec<String> {
            self.sent.borrow().iter().map(|n| n.body.clone()).collect()
        }
    }

    impl Notifier for TestNotifier {
        fn permission(&self) -> Permission {
            *self.permission.borrow()
        }

        fn request_permission(&mut self) -> Permission {
            *self.permission.borrow_mut() = self.on_request;
            self.on_request
        }

        fn notify(&mut self, notification: &Notification) {
            self.sent.borrow_mut().push(notification.clone());
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        today().and_hms_opt(h, m, 0).unwrap()
    }

    fn engine_with(notifier: TestNotifier, now: NaiveDateTime) -> (ReminderEngine, ManualTimerHost) {
        let host = ManualTimerHost::new();
        let engine = ReminderEngine::new(
            HydrationConfig::default(),
            Box::new(host.clone()),
            Box::new(notifier),
            now,
        )
        .unwrap();
        (engine, host)
    }

    #[test]
    fn starts_on_today_and_arms_when_already_granted() {
        let n = TestNotifier::new(Permission::Granted, Permission::Granted);
        let (engine, host) = engine_with(n, at(8, 30));
        assert_eq!(engine.selected_date(), Some(today()));
        assert_eq!(engine.arm_state(), ArmState::Armed);
        assert_eq!(engine.live_timer_count(), 14);
        assert_eq!(host.pending_count(), 14);
        let view = engine.day_view().unwrap();
        assert_eq!(view.pending_count, 3);
        assert_eq!(view.dose_ml, 118);
    }

    #[test]
    fn starts_idle_without_permission() {
        let n = TestNotifier::new(Permission::Denied, Permission::Denied);
        let (engine, host) = engine_with(n, at(8, 30));
        assert_eq!(engine.arm_state(), ArmState::Idle);
        assert_eq!(host.pending_count(), 0);
    }

    #[test]
    fn denied_permission_is_reported_and_stays_idle() {
        let n = TestNotifier::new(Permission::Denied, Permission::Denied);
        let (mut engine, host) = engine_with(n, at(8, 30));
        let err = engine.set_notifications_enabled(true).unwrap_err();
        assert!(matches!(err, ReminderError::PermissionDenied));
        assert_eq!(engine.permission_failure(), Some(Permission::Denied));
        engine.tick(at(9, 30));
        assert_eq!(engine.arm_state(), ArmState::Idle);
        assert_eq!(host.pending_count(), 0);
    }

    #[test]
    fn unsupported_host_is_reported() {
        let n = TestNotifier::new(Permission::Unsupported, Permission::Unsupported);
        let (mut engine, _host) = engine_with(n, at(8, 30));
        let err = engine.set_notifications_enabled(true).unwrap_err();
        assert!(matches!(err, ReminderError::PermissionUnsupported));
    }

    #[test]
    fn granting_permission_arms_today() {
        let n = TestNotifier::new(Permission::Denied, Permission::Granted);
        let (mut engine, host) = engine_with(n, at(8, 30));
        engine.set_notifications_enabled(true).unwrap();
        assert_eq!(engine.arm_state(), ArmState::Armed);
        assert_eq!(host.pending_count(), 14);
        let events = engine.drain_events();
        assert!(events.iter().any(|e| matches!(e, Event::NotificationsEnabled { .. })));
        assert!(events.iter().any(|e| matches!(e, Event::RemindersArmed { live_timers: 14, .. })));
    }

    #[test]
    fn tick_fires_reminder_message() {
        let n = TestNotifier::new(Permission::Granted, Permission::Granted);
        let (mut engine, _host) = engine_with(n.clone(), at(8, 30));
        engine.tick(at(9, 0));
        assert_eq!(n.bodies(), vec!["Time to drink water! Glass 4 of 17".to_string()]);
        assert_eq!(engine.live_timer_count(), 13);
        // Firing does not fill the slot.
        assert!(!engine.record(today()).unwrap().events()[3].filled);
    }

    #[test]
    fn toggle_fills_and_reports_progress() {
        let n = TestNotifier::new(Permission::Granted, Permission::Granted);
        let (mut engine, _host) = engine_with(n.clone(), at(8, 30));
        engine.drain_events();
        let outcome = engine.toggle_event(0).unwrap();
        assert!(outcome.filled);
        assert_eq!(outcome.drunk_count, 1);
        assert_eq!(outcome.pending_count, 2);
        assert_eq!(
            n.bodies(),
            vec!["Great job! You've drunk 1 glasses of water today.".to_string()]
        );

        // Unfilling says nothing.
        engine.toggle_event(0).unwrap();
        assert_eq!(n.bodies().len(), 1);
        let events = engine.drain_events();
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, Event::ProgressRecorded { .. }))
                .count(),
            1
        );
    }

    #[test]
    fn toggle_future_slot_changes_nothing() {
        let n = TestNotifier::new(Permission::Granted, Permission::Granted);
        let (mut engine, _host) = engine_with(n, at(8, 30));
        let before = engine.day_view().unwrap();
        let err = engine.toggle_event(10).unwrap_err();
        assert!(err.is_silent());
        assert_eq!(engine.day_view().unwrap(), before);
    }

    #[test]
    fn toggle_without_selection() {
        let n = TestNotifier::new(Permission::Granted, Permission::Granted);
        let (mut engine, host) = engine_with(n, at(8, 30));
        engine.clear_selection();
        assert_eq!(host.pending_count(), 0);
        assert!(matches!(engine.toggle_event(0), Err(ReminderError::NoDateSelected)));
    }

    #[test]
    fn selecting_another_day_disarms() {
        let n = TestNotifier::new(Permission::Granted, Permission::Granted);
        let (mut engine, host) = engine_with(n, at(8, 30));
        engine.select_date(today().succ_opt().unwrap()).unwrap();
        assert_eq!(engine.arm_state(), ArmState::Idle);
        assert_eq!(host.pending_count(), 0);

        engine.select_date(today()).unwrap();
        assert_eq!(engine.arm_state(), ArmState::Armed);
        assert_eq!(host.pending_count(), 14);
    }

    #[test]
    fn config_change_rebuilds_and_rearms() {
        let n = TestNotifier::new(Permission::Granted, Permission::Granted);
        let (mut engine, host) = engine_with(n, at(8, 30));
        engine.toggle_event(0).unwrap();

        let cfg = engine.config().with_interval_min(30).unwrap();
        engine.set_config(cfg).unwrap();
        let view = engine.day_view().unwrap();
        assert_eq!(view.interval_count, 33);
        assert_eq!(view.drunk_count, 0);
        // 09:00..22:00 every 30 minutes.
        assert_eq!(host.pending_count(), 27);
        assert_eq!(engine.live_timer_count(), 27);
    }

    #[test]
    fn identical_config_keeps_history() {
        let n = TestNotifier::new(Permission::Granted, Permission::Granted);
        let (mut engine, _host) = engine_with(n, at(8, 30));
        engine.toggle_event(0).unwrap();
        engine.set_config(HydrationConfig::default()).unwrap();
        assert_eq!(engine.day_view().unwrap().drunk_count, 1);
    }

    #[test]
    fn revoked_permission_is_noticed_on_tick() {
        let n = TestNotifier::new(Permission::Granted, Permission::Granted);
        let (mut engine, host) = engine_with(n.clone(), at(8, 30));
        *n.permission.borrow_mut() = Permission::Denied;
        engine.tick(at(8, 31));
        assert!(!engine.notifications_enabled());
        assert_eq!(engine.arm_state(), ArmState::Idle);
        assert_eq!(host.pending_count(), 0);
        engine.tick(at(12, 0));
        assert!(n.bodies().is_empty());
    }

    #[test]
    fn no_reminder_event_after_revocation() {
        let n = TestNotifier::new(Permission::Granted, Permission::Granted);
        let (mut engine, host) = engine_with(n.clone(), at(8, 30));
        engine.drain_events();
        *n.permission.borrow_mut() = Permission::Denied;

        engine.tick(at(9, 0));
        let events = engine.drain_events();
        assert!(!events.iter().any(|e| matches!(e, Event::ReminderFired { .. })));
        assert!(matches!(events[0], Event::NotificationsDisabled { .. }));
        assert_eq!(host.pending_count(), 0);
        assert!(n.bodies().is_empty());
    }

    #[test]
    fn channel_fire_after_revocation_is_dropped() {
        let n = TestNotifier::new(Permission::Granted, Permission::Granted);
        let (mut engine, host) = engine_with(n.clone(), at(8, 30));
        let fire = host.pending()[0];
        engine.drain_events();

        // Revoked, and the fire arrives before the next tick notices.
        *n.permission.borrow_mut() = Permission::Denied;
        engine.handle_fire(fire);
        assert!(engine.drain_events().is_empty());
        assert!(n.bodies().is_empty());
    }

    #[test]
    fn reminder_event_carries_due_time() {
        let n = TestNotifier::new(Permission::Granted, Permission::Granted);
        let (mut engine, _host) = engine_with(n, at(8, 30));
        engine.drain_events();
        engine.tick(at(9, 7));
        let events = engine.drain_events();
        assert!(matches!(
            events[0],
            Event::ReminderFired { index: 3, at: due, .. } if due == at(9, 0)
        ));
    }

    #[test]
    fn midnight_rollover_disarms_yesterday() {
        let n = TestNotifier::new(Permission::Granted, Permission::Granted);
        let (mut engine, host) = engine_with(n, at(8, 30));
        let tomorrow = today().succ_opt().unwrap();
        engine.tick(tomorrow.and_hms_opt(0, 1, 0).unwrap());
        assert_eq!(engine.arm_state(), ArmState::Idle);
        assert_eq!(host.pending_count(), 0);
        // Still showing yesterday; every unfilled slot is now pending.
        assert_eq!(engine.day_view().unwrap().pending_count, 17);
    }

    #[test]
    fn pre_selected_day_arms_when_it_arrives() {
        let n = TestNotifier::new(Permission::Granted, Permission::Granted);
        let (mut engine, host) = engine_with(n, at(23, 30));
        let tomorrow = today().succ_opt().unwrap();
        engine.select_date(tomorrow).unwrap();
        assert_eq!(engine.arm_state(), ArmState::Idle);
        engine.tick(tomorrow.and_hms_opt(0, 0, 30).unwrap());
        assert_eq!(engine.arm_state(), ArmState::Armed);
        assert_eq!(host.pending_count(), 17);
    }

    #[test]
    fn snapshot_is_date_keyed() {
        let n = TestNotifier::new(Permission::Granted, Permission::Granted);
        let (engine, _host) = engine_with(n, at(8, 30));
        let json = serde_json::to_value(engine.snapshot()).unwrap();
        assert!(json["records"]["2026-10-16"]["events"].is_array());
        assert_eq!(json["config"]["interval_min"], 60);
        assert_eq!(json["selected_date"], "2026-10-16");
    }
}
