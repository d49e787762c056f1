//! Date-keyed cache of daily records.
//!
//! A record is built the first time its date is asked for under the current
//! config and is then kept as-is, preserving whatever the user has filled in.
//! The only thing that throws records away is a config change: the slot set
//! itself is no longer well-defined under new parameters, so every cached day
//! is dropped and lazily rebuilt empty.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

use super::DailyRecord;
use crate::error::Result;
use crate::schedule::{compute_schedule, HydrationConfig};

#[derive(Debug, Clone, Serialize)]
pub struct DailyRecordStore {
    config: HydrationConfig,
    /// Serialized as a `YYYY-MM-DD` keyed map.
    records: BTreeMap<NaiveDate, DailyRecord>,
}

impl DailyRecordStore {
    pub fn new(config: HydrationConfig) -> Self {
        Self {
            config,
            records: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &HydrationConfig {
        &self.config
    }

    /// Cached record for `date`, building it on first access.
    pub fn get_or_create(&mut self, date: NaiveDate) -> Result<&mut DailyRecord> {
        match self.records.entry(date) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let schedule = compute_schedule(&self.config, date)?;
                debug!(%date, slots = schedule.interval_count, "materialized daily record");
                Ok(entry.insert(DailyRecord::from_schedule(schedule)))
            }
        }
    }

    pub fn get(&self, date: NaiveDate) -> Option<&DailyRecord> {
        self.records.get(&date)
    }

    pub fn get_mut(&mut self, date: NaiveDate) -> Option<&mut DailyRecord> {
        self.records.get_mut(&date)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.records.contains_key(&date)
    }

    /// Dates with a materialized record, oldest first.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.records.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn invalidate_all(&mut self) {
        let dropped = self.records.len();
        self.records.clear();
        debug!(dropped, "invalidated all daily records");
    }

    /// Swap in a new config and drop every cached record.
    ///
    /// The config type is validated on construction, so this cannot fail;
    /// rejecting bad input happens where the config is built.
    pub fn replace_config(&mut self, config: HydrationConfig) {
        info!(
            sleep_start = %config.sleep_start(),
            sleep_end = %config.sleep_end(),
            goal_ml = config.daily_goal_ml(),
            interval_min = config.interval_min(),
            "hydration config replaced"
        );
        self.config = config;
        self.invalidate_all();
    }
}
