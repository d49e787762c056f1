//! Wall-clock time of day, with no date component.
//!
//! Accepts the 12-hour `hh:mm AM` form and the 24-hour `HH:MM` form.
//! Always renders as `hh:mm AM`, which is also the serialized form.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ReminderError;

const TWELVE_HOUR: &str = "%I:%M %p";
const TWENTY_FOUR_HOUR: &str = "%H:%M";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(NaiveTime);

impl TimeOfDay {
    /// Build from hour (0-23) and minute (0-59).
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    pub fn parse(input: &str) -> Result<Self, ReminderError> {
        let trimmed = input.trim();
        NaiveTime::parse_from_str(trimmed, TWELVE_HOUR)
            .or_else(|_| NaiveTime::parse_from_str(trimmed, TWENTY_FOUR_HOUR))
            .map(Self)
            .map_err(|e| ReminderError::Parse {
                input: input.to_string(),
                message: e.to_string(),
            })
    }

    pub fn as_naive(&self) -> NaiveTime {
        self.0
    }

    /// Minutes since midnight, 0..1440.
    pub fn minute_of_day(&self) -> i64 {
        i64::from(self.0.hour()) * 60 + i64::from(self.0.minute())
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TWELVE_HOUR))
    }
}

impl FromStr for TimeOfDay {
    type Err = ReminderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_twelve_hour_form() {
        let t = TimeOfDay::parse("10:00 PM").unwrap();
        assert_eq!(t.minute_of_day(), 22 * 60);
        let t = TimeOfDay::parse("06:30 am").unwrap();
        assert_eq!(t.minute_of_day(), 6 * 60 + 30);
    }

    #[test]
    fn parses_twenty_four_hour_form() {
        let t = TimeOfDay::parse("23:15").unwrap();
        assert_eq!(t.minute_of_day(), 23 * 60 + 15);
    }

    #[test]
    fn renders_in_twelve_hour_form() {
        assert_eq!(TimeOfDay::from_hm(6, 0).unwrap().to_string(), "06:00 AM");
        assert_eq!(TimeOfDay::from_hm(22, 0).unwrap().to_string(), "10:00 PM");
    }

    #[test]
    fn rejects_garbage() {
        for bad in ["", "noon", "25:00", "10:61 PM", "13:00 PM"] {
            let err = TimeOfDay::parse(bad).unwrap_err();
            assert!(matches!(err, ReminderError::Parse { .. }), "{bad} parsed");
        }
    }

    #[test]
    fn serde_uses_display_form() {
        let t = TimeOfDay::from_hm(22, 0).unwrap();
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, "\"10:00 PM\"");
        let back: TimeOfDay = serde_json::from_str("\"22:00\"").unwrap();
        assert_eq!(back, t);
    }
}
