//! Wire helpers for `HH:mm` 24-hour clock times.

use chrono::NaiveTime;
use serde::{Deserialize, Deserializer, Serializer};

pub const CLOCK_FORMAT: &str = "%H:%M";

pub fn parse_clock_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), CLOCK_FORMAT).ok()
}

pub fn format_clock_time(time: NaiveTime) -> String {
    time.format(CLOCK_FORMAT).to_string()
}

/// `#[serde(with = "hhmm")]` for `NaiveTime` fields.
pub mod hhmm {
    use super::*;

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_clock_time(*time))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_clock_time(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("expected HH:mm time, got '{}'", raw)))
    }
}
