use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{ScheduleError, ScheduleResult};

pub const DEFAULT_TIMEZONE: &str = "Asia/Bangkok";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mentor {
    pub id: Uuid,
    /// IANA zone name that the mentor's schedule dates and times are expressed in.
    pub timezone: String,
    pub created_at: DateTime<Utc>,
}

impl Mentor {
    pub fn tz(&self) -> ScheduleResult<Tz> {
        parse_timezone(&self.timezone)
    }
}

pub fn parse_timezone(name: &str) -> ScheduleResult<Tz> {
    name.parse::<Tz>()
        .map_err(|e| ScheduleError::Validation(format!("Unknown timezone '{}': {}", name, e)))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterMentorRequest {
    pub timezone: Option<String>,
}
