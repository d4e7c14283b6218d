use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{ScheduleError, ScheduleResult};
use crate::models::booking::BookingStatus;
use crate::models::time_format::hhmm;

pub const DAYS_PER_WEEK: u64 = 7;
pub const MINUTES_PER_DAY: i32 = 24 * 60;

/// A Monday-anchored, seven-date calendar window in the mentor's local zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WeekWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl WeekWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> ScheduleResult<Self> {
        if start.weekday() != Weekday::Mon {
            return Err(ScheduleError::Validation(format!(
                "Week must start on a Monday, got {} ({})",
                start,
                start.weekday()
            )));
        }
        if Some(end) != last_day(start) {
            return Err(ScheduleError::Validation(format!(
                "Week window must span exactly 7 dates, got {} to {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    pub fn starting(start: NaiveDate) -> ScheduleResult<Self> {
        let end = last_day(start).ok_or_else(|| {
            ScheduleError::Validation(format!("Week starting {} runs past the supported calendar", start))
        })?;
        Self::new(start, end)
    }

    /// The week holding `date`.
    pub fn containing(date: NaiveDate) -> ScheduleResult<Self> {
        let offset = u64::from(date.weekday().num_days_from_monday());
        let start = date.checked_sub_days(Days::new(offset)).ok_or_else(|| {
            ScheduleError::Validation(format!("Week holding {} starts before the supported calendar", date))
        })?;
        Self::starting(start)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |date| *date <= end)
    }
}

fn last_day(start: NaiveDate) -> Option<NaiveDate> {
    start.checked_add_days(Days::new(DAYS_PER_WEEK - 1))
}

/// Parameters the slot generator turns into concrete slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotRules {
    #[serde(with = "hhmm")]
    pub start_hour: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_hour: NaiveTime,
    pub session_duration_minutes: i32,
    pub buffer_minutes: i32,
}

impl Default for SlotRules {
    fn default() -> Self {
        Self {
            start_hour: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            end_hour: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or_default(),
            session_duration_minutes: 60,
            buffer_minutes: 0,
        }
    }
}

impl SlotRules {
    pub fn validate(&self) -> ScheduleResult<()> {
        if self.start_hour >= self.end_hour {
            return Err(ScheduleError::Validation(format!(
                "Start hour {} must be before end hour {}",
                self.start_hour.format("%H:%M"),
                self.end_hour.format("%H:%M")
            )));
        }
        if self.session_duration_minutes <= 0 {
            return Err(ScheduleError::Validation(
                "Session duration must be a positive number of minutes".to_string(),
            ));
        }
        if self.session_duration_minutes > MINUTES_PER_DAY {
            return Err(ScheduleError::Validation(
                "Session duration cannot exceed one day".to_string(),
            ));
        }
        if self.buffer_minutes < 0 {
            return Err(ScheduleError::Validation(
                "Buffer minutes cannot be negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSettings {
    pub id: Uuid,
    pub mentor_id: Uuid,
    pub week_start_date: NaiveDate,
    pub week_end_date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_hour: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_hour: NaiveTime,
    pub session_duration_minutes: i32,
    pub buffer_minutes: i32,
    /// Set while any slot in the window carries an active booking.
    pub is_locked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ScheduleSettings {
    pub fn new(mentor_id: Uuid, week: WeekWindow, rules: SlotRules, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            mentor_id,
            week_start_date: week.start,
            week_end_date: week.end,
            start_hour: rules.start_hour,
            end_hour: rules.end_hour,
            session_duration_minutes: rules.session_duration_minutes,
            buffer_minutes: rules.buffer_minutes,
            is_locked: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn week(&self) -> WeekWindow {
        WeekWindow {
            start: self.week_start_date,
            end: self.week_end_date,
        }
    }

    pub fn rules(&self) -> SlotRules {
        SlotRules {
            start_hour: self.start_hour,
            end_hour: self.end_hour,
            session_duration_minutes: self.session_duration_minutes,
            buffer_minutes: self.buffer_minutes,
        }
    }

    /// Overwrites the generation fields in place, keeping identity and lock.
    pub fn apply_rules(&mut self, rules: SlotRules, now: DateTime<Utc>) {
        self.start_hour = rules.start_hour;
        self.end_hour = rules.end_hour;
        self.session_duration_minutes = rules.session_duration_minutes;
        self.buffer_minutes = rules.buffer_minutes;
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveScheduleSettingsRequest {
    pub week_start_date: NaiveDate,
    pub week_end_date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_hour: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_hour: NaiveTime,
    pub session_duration_minutes: i32,
    #[serde(default)]
    pub buffer_minutes: i32,
}

impl SaveScheduleSettingsRequest {
    pub fn week(&self) -> ScheduleResult<WeekWindow> {
        WeekWindow::new(self.week_start_date, self.week_end_date)
    }

    pub fn rules(&self) -> SlotRules {
        SlotRules {
            start_hour: self.start_hour,
            end_hour: self.end_hour,
            session_duration_minutes: self.session_duration_minutes,
            buffer_minutes: self.buffer_minutes,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleWeekQuery {
    pub week_start: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotView {
    pub id: Uuid,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    /// No active booking and the start is still ahead.
    pub is_available: bool,
    /// An active booking occupies the slot.
    pub is_booked: bool,
    pub booking_id: Option<Uuid>,
    pub booking_status: Option<BookingStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSettingsView {
    pub settings: ScheduleSettings,
    pub timezone: String,
    /// Every date of the window is present, even when it has no slots.
    pub days: BTreeMap<NaiveDate, Vec<SlotView>>,
}

impl ScheduleSettingsView {
    pub fn slots(&self) -> impl Iterator<Item = &SlotView> {
        self.days.values().flatten()
    }
}
