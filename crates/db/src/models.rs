use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use mentorsync_core::errors::ScheduleError;
use mentorsync_core::models::booking::Booking;
use mentorsync_core::models::mentor::Mentor;
use mentorsync_core::models::schedule::ScheduleSettings;
use mentorsync_core::models::time_slot::TimeSlot;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbMentor {
    pub id: Uuid,
    pub timezone: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbScheduleSettings {
    pub id: Uuid,
    pub mentor_id: Uuid,
    pub week_start_date: NaiveDate,
    pub week_end_date: NaiveDate,
    pub start_hour: NaiveTime,
    pub end_hour: NaiveTime,
    pub session_duration_minutes: i32,
    pub buffer_minutes: i32,
    pub is_locked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbTimeSlot {
    pub id: Uuid,
    pub mentor_id: Uuid,
    pub settings_id: Option<Uuid>,
    pub slot_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub retired: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbBooking {
    pub id: Uuid,
    pub time_slot_id: Uuid,
    pub mentor_id: Uuid,
    pub learner_id: Uuid,
    pub status: String,
    pub booked_on: DateTime<Utc>,
    pub processed_on: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub rescheduled_from: Option<Uuid>,
}

impl From<DbMentor> for Mentor {
    fn from(row: DbMentor) -> Self {
        Mentor {
            id: row.id,
            timezone: row.timezone,
            created_at: row.created_at,
        }
    }
}

impl From<DbScheduleSettings> for ScheduleSettings {
    fn from(row: DbScheduleSettings) -> Self {
        ScheduleSettings {
            id: row.id,
            mentor_id: row.mentor_id,
            week_start_date: row.week_start_date,
            week_end_date: row.week_end_date,
            start_hour: row.start_hour,
            end_hour: row.end_hour,
            session_duration_minutes: row.session_duration_minutes,
            buffer_minutes: row.buffer_minutes,
            is_locked: row.is_locked,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<DbTimeSlot> for TimeSlot {
    fn from(row: DbTimeSlot) -> Self {
        TimeSlot {
            id: row.id,
            mentor_id: row.mentor_id,
            settings_id: row.settings_id,
            date: row.slot_date,
            start_time: row.start_time,
            end_time: row.end_time,
            retired: row.retired,
            created_at: row.created_at,
        }
    }
}

/// Status text is the only column that can fail to map.
impl TryFrom<DbBooking> for Booking {
    type Error = ScheduleError;

    fn try_from(row: DbBooking) -> Result<Self, Self::Error> {
        Ok(Booking {
            id: row.id,
            time_slot_id: row.time_slot_id,
            mentor_id: row.mentor_id,
            learner_id: row.learner_id,
            status: row.status.parse()?,
            booked_on: row.booked_on,
            processed_on: row.processed_on,
            updated_at: row.updated_at,
            rescheduled_from: row.rescheduled_from,
        })
    }
}
