use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ScheduleError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Requested,
    Approved,
    Declined,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 5] = [
        BookingStatus::Requested,
        BookingStatus::Approved,
        BookingStatus::Declined,
        BookingStatus::Cancelled,
        BookingStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Requested => "requested",
            BookingStatus::Approved => "approved",
            BookingStatus::Declined => "declined",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    /// Occupies its slot.
    pub fn is_active(&self) -> bool {
        matches!(self, BookingStatus::Requested | BookingStatus::Approved)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BookingStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ScheduleError::Validation(format!("Unknown booking status '{}'", s)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub time_slot_id: Uuid,
    pub mentor_id: Uuid,
    pub learner_id: Uuid,
    pub status: BookingStatus,
    pub booked_on: DateTime<Utc>,
    /// When the mentor accepted or declined.
    pub processed_on: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub rescheduled_from: Option<Uuid>,
}

impl Booking {
    pub fn requested(time_slot_id: Uuid, mentor_id: Uuid, learner_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            time_slot_id,
            mentor_id,
            learner_id,
            status: BookingStatus::Requested,
            booked_on: now,
            processed_on: None,
            updated_at: now,
            rescheduled_from: None,
        }
    }

    pub fn involves(&self, actor_id: Uuid) -> bool {
        self.learner_id == actor_id || self.mentor_id == actor_id
    }
}

/// A compare-and-set status update: applied only if the booking is still in `from`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub booking_id: Uuid,
    pub from: BookingStatus,
    pub to: BookingStatus,
    pub at: DateTime<Utc>,
    pub processed: bool,
}

impl StatusChange {
    pub fn apply(&self, booking: &mut Booking) {
        booking.status = self.to;
        booking.updated_at = self.at;
        if self.processed {
            booking.processed_on = Some(self.at);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingRole {
    Learner,
    Mentor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingFilter {
    Learner(Uuid),
    Mentor(Uuid),
}

impl BookingFilter {
    pub fn for_role(role: BookingRole, actor_id: Uuid) -> Self {
        match role {
            BookingRole::Learner => BookingFilter::Learner(actor_id),
            BookingRole::Mentor => BookingFilter::Mentor(actor_id),
        }
    }

    pub fn matches(&self, booking: &Booking) -> bool {
        match self {
            BookingFilter::Learner(id) => booking.learner_id == *id,
            BookingFilter::Mentor(id) => booking.mentor_id == *id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestBookingRequest {
    pub time_slot_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleBookingRequest {
    pub new_time_slot_id: Uuid,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListBookingsQuery {
    pub role: Option<BookingRole>,
}
