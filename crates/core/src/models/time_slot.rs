use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::booking::{Booking, BookingStatus};
use crate::models::time_format::hhmm;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub id: Uuid,
    pub mentor_id: Uuid,
    /// Cleared when the owning settings row is deleted and the slot is kept for history.
    pub settings_id: Option<Uuid>,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    /// Superseded by a settings edit but kept because bookings reference it.
    pub retired: bool,
    pub created_at: DateTime<Utc>,
}

impl TimeSlot {
    pub fn from_candidate(
        candidate: &CandidateSlot,
        mentor_id: Uuid,
        settings_id: Uuid,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            mentor_id,
            settings_id: Some(settings_id),
            date: candidate.date,
            start_time: candidate.start_time,
            end_time: candidate.end_time,
            retired: false,
            created_at: now,
        }
    }

    pub fn overlaps(&self, other: &CandidateSlot) -> bool {
        self.date == other.date && self.start_time < other.end_time && other.start_time < self.end_time
    }
}

/// A slot produced by the generator, not yet persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CandidateSlot {
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
}

/// A stored slot together with every booking ever made on it.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotRecord {
    pub slot: TimeSlot,
    pub bookings: Vec<Booking>,
}

impl SlotRecord {
    pub fn active_booking(&self) -> Option<&Booking> {
        self.bookings.iter().find(|b| b.status.is_active())
    }

    /// Preserved across regeneration: an active or completed session lives here.
    pub fn is_confirmed(&self) -> bool {
        self.bookings
            .iter()
            .any(|b| b.status.is_active() || b.status == BookingStatus::Completed)
    }

    pub fn has_history(&self) -> bool {
        !self.bookings.is_empty()
    }

    /// The booking that best describes the slot for display.
    pub fn current_booking(&self) -> Option<&Booking> {
        self.active_booking()
            .or_else(|| self.bookings.iter().max_by_key(|b| b.updated_at))
    }
}

/// How a reconcile pass treats each existing slot of the window.
#[derive(Debug, Default)]
pub struct SlotPartition {
    pub preserved: Vec<SlotRecord>,
    pub retired: Vec<SlotRecord>,
    pub free: Vec<SlotRecord>,
}

impl SlotPartition {
    pub fn split(records: Vec<SlotRecord>) -> Self {
        let mut partition = SlotPartition::default();
        for record in records {
            if record.is_confirmed() {
                partition.preserved.push(record);
            } else if record.has_history() {
                partition.retired.push(record);
            } else {
                partition.free.push(record);
            }
        }
        partition
    }

    pub fn is_locked(&self) -> bool {
        self.preserved.iter().any(|r| r.active_booking().is_some())
    }
}
