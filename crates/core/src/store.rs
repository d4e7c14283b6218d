//! # Scheduling Store
//!
//! The persistence contract the engine runs against. Every method that changes
//! more than one row is a single atomic unit in the implementation: either all
//! of its writes commit or none do. Booking creation and reschedule rely on the
//! store's own serialization point (a uniqueness guarantee on active bookings
//! per slot), never on in-process locks held by the caller.

pub mod memory;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::errors::ScheduleResult;
use crate::models::booking::{Booking, BookingFilter, StatusChange};
use crate::models::mentor::Mentor;
use crate::models::schedule::{ScheduleSettings, WeekWindow};
use crate::models::time_slot::{CandidateSlot, SlotRecord, TimeSlot};

/// Result of an atomic settings save.
#[derive(Debug, Clone)]
pub struct AppliedSettings {
    pub settings: ScheduleSettings,
    /// Live slots of the window after the save, in `(date, start_time)` order.
    pub slots: Vec<SlotRecord>,
    pub preserved: usize,
    pub retired: usize,
    pub removed: usize,
    pub inserted: usize,
}

#[async_trait]
pub trait SchedulingStore: Send + Sync {
    async fn find_mentor(&self, mentor_id: Uuid) -> ScheduleResult<Option<Mentor>>;

    async fn upsert_mentor(&self, mentor: Mentor) -> ScheduleResult<Mentor>;

    async fn find_settings(
        &self,
        mentor_id: Uuid,
        week_start: NaiveDate,
    ) -> ScheduleResult<Option<ScheduleSettings>>;

    /// Live (non-retired) slots of the mentor's window with their bookings.
    async fn list_slots(&self, mentor_id: Uuid, week: WeekWindow) -> ScheduleResult<Vec<SlotRecord>>;

    /// Upserts `settings` by (mentor, week start) and replaces the window's free
    /// slots with `candidates`, keeping confirmed slots untouched, retiring
    /// superseded slots that carry booking history and skipping candidates that
    /// overlap a kept slot. Recomputes `is_locked`.
    async fn apply_settings(
        &self,
        settings: ScheduleSettings,
        candidates: Vec<CandidateSlot>,
    ) -> ScheduleResult<AppliedSettings>;

    /// Removes the settings row and its free slots. `InvalidState` while any
    /// slot of the window holds an active booking.
    async fn delete_settings(&self, mentor_id: Uuid, week: WeekWindow) -> ScheduleResult<()>;

    async fn find_slot(&self, slot_id: Uuid) -> ScheduleResult<Option<TimeSlot>>;

    async fn find_booking(&self, booking_id: Uuid) -> ScheduleResult<Option<Booking>>;

    /// Newest first.
    async fn list_bookings(&self, filter: BookingFilter) -> ScheduleResult<Vec<Booking>>;

    /// Atomic check-and-create: `SlotUnavailable` when the slot already has an
    /// active booking or has been retired, `NotFound` when it no longer exists.
    async fn insert_booking_if_free(&self, booking: Booking) -> ScheduleResult<Booking>;

    /// Applies `change` only if the booking is still in `change.from`;
    /// otherwise `InvalidState`.
    async fn transition_booking(&self, change: StatusChange) -> ScheduleResult<Booking>;

    /// Applies `cancel` to the old booking and inserts `replacement` as one
    /// unit. On any failure the old booking is left as it was.
    async fn swap_booking(&self, cancel: StatusChange, replacement: Booking) -> ScheduleResult<Booking>;
}
