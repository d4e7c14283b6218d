use async_trait::async_trait;
use chrono::NaiveDate;
use mentorsync_core::errors::ScheduleResult;
use mentorsync_core::models::booking::{Booking, BookingFilter, StatusChange};
use mentorsync_core::models::mentor::Mentor;
use mentorsync_core::models::schedule::{ScheduleSettings, WeekWindow};
use mentorsync_core::models::time_slot::{CandidateSlot, SlotRecord, TimeSlot};
use mentorsync_core::store::{AppliedSettings, SchedulingStore};
use mockall::mock;
use uuid::Uuid;

// Mock store for handler tests that need to script store failures
mock! {
    pub SchedulingStore {}

    #[async_trait]
    impl SchedulingStore for SchedulingStore {
        async fn find_mentor(&self, mentor_id: Uuid) -> ScheduleResult<Option<Mentor>>;

        async fn upsert_mentor(&self, mentor: Mentor) -> ScheduleResult<Mentor>;

        async fn find_settings(
            &self,
            mentor_id: Uuid,
            week_start: NaiveDate,
        ) -> ScheduleResult<Option<ScheduleSettings>>;

        async fn list_slots(&self, mentor_id: Uuid, week: WeekWindow) -> ScheduleResult<Vec<SlotRecord>>;

        async fn apply_settings(
            &self,
            settings: ScheduleSettings,
            candidates: Vec<CandidateSlot>,
        ) -> ScheduleResult<AppliedSettings>;

        async fn delete_settings(&self, mentor_id: Uuid, week: WeekWindow) -> ScheduleResult<()>;

        async fn find_slot(&self, slot_id: Uuid) -> ScheduleResult<Option<TimeSlot>>;

        async fn find_booking(&self, booking_id: Uuid) -> ScheduleResult<Option<Booking>>;

        async fn list_bookings(&self, filter: BookingFilter) -> ScheduleResult<Vec<Booking>>;

        async fn insert_booking_if_free(&self, booking: Booking) -> ScheduleResult<Booking>;

        async fn transition_booking(&self, change: StatusChange) -> ScheduleResult<Booking>;

        async fn swap_booking(&self, cancel: StatusChange, replacement: Booking) -> ScheduleResult<Booking>;
    }
}
