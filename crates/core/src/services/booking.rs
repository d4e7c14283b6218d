//! # Booking Arbiter
//!
//! Validates who may do what to a booking, then hands the actual state change
//! to the store as a single atomic operation. The only serialization point for
//! a slot is the store's check-and-create; two learners racing for the same
//! slot end with one `Requested` booking and one `SlotUnavailable`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clock::{local_to_utc, starts_after, Clock};
use crate::errors::{ScheduleError, ScheduleResult};
use crate::lifecycle::{plan_change, BookingAction};
use crate::models::booking::{Booking, BookingFilter, BookingRole};
use crate::models::time_slot::TimeSlot;
use crate::store::SchedulingStore;

pub struct BookingService {
    store: Arc<dyn SchedulingStore>,
    clock: Arc<dyn Clock>,
}

impl BookingService {
    pub fn new(store: Arc<dyn SchedulingStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    async fn booking(&self, booking_id: Uuid) -> ScheduleResult<Booking> {
        self.store
            .find_booking(booking_id)
            .await?
            .ok_or_else(|| ScheduleError::NotFound(format!("Booking {} not found", booking_id)))
    }

    async fn slot(&self, slot_id: Uuid) -> ScheduleResult<TimeSlot> {
        self.store
            .find_slot(slot_id)
            .await?
            .ok_or_else(|| ScheduleError::NotFound(format!("Time slot {} not found", slot_id)))
    }

    /// Checks everything about a slot that does not depend on other bookings.
    async fn ensure_bookable(&self, slot: &TimeSlot, learner_id: Uuid, now: DateTime<Utc>) -> ScheduleResult<()> {
        if slot.mentor_id == learner_id {
            return Err(ScheduleError::Unauthorized(
                "Mentors cannot book their own slots".to_string(),
            ));
        }
        if slot.retired {
            return Err(ScheduleError::SlotUnavailable(format!(
                "Time slot {} is no longer offered",
                slot.id
            )));
        }

        let mentor = self
            .store
            .find_mentor(slot.mentor_id)
            .await?
            .ok_or_else(|| ScheduleError::NotFound(format!("Mentor {} not found", slot.mentor_id)))?;
        if !starts_after(mentor.tz()?, slot.date, slot.start_time, now) {
            return Err(ScheduleError::SlotUnavailable(format!(
                "Time slot {} has already started",
                slot.id
            )));
        }
        Ok(())
    }

    pub async fn request_booking(&self, time_slot_id: Uuid, learner_id: Uuid) -> ScheduleResult<Booking> {
        let now = self.clock.now();
        let slot = self.slot(time_slot_id).await?;
        self.ensure_bookable(&slot, learner_id, now).await?;

        let booking = Booking::requested(slot.id, slot.mentor_id, learner_id, now);
        match self.store.insert_booking_if_free(booking).await {
            Ok(booking) => {
                info!(
                    "Booking requested: id={}, slot={}, learner={}",
                    booking.id, booking.time_slot_id, booking.learner_id
                );
                Ok(booking)
            }
            Err(err @ ScheduleError::SlotUnavailable(_)) => {
                debug!("Booking request lost slot {} to another learner", time_slot_id);
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    async fn mentor_action(&self, booking_id: Uuid, mentor_id: Uuid, action: BookingAction) -> ScheduleResult<Booking> {
        let booking = self.booking(booking_id).await?;
        if booking.mentor_id != mentor_id {
            return Err(ScheduleError::Unauthorized(format!(
                "Only the owning mentor can {} this booking",
                action
            )));
        }

        let change = plan_change(booking.id, booking.status, action, self.clock.now())?;
        let updated = self.store.transition_booking(change).await?;
        info!("Booking {}: id={}, {} -> {}", action, updated.id, change.from, change.to);
        Ok(updated)
    }

    pub async fn accept_booking(&self, booking_id: Uuid, mentor_id: Uuid) -> ScheduleResult<Booking> {
        self.mentor_action(booking_id, mentor_id, BookingAction::Accept).await
    }

    /// Declining frees the slot at once.
    pub async fn decline_booking(&self, booking_id: Uuid, mentor_id: Uuid) -> ScheduleResult<Booking> {
        self.mentor_action(booking_id, mentor_id, BookingAction::Decline).await
    }

    /// Marks an approved session completed once its end has passed.
    pub async fn complete_booking(&self, booking_id: Uuid, mentor_id: Uuid) -> ScheduleResult<Booking> {
        let booking = self.booking(booking_id).await?;
        if booking.mentor_id != mentor_id {
            return Err(ScheduleError::Unauthorized(
                "Only the owning mentor can complete this booking".to_string(),
            ));
        }
        let slot = self.slot(booking.time_slot_id).await?;
        let mentor = self
            .store
            .find_mentor(slot.mentor_id)
            .await?
            .ok_or_else(|| ScheduleError::NotFound(format!("Mentor {} not found", slot.mentor_id)))?;
        let ends_at = local_to_utc(mentor.tz()?, slot.date, slot.end_time);
        if ends_at > self.clock.now() {
            return Err(ScheduleError::InvalidState(format!(
                "Session for booking {} has not ended yet",
                booking_id
            )));
        }
        self.mentor_action(booking_id, mentor_id, BookingAction::Complete).await
    }

    pub async fn cancel_booking(&self, booking_id: Uuid, actor_id: Uuid) -> ScheduleResult<Booking> {
        let booking = self.booking(booking_id).await?;
        if !booking.involves(actor_id) {
            return Err(ScheduleError::Unauthorized(
                "Only the learner or the mentor can cancel this booking".to_string(),
            ));
        }

        let change = plan_change(booking.id, booking.status, BookingAction::Cancel, self.clock.now())?;
        let updated = self.store.transition_booking(change).await?;
        info!("Booking cancelled: id={}, by={}", updated.id, actor_id);
        Ok(updated)
    }

    /// Moves the learner's active booking to `new_time_slot_id` as one unit.
    ///
    /// Failures come back as `RescheduleFailed`, reporting whether the
    /// original booking is still active.
    pub async fn reschedule_booking(
        &self,
        booking_id: Uuid,
        learner_id: Uuid,
        new_time_slot_id: Uuid,
    ) -> ScheduleResult<Booking> {
        match self.try_reschedule(booking_id, learner_id, new_time_slot_id).await {
            Ok(booking) => Ok(booking),
            Err(source) => {
                let original_preserved = match self.store.find_booking(booking_id).await {
                    Ok(Some(original)) => original.status.is_active(),
                    Ok(None) => false,
                    Err(lookup) => {
                        warn!("Could not re-read booking {} after failed reschedule: {}", booking_id, lookup);
                        false
                    }
                };
                warn!(
                    "Reschedule failed: booking={}, target={}, original_preserved={}, reason={}",
                    booking_id, new_time_slot_id, original_preserved, source
                );
                Err(ScheduleError::RescheduleFailed {
                    original_preserved,
                    source: Box::new(source),
                })
            }
        }
    }

    async fn try_reschedule(
        &self,
        booking_id: Uuid,
        learner_id: Uuid,
        new_time_slot_id: Uuid,
    ) -> ScheduleResult<Booking> {
        let now = self.clock.now();
        let original = self.booking(booking_id).await?;
        if original.learner_id != learner_id {
            return Err(ScheduleError::Unauthorized(
                "Only the learner who booked can reschedule".to_string(),
            ));
        }
        let cancel = plan_change(original.id, original.status, BookingAction::Cancel, now)?;
        if original.time_slot_id == new_time_slot_id {
            return Err(ScheduleError::Validation(
                "Booking is already on the requested time slot".to_string(),
            ));
        }

        let slot = self.slot(new_time_slot_id).await?;
        self.ensure_bookable(&slot, learner_id, now).await?;

        let mut replacement = Booking::requested(slot.id, slot.mentor_id, learner_id, now);
        replacement.rescheduled_from = Some(original.id);

        let booking = self.store.swap_booking(cancel, replacement).await?;
        info!(
            "Booking rescheduled: old={}, new={}, slot={}",
            original.id, booking.id, booking.time_slot_id
        );
        Ok(booking)
    }

    pub async fn get_booking(&self, booking_id: Uuid, actor_id: Uuid) -> ScheduleResult<Booking> {
        let booking = self.booking(booking_id).await?;
        if !booking.involves(actor_id) {
            return Err(ScheduleError::Unauthorized(
                "Bookings are visible to their learner and mentor only".to_string(),
            ));
        }
        Ok(booking)
    }

    pub async fn list_bookings(&self, actor_id: Uuid, role: BookingRole) -> ScheduleResult<Vec<Booking>> {
        self.store
            .list_bookings(BookingFilter::for_role(role, actor_id))
            .await
    }
}
