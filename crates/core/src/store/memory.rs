//! In-process store: flat id-keyed maps plus foreign-key indexes, guarded by a
//! single async mutex so every trait method is one atomic unit.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::errors::{ScheduleError, ScheduleResult};
use crate::generator::exclude_overlapping;
use crate::models::booking::{Booking, BookingFilter, StatusChange};
use crate::models::mentor::Mentor;
use crate::models::schedule::{ScheduleSettings, WeekWindow};
use crate::models::time_slot::{CandidateSlot, SlotPartition, SlotRecord, TimeSlot};
use crate::store::{AppliedSettings, SchedulingStore};

#[derive(Debug, Default)]
struct Arena {
    mentors: HashMap<Uuid, Mentor>,
    settings: HashMap<Uuid, ScheduleSettings>,
    settings_by_week: HashMap<(Uuid, NaiveDate), Uuid>,
    slots: HashMap<Uuid, TimeSlot>,
    slots_by_day: BTreeMap<(Uuid, NaiveDate), Vec<Uuid>>,
    bookings: HashMap<Uuid, Booking>,
    bookings_by_slot: HashMap<Uuid, Vec<Uuid>>,
    /// At most one active booking per slot.
    active_by_slot: HashMap<Uuid, Uuid>,
}

impl Arena {
    fn record(&self, slot: &TimeSlot) -> SlotRecord {
        let bookings = self
            .bookings_by_slot
            .get(&slot.id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.bookings.get(id).cloned())
            .collect();
        SlotRecord {
            slot: slot.clone(),
            bookings,
        }
    }

    fn window_records(&self, mentor_id: Uuid, week: WeekWindow) -> Vec<SlotRecord> {
        let mut records: Vec<SlotRecord> = self
            .slots_by_day
            .range((mentor_id, week.start)..=(mentor_id, week.end))
            .flat_map(|(_, ids)| ids.iter())
            .filter_map(|id| self.slots.get(id))
            .filter(|slot| !slot.retired)
            .map(|slot| self.record(slot))
            .collect();
        records.sort_by_key(|r| (r.slot.date, r.slot.start_time));
        records
    }

    fn insert_slot(&mut self, slot: TimeSlot) {
        self.slots_by_day
            .entry((slot.mentor_id, slot.date))
            .or_default()
            .push(slot.id);
        self.slots.insert(slot.id, slot);
    }

    fn remove_slot(&mut self, slot_id: Uuid) {
        if let Some(slot) = self.slots.remove(&slot_id) {
            if let Some(ids) = self.slots_by_day.get_mut(&(slot.mentor_id, slot.date)) {
                ids.retain(|id| *id != slot_id);
            }
        }
    }

    fn free_slot(&self, slot_id: Uuid) -> ScheduleResult<&TimeSlot> {
        let slot = self
            .slots
            .get(&slot_id)
            .ok_or_else(|| ScheduleError::NotFound(format!("Time slot {} not found", slot_id)))?;
        if slot.retired {
            return Err(ScheduleError::SlotUnavailable(format!(
                "Time slot {} is no longer offered",
                slot_id
            )));
        }
        if self.active_by_slot.contains_key(&slot_id) {
            return Err(ScheduleError::SlotUnavailable(format!(
                "Time slot {} already has an active booking",
                slot_id
            )));
        }
        Ok(slot)
    }

    fn insert_booking(&mut self, booking: Booking) -> ScheduleResult<Booking> {
        let settings_id = self.free_slot(booking.time_slot_id)?.settings_id;
        if booking.status.is_active() {
            self.active_by_slot.insert(booking.time_slot_id, booking.id);
        }
        self.bookings_by_slot
            .entry(booking.time_slot_id)
            .or_default()
            .push(booking.id);
        self.bookings.insert(booking.id, booking.clone());
        self.refresh_lock(settings_id);
        Ok(booking)
    }

    fn checked_change(&self, change: &StatusChange) -> ScheduleResult<()> {
        let booking = self
            .bookings
            .get(&change.booking_id)
            .ok_or_else(|| ScheduleError::NotFound(format!("Booking {} not found", change.booking_id)))?;
        if booking.status != change.from {
            return Err(ScheduleError::InvalidState(format!(
                "Booking {} is {}, expected {}",
                booking.id, booking.status, change.from
            )));
        }
        Ok(())
    }

    fn apply_change(&mut self, change: &StatusChange) -> ScheduleResult<Booking> {
        self.checked_change(change)?;
        let booking = self
            .bookings
            .get_mut(&change.booking_id)
            .ok_or_else(|| ScheduleError::NotFound(format!("Booking {} not found", change.booking_id)))?;
        change.apply(booking);
        let updated = booking.clone();

        if !updated.status.is_active()
            && self.active_by_slot.get(&updated.time_slot_id) == Some(&updated.id)
        {
            self.active_by_slot.remove(&updated.time_slot_id);
        }
        let settings_id = self
            .slots
            .get(&updated.time_slot_id)
            .and_then(|slot| slot.settings_id);
        self.refresh_lock(settings_id);
        Ok(updated)
    }

    fn refresh_lock(&mut self, settings_id: Option<Uuid>) {
        let Some(settings_id) = settings_id else {
            return;
        };
        let locked = self
            .slots
            .values()
            .filter(|slot| slot.settings_id == Some(settings_id) && !slot.retired)
            .any(|slot| self.active_by_slot.contains_key(&slot.id));
        if let Some(settings) = self.settings.get_mut(&settings_id) {
            settings.is_locked = locked;
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    arena: Mutex<Arena>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SchedulingStore for InMemoryStore {
    async fn find_mentor(&self, mentor_id: Uuid) -> ScheduleResult<Option<Mentor>> {
        Ok(self.arena.lock().await.mentors.get(&mentor_id).cloned())
    }

    async fn upsert_mentor(&self, mentor: Mentor) -> ScheduleResult<Mentor> {
        let mut arena = self.arena.lock().await;
        let stored = arena
            .mentors
            .entry(mentor.id)
            .and_modify(|existing| existing.timezone = mentor.timezone.clone())
            .or_insert(mentor);
        Ok(stored.clone())
    }

    async fn find_settings(
        &self,
        mentor_id: Uuid,
        week_start: NaiveDate,
    ) -> ScheduleResult<Option<ScheduleSettings>> {
        let arena = self.arena.lock().await;
        Ok(arena
            .settings_by_week
            .get(&(mentor_id, week_start))
            .and_then(|id| arena.settings.get(id))
            .cloned())
    }

    async fn list_slots(&self, mentor_id: Uuid, week: WeekWindow) -> ScheduleResult<Vec<SlotRecord>> {
        Ok(self.arena.lock().await.window_records(mentor_id, week))
    }

    async fn apply_settings(
        &self,
        mut settings: ScheduleSettings,
        candidates: Vec<CandidateSlot>,
    ) -> ScheduleResult<AppliedSettings> {
        let mut arena = self.arena.lock().await;
        let week = settings.week();
        let key = (settings.mentor_id, settings.week_start_date);

        if let Some(existing) = arena.settings_by_week.get(&key).and_then(|id| arena.settings.get(id)) {
            settings.id = existing.id;
            settings.created_at = existing.created_at;
        }

        let partition = SlotPartition::split(arena.window_records(settings.mentor_id, week));
        for record in &partition.free {
            arena.remove_slot(record.slot.id);
        }
        for record in &partition.retired {
            if let Some(slot) = arena.slots.get_mut(&record.slot.id) {
                slot.retired = true;
            }
        }

        let kept: Vec<TimeSlot> = partition.preserved.iter().map(|r| r.slot.clone()).collect();
        let fresh = exclude_overlapping(candidates, &kept);
        let inserted = fresh.len();
        for candidate in &fresh {
            arena.insert_slot(TimeSlot::from_candidate(
                candidate,
                settings.mentor_id,
                settings.id,
                settings.updated_at,
            ));
        }

        settings.is_locked = partition.is_locked();
        arena.settings_by_week.insert(key, settings.id);
        arena.settings.insert(settings.id, settings.clone());

        debug!(
            "In-memory settings applied: settings_id={}, preserved={}, retired={}, removed={}, inserted={}",
            settings.id,
            partition.preserved.len(),
            partition.retired.len(),
            partition.free.len(),
            inserted
        );

        Ok(AppliedSettings {
            slots: arena.window_records(settings.mentor_id, week),
            settings,
            preserved: partition.preserved.len(),
            retired: partition.retired.len(),
            removed: partition.free.len(),
            inserted,
        })
    }

    async fn delete_settings(&self, mentor_id: Uuid, week: WeekWindow) -> ScheduleResult<()> {
        let mut arena = self.arena.lock().await;
        let settings_id = arena
            .settings_by_week
            .get(&(mentor_id, week.start))
            .copied()
            .ok_or_else(|| {
                ScheduleError::NotFound(format!(
                    "No schedule settings for mentor {} in week of {}",
                    mentor_id, week.start
                ))
            })?;

        let partition = SlotPartition::split(arena.window_records(mentor_id, week));
        if partition.is_locked() {
            return Err(ScheduleError::InvalidState(
                "Schedule settings are locked by active bookings".to_string(),
            ));
        }

        for record in &partition.free {
            arena.remove_slot(record.slot.id);
        }
        for record in partition.preserved.iter().chain(partition.retired.iter()) {
            if let Some(slot) = arena.slots.get_mut(&record.slot.id) {
                slot.retired = true;
                slot.settings_id = None;
            }
        }
        arena.settings_by_week.remove(&(mentor_id, week.start));
        arena.settings.remove(&settings_id);
        Ok(())
    }

    async fn find_slot(&self, slot_id: Uuid) -> ScheduleResult<Option<TimeSlot>> {
        Ok(self.arena.lock().await.slots.get(&slot_id).cloned())
    }

    async fn find_booking(&self, booking_id: Uuid) -> ScheduleResult<Option<Booking>> {
        Ok(self.arena.lock().await.bookings.get(&booking_id).cloned())
    }

    async fn list_bookings(&self, filter: BookingFilter) -> ScheduleResult<Vec<Booking>> {
        let arena = self.arena.lock().await;
        let mut bookings: Vec<Booking> = arena
            .bookings
            .values()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.booked_on.cmp(&a.booked_on));
        Ok(bookings)
    }

    async fn insert_booking_if_free(&self, booking: Booking) -> ScheduleResult<Booking> {
        self.arena.lock().await.insert_booking(booking)
    }

    async fn transition_booking(&self, change: StatusChange) -> ScheduleResult<Booking> {
        self.arena.lock().await.apply_change(&change)
    }

    async fn swap_booking(&self, cancel: StatusChange, replacement: Booking) -> ScheduleResult<Booking> {
        let mut arena = self.arena.lock().await;
        // Validate both halves before touching anything.
        arena.checked_change(&cancel)?;
        arena.free_slot(replacement.time_slot_id)?;

        arena.apply_change(&cancel)?;
        arena.insert_booking(replacement)
    }
}
