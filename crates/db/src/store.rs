//! Postgres-backed [`SchedulingStore`].
//!
//! Each trait method runs in one transaction; returning early drops the
//! transaction and rolls it back. Double booking is prevented by the partial
//! unique index on active bookings, with the slot row lock queuing writers in
//! front of it.
//!
//! Row locks are always taken slots first, then settings. Several slots are
//! locked in `(date, start, id)` order and several settings rows in id order.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use eyre::WrapErr;
use mentorsync_core::errors::{ScheduleError, ScheduleResult};
use mentorsync_core::generator::exclude_overlapping;
use mentorsync_core::models::booking::{Booking, BookingFilter, StatusChange};
use mentorsync_core::models::mentor::Mentor;
use mentorsync_core::models::schedule::{ScheduleSettings, WeekWindow};
use mentorsync_core::models::time_slot::{CandidateSlot, SlotPartition, SlotRecord, TimeSlot};
use mentorsync_core::store::{AppliedSettings, SchedulingStore};
use sqlx::PgConnection;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::DbTimeSlot;
use crate::repositories::{booking, mentor, schedule_settings, time_slot};
use crate::DbPool;

#[derive(Debug, Clone)]
pub struct PgSchedulingStore {
    pool: DbPool,
}

impl PgSchedulingStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> ScheduleResult<sqlx::Transaction<'static, sqlx::Postgres>> {
        Ok(self.pool.begin().await.wrap_err("Failed to start transaction")?)
    }
}

/// Attaches every booking to its slot, keeping slot order.
async fn load_records(conn: &mut PgConnection, slots: Vec<DbTimeSlot>) -> ScheduleResult<Vec<SlotRecord>> {
    let ids: Vec<Uuid> = slots.iter().map(|s| s.id).collect();
    let mut by_slot: HashMap<Uuid, Vec<Booking>> = HashMap::new();
    for row in booking::get_bookings_for_slots(conn, &ids).await? {
        let booking = Booking::try_from(row)?;
        by_slot.entry(booking.time_slot_id).or_default().push(booking);
    }

    Ok(slots
        .into_iter()
        .map(|row| {
            let bookings = by_slot.remove(&row.id).unwrap_or_default();
            SlotRecord {
                slot: TimeSlot::from(row),
                bookings,
            }
        })
        .collect())
}

async fn refresh_lock(conn: &mut PgConnection, settings_id: Option<Uuid>) -> ScheduleResult<()> {
    if let Some(settings_id) = settings_id {
        schedule_settings::refresh_lock(conn, settings_id).await?;
    }
    Ok(())
}

/// Locks the slot and checks it can take a new booking.
async fn lock_free_slot(conn: &mut PgConnection, slot_id: Uuid) -> ScheduleResult<TimeSlot> {
    let slot: TimeSlot = time_slot::lock_time_slot(conn, slot_id)
        .await?
        .ok_or_else(|| ScheduleError::NotFound(format!("Time slot {} not found", slot_id)))?
        .into();
    if slot.retired {
        return Err(ScheduleError::SlotUnavailable(format!(
            "Time slot {} is no longer offered",
            slot_id
        )));
    }
    Ok(slot)
}

async fn insert_on_locked_slot(conn: &mut PgConnection, slot: &TimeSlot, new: &Booking) -> ScheduleResult<Booking> {
    let row = booking::insert_booking(conn, new).await?.ok_or_else(|| {
        ScheduleError::SlotUnavailable(format!(
            "Time slot {} already has an active booking",
            new.time_slot_id
        ))
    })?;
    refresh_lock(conn, slot.settings_id).await?;
    Booking::try_from(row)
}

/// Status compare-and-set that explains why nothing was updated.
async fn change_status(conn: &mut PgConnection, change: &StatusChange) -> ScheduleResult<Booking> {
    if let Some(row) = booking::update_booking_status(conn, change).await? {
        return Booking::try_from(row);
    }

    match booking::get_booking_by_id(conn, change.booking_id).await? {
        None => Err(ScheduleError::NotFound(format!(
            "Booking {} not found",
            change.booking_id
        ))),
        Some(row) => Err(ScheduleError::InvalidState(format!(
            "Booking {} is {}, expected {}",
            row.id, row.status, change.from
        ))),
    }
}

/// Order in which a transaction touching several slots must lock them.
fn slot_lock_order(mut slots: Vec<TimeSlot>) -> Vec<Uuid> {
    slots.sort_by_key(|slot| (slot.date, slot.start_time, slot.id));
    slots.dedup_by_key(|slot| slot.id);
    slots.into_iter().map(|slot| slot.id).collect()
}

/// Order in which a transaction touching several settings rows must lock them.
fn settings_lock_order(ids: impl IntoIterator<Item = Option<Uuid>>) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = ids.into_iter().flatten().collect();
    ids.sort();
    ids.dedup();
    ids
}

async fn settings_of_slot(conn: &mut PgConnection, slot_id: Uuid) -> ScheduleResult<Option<Uuid>> {
    Ok(time_slot::get_time_slot_by_id(conn, slot_id)
        .await?
        .and_then(|slot| slot.settings_id))
}

#[async_trait]
impl SchedulingStore for PgSchedulingStore {
    async fn find_mentor(&self, mentor_id: Uuid) -> ScheduleResult<Option<Mentor>> {
        let mut conn = self.pool.acquire().await.wrap_err("Failed to acquire connection")?;
        Ok(mentor::get_mentor_by_id(&mut conn, mentor_id).await?.map(Mentor::from))
    }

    async fn upsert_mentor(&self, new: Mentor) -> ScheduleResult<Mentor> {
        let mut conn = self.pool.acquire().await.wrap_err("Failed to acquire connection")?;
        let row = mentor::upsert_mentor(&mut conn, new.id, &new.timezone, new.created_at).await?;
        Ok(row.into())
    }

    async fn find_settings(
        &self,
        mentor_id: Uuid,
        week_start: NaiveDate,
    ) -> ScheduleResult<Option<ScheduleSettings>> {
        let mut conn = self.pool.acquire().await.wrap_err("Failed to acquire connection")?;
        Ok(schedule_settings::get_settings_by_week(&mut conn, mentor_id, week_start)
            .await?
            .map(ScheduleSettings::from))
    }

    async fn list_slots(&self, mentor_id: Uuid, week: WeekWindow) -> ScheduleResult<Vec<SlotRecord>> {
        let mut tx = self.begin().await?;
        let slots = time_slot::get_week_slots(&mut tx, mentor_id, week, false).await?;
        let records = load_records(&mut tx, slots).await?;
        tx.commit().await.wrap_err("Failed to commit slot listing")?;
        Ok(records)
    }

    async fn apply_settings(
        &self,
        settings: ScheduleSettings,
        candidates: Vec<CandidateSlot>,
    ) -> ScheduleResult<AppliedSettings> {
        let mut tx = self.begin().await?;
        let week = settings.week();

        // Slot locks are always taken before the settings row, matching the
        // booking path. The second read picks up slots committed by a save
        // that held the settings row before us.
        time_slot::get_week_slots(&mut tx, settings.mentor_id, week, true).await?;
        let stored = schedule_settings::upsert_settings(&mut tx, &settings).await?;
        let slots = time_slot::get_week_slots(&mut tx, settings.mentor_id, week, true).await?;

        let partition = SlotPartition::split(load_records(&mut tx, slots).await?);
        let free: Vec<Uuid> = partition.free.iter().map(|r| r.slot.id).collect();
        let retired: Vec<Uuid> = partition.retired.iter().map(|r| r.slot.id).collect();
        time_slot::delete_time_slots(&mut tx, &free).await?;
        time_slot::retire_time_slots(&mut tx, &retired, false).await?;

        let kept: Vec<TimeSlot> = partition.preserved.iter().map(|r| r.slot.clone()).collect();
        let fresh = exclude_overlapping(candidates, &kept);
        for candidate in &fresh {
            let slot = TimeSlot::from_candidate(candidate, stored.mentor_id, stored.id, stored.updated_at);
            time_slot::insert_time_slot(&mut tx, &slot).await?;
        }

        let settings: ScheduleSettings = schedule_settings::refresh_lock(&mut tx, stored.id)
            .await?
            .unwrap_or(stored)
            .into();
        let slots = time_slot::get_week_slots(&mut tx, settings.mentor_id, week, false).await?;
        let records = load_records(&mut tx, slots).await?;

        tx.commit().await.wrap_err("Failed to commit schedule settings")?;

        debug!(
            "Settings applied: settings_id={}, preserved={}, retired={}, removed={}, inserted={}",
            settings.id,
            partition.preserved.len(),
            retired.len(),
            free.len(),
            fresh.len()
        );

        Ok(AppliedSettings {
            settings,
            slots: records,
            preserved: partition.preserved.len(),
            retired: retired.len(),
            removed: free.len(),
            inserted: fresh.len(),
        })
    }

    async fn delete_settings(&self, mentor_id: Uuid, week: WeekWindow) -> ScheduleResult<()> {
        let mut tx = self.begin().await?;

        let slots = time_slot::get_week_slots(&mut tx, mentor_id, week, true).await?;
        let settings = schedule_settings::get_settings_by_week(&mut tx, mentor_id, week.start)
            .await?
            .ok_or_else(|| {
                ScheduleError::NotFound(format!(
                    "No schedule settings for mentor {} in week of {}",
                    mentor_id, week.start
                ))
            })?;

        let partition = SlotPartition::split(load_records(&mut tx, slots).await?);
        if partition.is_locked() {
            return Err(ScheduleError::InvalidState(
                "Schedule settings are locked by active bookings".to_string(),
            ));
        }

        let free: Vec<Uuid> = partition.free.iter().map(|r| r.slot.id).collect();
        let kept: Vec<Uuid> = partition
            .preserved
            .iter()
            .chain(partition.retired.iter())
            .map(|r| r.slot.id)
            .collect();
        time_slot::delete_time_slots(&mut tx, &free).await?;
        time_slot::retire_time_slots(&mut tx, &kept, true).await?;
        schedule_settings::delete_settings(&mut tx, settings.id).await?;

        tx.commit().await.wrap_err("Failed to commit settings deletion")?;
        info!(
            "Schedule settings deleted: mentor={}, week_start={}, kept_for_history={}",
            mentor_id,
            week.start,
            kept.len()
        );
        Ok(())
    }

    async fn find_slot(&self, slot_id: Uuid) -> ScheduleResult<Option<TimeSlot>> {
        let mut conn = self.pool.acquire().await.wrap_err("Failed to acquire connection")?;
        Ok(time_slot::get_time_slot_by_id(&mut conn, slot_id).await?.map(TimeSlot::from))
    }

    async fn find_booking(&self, booking_id: Uuid) -> ScheduleResult<Option<Booking>> {
        let mut conn = self.pool.acquire().await.wrap_err("Failed to acquire connection")?;
        booking::get_booking_by_id(&mut conn, booking_id)
            .await?
            .map(Booking::try_from)
            .transpose()
    }

    async fn list_bookings(&self, filter: BookingFilter) -> ScheduleResult<Vec<Booking>> {
        let mut conn = self.pool.acquire().await.wrap_err("Failed to acquire connection")?;
        booking::list_bookings(&mut conn, filter)
            .await?
            .into_iter()
            .map(Booking::try_from)
            .collect()
    }

    async fn insert_booking_if_free(&self, new: Booking) -> ScheduleResult<Booking> {
        let mut tx = self.begin().await?;
        let slot = lock_free_slot(&mut tx, new.time_slot_id).await?;
        let stored = insert_on_locked_slot(&mut tx, &slot, &new).await?;
        tx.commit().await.wrap_err("Failed to commit booking")?;
        Ok(stored)
    }

    async fn transition_booking(&self, change: StatusChange) -> ScheduleResult<Booking> {
        let mut tx = self.begin().await?;
        let updated = change_status(&mut tx, &change).await?;
        let settings_id = settings_of_slot(&mut tx, updated.time_slot_id).await?;
        refresh_lock(&mut tx, settings_id).await?;
        tx.commit().await.wrap_err("Failed to commit booking status change")?;
        Ok(updated)
    }

    async fn swap_booking(&self, cancel: StatusChange, replacement: Booking) -> ScheduleResult<Booking> {
        let mut tx = self.begin().await?;

        let original = booking::get_booking_by_id(&mut tx, cancel.booking_id)
            .await?
            .ok_or_else(|| ScheduleError::NotFound(format!("Booking {} not found", cancel.booking_id)))?;
        let mut slots = Vec::with_capacity(2);
        for slot_id in [original.time_slot_id, replacement.time_slot_id] {
            let slot = time_slot::get_time_slot_by_id(&mut tx, slot_id)
                .await?
                .ok_or_else(|| ScheduleError::NotFound(format!("Time slot {} not found", slot_id)))?;
            slots.push(TimeSlot::from(slot));
        }

        let mut target = None;
        let mut settings_ids = Vec::with_capacity(2);
        for slot_id in slot_lock_order(slots) {
            let slot = if slot_id == replacement.time_slot_id {
                let slot = lock_free_slot(&mut tx, slot_id).await?;
                target = Some(slot.clone());
                slot
            } else {
                time_slot::lock_time_slot(&mut tx, slot_id)
                    .await?
                    .ok_or_else(|| ScheduleError::NotFound(format!("Time slot {} not found", slot_id)))?
                    .into()
            };
            settings_ids.push(slot.settings_id);
        }
        let target = target.ok_or_else(|| {
            ScheduleError::NotFound(format!("Time slot {} not found", replacement.time_slot_id))
        })?;

        change_status(&mut tx, &cancel).await?;
        let row = booking::insert_booking(&mut tx, &replacement).await?.ok_or_else(|| {
            ScheduleError::SlotUnavailable(format!(
                "Time slot {} already has an active booking",
                target.id
            ))
        })?;
        let stored = Booking::try_from(row)?;
        for settings_id in settings_lock_order(settings_ids) {
            schedule_settings::refresh_lock(&mut tx, settings_id).await?;
        }

        tx.commit().await.wrap_err("Failed to commit reschedule")?;
        Ok(stored)
    }
}
