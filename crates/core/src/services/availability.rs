//! # Availability
//!
//! Reconciles a mentor's weekly settings with the stored slots and renders the
//! per-date view learners book from.
//!
//! A settings save regenerates only the *free* part of the week. Slots holding
//! an active or completed booking are kept exactly as stored, even when the new
//! hours would no longer produce them, and fresh candidates that would overlap
//! them are skipped. Editing hours can therefore never cancel a learner's
//! session behind their back.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Days, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::{debug, info};
use uuid::Uuid;

use crate::clock::{local_today, starts_after, Clock};
use crate::errors::{ScheduleError, ScheduleResult};
use crate::generator::generate_slots;
use crate::models::mentor::{parse_timezone, Mentor, DEFAULT_TIMEZONE};
use crate::models::schedule::{
    SaveScheduleSettingsRequest, ScheduleSettings, ScheduleSettingsView, SlotRules, SlotView,
    WeekWindow,
};
use crate::models::time_slot::SlotRecord;
use crate::store::{AppliedSettings, SchedulingStore};

/// How many weeks past the current one a read may fill with default rules.
pub const DEFAULT_FILL_HORIZON_WEEKS: u32 = 8;

pub struct AvailabilityService {
    store: Arc<dyn SchedulingStore>,
    clock: Arc<dyn Clock>,
    default_rules: SlotRules,
    default_timezone: String,
    fill_horizon_weeks: u32,
}

impl AvailabilityService {
    pub fn new(store: Arc<dyn SchedulingStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            default_rules: SlotRules::default(),
            default_timezone: DEFAULT_TIMEZONE.to_string(),
            fill_horizon_weeks: DEFAULT_FILL_HORIZON_WEEKS,
        }
    }

    pub fn with_fill_horizon(mut self, weeks: u32) -> Self {
        self.fill_horizon_weeks = weeks;
        self
    }

    /// Rules used for weeks the mentor never configured, and the zone given to
    /// mentors registered without one.
    pub fn with_defaults(mut self, rules: SlotRules, timezone: impl Into<String>) -> Self {
        self.default_rules = rules;
        self.default_timezone = timezone.into();
        self
    }

    pub fn default_rules(&self) -> SlotRules {
        self.default_rules
    }

    /// Reads persist default settings only for weeks that have not ended and
    /// start within the fill horizon of the mentor's local today.
    fn fills_defaults(&self, week: WeekWindow, today: NaiveDate) -> bool {
        if week.end < today {
            return false;
        }
        let horizon = Days::new(u64::from(self.fill_horizon_weeks) * 7);
        match today.checked_add_days(horizon) {
            Some(limit) => week.start <= limit,
            None => true,
        }
    }

    pub async fn register_mentor(&self, mentor_id: Uuid, timezone: Option<String>) -> ScheduleResult<Mentor> {
        let existing = self.store.find_mentor(mentor_id).await?;
        let timezone = match (timezone, &existing) {
            (Some(tz), _) => tz,
            (None, Some(mentor)) => mentor.timezone.clone(),
            (None, None) => self.default_timezone.clone(),
        };
        parse_timezone(&timezone)?;

        let mentor = Mentor {
            id: mentor_id,
            timezone,
            created_at: existing.map(|m| m.created_at).unwrap_or_else(|| self.clock.now()),
        };
        let mentor = self.store.upsert_mentor(mentor).await?;
        info!("Mentor registered: id={}, timezone={}", mentor.id, mentor.timezone);
        Ok(mentor)
    }

    async fn mentor(&self, mentor_id: Uuid) -> ScheduleResult<(Mentor, Tz)> {
        let mentor = self
            .store
            .find_mentor(mentor_id)
            .await?
            .ok_or_else(|| ScheduleError::NotFound(format!("Mentor {} not found", mentor_id)))?;
        let tz = mentor.tz()?;
        Ok((mentor, tz))
    }

    /// The settings view for the week starting `week_start`, or the mentor's
    /// current local week. A week without settings is filled from the default
    /// rules when it lies within the fill horizon; further weeks come back
    /// with the default rules and no slots.
    pub async fn get_schedule_settings(
        &self,
        mentor_id: Uuid,
        week_start: Option<NaiveDate>,
    ) -> ScheduleResult<ScheduleSettingsView> {
        let (mentor, tz) = self.mentor(mentor_id).await?;
        let now = self.clock.now();
        let today = local_today(tz, now);
        let week = match week_start {
            Some(start) => WeekWindow::starting(start)?,
            None => WeekWindow::containing(today)?,
        };

        let (settings, slots) = match self.store.find_settings(mentor_id, week.start).await? {
            Some(settings) => {
                let slots = self.store.list_slots(mentor_id, week).await?;
                (settings, slots)
            }
            None if self.fills_defaults(week, today) => {
                debug!(
                    "No settings for mentor {} in week of {}, applying defaults",
                    mentor_id, week.start
                );
                let applied = self.reconcile(&mentor, week, self.default_rules).await?;
                (applied.settings, applied.slots)
            }
            None => {
                debug!(
                    "No settings for mentor {} in week of {}, outside the fill horizon",
                    mentor_id, week.start
                );
                let unsaved = ScheduleSettings::new(mentor_id, week, self.default_rules, now);
                (unsaved, Vec::new())
            }
        };

        Ok(build_view(settings, &mentor.timezone, tz, &slots, now))
    }

    pub async fn save_schedule_settings(
        &self,
        mentor_id: Uuid,
        request: SaveScheduleSettingsRequest,
    ) -> ScheduleResult<ScheduleSettingsView> {
        let week = request.week()?;
        let rules = request.rules();
        rules.validate()?;

        let (mentor, tz) = self.mentor(mentor_id).await?;
        let applied = self.reconcile(&mentor, week, rules).await?;
        Ok(build_view(
            applied.settings,
            &mentor.timezone,
            tz,
            &applied.slots,
            self.clock.now(),
        ))
    }

    /// Regenerates the free slots of `week` from `rules`.
    pub async fn reconcile(
        &self,
        mentor: &Mentor,
        week: WeekWindow,
        rules: SlotRules,
    ) -> ScheduleResult<AppliedSettings> {
        let tz = mentor.tz()?;
        let now = self.clock.now();
        let candidates = generate_slots(&rules, &week, tz, now)?;

        let settings = match self.store.find_settings(mentor.id, week.start).await? {
            Some(mut existing) => {
                existing.apply_rules(rules, now);
                existing
            }
            None => ScheduleSettings::new(mentor.id, week, rules, now),
        };

        let applied = self.store.apply_settings(settings, candidates).await?;
        info!(
            "Schedule reconciled: mentor={}, week={}, preserved={}, retired={}, removed={}, inserted={}, locked={}",
            mentor.id,
            week.start,
            applied.preserved,
            applied.retired,
            applied.removed,
            applied.inserted,
            applied.settings.is_locked
        );
        Ok(applied)
    }

    pub async fn delete_schedule_settings(&self, mentor_id: Uuid, week_start: NaiveDate) -> ScheduleResult<()> {
        let week = WeekWindow::starting(week_start)?;
        self.mentor(mentor_id).await?;
        self.store.delete_settings(mentor_id, week).await?;
        info!("Schedule settings deleted: mentor={}, week={}", mentor_id, week.start);
        Ok(())
    }
}

/// Overlays booking state onto stored slots, grouped by date.
pub fn build_view(
    settings: ScheduleSettings,
    timezone: &str,
    tz: Tz,
    slots: &[SlotRecord],
    now: DateTime<Utc>,
) -> ScheduleSettingsView {
    let mut days: BTreeMap<NaiveDate, Vec<SlotView>> =
        settings.week().dates().map(|date| (date, Vec::new())).collect();

    for record in slots {
        let slot = &record.slot;
        let active = record.active_booking();
        let shown = record.current_booking();
        let view = SlotView {
            id: slot.id,
            date: slot.date,
            start_time: slot.start_time,
            end_time: slot.end_time,
            is_available: active.is_none() && starts_after(tz, slot.date, slot.start_time, now),
            is_booked: active.is_some(),
            booking_id: shown.map(|b| b.id),
            booking_status: shown.map(|b| b.status),
        };
        days.entry(slot.date).or_default().push(view);
    }

    for day in days.values_mut() {
        day.sort_by_key(|v| v.start_time);
    }

    ScheduleSettingsView {
        settings,
        timezone: timezone.to_string(),
        days,
    }
}
