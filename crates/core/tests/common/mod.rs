#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use fake::{Fake, Faker};
use mentorsync_core::clock::FixedClock;
use mentorsync_core::models::schedule::{SaveScheduleSettingsRequest, SlotRules, WeekWindow};
use mentorsync_core::services::availability::AvailabilityService;
use mentorsync_core::services::booking::BookingService;
use mentorsync_core::store::memory::InMemoryStore;
use uuid::Uuid;

pub const TIMEZONE: &str = "Asia/Bangkok";

pub fn at(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Monday 2026-10-19 .. Sunday 2026-10-25.
pub fn week() -> WeekWindow {
    WeekWindow::new(date(2026, 10, 19), date(2026, 10, 25)).unwrap()
}

/// Sunday before the test week, so every slot of the week is in the future.
pub fn before_week() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 0, 0, 0).unwrap()
}

pub fn rules(start: NaiveTime, end: NaiveTime, duration: i32, buffer: i32) -> SlotRules {
    SlotRules {
        start_hour: start,
        end_hour: end,
        session_duration_minutes: duration,
        buffer_minutes: buffer,
    }
}

pub fn save_request(rules: SlotRules) -> SaveScheduleSettingsRequest {
    let week = week();
    SaveScheduleSettingsRequest {
        week_start_date: week.start,
        week_end_date: week.end,
        start_hour: rules.start_hour,
        end_hour: rules.end_hour,
        session_duration_minutes: rules.session_duration_minutes,
        buffer_minutes: rules.buffer_minutes,
    }
}

pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub clock: Arc<FixedClock>,
    pub availability: AvailabilityService,
    pub bookings: BookingService,
    pub mentor_id: Uuid,
}

impl Harness {
    pub async fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(FixedClock::new(before_week()));
        let availability = AvailabilityService::new(store.clone(), clock.clone());
        let bookings = BookingService::new(store.clone(), clock.clone());
        let mentor_id: Uuid = Faker.fake();
        availability
            .register_mentor(mentor_id, Some(TIMEZONE.to_string()))
            .await
            .unwrap();

        Self {
            store,
            clock,
            availability,
            bookings,
            mentor_id,
        }
    }

    pub fn learner() -> Uuid {
        Faker.fake()
    }

    /// Saves `rules` for the test week.
    pub async fn save(&self, rules: SlotRules) -> mentorsync_core::models::schedule::ScheduleSettingsView {
        self.availability
            .save_schedule_settings(self.mentor_id, save_request(rules))
            .await
            .unwrap()
    }

    /// Id of the slot starting at `start` on `day`.
    pub async fn slot_at(&self, day: NaiveDate, start: NaiveTime) -> Uuid {
        let view = self
            .availability
            .get_schedule_settings(self.mentor_id, Some(week().start))
            .await
            .unwrap();
        view.days[&day]
            .iter()
            .find(|slot| slot.start_time == start)
            .map(|slot| slot.id)
            .unwrap_or_else(|| panic!("no slot at {} {}", day, start))
    }
}
