//! # Time-Slot Generator
//!
//! Turns a weekly availability window into discrete candidate slots. Pure and
//! deterministic: the same rules, week, zone and `now` always give the same
//! output, in `(date, start_time)` order.
//!
//! For each date the cursor starts at `start_hour`, emits a slot of
//! `session_duration_minutes`, then advances by the session plus
//! `buffer_minutes`. A trailing interval shorter than a session is dropped,
//! and slots whose start is not strictly after `now` (evaluated in the
//! mentor's zone) are never offered.

use chrono::{DateTime, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;

use crate::clock::starts_after;
use crate::errors::ScheduleResult;
use crate::models::schedule::{SlotRules, WeekWindow};
use crate::models::time_slot::{CandidateSlot, TimeSlot};

fn minutes_of_day(time: NaiveTime) -> i32 {
    (time.num_seconds_from_midnight() / 60) as i32
}

fn time_from_minutes(minutes: i32) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt((minutes / 60) as u32, (minutes % 60) as u32, 0)
}

/// The `(start, end)` pairs one day yields, before any past-time filtering.
pub fn daily_template(rules: &SlotRules) -> ScheduleResult<Vec<(NaiveTime, NaiveTime)>> {
    rules.validate()?;

    let day_end = minutes_of_day(rules.end_hour);
    let step = rules.session_duration_minutes + rules.buffer_minutes;
    let mut cursor = minutes_of_day(rules.start_hour);
    let mut template = Vec::new();

    while cursor + rules.session_duration_minutes <= day_end {
        let end = cursor + rules.session_duration_minutes;
        if let (Some(start_time), Some(end_time)) = (time_from_minutes(cursor), time_from_minutes(end)) {
            template.push((start_time, end_time));
        }
        cursor += step;
    }

    Ok(template)
}

/// Generates the week's bookable candidates that start after `now`.
pub fn generate_slots(
    rules: &SlotRules,
    week: &WeekWindow,
    tz: Tz,
    now: DateTime<Utc>,
) -> ScheduleResult<Vec<CandidateSlot>> {
    let template = daily_template(rules)?;

    let slots = week
        .dates()
        .flat_map(|date| {
            template.iter().map(move |&(start_time, end_time)| CandidateSlot {
                date,
                start_time,
                end_time,
            })
        })
        .filter(|slot| starts_after(tz, slot.date, slot.start_time, now))
        .collect();

    Ok(slots)
}

/// Drops candidates that would overlap a slot that must be kept.
pub fn exclude_overlapping(candidates: Vec<CandidateSlot>, occupied: &[TimeSlot]) -> Vec<CandidateSlot> {
    candidates
        .into_iter()
        .filter(|candidate| !occupied.iter().any(|slot| slot.overlaps(candidate)))
        .collect()
}
