use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use mentorsync_core::errors::ScheduleError;
use mentorsync_core::models::booking::{Booking, BookingStatus};
use mentorsync_core::models::schedule::ScheduleSettings;
use mentorsync_core::models::time_slot::TimeSlot;
use mentorsync_db::models::{DbBooking, DbScheduleSettings, DbTimeSlot};
use pretty_assertions::assert_eq;
use rstest::rstest;
use uuid::Uuid;

fn db_booking(status: &str) -> DbBooking {
    let at = Utc.with_ymd_and_hms(2026, 10, 18, 8, 0, 0).unwrap();
    DbBooking {
        id: Uuid::new_v4(),
        time_slot_id: Uuid::new_v4(),
        mentor_id: Uuid::new_v4(),
        learner_id: Uuid::new_v4(),
        status: status.to_string(),
        booked_on: at,
        processed_on: None,
        updated_at: at,
        rescheduled_from: None,
    }
}

#[rstest]
#[case("requested", BookingStatus::Requested)]
#[case("approved", BookingStatus::Approved)]
#[case("declined", BookingStatus::Declined)]
#[case("cancelled", BookingStatus::Cancelled)]
#[case("completed", BookingStatus::Completed)]
fn test_booking_row_status_maps(#[case] text: &str, #[case] expected: BookingStatus) {
    let row = db_booking(text);
    let id = row.id;

    let booking = Booking::try_from(row).unwrap();

    assert_eq!(booking.id, id);
    assert_eq!(booking.status, expected);
}

#[test]
fn test_unknown_booking_status_is_rejected() {
    let err = Booking::try_from(db_booking("pending")).unwrap_err();
    assert!(matches!(err, ScheduleError::Validation(_)));
}

#[test]
fn test_time_slot_row_maps_slot_date() {
    let row = DbTimeSlot {
        id: Uuid::new_v4(),
        mentor_id: Uuid::new_v4(),
        settings_id: None,
        slot_date: NaiveDate::from_ymd_opt(2026, 10, 20).unwrap(),
        start_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
        retired: true,
        created_at: Utc.with_ymd_and_hms(2026, 10, 18, 0, 0, 0).unwrap(),
    };

    let slot = TimeSlot::from(row.clone());

    assert_eq!(slot.date, row.slot_date);
    assert_eq!(slot.settings_id, None);
    assert!(slot.retired);
}

#[test]
fn test_settings_row_keeps_week_and_lock() {
    let now = Utc.with_ymd_and_hms(2026, 10, 18, 0, 0, 0).unwrap();
    let row = DbScheduleSettings {
        id: Uuid::new_v4(),
        mentor_id: Uuid::new_v4(),
        week_start_date: NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
        week_end_date: NaiveDate::from_ymd_opt(2026, 10, 25).unwrap(),
        start_hour: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        end_hour: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        session_duration_minutes: 60,
        buffer_minutes: 15,
        is_locked: true,
        created_at: now,
        updated_at: now,
    };

    let settings = ScheduleSettings::from(row);

    assert!(settings.is_locked);
    assert_eq!(settings.week().start, settings.week_start_date);
    assert_eq!(settings.rules().buffer_minutes, 15);
}
