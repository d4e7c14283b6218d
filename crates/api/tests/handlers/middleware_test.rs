use std::sync::Arc;

use axum::http::{HeaderValue, StatusCode};
use axum_test::TestServer;
use chrono::{NaiveDate, NaiveTime, Utc};
use mentorsync_api::middleware::auth::parse_actor;
use mentorsync_api::middleware::error_handling::{map_error, status_for};
use mentorsync_api::{build_router, ApiState};
use mentorsync_core::clock::FixedClock;
use mentorsync_core::errors::ScheduleError;
use mentorsync_core::models::booking::{Booking, BookingStatus};
use mentorsync_core::models::time_slot::TimeSlot;
use mentorsync_db::mock::store::MockSchedulingStore;
use rstest::rstest;
use serde_json::Value;
use uuid::Uuid;

use crate::test_utils::{user_header, user_value};

#[rstest]
#[case(ScheduleError::NotFound("Booking not found".to_string()), StatusCode::NOT_FOUND)]
#[case(ScheduleError::Validation("Invalid input".to_string()), StatusCode::BAD_REQUEST)]
#[case(ScheduleError::Authentication("Missing header".to_string()), StatusCode::UNAUTHORIZED)]
#[case(ScheduleError::Unauthorized("Not the mentor".to_string()), StatusCode::FORBIDDEN)]
#[case(ScheduleError::InvalidState("Booking is declined".to_string()), StatusCode::CONFLICT)]
#[case(ScheduleError::SlotUnavailable("Slot taken".to_string()), StatusCode::CONFLICT)]
#[case(ScheduleError::Database(eyre::eyre!("Database error")), StatusCode::INTERNAL_SERVER_ERROR)]
fn test_error_status_mapping(#[case] error: ScheduleError, #[case] expected: StatusCode) {
    assert_eq!(status_for(&error), expected);
    assert_eq!(map_error(error).status(), expected);
}

#[test]
fn test_reschedule_failure_uses_source_status() {
    let error = ScheduleError::RescheduleFailed {
        original_preserved: false,
        source: Box::new(ScheduleError::NotFound("Time slot missing".to_string())),
    };

    assert_eq!(map_error(error).status(), StatusCode::NOT_FOUND);
}

#[test]
fn test_internal_error_is_server_error() {
    let io_error = std::io::Error::new(std::io::ErrorKind::Other, "IO error");
    let error = ScheduleError::Internal(Box::new(io_error));

    assert_eq!(map_error(error).status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn test_parse_actor() {
    let id = Uuid::new_v4();

    assert_eq!(parse_actor(Some(&id.to_string())).unwrap().id(), id);
    assert!(matches!(parse_actor(None), Err(ScheduleError::Authentication(_))));
    assert!(matches!(
        parse_actor(Some("not-a-uuid")),
        Err(ScheduleError::Authentication(_))
    ));
}

#[tokio::test]
async fn test_malformed_identity_is_rejected() {
    let ctx = crate::test_utils::TestContext::new().await;

    let response = ctx
        .server
        .get("/api/bookings")
        .add_header(user_header(), HeaderValue::from_static("mentor-42"))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[test_log::test(tokio::test)]
async fn test_store_failure_maps_to_server_error() {
    let mut store = MockSchedulingStore::new();
    store
        .expect_find_mentor()
        .returning(|_| Err(ScheduleError::Database(eyre::eyre!("connection reset"))));
    let state = Arc::new(ApiState::new(Arc::new(store), Arc::new(FixedClock::new(Utc::now()))));
    let server = TestServer::new(build_router(state)).unwrap();
    let mentor = Uuid::new_v4();

    let response = server
        .get(&format!("/api/mentors/{}/schedule", mentor))
        .add_header(user_header(), user_value(mentor))
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json::<Value>()["code"], "database_error");
}

#[test_log::test(tokio::test)]
async fn test_missing_booking_never_reaches_transition() {
    let mut store = MockSchedulingStore::new();
    store.expect_find_booking().times(1).returning(|_| Ok(None));
    store.expect_transition_booking().never();
    let state = Arc::new(ApiState::new(Arc::new(store), Arc::new(FixedClock::new(Utc::now()))));
    let server = TestServer::new(build_router(state)).unwrap();
    let mentor = Uuid::new_v4();

    let response = server
        .post(&format!("/api/bookings/{}/accept", Uuid::new_v4()))
        .add_header(user_header(), user_value(mentor))
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[test_log::test(tokio::test)]
async fn test_complete_without_mentor_record_is_not_found() {
    let mentor = Uuid::new_v4();
    let slot = TimeSlot {
        id: Uuid::new_v4(),
        mentor_id: mentor,
        settings_id: Some(Uuid::new_v4()),
        date: NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
        start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        retired: false,
        created_at: Utc::now(),
    };
    let mut booking = Booking::requested(slot.id, mentor, Uuid::new_v4(), Utc::now());
    booking.status = BookingStatus::Approved;
    let booking_id = booking.id;

    let mut store = MockSchedulingStore::new();
    store.expect_find_booking().returning(move |_| Ok(Some(booking.clone())));
    store.expect_find_slot().returning(move |_| Ok(Some(slot.clone())));
    store.expect_find_mentor().times(1).returning(|_| Ok(None));
    store.expect_transition_booking().never();
    let state = Arc::new(ApiState::new(Arc::new(store), Arc::new(FixedClock::new(Utc::now()))));
    let server = TestServer::new(build_router(state)).unwrap();

    let response = server
        .post(&format!("/api/bookings/{}/complete", booking_id))
        .add_header(user_header(), user_value(mentor))
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["code"], "not_found");
}
