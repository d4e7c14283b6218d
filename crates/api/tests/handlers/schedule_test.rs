use axum::http::StatusCode;
use mentorsync_core::store::SchedulingStore;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::test_utils::{week_body, TestContext, WEEK_START};

#[tokio::test]
async fn test_health_and_version() {
    let ctx = TestContext::new().await;

    let health = ctx.server.get("/health").await;
    assert_eq!(health.status_code(), StatusCode::OK);
    assert_eq!(health.json::<Value>(), json!({ "status": "ok" }));

    let version = ctx.server.get("/version").await.json::<Value>();
    assert_eq!(version["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_register_mentor_sets_timezone() {
    let ctx = TestContext::new().await;
    let mentor = Uuid::new_v4();

    let response = ctx
        .put(&format!("/api/mentors/{}", mentor), mentor)
        .json(&json!({ "timezone": "Europe/Berlin" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<Value>();
    assert_eq!(body["id"], mentor.to_string());
    assert_eq!(body["timezone"], "Europe/Berlin");
}

#[tokio::test]
async fn test_register_rejects_other_callers_and_bad_zones() {
    let ctx = TestContext::new().await;
    let path = format!("/api/mentors/{}", ctx.mentor_id);

    let response = ctx
        .put(&path, TestContext::learner())
        .json(&json!({ "timezone": "Asia/Tokyo" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let response = ctx
        .put(&path, ctx.mentor_id)
        .json(&json!({ "timezone": "Mars/Olympus" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], "validation_error");
}

#[tokio::test]
async fn test_save_and_read_week() {
    let ctx = TestContext::new().await;

    let saved = ctx.save_week("09:00", "11:00", 60).await;
    assert_eq!(saved["timezone"], "Asia/Bangkok");
    assert_eq!(saved["settings"]["week_start_date"], WEEK_START);
    assert_eq!(saved["settings"]["start_hour"], "09:00");
    assert_eq!(saved["days"].as_object().unwrap().len(), 7);

    let monday = saved["days"]["2026-10-19"].as_array().unwrap();
    assert_eq!(monday.len(), 2);
    assert_eq!(monday[0]["start_time"], "09:00");
    assert_eq!(monday[0]["end_time"], "10:00");
    assert_eq!(monday[0]["is_available"], true);

    let read = ctx
        .get(
            &format!("{}?week_start={}", ctx.schedule_path(), WEEK_START),
            TestContext::learner(),
        )
        .await;
    assert_eq!(read.status_code(), StatusCode::OK);
    assert_eq!(read.json::<Value>()["days"], saved["days"]);
}

#[tokio::test]
async fn test_unsaved_week_shows_default_hours() {
    let ctx = TestContext::new().await;

    let view = ctx
        .get(
            &format!("{}?week_start={}", ctx.schedule_path(), WEEK_START),
            TestContext::learner(),
        )
        .await
        .json::<Value>();

    assert_eq!(view["settings"]["start_hour"], "09:00");
    assert_eq!(view["settings"]["end_hour"], "17:00");
    assert_eq!(view["days"]["2026-10-21"].as_array().unwrap().len(), 8);
}

#[tokio::test]
async fn test_save_validates_payload() {
    let ctx = TestContext::new().await;

    let mut body = week_body("09:00", "11:00", 60);
    body["week_start_date"] = json!("2026-10-20");
    body["week_end_date"] = json!("2026-10-26");
    let response = ctx.put(&ctx.schedule_path(), ctx.mentor_id).json(&body).await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = ctx
        .put(&ctx.schedule_path(), ctx.mentor_id)
        .json(&week_body("12:00", "11:00", 60))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = ctx
        .put(&ctx.schedule_path(), ctx.mentor_id)
        .json(&week_body("9am", "11:00", 60))
        .await;
    assert!(response.status_code().is_client_error());
}

#[tokio::test]
async fn test_schedule_requires_identity_and_ownership() {
    let ctx = TestContext::new().await;

    let response = ctx.server.get(&ctx.schedule_path()).await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["code"], "authentication_error");

    let response = ctx
        .put(&ctx.schedule_path(), TestContext::learner())
        .json(&week_body("09:00", "11:00", 60))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unknown_mentor_is_not_found() {
    let ctx = TestContext::new().await;

    let response = ctx
        .get(&format!("/api/mentors/{}/schedule", Uuid::new_v4()), ctx.mentor_id)
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_edit_keeps_booked_slot() {
    let ctx = TestContext::new().await;
    let view = ctx.save_week("09:00", "17:00", 60).await;
    let slot = TestContext::slot_id(&view, "2026-10-20", "14:00");
    ctx.book(slot, TestContext::learner()).await;

    let view = ctx.save_week("09:00", "12:00", 60).await;

    assert_eq!(view["settings"]["is_locked"], true);
    let tuesday = view["days"]["2026-10-20"].as_array().unwrap();
    let starts: Vec<&str> = tuesday.iter().map(|s| s["start_time"].as_str().unwrap()).collect();
    assert_eq!(starts, vec!["09:00", "10:00", "11:00", "14:00"]);
    assert_eq!(tuesday[3]["is_booked"], true);
    assert_eq!(tuesday[3]["booking_status"], "requested");
}

#[tokio::test]
async fn test_delete_week() {
    let ctx = TestContext::new().await;
    let view = ctx.save_week("09:00", "11:00", 60).await;
    let slot = TestContext::slot_id(&view, "2026-10-19", "09:00");
    let learner = TestContext::learner();
    let booking = ctx.book(slot, learner).await;
    let path = format!("{}?week_start={}", ctx.schedule_path(), WEEK_START);

    let response = ctx.delete(&path, ctx.mentor_id).await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
    assert_eq!(response.json::<Value>()["code"], "invalid_state");

    ctx.post(&format!("/api/bookings/{}/cancel", booking), learner).await;
    let response = ctx.delete(&path, ctx.mentor_id).await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

    let response = ctx.delete(&ctx.schedule_path(), ctx.mentor_id).await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_week_at_the_end_of_the_calendar_is_a_bad_request() {
    let ctx = TestContext::new().await;

    let response = ctx
        .get(
            &format!("{}?week_start=%2B262142-12-31", ctx.schedule_path()),
            TestContext::learner(),
        )
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], "validation_error");
}

#[tokio::test]
async fn test_far_future_read_stores_nothing() {
    let ctx = TestContext::new().await;

    let response = ctx
        .get(
            &format!("{}?week_start=9999-12-27", ctx.schedule_path()),
            TestContext::learner(),
        )
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<Value>();
    assert_eq!(body["settings"]["week_start_date"], "9999-12-27");
    assert!(body["days"].as_object().unwrap().values().all(|day| day.as_array().unwrap().is_empty()));
    let stored = ctx
        .store
        .find_settings(ctx.mentor_id, "9999-12-27".parse().unwrap())
        .await
        .unwrap();
    assert!(stored.is_none());
}
