use axum::http::StatusCode;
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::test_utils::TestContext;

async fn context_with_slots() -> (TestContext, Uuid, Uuid) {
    let ctx = TestContext::new().await;
    let view = ctx.save_week("09:00", "17:00", 60).await;
    let first = TestContext::slot_id(&view, "2026-10-21", "14:00");
    let second = TestContext::slot_id(&view, "2026-10-22", "10:00");
    (ctx, first, second)
}

#[tokio::test]
async fn test_request_booking_returns_created() {
    let (ctx, slot, _) = context_with_slots().await;
    let learner = TestContext::learner();

    let response = ctx
        .post("/api/bookings", learner)
        .json(&json!({ "time_slot_id": slot }))
        .await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body = response.json::<Value>();
    assert_eq!(body["status"], "requested");
    assert_eq!(body["learner_id"], learner.to_string());
    assert_eq!(body["mentor_id"], ctx.mentor_id.to_string());
    assert_eq!(body["processed_on"], Value::Null);
}

#[tokio::test]
async fn test_taken_slot_conflicts_and_missing_slot_is_not_found() {
    let (ctx, slot, _) = context_with_slots().await;
    ctx.book(slot, TestContext::learner()).await;

    let response = ctx
        .post("/api/bookings", TestContext::learner())
        .json(&json!({ "time_slot_id": slot }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
    assert_eq!(response.json::<Value>()["code"], "slot_unavailable");

    let response = ctx
        .post("/api/bookings", TestContext::learner())
        .json(&json!({ "time_slot_id": Uuid::new_v4() }))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_mentor_accepts_and_declines() {
    let (ctx, first, second) = context_with_slots().await;
    let accepted = ctx.book(first, TestContext::learner()).await;
    let declined = ctx.book(second, TestContext::learner()).await;

    let response = ctx
        .post(&format!("/api/bookings/{}/accept", accepted), ctx.mentor_id)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<Value>();
    assert_eq!(body["status"], "approved");
    assert!(body["processed_on"].is_string());

    let response = ctx
        .post(&format!("/api/bookings/{}/decline", declined), ctx.mentor_id)
        .await;
    assert_eq!(response.json::<Value>()["status"], "declined");

    // Declined slots are bookable again.
    ctx.book(second, TestContext::learner()).await;
}

#[tokio::test]
async fn test_learner_cannot_accept() {
    let (ctx, slot, _) = context_with_slots().await;
    let learner = TestContext::learner();
    let booking = ctx.book(slot, learner).await;

    let response = ctx
        .post(&format!("/api/bookings/{}/accept", booking), learner)
        .await;

    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(ctx.stored_status(booking).await, "requested");
}

#[tokio::test]
async fn test_invalid_transition_conflicts() {
    let (ctx, slot, _) = context_with_slots().await;
    let learner = TestContext::learner();
    let booking = ctx.book(slot, learner).await;
    ctx.post(&format!("/api/bookings/{}/cancel", booking), learner).await;

    let response = ctx
        .post(&format!("/api/bookings/{}/accept", booking), ctx.mentor_id)
        .await;

    assert_eq!(response.status_code(), StatusCode::CONFLICT);
    assert_eq!(response.json::<Value>()["code"], "invalid_state");
}

#[tokio::test]
async fn test_complete_after_session_end() {
    let (ctx, slot, _) = context_with_slots().await;
    let booking = ctx.book(slot, TestContext::learner()).await;
    ctx.post(&format!("/api/bookings/{}/accept", booking), ctx.mentor_id).await;
    let path = format!("/api/bookings/{}/complete", booking);

    let response = ctx.post(&path, ctx.mentor_id).await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);

    // Wednesday 15:00 Bangkok, the session's end.
    ctx.clock.set(Utc.with_ymd_and_hms(2026, 10, 21, 8, 0, 0).unwrap());
    let response = ctx.post(&path, ctx.mentor_id).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["status"], "completed");
}

#[tokio::test]
async fn test_reschedule_moves_booking() {
    let (ctx, first, second) = context_with_slots().await;
    let learner = TestContext::learner();
    let booking = ctx.book(first, learner).await;

    let response = ctx
        .post(&format!("/api/bookings/{}/reschedule", booking), learner)
        .json(&json!({ "new_time_slot_id": second }))
        .await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body = response.json::<Value>();
    assert_eq!(body["time_slot_id"], second.to_string());
    assert_eq!(body["rescheduled_from"], booking.to_string());
    assert_eq!(ctx.stored_status(booking).await, "cancelled");
}

#[tokio::test]
async fn test_failed_reschedule_reports_original_preserved() {
    let (ctx, first, second) = context_with_slots().await;
    let learner = TestContext::learner();
    let booking = ctx.book(first, learner).await;
    ctx.book(second, TestContext::learner()).await;

    let response = ctx
        .post(&format!("/api/bookings/{}/reschedule", booking), learner)
        .json(&json!({ "new_time_slot_id": second }))
        .await;

    assert_eq!(response.status_code(), StatusCode::CONFLICT);
    let body = response.json::<Value>();
    assert_eq!(body["code"], "slot_unavailable");
    assert_eq!(body["original_booking_preserved"], true);
    assert_eq!(ctx.stored_status(booking).await, "requested");
}

#[tokio::test]
async fn test_bookings_visible_to_parties_only() {
    let (ctx, first, second) = context_with_slots().await;
    let learner = TestContext::learner();
    let older = ctx.book(first, learner).await;
    ctx.clock.set(Utc.with_ymd_and_hms(2026, 10, 18, 1, 0, 0).unwrap());
    let newer = ctx.book(second, learner).await;

    let response = ctx.get(&format!("/api/bookings/{}", older), ctx.mentor_id).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let response = ctx
        .get(&format!("/api/bookings/{}", older), TestContext::learner())
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let mine = ctx.get("/api/bookings", learner).await.json::<Vec<Value>>();
    let ids: Vec<&str> = mine.iter().map(|b| b["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec![newer.to_string(), older.to_string()]);

    let mentoring = ctx
        .get("/api/bookings?role=mentor", ctx.mentor_id)
        .await
        .json::<Vec<Value>>();
    assert_eq!(mentoring.len(), 2);
    let none = ctx.get("/api/bookings?role=learner", ctx.mentor_id).await.json::<Vec<Value>>();
    assert!(none.is_empty());
}
