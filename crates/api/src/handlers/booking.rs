use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use mentorsync_core::models::booking::{
    Booking, BookingRole, ListBookingsQuery, RequestBookingRequest, RescheduleBookingRequest,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    middleware::{auth::Actor, error_handling::AppError},
    ApiState,
};

#[axum::debug_handler]
pub async fn request_booking(
    State(state): State<Arc<ApiState>>,
    actor: Actor,
    Json(payload): Json<RequestBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let booking = state
        .bookings
        .request_booking(payload.time_slot_id, actor.id())
        .await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// Bookings where the caller is the learner, or the mentor with `?role=mentor`.
#[axum::debug_handler]
pub async fn list_bookings(
    State(state): State<Arc<ApiState>>,
    actor: Actor,
    Query(query): Query<ListBookingsQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let role = query.role.unwrap_or(BookingRole::Learner);
    let bookings = state.bookings.list_bookings(actor.id(), role).await?;
    Ok(Json(bookings))
}

#[axum::debug_handler]
pub async fn get_booking(
    State(state): State<Arc<ApiState>>,
    actor: Actor,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    let booking = state.bookings.get_booking(booking_id, actor.id()).await?;
    Ok(Json(booking))
}

#[axum::debug_handler]
pub async fn accept_booking(
    State(state): State<Arc<ApiState>>,
    actor: Actor,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    let booking = state.bookings.accept_booking(booking_id, actor.id()).await?;
    Ok(Json(booking))
}

#[axum::debug_handler]
pub async fn decline_booking(
    State(state): State<Arc<ApiState>>,
    actor: Actor,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    let booking = state.bookings.decline_booking(booking_id, actor.id()).await?;
    Ok(Json(booking))
}

#[axum::debug_handler]
pub async fn cancel_booking(
    State(state): State<Arc<ApiState>>,
    actor: Actor,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    let booking = state.bookings.cancel_booking(booking_id, actor.id()).await?;
    Ok(Json(booking))
}

#[axum::debug_handler]
pub async fn complete_booking(
    State(state): State<Arc<ApiState>>,
    actor: Actor,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    let booking = state.bookings.complete_booking(booking_id, actor.id()).await?;
    Ok(Json(booking))
}

/// Responds with the replacement booking; the original is cancelled.
#[axum::debug_handler]
pub async fn reschedule_booking(
    State(state): State<Arc<ApiState>>,
    actor: Actor,
    Path(booking_id): Path<Uuid>,
    Json(payload): Json<RescheduleBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let booking = state
        .bookings
        .reschedule_booking(booking_id, actor.id(), payload.new_time_slot_id)
        .await?;
    Ok((StatusCode::CREATED, Json(booking)))
}
