use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use mentorsync_core::{
    errors::ScheduleError,
    models::{
        mentor::{Mentor, RegisterMentorRequest},
        schedule::{SaveScheduleSettingsRequest, ScheduleSettingsView, ScheduleWeekQuery},
    },
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    middleware::{auth::Actor, error_handling::AppError},
    ApiState,
};

/// Only the mentor may change their own profile or schedule.
fn ensure_self(actor: Actor, mentor_id: Uuid) -> Result<(), AppError> {
    if actor.id() != mentor_id {
        return Err(AppError(ScheduleError::Unauthorized(
            "Mentors can only manage their own schedule".to_string(),
        )));
    }
    Ok(())
}

#[axum::debug_handler]
pub async fn register_mentor(
    State(state): State<Arc<ApiState>>,
    actor: Actor,
    Path(mentor_id): Path<Uuid>,
    Json(payload): Json<RegisterMentorRequest>,
) -> Result<Json<Mentor>, AppError> {
    ensure_self(actor, mentor_id)?;
    let mentor = state
        .availability
        .register_mentor(mentor_id, payload.timezone)
        .await?;
    Ok(Json(mentor))
}

/// Any caller may read a mentor's week; learners need it to pick a slot.
#[axum::debug_handler]
pub async fn get_schedule(
    State(state): State<Arc<ApiState>>,
    _actor: Actor,
    Path(mentor_id): Path<Uuid>,
    Query(query): Query<ScheduleWeekQuery>,
) -> Result<Json<ScheduleSettingsView>, AppError> {
    let view = state
        .availability
        .get_schedule_settings(mentor_id, query.week_start)
        .await?;
    Ok(Json(view))
}

#[axum::debug_handler]
pub async fn save_schedule(
    State(state): State<Arc<ApiState>>,
    actor: Actor,
    Path(mentor_id): Path<Uuid>,
    Json(payload): Json<SaveScheduleSettingsRequest>,
) -> Result<Json<ScheduleSettingsView>, AppError> {
    ensure_self(actor, mentor_id)?;
    let view = state
        .availability
        .save_schedule_settings(mentor_id, payload)
        .await?;
    Ok(Json(view))
}

#[axum::debug_handler]
pub async fn delete_schedule(
    State(state): State<Arc<ApiState>>,
    actor: Actor,
    Path(mentor_id): Path<Uuid>,
    Query(query): Query<ScheduleWeekQuery>,
) -> Result<StatusCode, AppError> {
    ensure_self(actor, mentor_id)?;
    let week_start = query.week_start.ok_or_else(|| {
        ScheduleError::Validation("week_start query parameter is required".to_string())
    })?;
    state
        .availability
        .delete_schedule_settings(mentor_id, week_start)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
