//! # Error Handling Middleware
//!
//! Maps scheduling errors to HTTP status codes and JSON error bodies so every
//! handler reports failures the same way.
//!
//! | Error | Status |
//! |-------|--------|
//! | `NotFound` | 404 |
//! | `Validation` | 400 |
//! | `Authentication` | 401 |
//! | `Unauthorized` | 403 |
//! | `InvalidState`, `SlotUnavailable` | 409 |
//! | `Database`, `Internal` | 500 |
//!
//! A failed reschedule takes the status of its underlying cause and adds an
//! `original_booking_preserved` field to the body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mentorsync_core::errors::ScheduleError;
use serde_json::json;
use tracing::error;

/// Application error wrapper that provides HTTP status code mapping
///
/// # Example
///
/// ```
/// use axum::Json;
/// use mentorsync_api::middleware::error_handling::AppError;
/// use mentorsync_core::errors::ScheduleError;
///
/// async fn handler(found: bool) -> Result<Json<&'static str>, AppError> {
///     if !found {
///         return Err(AppError(ScheduleError::NotFound("Booking not found".to_string())));
///     }
///     Ok(Json("ok"))
/// }
/// # fn main() {}
/// ```
#[derive(Debug)]
pub struct AppError(pub ScheduleError);

pub fn status_for(err: &ScheduleError) -> StatusCode {
    match err {
        ScheduleError::NotFound(_) => StatusCode::NOT_FOUND,
        ScheduleError::Validation(_) => StatusCode::BAD_REQUEST,
        ScheduleError::Authentication(_) => StatusCode::UNAUTHORIZED,
        ScheduleError::Unauthorized(_) => StatusCode::FORBIDDEN,
        ScheduleError::InvalidState(_) | ScheduleError::SlotUnavailable(_) => StatusCode::CONFLICT,
        ScheduleError::RescheduleFailed { source, .. } => status_for(source),
        ScheduleError::Database(_) | ScheduleError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            error!("Request failed: {:?}", self.0);
        }

        let mut body = json!({
            "error": self.0.to_string(),
            "code": self.0.code(),
        });
        if let ScheduleError::RescheduleFailed {
            original_preserved, ..
        } = &self.0
        {
            body["original_booking_preserved"] = json!(original_preserved);
        }

        (status, Json(body)).into_response()
    }
}

/// Allows `?` on `ScheduleResult` inside handlers.
impl From<ScheduleError> for AppError {
    fn from(err: ScheduleError) -> Self {
        AppError(err)
    }
}

/// Store-level reports surface as database errors.
impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        AppError(ScheduleError::Database(err))
    }
}

/// Maps a `ScheduleError` straight to a response.
pub fn map_error(err: ScheduleError) -> Response {
    AppError(err).into_response()
}
