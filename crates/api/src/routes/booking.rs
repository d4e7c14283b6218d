use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/bookings",
            post(handlers::booking::request_booking).get(handlers::booking::list_bookings),
        )
        .route("/api/bookings/:id", get(handlers::booking::get_booking))
        .route("/api/bookings/:id/accept", post(handlers::booking::accept_booking))
        .route("/api/bookings/:id/decline", post(handlers::booking::decline_booking))
        .route("/api/bookings/:id/cancel", post(handlers::booking::cancel_booking))
        .route("/api/bookings/:id/complete", post(handlers::booking::complete_booking))
        .route(
            "/api/bookings/:id/reschedule",
            post(handlers::booking::reschedule_booking),
        )
}
