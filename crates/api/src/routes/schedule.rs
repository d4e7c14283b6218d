use axum::{
    routing::{get, put},
    Router,
};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/mentors/:id", put(handlers::schedule::register_mentor))
        .route(
            "/api/mentors/:id/schedule",
            get(handlers::schedule::get_schedule)
                .put(handlers::schedule::save_schedule)
                .delete(handlers::schedule::delete_schedule),
        )
}
