//! # MentorSync API
//!
//! The API crate provides the web server for the MentorSync scheduling engine.
//! Mentors publish weekly availability; learners request, cancel and
//! reschedule sessions in the generated slots.
//!
//! ## Architecture
//!
//! - **Routes**: Define API endpoints and URL structure
//! - **Handlers**: Translate HTTP requests into calls on the scheduling services
//! - **Middleware**: Caller identity and error-to-status mapping
//! - **Config**: Environment configuration
//!
//! The API uses Axum as the web framework. Persistence is whatever
//! [`SchedulingStore`] the server is started with.

/// Configuration module for API settings
pub mod config;
/// Request handlers for schedules and bookings
pub mod handlers;
/// Middleware for caller identity and error handling
pub mod middleware;
/// Route definitions and API endpoint structure
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    error_handling::HandleErrorLayer,
    http::{HeaderValue, StatusCode},
    Json, Router,
};
use eyre::Result;
use mentorsync_core::clock::{Clock, SystemClock};
use mentorsync_core::services::availability::AvailabilityService;
use mentorsync_core::services::booking::BookingService;
use mentorsync_core::store::SchedulingStore;
use serde_json::json;
use tokio::net::TcpListener;
use tower::{BoxError, ServiceBuilder};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

/// Shared application state that is accessible to all request handlers
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use mentorsync_api::ApiState;
/// use mentorsync_core::clock::SystemClock;
/// use mentorsync_core::store::memory::InMemoryStore;
///
/// let state = Arc::new(ApiState::new(
///     Arc::new(InMemoryStore::new()),
///     Arc::new(SystemClock),
/// ));
/// let app = mentorsync_api::build_router(state);
/// ```
pub struct ApiState {
    /// Schedule settings and slot generation
    pub availability: AvailabilityService,
    /// Booking requests and lifecycle transitions
    pub bookings: BookingService,
}

impl ApiState {
    pub fn new(store: Arc<dyn SchedulingStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            availability: AvailabilityService::new(store.clone(), clock.clone()),
            bookings: BookingService::new(store, clock),
        }
    }

    /// State whose default rules and timezone come from `config`.
    pub fn from_config(config: &config::ApiConfig, store: Arc<dyn SchedulingStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            availability: AvailabilityService::new(store.clone(), clock.clone())
                .with_defaults(config.default_rules, config.default_timezone.clone())
                .with_fill_horizon(config.fill_horizon_weeks),
            bookings: BookingService::new(store, clock),
        }
    }
}

/// Builds the application router with every endpoint and request tracing.
pub fn build_router(state: Arc<ApiState>) -> Router {
    Router::new()
        // Health check endpoints
        .merge(routes::health::routes())
        // Mentor and schedule settings endpoints
        .merge(routes::schedule::routes())
        // Booking endpoints
        .merge(routes::booking::routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn handle_middleware_error(err: BoxError) -> (StatusCode, Json<serde_json::Value>) {
    if err.is::<tower::timeout::error::Elapsed>() {
        (
            StatusCode::REQUEST_TIMEOUT,
            Json(json!({ "error": "Request timed out", "code": "timeout" })),
        )
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": format!("Unhandled internal error: {}", err), "code": "internal_error" })),
        )
    }
}

/// Starts the API server with the provided configuration and store
///
/// Initializes logging, builds the services over `store` with the system
/// clock, applies CORS and the request timeout, and serves until shutdown.
///
/// # Example
///
/// ```no_run
/// # async fn run() -> eyre::Result<()> {
/// use std::sync::Arc;
/// use mentorsync_api::{config::ApiConfig, start_server};
/// use mentorsync_db::store::PgSchedulingStore;
///
/// let config = ApiConfig::from_env()?;
/// let pool = mentorsync_db::create_pool(&config.database_url).await?;
/// start_server(config, Arc::new(PgSchedulingStore::new(pool))).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_server(config: config::ApiConfig, store: Arc<dyn SchedulingStore>) -> Result<()> {
    // Initialize tracing for logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let state = Arc::new(ApiState::from_config(&config, store, Arc::new(SystemClock)));
    let app = build_router(state);

    // Apply CORS configuration if origins are specified
    let app = if let Some(origins) = &config.cors_origins {
        let origins = origins
            .iter()
            .map(|origin| origin.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()?;
        let cors = tower_http::cors::CorsLayer::new()
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::PUT,
                axum::http::Method::DELETE,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers([
                axum::http::header::CONTENT_TYPE,
                axum::http::header::ACCEPT,
                axum::http::HeaderName::from_static(middleware::auth::USER_ID_HEADER),
            ])
            .allow_origin(origins)
            .allow_credentials(true);

        app.layer(cors)
    } else {
        app
    };

    // A timed-out request drops its store transaction, which rolls it back.
    let app = app.layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(handle_middleware_error))
            .timeout(Duration::from_secs(config.request_timeout)),
    );

    // Start the HTTP server
    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
