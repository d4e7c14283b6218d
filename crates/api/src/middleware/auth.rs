//! # Caller Identity
//!
//! Every scheduling and booking endpoint acts on behalf of a caller, named by
//! the `X-User-Id` header. Issuing and verifying that identity is the job of
//! whatever sits in front of this service; here the header is only parsed.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};
use mentorsync_core::errors::ScheduleError;
use uuid::Uuid;

use crate::middleware::error_handling::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller of a request.
///
/// Missing or malformed headers are rejected with `401`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor(pub Uuid);

impl Actor {
    pub fn id(&self) -> Uuid {
        self.0
    }
}

pub fn parse_actor(value: Option<&str>) -> Result<Actor, ScheduleError> {
    let raw = value.ok_or_else(|| {
        ScheduleError::Authentication(format!("Missing {} header", USER_ID_HEADER))
    })?;
    Uuid::parse_str(raw.trim())
        .map(Actor)
        .map_err(|_| ScheduleError::Authentication(format!("Invalid {} header", USER_ID_HEADER)))
}

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok());
        Ok(parse_actor(header)?)
    }
}
