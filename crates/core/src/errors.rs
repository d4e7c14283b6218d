use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Slot unavailable: {0}")]
    SlotUnavailable(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Reschedule failed (original booking preserved: {original_preserved}): {source}")]
    RescheduleFailed {
        original_preserved: bool,
        #[source]
        source: Box<ScheduleError>,
    },

    #[error("Database error: {0}")]
    Database(#[from] eyre::Report),

    #[error("Internal server error: {0}")]
    Internal(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl ScheduleError {
    /// Stable machine-readable code, independent of the message text.
    pub fn code(&self) -> &'static str {
        match self {
            ScheduleError::NotFound(_) => "not_found",
            ScheduleError::InvalidState(_) => "invalid_state",
            ScheduleError::SlotUnavailable(_) => "slot_unavailable",
            ScheduleError::Unauthorized(_) => "unauthorized",
            ScheduleError::Validation(_) => "validation_error",
            ScheduleError::Authentication(_) => "authentication_error",
            ScheduleError::RescheduleFailed { source, .. } => source.code(),
            ScheduleError::Database(_) => "database_error",
            ScheduleError::Internal(_) => "internal_error",
        }
    }

    /// Expected outcomes a client can react to, as opposed to store faults.
    pub fn is_expected(&self) -> bool {
        !matches!(self, ScheduleError::Database(_) | ScheduleError::Internal(_))
            && !matches!(self, ScheduleError::RescheduleFailed { source, .. } if !source.is_expected())
    }
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;
