//! # Booking Lifecycle
//!
//! Every legal booking status transition is listed in [`BookingStatus::can_transition_to`];
//! nothing else in the crate decides whether a status may change.
//!
//! ```text
//! Requested ──accept──▶ Approved ──complete──▶ Completed
//!     │                    │
//!     ├──decline──▶ Declined
//!     └──cancel───▶ Cancelled ◀──cancel──┘
//! ```
//!
//! `Declined`, `Cancelled` and `Completed` are terminal.

use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::{ScheduleError, ScheduleResult};
use crate::models::booking::{BookingStatus, StatusChange};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingAction {
    Accept,
    Decline,
    Cancel,
    Complete,
}

impl BookingAction {
    pub fn target(&self) -> BookingStatus {
        match self {
            BookingAction::Accept => BookingStatus::Approved,
            BookingAction::Decline => BookingStatus::Declined,
            BookingAction::Cancel => BookingStatus::Cancelled,
            BookingAction::Complete => BookingStatus::Completed,
        }
    }

    /// Accept and decline stamp `processed_on`.
    pub fn marks_processed(&self) -> bool {
        matches!(self, BookingAction::Accept | BookingAction::Decline)
    }
}

impl fmt::Display for BookingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BookingAction::Accept => "accept",
            BookingAction::Decline => "decline",
            BookingAction::Cancel => "cancel",
            BookingAction::Complete => "complete",
        };
        f.write_str(name)
    }
}

impl BookingStatus {
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;

        match (self, next) {
            (Requested, Approved) | (Requested, Declined) | (Requested, Cancelled) => true,
            (Approved, Cancelled) | (Approved, Completed) => true,
            (Requested, _) | (Approved, _) => false,
            (Declined, _) | (Cancelled, _) | (Completed, _) => false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        BookingStatus::ALL
            .into_iter()
            .all(|next| !self.can_transition_to(next))
    }
}

/// Resolves `action` against `current`, failing with `InvalidState` when the
/// lifecycle forbids it.
pub fn transition(current: BookingStatus, action: BookingAction) -> ScheduleResult<BookingStatus> {
    let next = action.target();
    if current.can_transition_to(next) {
        Ok(next)
    } else {
        Err(ScheduleError::InvalidState(format!(
            "Cannot {} a booking that is {}",
            action, current
        )))
    }
}

/// Builds the compare-and-set change a store applies for `action`.
pub fn plan_change(
    booking_id: Uuid,
    current: BookingStatus,
    action: BookingAction,
    at: DateTime<Utc>,
) -> ScheduleResult<StatusChange> {
    let to = transition(current, action)?;
    Ok(StatusChange {
        booking_id,
        from: current,
        to,
        at,
        processed: action.marks_processed(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_have_no_exits() {
        assert!(BookingStatus::Declined.is_terminal());
        assert!(BookingStatus::Cancelled.is_terminal());
        assert!(BookingStatus::Completed.is_terminal());
        assert!(!BookingStatus::Requested.is_terminal());
        assert!(!BookingStatus::Approved.is_terminal());
    }

    #[test]
    fn nothing_returns_to_requested() {
        for status in BookingStatus::ALL {
            assert!(!status.can_transition_to(BookingStatus::Requested));
        }
    }
}
