use chrono::Utc;
use mentorsync_core::errors::ScheduleError;
use mentorsync_core::lifecycle::{plan_change, transition, BookingAction};
use mentorsync_core::models::booking::BookingStatus::{self, *};
use rstest::rstest;
use uuid::Uuid;

#[rstest]
#[case(Requested, Approved, true)]
#[case(Requested, Declined, true)]
#[case(Requested, Cancelled, true)]
#[case(Requested, Completed, false)]
#[case(Approved, Cancelled, true)]
#[case(Approved, Completed, true)]
#[case(Approved, Declined, false)]
#[case(Approved, Requested, false)]
#[case(Declined, Requested, false)]
#[case(Declined, Approved, false)]
#[case(Cancelled, Requested, false)]
#[case(Cancelled, Approved, false)]
#[case(Completed, Approved, false)]
#[case(Completed, Cancelled, false)]
fn test_transition_table(#[case] from: BookingStatus, #[case] to: BookingStatus, #[case] allowed: bool) {
    assert_eq!(from.can_transition_to(to), allowed);
}

#[rstest]
fn test_terminal_states_reject_every_action(
    #[values(Declined, Cancelled, Completed)] terminal: BookingStatus,
    #[values(BookingAction::Accept, BookingAction::Decline, BookingAction::Cancel, BookingAction::Complete)]
    action: BookingAction,
) {
    let err = transition(terminal, action).unwrap_err();
    assert!(matches!(err, ScheduleError::InvalidState(_)));
}

#[test]
fn test_accept_and_decline_mark_processed() {
    let id = Uuid::new_v4();
    let now = Utc::now();

    assert!(plan_change(id, Requested, BookingAction::Accept, now).unwrap().processed);
    assert!(plan_change(id, Requested, BookingAction::Decline, now).unwrap().processed);
    assert!(!plan_change(id, Requested, BookingAction::Cancel, now).unwrap().processed);
    assert!(!plan_change(id, Approved, BookingAction::Complete, now).unwrap().processed);
}

#[test]
fn test_invalid_state_message_names_action_and_status() {
    let err = transition(Completed, BookingAction::Cancel).unwrap_err();

    assert_eq!(err.to_string(), "Invalid state: Cannot cancel a booking that is completed");
}

#[test]
fn test_only_requested_and_approved_are_active() {
    let active: Vec<_> = BookingStatus::ALL.into_iter().filter(|s| s.is_active()).collect();
    assert_eq!(active, vec![Requested, Approved]);
}
