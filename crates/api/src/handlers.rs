/// Booking requests and lifecycle actions
pub mod booking;
/// Mentor registration and weekly schedule settings
pub mod schedule;
