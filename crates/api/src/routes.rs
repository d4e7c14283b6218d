/// Booking endpoints
pub mod booking;
/// Liveness and version endpoints
pub mod health;
/// Mentor and schedule settings endpoints
pub mod schedule;
