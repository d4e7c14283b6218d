pub mod booking;
pub mod mentor;
pub mod schedule;
pub mod time_format;
pub mod time_slot;
