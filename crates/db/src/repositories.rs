pub mod booking;
pub mod mentor;
pub mod schedule_settings;
pub mod time_slot;
