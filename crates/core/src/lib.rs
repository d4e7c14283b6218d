//! # MentorSync Core
//!
//! Domain types and the scheduling engine: the slot generator, the booking
//! lifecycle, the persistence contract and the services that drive them.
//! Nothing here performs I/O except through a [`store::SchedulingStore`].

pub mod clock;
pub mod errors;
pub mod generator;
pub mod lifecycle;
pub mod models;
pub mod services;
pub mod store;
