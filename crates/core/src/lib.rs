//! Scheduling domain logic for the bookwell engine.
//!
//! This crate has zero internal dependencies: everything here is pure and
//! can be used from the repository layer, the engine, or tests without a
//! database.

pub mod appointment;
pub mod availability;
pub mod break_rules;
pub mod clock;
pub mod error;
pub mod interval;
pub mod reminders;
pub mod services;
pub mod settings;
pub mod slot_key;
pub mod types;
