//! Row structs and DTOs.
//!
//! Each submodule contains a `FromRow` + `Serialize` struct matching the
//! database row and, where the engine inserts rows, a create DTO.

pub mod appointment;
pub mod blocked_interval;
pub mod break_rule;
pub mod client;
pub mod service;
pub mod setting;
