//! Periodic jobs driving time-based transitions.
//!
//! Each job is an `async fn run(engine, period, cancel)` loop that reloads
//! the calendar settings on every tick and stops when `cancel` fires. A
//! failed tick is logged and retried on the next one.

pub mod break_expansion;
pub mod completion;
pub mod hold_expiry;
pub mod reminders;
