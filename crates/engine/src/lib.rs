//! The booking engine.
//!
//! [`BookingEngine`] owns every operation that reads or writes the
//! calendar. The [`background`] loops drive the time-based transitions
//! (hold expiry, break expansion, reminders, completion) through the same
//! engine, and the `bookwell-worker` binary wires it all together.

pub mod background;
pub mod config;
pub mod engine;
pub mod error;
pub mod notices;

pub use engine::{BookingEngine, ExpansionReport, ReservationRequest};
pub use error::{EngineError, EngineResult};
