//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods.
//! Methods that may run inside a transaction accept `impl PgExecutor`, so
//! callers pass either `&PgPool` or `&mut *tx`.

pub mod appointment_repo;
pub mod blocked_interval_repo;
pub mod break_rule_repo;
pub mod client_repo;
pub mod service_repo;
pub mod settings_repo;

pub use appointment_repo::AppointmentRepo;
pub use blocked_interval_repo::BlockedIntervalRepo;
pub use break_rule_repo::BreakRuleRepo;
pub use client_repo::ClientRepo;
pub use service_repo::ServiceRepo;
pub use settings_repo::SettingsRepo;
