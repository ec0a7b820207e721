//! [`BookingEngine`] and its operations.
//!
//! Operations take the [`CalendarSettings`] snapshot they run against as
//! an argument; callers load it with [`BookingEngine::load_settings`] once
//! per request. Every operation reads the current instant from the
//! engine's [`Clock`] and publishes notifications only after its
//! transaction has committed.

use std::sync::Arc;

use bookwell_core::clock::Clock;
use bookwell_core::settings::CalendarSettings;
use bookwell_core::types::Timestamp;
use bookwell_db::repositories::SettingsRepo;
use bookwell_db::DbPool;
use bookwell_events::{Notification, NotificationSink};
use chrono_tz::Tz;

use crate::error::EngineResult;

mod availability;
mod breaks;
mod clients;
mod lifecycle;
mod projections;
mod reservation;
mod reschedule;
mod sweeps;

pub use breaks::ExpansionReport;
pub use reservation::ReservationRequest;

/// The scheduling engine. Cheap to clone; clones share the pool, clock
/// and sink.
#[derive(Clone)]
pub struct BookingEngine {
    pool: DbPool,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn NotificationSink>,
    default_tz: Tz,
}

impl BookingEngine {
    /// `default_tz` applies when the settings table has no timezone row.
    pub fn new(
        pool: DbPool,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn NotificationSink>,
        default_tz: Tz,
    ) -> Self {
        Self {
            pool,
            clock,
            notifier,
            default_tz,
        }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Read the settings table into a fresh snapshot.
    pub async fn load_settings(&self) -> EngineResult<CalendarSettings> {
        let rows = SettingsRepo::list(&self.pool).await?;
        let settings = CalendarSettings::from_entries(
            rows.into_iter().map(|row| (row.key, row.value)),
            self.default_tz,
        )?;
        Ok(settings)
    }

    /// Insert `defaults` for every settings key that has no row yet.
    /// Returns the number of keys inserted.
    pub async fn seed_settings(&self, defaults: &CalendarSettings) -> EngineResult<u64> {
        defaults.validate()?;
        let inserted = SettingsRepo::seed_missing(&self.pool, &defaults.to_entries()).await?;
        if inserted > 0 {
            tracing::info!(inserted, "Seeded missing settings");
        }
        Ok(inserted)
    }

    /// Publish after commit, stamped with the engine clock.
    fn notify(&self, notification: Notification) {
        self.notifier.notify(notification.at(self.clock.now()));
    }
}
