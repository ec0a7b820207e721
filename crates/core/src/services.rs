//! Service footprints and multi-service arithmetic.
//!
//! A booking names one or more services. The first is the primary: its id
//! keys the slot lock and its buffer is added, together with the global
//! buffer, when the occupied end is computed. Every other service
//! contributes its duration and its buffer to the requested duration.

use crate::availability::occupied_minutes;
use crate::error::CoreError;
use crate::types::DbId;

/// The calendar-relevant part of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceFootprint {
    pub id: DbId,
    pub duration_min: i64,
    pub buffer_min: i64,
    pub price_cents: i64,
}

/// A resolved, ordered service selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSelection {
    services: Vec<ServiceFootprint>,
}

impl ServiceSelection {
    pub fn new(services: Vec<ServiceFootprint>) -> Result<Self, CoreError> {
        if services.is_empty() {
            return Err(CoreError::Validation(
                "At least one service must be selected".into(),
            ));
        }
        if let Some(bad) = services.iter().find(|s| s.duration_min <= 0) {
            return Err(CoreError::Validation(format!(
                "Service {} has a non-positive duration",
                bad.id
            )));
        }
        Ok(Self { services })
    }

    pub fn primary(&self) -> &ServiceFootprint {
        // Non-empty by construction.
        &self.services[0]
    }

    pub fn ids(&self) -> Vec<DbId> {
        self.services.iter().map(|s| s.id).collect()
    }

    /// Requested duration: every duration and buffer except the primary's
    /// buffer.
    pub fn requested_duration_min(&self) -> i64 {
        let durations: i64 = self.services.iter().map(|s| s.duration_min).sum();
        let buffers: i64 = self.services.iter().map(|s| s.buffer_min).sum();
        durations + buffers - self.primary().buffer_min
    }

    /// Minutes the booking occupies on the calendar.
    pub fn occupied_min(&self, global_buffer_min: i64) -> i64 {
        occupied_minutes(
            self.requested_duration_min(),
            self.primary().buffer_min,
            global_buffer_min,
        )
    }

    /// Sum of catalogue prices, in cents.
    pub fn total_price_cents(&self) -> i64 {
        self.services.iter().map(|s| s.price_cents).sum()
    }
}
