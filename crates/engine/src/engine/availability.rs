use bookwell_core::availability::{list_work_dates, lookup_window, AvailableSlots};
use bookwell_core::error::CoreError;
use bookwell_core::services::ServiceSelection;
use bookwell_core::settings::CalendarSettings;
use bookwell_core::types::DbId;
use bookwell_db::repositories::ServiceRepo;
use bookwell_db::reservation::busy_intervals;
use chrono::NaiveDate;

use super::BookingEngine;
use crate::error::{EngineError, EngineResult};

impl BookingEngine {
    /// Bookable work days from today through the horizon.
    pub fn list_available_dates(&self, settings: &CalendarSettings) -> Vec<NaiveDate> {
        list_work_dates(settings, self.now())
    }

    /// Free start times on `day` for the given services.
    ///
    /// Break rules are expanded first so that recurring breaks inside the
    /// horizon are visible; an expansion failure is logged and the listing
    /// proceeds with what is stored.
    pub async fn list_slots(
        &self,
        settings: &CalendarSettings,
        services: &ServiceSelection,
        day: NaiveDate,
    ) -> EngineResult<AvailableSlots> {
        if let Err(e) = self
            .expand_break_rules(settings, settings.booking_horizon_days)
            .await
        {
            tracing::warn!(error = %e, "Break expansion before slot listing failed");
        }
        let occupied = services.occupied_min(i64::from(settings.buffer_min));
        self.free_slots(settings, day, occupied).await
    }

    /// Free start times on `day` for a break of `duration_min` minutes.
    /// No buffers apply.
    pub async fn list_break_slots(
        &self,
        settings: &CalendarSettings,
        day: NaiveDate,
        duration_min: i64,
    ) -> EngineResult<AvailableSlots> {
        self.free_slots(settings, day, duration_min).await
    }

    async fn free_slots(
        &self,
        settings: &CalendarSettings,
        day: NaiveDate,
        occupied_min: i64,
    ) -> EngineResult<AvailableSlots> {
        let busy = if settings.is_work_day(day) {
            busy_intervals(&self.pool, lookup_window(settings, day)?).await?
        } else {
            Vec::new()
        };
        Ok(AvailableSlots::new(
            settings,
            day,
            occupied_min,
            self.now(),
            busy,
        )?)
    }

    /// Load services in the given order. Unknown ids are `NotFound`,
    /// retired services a validation error.
    pub async fn resolve_services(&self, ids: &[DbId]) -> EngineResult<ServiceSelection> {
        let found = ServiceRepo::find_many(&self.pool, ids).await?;
        let mut footprints = Vec::with_capacity(ids.len());
        for id in ids {
            let service = found
                .iter()
                .find(|s| s.id == *id)
                .ok_or_else(|| EngineError::not_found("Service", *id))?;
            if !service.is_active {
                return Err(CoreError::Validation(format!(
                    "Service '{}' is not offered",
                    service.name
                ))
                .into());
            }
            footprints.push(service.footprint());
        }
        Ok(ServiceSelection::new(footprints)?)
    }
}
