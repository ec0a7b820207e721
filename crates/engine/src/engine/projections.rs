//! Read-only views over the calendar.

use bookwell_core::interval::Interval;
use bookwell_core::settings::CalendarSettings;
use bookwell_core::types::DbId;
use bookwell_db::models::appointment::{AppointmentDetail, VisitTotals};
use bookwell_db::models::blocked_interval::BlockedInterval;
use bookwell_db::repositories::{AppointmentRepo, BlockedIntervalRepo};
use chrono::NaiveDate;

use super::BookingEngine;
use crate::error::EngineResult;

impl BookingEngine {
    /// A client's future bookings and pending holds, soonest first.
    pub async fn list_upcoming_for_client(
        &self,
        client_id: DbId,
        limit: i64,
    ) -> EngineResult<Vec<AppointmentDetail>> {
        Ok(AppointmentRepo::list_upcoming_for_client(&self.pool, client_id, self.now(), limit).await?)
    }

    /// A client's past appointments, newest first.
    pub async fn list_history_for_client(
        &self,
        client_id: DbId,
        limit: i64,
    ) -> EngineResult<Vec<AppointmentDetail>> {
        Ok(AppointmentRepo::list_history_for_client(&self.pool, client_id, self.now(), limit).await?)
    }

    /// Active appointments starting on a local calendar day.
    pub async fn list_for_day(
        &self,
        settings: &CalendarSettings,
        day: NaiveDate,
    ) -> EngineResult<Vec<AppointmentDetail>> {
        let bounds = settings.day_bounds(day)?;
        Ok(AppointmentRepo::list_active_starting_in(&self.pool, bounds).await?)
    }

    pub async fn list_for_range(&self, range: Interval) -> EngineResult<Vec<AppointmentDetail>> {
        Ok(AppointmentRepo::list_active_starting_in(&self.pool, range).await?)
    }

    pub async fn list_pending_holds(&self) -> EngineResult<Vec<AppointmentDetail>> {
        Ok(AppointmentRepo::list_holds(&self.pool).await?)
    }

    pub async fn list_blocked_range(&self, range: Interval) -> EngineResult<Vec<BlockedInterval>> {
        Ok(BlockedIntervalRepo::list_in_range(&self.pool, range).await?)
    }

    /// Count, revenue and minutes of confirmed visits starting in `range`.
    pub async fn visit_summary(&self, range: Interval) -> EngineResult<VisitTotals> {
        Ok(AppointmentRepo::visit_totals(&self.pool, range).await?)
    }
}
