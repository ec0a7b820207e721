//! Appointment models and DTOs.

use bookwell_core::appointment::AppointmentStatus;
use bookwell_core::error::CoreError;
use bookwell_core::interval::Interval;
use bookwell_core::types::{DbId, StatusId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `appointments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Appointment {
    pub id: DbId,
    pub client_id: DbId,
    /// Primary service, equal to `service_ids[0]`.
    pub service_id: DbId,
    pub service_ids: Vec<DbId>,
    pub start_at: Timestamp,
    pub end_at: Timestamp,
    pub status_id: StatusId,
    pub hold_expires_at: Option<Timestamp>,
    /// Pending reschedule request; only meaningful while Booked.
    pub proposed_start_at: Option<Timestamp>,
    pub price_override_cents: Option<i64>,
    pub visit_confirmed: bool,
    pub reminder_first_sent: bool,
    pub reminder_second_sent: bool,
    pub client_comment: Option<String>,
    pub admin_comment: Option<String>,
    pub rejection_reason: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Appointment {
    pub fn status(&self) -> Result<AppointmentStatus, CoreError> {
        AppointmentStatus::from_id(self.status_id)
    }

    pub fn interval(&self) -> Interval {
        Interval {
            start: self.start_at,
            end: self.end_at,
        }
    }
}

/// An appointment joined with the names needed to present it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AppointmentDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub appointment: Appointment,
    pub service_name: String,
    pub client_ref: String,
    pub client_name: Option<String>,
    /// Catalogue price of the primary service, in cents.
    pub service_price_cents: i64,
}

/// DTO for inserting an appointment. Callers must have validated the slot.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAppointment {
    pub client_id: DbId,
    pub service_ids: Vec<DbId>,
    pub start_at: Timestamp,
    pub end_at: Timestamp,
    pub status: AppointmentStatus,
    pub hold_expires_at: Option<Timestamp>,
    pub price_override_cents: Option<i64>,
    pub client_comment: Option<String>,
    pub admin_comment: Option<String>,
}

/// Aggregate over confirmed visits in a range.
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize)]
pub struct VisitTotals {
    pub visit_count: i64,
    pub total_price_cents: i64,
    pub total_minutes: i64,
}
