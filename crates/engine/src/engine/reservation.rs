use bookwell_core::appointment::ReservationKind;
use bookwell_core::interval::Interval;
use bookwell_core::settings::CalendarSettings;
use bookwell_core::slot_key::slot_lock_key;
use bookwell_core::types::{DbId, Timestamp};
use bookwell_db::models::appointment::{Appointment, CreateAppointment};
use bookwell_db::repositories::{AppointmentRepo, ClientRepo};
use bookwell_db::reservation::{acquire_xact_lock, check_slot};
use serde::Deserialize;

use super::BookingEngine;
use crate::error::{ensure_free, EngineError, EngineResult};
use crate::notices;

/// A request for a new appointment.
#[derive(Debug, Clone, Deserialize)]
pub struct ReservationRequest {
    pub client_id: DbId,
    /// Ordered; the first entry is the primary service.
    pub service_ids: Vec<DbId>,
    pub start_at: Timestamp,
    pub kind: ReservationKind,
    /// Defaults to the sum of service prices when several are booked.
    pub price_override_cents: Option<i64>,
    pub client_comment: Option<String>,
    pub admin_comment: Option<String>,
}

impl BookingEngine {
    /// Create a Hold or a Booked appointment.
    ///
    /// Runs under the slot-key lock of `(start, primary service)` and
    /// re-checks the calendar inside it. Fails with `SlotTaken` or
    /// `SlotBlocked` on conflict; the caller should offer another time.
    pub async fn reserve(
        &self,
        settings: &CalendarSettings,
        request: &ReservationRequest,
    ) -> EngineResult<Appointment> {
        let now = self.now();
        if request.start_at < now {
            return Err(EngineError::InPast(request.start_at));
        }

        if ClientRepo::find_by_id(&self.pool, request.client_id).await?.is_none() {
            return Err(EngineError::not_found("Client", request.client_id));
        }
        let services = self.resolve_services(&request.service_ids).await?;
        let occupied = services.occupied_min(i64::from(settings.buffer_min));
        let interval = Interval::starting_at(request.start_at, occupied)?;
        let primary = services.primary().id;

        let price_override_cents = request.price_override_cents.or_else(|| {
            (request.service_ids.len() > 1).then(|| services.total_price_cents())
        });

        let mut tx = self.pool.begin().await?;
        acquire_xact_lock(&mut *tx, slot_lock_key(request.start_at, primary)).await?;

        if let Err(conflict) = ensure_free(check_slot(&mut *tx, interval, None).await?) {
            tracing::debug!(
                start_at = %request.start_at,
                service_id = primary,
                error = %conflict,
                "Reservation conflict"
            );
            return Err(conflict);
        }

        let appointment = AppointmentRepo::insert(
            &mut *tx,
            &CreateAppointment {
                client_id: request.client_id,
                service_ids: services.ids(),
                start_at: interval.start,
                end_at: interval.end,
                status: request.kind.initial_status(),
                hold_expires_at: request.kind.hold_expires_at(settings, now),
                price_override_cents,
                client_comment: request.client_comment.clone(),
                admin_comment: request.admin_comment.clone(),
            },
        )
        .await
        .map_err(EngineError::from_write)?;
        tx.commit().await?;

        tracing::info!(
            appointment_id = appointment.id,
            client_id = appointment.client_id,
            status = ?request.kind,
            start_at = %appointment.start_at,
            "Appointment reserved"
        );
        self.notify(match request.kind {
            ReservationKind::Hold => notices::hold_created(settings, &appointment),
            ReservationKind::Booked => notices::booked(settings, &appointment),
        });
        Ok(appointment)
    }
}
