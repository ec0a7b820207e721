//! Status flips that do not move time.
//!
//! Each is one conditional `UPDATE` and takes no slot lock. A transition
//! that does not apply (wrong status, wrong client) returns `None` and
//! leaves the row alone.

use bookwell_core::appointment::{client_change_allowed, AppointmentStatus, CancelOutcome};
use bookwell_core::error::CoreError;
use bookwell_core::settings::CalendarSettings;
use bookwell_core::types::DbId;
use bookwell_db::models::appointment::Appointment;
use bookwell_db::repositories::AppointmentRepo;

use super::BookingEngine;
use crate::error::EngineResult;
use crate::notices;

impl BookingEngine {
    /// Hold -> Booked.
    pub async fn confirm(
        &self,
        settings: &CalendarSettings,
        appointment_id: DbId,
    ) -> EngineResult<Option<Appointment>> {
        let confirmed = AppointmentRepo::confirm_hold(&self.pool, appointment_id).await?;
        match &confirmed {
            Some(appt) => {
                tracing::info!(appointment_id, "Hold confirmed");
                self.notify(notices::confirmed(settings, appt));
            }
            None => tracing::debug!(appointment_id, "Confirm ignored, not a hold"),
        }
        Ok(confirmed)
    }

    /// Hold -> Rejected.
    pub async fn reject(
        &self,
        settings: &CalendarSettings,
        appointment_id: DbId,
        reason: Option<&str>,
    ) -> EngineResult<Option<Appointment>> {
        let rejected = AppointmentRepo::reject_hold(&self.pool, appointment_id, reason).await?;
        match &rejected {
            Some(appt) => {
                tracing::info!(appointment_id, "Hold rejected");
                self.notify(notices::rejected(settings, appt));
            }
            None => tracing::debug!(appointment_id, "Reject ignored, not a hold"),
        }
        Ok(rejected)
    }

    /// Booked -> Canceled on behalf of the owning client, up to the
    /// cancellation cutoff.
    pub async fn cancel_by_client(
        &self,
        settings: &CalendarSettings,
        appointment_id: DbId,
        client_id: DbId,
    ) -> EngineResult<CancelOutcome> {
        let now = self.now();
        let Some(current) = AppointmentRepo::find_by_id(&self.pool, appointment_id).await? else {
            return Ok(CancelOutcome::NotAllowed);
        };
        if current.client_id != client_id
            || !current.status()?.can_transition_to(AppointmentStatus::Canceled)
        {
            return Ok(CancelOutcome::NotAllowed);
        }
        if !client_change_allowed(settings, current.start_at, now) {
            tracing::debug!(appointment_id, "Client cancel refused, inside cutoff");
            return Ok(CancelOutcome::TooLate);
        }

        // The update re-applies both conditions in case the row changed
        // since it was read.
        let canceled = AppointmentRepo::cancel_booked(
            &self.pool,
            appointment_id,
            Some(client_id),
            Some(now + settings.cancel_limit()),
        )
        .await?;
        match canceled {
            Some(appt) => {
                tracing::info!(appointment_id, client_id, "Appointment canceled by client");
                self.notify(notices::canceled_by_client(settings, &appt));
                Ok(CancelOutcome::Canceled)
            }
            None => Ok(CancelOutcome::NotAllowed),
        }
    }

    /// Booked -> Canceled, ignoring the cutoff.
    pub async fn cancel_by_operator(
        &self,
        settings: &CalendarSettings,
        appointment_id: DbId,
    ) -> EngineResult<Option<Appointment>> {
        let canceled =
            AppointmentRepo::cancel_booked(&self.pool, appointment_id, None, None).await?;
        match &canceled {
            Some(appt) => {
                tracing::info!(appointment_id, "Appointment canceled by operator");
                self.notify(notices::canceled_by_operator(settings, appt));
            }
            None => tracing::debug!(appointment_id, "Cancel ignored, not booked"),
        }
        Ok(canceled)
    }

    /// Record that the visit took place, optionally with its final price.
    ///
    /// Applies to Completed appointments and to Booked ones that have
    /// ended, which are completed on the spot.
    pub async fn confirm_visit(
        &self,
        appointment_id: DbId,
        final_price_cents: Option<i64>,
    ) -> EngineResult<Option<Appointment>> {
        if let Some(price) = final_price_cents.filter(|p| *p < 0) {
            return Err(CoreError::Validation(format!("Price cannot be negative, got {price}")).into());
        }
        let confirmed = AppointmentRepo::confirm_visit(
            &self.pool,
            appointment_id,
            final_price_cents,
            self.now(),
        )
        .await?;
        match &confirmed {
            Some(_) => tracing::info!(appointment_id, final_price_cents, "Visit confirmed"),
            None => tracing::debug!(appointment_id, "Visit confirmation ignored"),
        }
        Ok(confirmed)
    }
}
