//! The reschedule handshake.
//!
//! A client proposes a new start; an operator approves or rejects it.
//! Operators can also move an appointment directly. Every path that moves
//! time locks the appointment row, then the slot key of the new start,
//! and re-checks the calendar excluding the appointment itself.

use bookwell_core::appointment::{client_change_allowed, AppointmentStatus};
use bookwell_core::interval::Interval;
use bookwell_core::settings::CalendarSettings;
use bookwell_core::slot_key::slot_lock_key;
use bookwell_core::types::{DbId, Timestamp};
use bookwell_db::models::appointment::Appointment;
use bookwell_db::repositories::AppointmentRepo;
use bookwell_db::reservation::{acquire_xact_lock, check_slot};
use sqlx::PgConnection;

use super::BookingEngine;
use crate::error::{ensure_free, EngineError, EngineResult};
use crate::notices;

impl BookingEngine {
    /// Record a client's request to move their Booked appointment to
    /// `new_start`. Times do not change until an operator approves.
    ///
    /// Clients may ask up to the cancellation cutoff of the current start.
    pub async fn propose_reschedule(
        &self,
        settings: &CalendarSettings,
        appointment_id: DbId,
        client_id: DbId,
        new_start: Timestamp,
    ) -> EngineResult<Appointment> {
        self.ensure_future(new_start)?;

        let mut tx = self.pool.begin().await?;
        let current = lock_booked(&mut *tx, appointment_id).await?;
        if current.client_id != client_id {
            return Err(EngineError::NotOwner {
                appointment_id,
                client_id,
            });
        }
        if !client_change_allowed(settings, current.start_at, self.now()) {
            tracing::debug!(appointment_id, "Reschedule request refused, inside cutoff");
            return Err(EngineError::ChangeClosed(appointment_id));
        }
        reserve_target(&mut *tx, &current, new_start).await?;

        let proposed = AppointmentRepo::set_proposal(&mut *tx, appointment_id, new_start)
            .await?
            .ok_or(EngineError::NotBooked(appointment_id))?;
        tx.commit().await?;

        tracing::info!(appointment_id, proposed_start_at = %new_start, "Reschedule proposed");
        self.notify(notices::reschedule_proposed(settings, &proposed));
        Ok(proposed)
    }

    /// Move the appointment to its proposed start.
    ///
    /// The target is re-validated; on conflict the proposal stays pending
    /// so the operator can reject it explicitly.
    pub async fn approve_reschedule(
        &self,
        settings: &CalendarSettings,
        appointment_id: DbId,
    ) -> EngineResult<Appointment> {
        let mut tx = self.pool.begin().await?;
        let current = lock_booked(&mut *tx, appointment_id).await?;
        let new_start = current
            .proposed_start_at
            .ok_or(EngineError::NoPendingProposal(appointment_id))?;
        self.ensure_future(new_start)?;

        let target = reserve_target(&mut *tx, &current, new_start).await?;
        let moved = apply_move(&mut *tx, appointment_id, target).await?;
        tx.commit().await?;

        tracing::info!(appointment_id, start_at = %moved.start_at, "Reschedule approved");
        self.notify(notices::reschedule_approved(settings, &moved));
        Ok(moved)
    }

    /// Drop the pending proposal, leaving times unchanged.
    pub async fn reject_reschedule(
        &self,
        settings: &CalendarSettings,
        appointment_id: DbId,
    ) -> EngineResult<Appointment> {
        let Some(cleared) = AppointmentRepo::clear_proposal(&self.pool, appointment_id).await?
        else {
            return match AppointmentRepo::find_by_id(&self.pool, appointment_id).await? {
                Some(_) => Err(EngineError::NoPendingProposal(appointment_id)),
                None => Err(EngineError::not_found("Appointment", appointment_id)),
            };
        };

        tracing::info!(appointment_id, "Reschedule rejected");
        self.notify(notices::reschedule_rejected(settings, &cleared));
        Ok(cleared)
    }

    /// Operator move: propose and approve in one transaction.
    pub async fn direct_reschedule(
        &self,
        settings: &CalendarSettings,
        appointment_id: DbId,
        new_start: Timestamp,
    ) -> EngineResult<Appointment> {
        self.ensure_future(new_start)?;

        let mut tx = self.pool.begin().await?;
        let current = lock_booked(&mut *tx, appointment_id).await?;
        let target = reserve_target(&mut *tx, &current, new_start).await?;
        let moved = apply_move(&mut *tx, appointment_id, target).await?;
        tx.commit().await?;

        tracing::info!(appointment_id, start_at = %moved.start_at, "Appointment rescheduled");
        self.notify(notices::rescheduled(settings, &moved));
        Ok(moved)
    }

    fn ensure_future(&self, start: Timestamp) -> EngineResult<()> {
        if start < self.now() {
            return Err(EngineError::InPast(start));
        }
        Ok(())
    }
}

/// Lock the appointment row and require it to be Booked.
async fn lock_booked(conn: &mut PgConnection, appointment_id: DbId) -> EngineResult<Appointment> {
    let current = AppointmentRepo::find_for_update(&mut *conn, appointment_id)
        .await?
        .ok_or_else(|| EngineError::not_found("Appointment", appointment_id))?;
    if current.status()? != AppointmentStatus::Booked {
        return Err(EngineError::NotBooked(appointment_id));
    }
    Ok(current)
}

/// Take the slot lock for `new_start` and check that the moved interval is
/// free apart from the appointment itself.
async fn reserve_target(
    conn: &mut PgConnection,
    current: &Appointment,
    new_start: Timestamp,
) -> EngineResult<Interval> {
    let target = current.interval().moved_to(new_start);
    acquire_xact_lock(&mut *conn, slot_lock_key(new_start, current.service_id)).await?;
    if let Err(conflict) = ensure_free(check_slot(&mut *conn, target, Some(current.id)).await?) {
        tracing::debug!(
            appointment_id = current.id,
            start_at = %new_start,
            error = %conflict,
            "Reschedule conflict"
        );
        return Err(conflict);
    }
    Ok(target)
}

async fn apply_move(
    conn: &mut PgConnection,
    appointment_id: DbId,
    target: Interval,
) -> EngineResult<Appointment> {
    AppointmentRepo::apply_move(&mut *conn, appointment_id, target)
        .await
        .map_err(EngineError::from_write)?
        .ok_or(EngineError::NotBooked(appointment_id))
}
