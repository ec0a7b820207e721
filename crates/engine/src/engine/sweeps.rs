//! Time-driven transitions, run by the background loops.
//!
//! Each sweep is a single `UPDATE … RETURNING` committed before any
//! notification goes out, so two overlapping sweeps never report the same
//! row.

use bookwell_core::appointment::client_change_allowed;
use bookwell_core::reminders::ReminderKind;
use bookwell_core::settings::CalendarSettings;
use bookwell_db::repositories::AppointmentRepo;

use super::BookingEngine;
use crate::error::EngineResult;
use crate::notices;

impl BookingEngine {
    /// Reject every hold whose TTL elapsed. Returns the number expired.
    pub async fn expire_holds(&self, settings: &CalendarSettings) -> EngineResult<usize> {
        let mut tx = self.pool.begin().await?;
        let expired = AppointmentRepo::expire_holds(&mut *tx, self.now()).await?;
        tx.commit().await?;

        for appt in &expired {
            tracing::debug!(appointment_id = appt.id, "Hold expired");
            self.notify(notices::hold_expired(settings, appt));
        }
        Ok(expired.len())
    }

    /// Complete every Booked appointment that has ended and ask the
    /// operators to confirm each visit.
    pub async fn complete_finished(&self, settings: &CalendarSettings) -> EngineResult<usize> {
        let mut tx = self.pool.begin().await?;
        let completed = AppointmentRepo::complete_finished(&mut *tx, self.now()).await?;
        tx.commit().await?;

        for appt in &completed {
            self.notify(notices::visit_confirmation_requested(settings, appt));
        }
        Ok(completed.len())
    }

    /// Send every reminder that is due now. Returns the number sent.
    pub async fn send_reminders(&self, settings: &CalendarSettings) -> EngineResult<usize> {
        let now = self.now();
        let mut sent = 0;
        for kind in ReminderKind::ALL {
            let claimed = AppointmentRepo::claim_reminders(&self.pool, kind, kind.window(now)).await?;
            for detail in &claimed {
                let allow_change =
                    client_change_allowed(settings, detail.appointment.start_at, now);
                self.notify(notices::reminder(settings, detail, kind, allow_change));
            }
            sent += claimed.len();
        }
        Ok(sent)
    }
}
