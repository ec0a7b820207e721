//! Repository for the `appointments` table.
//!
//! Status flips that do not move time are single conditional `UPDATE`
//! statements: the `WHERE` clause carries the precondition and an empty
//! result means the transition did not apply. Methods accept any
//! `PgExecutor` so they can run on the pool or inside a transaction.

use bookwell_core::appointment::{AppointmentStatus, ACTIVE_STATUS_IDS};
use bookwell_core::interval::Interval;
use bookwell_core::reminders::ReminderKind;
use bookwell_core::types::{DbId, Timestamp};
use sqlx::PgExecutor;

use crate::models::appointment::{
    Appointment, AppointmentDetail, CreateAppointment, VisitTotals,
};

/// Column list for `appointments` queries.
const COLUMNS: &str = "\
    id, client_id, service_id, service_ids, start_at, end_at, status_id, \
    hold_expires_at, proposed_start_at, price_override_cents, visit_confirmed, \
    reminder_first_sent, reminder_second_sent, client_comment, admin_comment, \
    rejection_reason, created_at, updated_at";

/// Same columns qualified with the `a` alias, plus the joined names.
const DETAIL_COLUMNS: &str = "\
    a.id, a.client_id, a.service_id, a.service_ids, a.start_at, a.end_at, a.status_id, \
    a.hold_expires_at, a.proposed_start_at, a.price_override_cents, a.visit_confirmed, \
    a.reminder_first_sent, a.reminder_second_sent, a.client_comment, a.admin_comment, \
    a.rejection_reason, a.created_at, a.updated_at, \
    s.name AS service_name, c.external_ref AS client_ref, c.display_name AS client_name, \
    s.price_cents AS service_price_cents";

/// Join clause matching [`DETAIL_COLUMNS`].
const DETAIL_JOINS: &str = "\
    JOIN services s ON s.id = a.service_id \
    JOIN clients c ON c.id = a.client_id";

/// Reason recorded when the sweeper rejects an abandoned hold.
pub const HOLD_EXPIRED_REASON: &str = "hold expired";

/// Provides queries and guarded transitions for appointments.
pub struct AppointmentRepo;

impl AppointmentRepo {
    // -----------------------------------------------------------------------
    // Creation and lookup
    // -----------------------------------------------------------------------

    /// Insert an appointment. The primary service is `service_ids[1]` (SQL
    /// arrays are one-based).
    pub async fn insert(
        executor: impl PgExecutor<'_>,
        input: &CreateAppointment,
    ) -> Result<Appointment, sqlx::Error> {
        let query = format!(
            "INSERT INTO appointments \
                (client_id, service_id, service_ids, start_at, end_at, status_id, \
                 hold_expires_at, price_override_cents, client_comment, admin_comment) \
             VALUES ($1, $2[1], $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Appointment>(&query)
            .bind(input.client_id)
            .bind(&input.service_ids)
            .bind(input.start_at)
            .bind(input.end_at)
            .bind(input.status.id())
            .bind(input.hold_expires_at)
            .bind(input.price_override_cents)
            .bind(&input.client_comment)
            .bind(&input.admin_comment)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<Appointment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM appointments WHERE id = $1");
        sqlx::query_as::<_, Appointment>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Lock the row for the rest of the transaction.
    pub async fn find_for_update(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<Appointment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM appointments WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Appointment>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    // -----------------------------------------------------------------------
    // Guarded status transitions
    // -----------------------------------------------------------------------

    /// Hold -> Booked. Clears the expiry.
    pub async fn confirm_hold(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<Appointment>, sqlx::Error> {
        let query = format!(
            "UPDATE appointments SET status_id = $2, hold_expires_at = NULL \
             WHERE id = $1 AND status_id = $3 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Appointment>(&query)
            .bind(id)
            .bind(AppointmentStatus::Booked.id())
            .bind(AppointmentStatus::Hold.id())
            .fetch_optional(executor)
            .await
    }

    /// Hold -> Rejected with an optional reason.
    pub async fn reject_hold(
        executor: impl PgExecutor<'_>,
        id: DbId,
        reason: Option<&str>,
    ) -> Result<Option<Appointment>, sqlx::Error> {
        let query = format!(
            "UPDATE appointments \
             SET status_id = $2, hold_expires_at = NULL, rejection_reason = $4 \
             WHERE id = $1 AND status_id = $3 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Appointment>(&query)
            .bind(id)
            .bind(AppointmentStatus::Rejected.id())
            .bind(AppointmentStatus::Hold.id())
            .bind(reason)
            .fetch_optional(executor)
            .await
    }

    /// Booked -> Canceled.
    ///
    /// `client_id` restricts the update to that client's appointment and
    /// `not_before` requires `start_at >= not_before`; either may be `None`
    /// for the operator path.
    pub async fn cancel_booked(
        executor: impl PgExecutor<'_>,
        id: DbId,
        client_id: Option<DbId>,
        not_before: Option<Timestamp>,
    ) -> Result<Option<Appointment>, sqlx::Error> {
        let query = format!(
            "UPDATE appointments SET status_id = $2, proposed_start_at = NULL \
             WHERE id = $1 AND status_id = $3 \
               AND ($4::BIGINT IS NULL OR client_id = $4) \
               AND ($5::TIMESTAMPTZ IS NULL OR start_at >= $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Appointment>(&query)
            .bind(id)
            .bind(AppointmentStatus::Canceled.id())
            .bind(AppointmentStatus::Booked.id())
            .bind(client_id)
            .bind(not_before)
            .fetch_optional(executor)
            .await
    }

    /// Mark the visit confirmed, completing a finished Booked appointment.
    ///
    /// Applies to Completed appointments and to Booked ones whose end is at
    /// or before `now`. `price_override_cents` replaces the stored override
    /// when given.
    pub async fn confirm_visit(
        executor: impl PgExecutor<'_>,
        id: DbId,
        price_override_cents: Option<i64>,
        now: Timestamp,
    ) -> Result<Option<Appointment>, sqlx::Error> {
        let query = format!(
            "UPDATE appointments \
             SET status_id = $2, visit_confirmed = TRUE, proposed_start_at = NULL, \
                 price_override_cents = COALESCE($4, price_override_cents) \
             WHERE id = $1 \
               AND (status_id = $2 OR (status_id = $3 AND end_at <= $5)) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Appointment>(&query)
            .bind(id)
            .bind(AppointmentStatus::Completed.id())
            .bind(AppointmentStatus::Booked.id())
            .bind(price_override_cents)
            .bind(now)
            .fetch_optional(executor)
            .await
    }

    // -----------------------------------------------------------------------
    // Reschedule
    // -----------------------------------------------------------------------

    /// Record a pending reschedule request on a Booked appointment.
    pub async fn set_proposal(
        executor: impl PgExecutor<'_>,
        id: DbId,
        proposed_start_at: Timestamp,
    ) -> Result<Option<Appointment>, sqlx::Error> {
        let query = format!(
            "UPDATE appointments SET proposed_start_at = $2 \
             WHERE id = $1 AND status_id = $3 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Appointment>(&query)
            .bind(id)
            .bind(proposed_start_at)
            .bind(AppointmentStatus::Booked.id())
            .fetch_optional(executor)
            .await
    }

    /// Drop a pending reschedule request. Times stay unchanged.
    pub async fn clear_proposal(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<Appointment>, sqlx::Error> {
        let query = format!(
            "UPDATE appointments SET proposed_start_at = NULL \
             WHERE id = $1 AND proposed_start_at IS NOT NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Appointment>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Move a Booked appointment and treat it as a new occurrence: the
    /// proposal, reminder flags and visit confirmation are reset.
    pub async fn apply_move(
        executor: impl PgExecutor<'_>,
        id: DbId,
        to: Interval,
    ) -> Result<Option<Appointment>, sqlx::Error> {
        let query = format!(
            "UPDATE appointments \
             SET start_at = $2, end_at = $3, proposed_start_at = NULL, \
                 reminder_first_sent = FALSE, reminder_second_sent = FALSE, \
                 visit_confirmed = FALSE \
             WHERE id = $1 AND status_id = $4 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Appointment>(&query)
            .bind(id)
            .bind(to.start)
            .bind(to.end)
            .bind(AppointmentStatus::Booked.id())
            .fetch_optional(executor)
            .await
    }

    // -----------------------------------------------------------------------
    // Sweeps
    // -----------------------------------------------------------------------

    /// Reject every hold whose expiry is at or before `now`.
    ///
    /// One statement: concurrent sweeps cannot both return the same row.
    pub async fn expire_holds(
        executor: impl PgExecutor<'_>,
        now: Timestamp,
    ) -> Result<Vec<Appointment>, sqlx::Error> {
        let query = format!(
            "UPDATE appointments \
             SET status_id = $2, hold_expires_at = NULL, rejection_reason = $4 \
             WHERE status_id = $3 AND hold_expires_at <= $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Appointment>(&query)
            .bind(now)
            .bind(AppointmentStatus::Rejected.id())
            .bind(AppointmentStatus::Hold.id())
            .bind(HOLD_EXPIRED_REASON)
            .fetch_all(executor)
            .await
    }

    /// Complete every Booked appointment whose end is at or before `now`.
    pub async fn complete_finished(
        executor: impl PgExecutor<'_>,
        now: Timestamp,
    ) -> Result<Vec<Appointment>, sqlx::Error> {
        let query = format!(
            "UPDATE appointments SET status_id = $2, proposed_start_at = NULL \
             WHERE status_id = $3 AND end_at <= $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Appointment>(&query)
            .bind(now)
            .bind(AppointmentStatus::Completed.id())
            .bind(AppointmentStatus::Booked.id())
            .fetch_all(executor)
            .await
    }

    /// Flag and return the Booked appointments starting inside `window`
    /// that have not had this reminder yet.
    pub async fn claim_reminders(
        executor: impl PgExecutor<'_>,
        kind: ReminderKind,
        window: Interval,
    ) -> Result<Vec<AppointmentDetail>, sqlx::Error> {
        let flag = kind.flag_column();
        let query = format!(
            "WITH claimed AS ( \
                 UPDATE appointments SET {flag} = TRUE \
                 WHERE status_id = $3 AND {flag} = FALSE \
                   AND start_at >= $1 AND start_at < $2 \
                 RETURNING * \
             ) \
             SELECT {DETAIL_COLUMNS} FROM claimed a {DETAIL_JOINS} \
             ORDER BY a.start_at"
        );
        sqlx::query_as::<_, AppointmentDetail>(&query)
            .bind(window.start)
            .bind(window.end)
            .bind(AppointmentStatus::Booked.id())
            .fetch_all(executor)
            .await
    }

    // -----------------------------------------------------------------------
    // Projections
    // -----------------------------------------------------------------------

    /// Future Booked appointments and unexpired holds of one client.
    pub async fn list_upcoming_for_client(
        executor: impl PgExecutor<'_>,
        client_id: DbId,
        now: Timestamp,
        limit: i64,
    ) -> Result<Vec<AppointmentDetail>, sqlx::Error> {
        let query = format!(
            "SELECT {DETAIL_COLUMNS} FROM appointments a {DETAIL_JOINS} \
             WHERE a.client_id = $1 AND a.start_at >= $2 \
               AND (a.status_id = $3 OR (a.status_id = $4 AND a.hold_expires_at > $2)) \
             ORDER BY a.start_at ASC \
             LIMIT $5"
        );
        sqlx::query_as::<_, AppointmentDetail>(&query)
            .bind(client_id)
            .bind(now)
            .bind(AppointmentStatus::Booked.id())
            .bind(AppointmentStatus::Hold.id())
            .bind(limit)
            .fetch_all(executor)
            .await
    }

    /// Past appointments of one client, newest first, holds excluded.
    pub async fn list_history_for_client(
        executor: impl PgExecutor<'_>,
        client_id: DbId,
        now: Timestamp,
        limit: i64,
    ) -> Result<Vec<AppointmentDetail>, sqlx::Error> {
        let query = format!(
            "SELECT {DETAIL_COLUMNS} FROM appointments a {DETAIL_JOINS} \
             WHERE a.client_id = $1 AND a.start_at < $2 AND a.status_id <> $3 \
             ORDER BY a.start_at DESC \
             LIMIT $4"
        );
        sqlx::query_as::<_, AppointmentDetail>(&query)
            .bind(client_id)
            .bind(now)
            .bind(AppointmentStatus::Hold.id())
            .bind(limit)
            .fetch_all(executor)
            .await
    }

    /// Active appointments starting inside `range`, in start order.
    pub async fn list_active_starting_in(
        executor: impl PgExecutor<'_>,
        range: Interval,
    ) -> Result<Vec<AppointmentDetail>, sqlx::Error> {
        let query = format!(
            "SELECT {DETAIL_COLUMNS} FROM appointments a {DETAIL_JOINS} \
             WHERE a.start_at >= $1 AND a.start_at < $2 AND a.status_id = ANY($3) \
             ORDER BY a.start_at ASC"
        );
        sqlx::query_as::<_, AppointmentDetail>(&query)
            .bind(range.start)
            .bind(range.end)
            .bind(ACTIVE_STATUS_IDS)
            .fetch_all(executor)
            .await
    }

    /// Every hold awaiting a decision, soonest expiry first.
    pub async fn list_holds(
        executor: impl PgExecutor<'_>,
    ) -> Result<Vec<AppointmentDetail>, sqlx::Error> {
        let query = format!(
            "SELECT {DETAIL_COLUMNS} FROM appointments a {DETAIL_JOINS} \
             WHERE a.status_id = $1 \
             ORDER BY a.hold_expires_at ASC, a.id ASC"
        );
        sqlx::query_as::<_, AppointmentDetail>(&query)
            .bind(AppointmentStatus::Hold.id())
            .fetch_all(executor)
            .await
    }

    /// Totals over confirmed visits starting inside `range`.
    ///
    /// Price is the override when present, otherwise the primary service's
    /// catalogue price.
    pub async fn visit_totals(
        executor: impl PgExecutor<'_>,
        range: Interval,
    ) -> Result<VisitTotals, sqlx::Error> {
        sqlx::query_as::<_, VisitTotals>(
            "SELECT COUNT(*)::BIGINT AS visit_count, \
                    COALESCE(SUM(COALESCE(a.price_override_cents, s.price_cents)), 0)::BIGINT \
                        AS total_price_cents, \
                    COALESCE(SUM(EXTRACT(EPOCH FROM (a.end_at - a.start_at)) / 60), 0)::BIGINT \
                        AS total_minutes \
             FROM appointments a \
             JOIN services s ON s.id = a.service_id \
             WHERE a.visit_confirmed AND a.start_at >= $1 AND a.start_at < $2",
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_one(executor)
        .await
    }
}
