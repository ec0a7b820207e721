//! Calendar locking and overlap checks.
//!
//! Every writer of calendar time follows the same sequence inside one
//! transaction: take the advisory lock for the slot, re-check overlaps,
//! then write. The lock is transaction-scoped and released on commit or
//! rollback. The `ex_appointments_no_overlap` exclusion constraint backs
//! the re-check for appointments whose lock keys differ.

use bookwell_core::appointment::ACTIVE_STATUS_IDS;
use bookwell_core::interval::Interval;
use bookwell_core::types::{DbId, Timestamp};
use sqlx::{PgConnection, PgExecutor};

/// Name of the exclusion constraint forbidding overlapping active
/// appointments.
pub const NO_OVERLAP_CONSTRAINT: &str = "ex_appointments_no_overlap";

/// Outcome of an overlap re-check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotCheck {
    Free,
    /// An active appointment overlaps.
    Taken,
    /// A blocked interval overlaps.
    Blocked,
}

/// Block until the transaction-scoped advisory lock `key` is held.
pub async fn acquire_xact_lock(conn: &mut PgConnection, key: i64) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(key)
        .execute(conn)
        .await?;
    Ok(())
}

/// Check `interval` against active appointments, then blocked intervals.
///
/// `exclude` skips the appointment being moved.
pub async fn check_slot(
    conn: &mut PgConnection,
    interval: Interval,
    exclude: Option<DbId>,
) -> Result<SlotCheck, sqlx::Error> {
    let taken = sqlx::query_scalar::<_, DbId>(
        "SELECT id FROM appointments \
         WHERE start_at < $2 AND end_at > $1 AND status_id = ANY($3) \
           AND ($4::BIGINT IS NULL OR id <> $4) \
         LIMIT 1",
    )
    .bind(interval.start)
    .bind(interval.end)
    .bind(ACTIVE_STATUS_IDS)
    .bind(exclude)
    .fetch_optional(&mut *conn)
    .await?;
    if taken.is_some() {
        return Ok(SlotCheck::Taken);
    }

    let blocked = sqlx::query_scalar::<_, DbId>(
        "SELECT id FROM blocked_intervals WHERE start_at < $2 AND end_at > $1 LIMIT 1",
    )
    .bind(interval.start)
    .bind(interval.end)
    .fetch_optional(&mut *conn)
    .await?;
    if blocked.is_some() {
        return Ok(SlotCheck::Blocked);
    }

    Ok(SlotCheck::Free)
}

/// Every active appointment and blocked interval intersecting `window`,
/// in start order.
pub async fn busy_intervals(
    executor: impl PgExecutor<'_>,
    window: Interval,
) -> Result<Vec<Interval>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (Timestamp, Timestamp)>(
        "SELECT start_at, end_at FROM appointments \
         WHERE start_at < $2 AND end_at > $1 AND status_id = ANY($3) \
         UNION ALL \
         SELECT start_at, end_at FROM blocked_intervals \
         WHERE start_at < $2 AND end_at > $1 \
         ORDER BY 1",
    )
    .bind(window.start)
    .bind(window.end)
    .bind(ACTIVE_STATUS_IDS)
    .fetch_all(executor)
    .await?;
    Ok(rows
        .into_iter()
        .map(|(start, end)| Interval { start, end })
        .collect())
}

/// Whether `err` is the exclusion-constraint violation raised when two
/// active appointments would overlap (SQLSTATE 23P01).
pub fn is_overlap_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.code().as_deref() == Some("23P01")
                && db_err.constraint() == Some(NO_OVERLAP_CONSTRAINT)
        }
        _ => false,
    }
}
