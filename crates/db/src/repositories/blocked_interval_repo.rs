//! Repository for the `blocked_intervals` table.

use bookwell_core::interval::Interval;
use bookwell_core::types::{DbId, Timestamp};
use sqlx::PgExecutor;

use crate::models::blocked_interval::{BlockedInterval, CreateBlockedInterval};

/// Column list for `blocked_intervals` queries.
const COLUMNS: &str = "id, start_at, end_at, reason, created_by, break_rule_id, created_at";

/// Provides CRUD operations for blocked intervals.
pub struct BlockedIntervalRepo;

impl BlockedIntervalRepo {
    /// Insert a block. Callers must have run the overlap checks.
    pub async fn insert(
        executor: impl PgExecutor<'_>,
        input: &CreateBlockedInterval,
    ) -> Result<BlockedInterval, sqlx::Error> {
        let query = format!(
            "INSERT INTO blocked_intervals (start_at, end_at, reason, created_by, break_rule_id) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BlockedInterval>(&query)
            .bind(input.start_at)
            .bind(input.end_at)
            .bind(&input.reason)
            .bind(&input.created_by)
            .bind(input.break_rule_id)
            .fetch_one(executor)
            .await
    }

    /// Returns `true` if a row was deleted.
    pub async fn delete(executor: impl PgExecutor<'_>, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM blocked_intervals WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete the blocks a rule generated that start at or after `from`.
    pub async fn delete_generated_from(
        executor: impl PgExecutor<'_>,
        break_rule_id: DbId,
        from: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM blocked_intervals WHERE break_rule_id = $1 AND start_at >= $2",
        )
        .bind(break_rule_id)
        .bind(from)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Blocks that end at or after `range.start` and start before
    /// `range.end`, in start order.
    pub async fn list_in_range(
        executor: impl PgExecutor<'_>,
        range: Interval,
    ) -> Result<Vec<BlockedInterval>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM blocked_intervals \
             WHERE end_at >= $1 AND start_at < $2 \
             ORDER BY start_at ASC"
        );
        sqlx::query_as::<_, BlockedInterval>(&query)
            .bind(range.start)
            .bind(range.end)
            .fetch_all(executor)
            .await
    }
}
