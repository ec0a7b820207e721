//! Repository for the `break_rules` table.

use bookwell_core::types::DbId;
use chrono::NaiveDate;
use sqlx::PgExecutor;

use crate::models::break_rule::{BreakRule, CreateBreakRule};

/// Column list for `break_rules` queries.
const COLUMNS: &str = "\
    id, repeat, start_time, duration_min, reason, weekday, start_date, \
    last_generated_date, created_by, created_at, updated_at";

/// Provides CRUD operations for break rules.
pub struct BreakRuleRepo;

impl BreakRuleRepo {
    pub async fn create(
        executor: impl PgExecutor<'_>,
        input: &CreateBreakRule,
    ) -> Result<BreakRule, sqlx::Error> {
        let query = format!(
            "INSERT INTO break_rules \
                (repeat, start_time, duration_min, reason, weekday, start_date, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BreakRule>(&query)
            .bind(input.repeat.as_str())
            .bind(input.start_time)
            .bind(input.duration_min)
            .bind(&input.reason)
            .bind(input.weekday)
            .bind(input.start_date)
            .bind(&input.created_by)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<BreakRule>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM break_rules WHERE id = $1");
        sqlx::query_as::<_, BreakRule>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn list(executor: impl PgExecutor<'_>) -> Result<Vec<BreakRule>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM break_rules ORDER BY id ASC");
        sqlx::query_as::<_, BreakRule>(&query)
            .fetch_all(executor)
            .await
    }

    /// Move the high-water mark forward. A date at or before the stored
    /// one is ignored; returns `true` if the mark moved.
    pub async fn advance_generated(
        executor: impl PgExecutor<'_>,
        id: DbId,
        through: NaiveDate,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE break_rules SET last_generated_date = $2 \
             WHERE id = $1 AND (last_generated_date IS NULL OR last_generated_date < $2)",
        )
        .bind(id)
        .bind(through)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Returns `true` if a row was deleted.
    pub async fn delete(executor: impl PgExecutor<'_>, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM break_rules WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
