//! Repository for the `services` table.

use bookwell_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::service::{CreateService, Service};

/// Column list for `services` queries.
const COLUMNS: &str = "\
    id, name, duration_min, buffer_min, price_cents, is_active, sort_order, \
    created_at, updated_at";

/// Provides catalogue queries.
pub struct ServiceRepo;

impl ServiceRepo {
    pub async fn create(
        executor: impl PgExecutor<'_>,
        input: &CreateService,
    ) -> Result<Service, sqlx::Error> {
        let query = format!(
            "INSERT INTO services (name, duration_min, buffer_min, price_cents, sort_order) \
             VALUES ($1, $2, COALESCE($3, 0), COALESCE($4, 0), COALESCE($5, 0)) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Service>(&query)
            .bind(&input.name)
            .bind(input.duration_min)
            .bind(input.buffer_min)
            .bind(input.price_cents)
            .bind(input.sort_order)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<Service>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM services WHERE id = $1");
        sqlx::query_as::<_, Service>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Fetch several services. Order of the result is unspecified; callers
    /// re-order by their own id list.
    pub async fn find_many(
        executor: impl PgExecutor<'_>,
        ids: &[DbId],
    ) -> Result<Vec<Service>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM services WHERE id = ANY($1)");
        sqlx::query_as::<_, Service>(&query)
            .bind(ids)
            .fetch_all(executor)
            .await
    }
}
