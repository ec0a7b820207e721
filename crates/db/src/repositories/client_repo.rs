//! Repository for the `clients` table.

use bookwell_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::client::{Client, UpsertClient};

/// Column list for `clients` queries.
const COLUMNS: &str = "id, external_ref, display_name, phone, created_at, updated_at";

/// Provides client registration and lookup.
pub struct ClientRepo;

impl ClientRepo {
    /// Register a client by external reference, refreshing the profile
    /// fields that are provided.
    pub async fn upsert(
        executor: impl PgExecutor<'_>,
        input: &UpsertClient,
    ) -> Result<Client, sqlx::Error> {
        let query = format!(
            "INSERT INTO clients (external_ref, display_name, phone) VALUES ($1, $2, $3) \
             ON CONFLICT (external_ref) DO UPDATE SET \
                 display_name = COALESCE(EXCLUDED.display_name, clients.display_name), \
                 phone = COALESCE(EXCLUDED.phone, clients.phone) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Client>(&query)
            .bind(&input.external_ref)
            .bind(&input.display_name)
            .bind(&input.phone)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<Client>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM clients WHERE id = $1");
        sqlx::query_as::<_, Client>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }
}
