//! Client models.

use bookwell_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `clients` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Client {
    pub id: DbId,
    pub external_ref: String,
    pub display_name: Option<String>,
    pub phone: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for registering a client or refreshing its profile.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertClient {
    pub external_ref: String,
    pub display_name: Option<String>,
    pub phone: Option<String>,
}
