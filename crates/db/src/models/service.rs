//! Service catalogue models.

use bookwell_core::services::ServiceFootprint;
use bookwell_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `services` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Service {
    pub id: DbId,
    pub name: String,
    pub duration_min: i32,
    pub buffer_min: i32,
    pub price_cents: i64,
    pub is_active: bool,
    pub sort_order: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Service {
    pub fn footprint(&self) -> ServiceFootprint {
        ServiceFootprint {
            id: self.id,
            duration_min: i64::from(self.duration_min),
            buffer_min: i64::from(self.buffer_min),
            price_cents: self.price_cents,
        }
    }
}

/// DTO for adding a service to the catalogue.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateService {
    pub name: String,
    pub duration_min: i32,
    pub buffer_min: Option<i32>,
    pub price_cents: Option<i64>,
    pub sort_order: Option<i32>,
}
