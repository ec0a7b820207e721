//! Blocked interval models.

use bookwell_core::interval::Interval;
use bookwell_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `blocked_intervals` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BlockedInterval {
    pub id: DbId,
    pub start_at: Timestamp,
    pub end_at: Timestamp,
    pub reason: String,
    pub created_by: Option<String>,
    /// Set when the block was generated from a break rule.
    pub break_rule_id: Option<DbId>,
    pub created_at: Timestamp,
}

impl BlockedInterval {
    pub fn interval(&self) -> Interval {
        Interval {
            start: self.start_at,
            end: self.end_at,
        }
    }
}

/// DTO for inserting a blocked interval.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBlockedInterval {
    pub start_at: Timestamp,
    pub end_at: Timestamp,
    pub reason: String,
    pub created_by: Option<String>,
    pub break_rule_id: Option<DbId>,
}
