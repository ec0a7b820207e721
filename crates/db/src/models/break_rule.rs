//! Break rule models.

use bookwell_core::break_rules::{BreakSchedule, RepeatKind};
use bookwell_core::error::CoreError;
use bookwell_core::types::{DbId, Timestamp};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `break_rules` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BreakRule {
    pub id: DbId,
    pub repeat: String,
    pub start_time: NaiveTime,
    pub duration_min: i32,
    pub reason: Option<String>,
    pub weekday: Option<i16>,
    pub start_date: NaiveDate,
    pub last_generated_date: Option<NaiveDate>,
    pub created_by: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl BreakRule {
    /// The date arithmetic view of this rule.
    pub fn schedule(&self) -> Result<BreakSchedule, CoreError> {
        let weekday = match self.weekday {
            Some(w) => Some(u8::try_from(w).map_err(|_| {
                CoreError::Integrity(format!("Break rule {} has weekday {w}", self.id))
            })?),
            None => None,
        };
        Ok(BreakSchedule {
            repeat: RepeatKind::from_str(&self.repeat)
                .map_err(|e| CoreError::Integrity(e.to_string()))?,
            start_time: self.start_time,
            duration_min: i64::from(self.duration_min),
            weekday,
            start_date: self.start_date,
            last_generated_date: self.last_generated_date,
        })
    }
}

/// DTO for storing a new break rule.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBreakRule {
    pub repeat: RepeatKind,
    pub start_time: NaiveTime,
    pub duration_min: i32,
    pub reason: Option<String>,
    pub weekday: Option<i16>,
    pub start_date: NaiveDate,
    pub created_by: Option<String>,
}
