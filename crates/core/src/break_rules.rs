//! Recurring break rules.
//!
//! A rule is a template: it never blocks time by itself. Expansion projects
//! it onto concrete dates, and the engine materialises each date as a
//! blocked interval.

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::interval::Interval;
use crate::settings::{weekday_index, CalendarSettings};

/// Reason recorded on generated blocks when the rule has none.
pub const DEFAULT_BREAK_REASON: &str = "Break";

// ---------------------------------------------------------------------------
// Repeat kind
// ---------------------------------------------------------------------------

pub const REPEAT_NONE: &str = "none";
pub const REPEAT_DAILY: &str = "daily";
pub const REPEAT_WEEKLY: &str = "weekly";

pub const VALID_REPEATS: &[&str] = &[REPEAT_NONE, REPEAT_DAILY, REPEAT_WEEKLY];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatKind {
    None,
    Daily,
    Weekly,
}

impl RepeatKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => REPEAT_NONE,
            Self::Daily => REPEAT_DAILY,
            Self::Weekly => REPEAT_WEEKLY,
        }
    }

    /// Parse from a string, returning an error for unknown kinds.
    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            REPEAT_NONE => Ok(Self::None),
            REPEAT_DAILY => Ok(Self::Daily),
            REPEAT_WEEKLY => Ok(Self::Weekly),
            other => Err(CoreError::Validation(format!(
                "Unknown repeat kind: '{other}'. Valid kinds: {}",
                VALID_REPEATS.join(", ")
            ))),
        }
    }

    /// Distance between occurrences; `None` for one-off rules.
    pub fn step(&self) -> Option<Duration> {
        match self {
            Self::None => None,
            Self::Daily => Some(Duration::days(1)),
            Self::Weekly => Some(Duration::days(7)),
        }
    }
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

/// The date-relevant part of a break rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakSchedule {
    pub repeat: RepeatKind,
    pub start_time: NaiveTime,
    pub duration_min: i64,
    /// Weekly anchor, 0 = Monday.
    pub weekday: Option<u8>,
    pub start_date: NaiveDate,
    pub last_generated_date: Option<NaiveDate>,
}

impl BreakSchedule {
    /// Dates to materialise, up to and including `through`.
    ///
    /// Iteration resumes one step after the high-water mark and keeps only
    /// work days; a weekly rule's own weekday always counts as a work day.
    pub fn due_dates(&self, through: NaiveDate, work_days: &BTreeSet<u8>) -> Vec<NaiveDate> {
        let Some(step) = self.repeat.step() else {
            return Vec::new();
        };

        let mut allowed = work_days.clone();
        if self.repeat == RepeatKind::Weekly {
            if let Some(anchor) = self.weekday {
                allowed.insert(anchor);
            }
        }

        let mut cursor = match self.last_generated_date {
            Some(last) => std::cmp::max(self.start_date, last + step),
            None => self.start_date,
        };

        let mut dates = Vec::new();
        while cursor <= through {
            if allowed.contains(&weekday_index(cursor)) {
                dates.push(cursor);
            }
            cursor += step;
        }
        dates
    }

    /// The absolute interval this rule blocks on `day`.
    pub fn occurrence(&self, settings: &CalendarSettings, day: NaiveDate) -> Result<Interval, CoreError> {
        let start = settings.to_utc(day.and_time(self.start_time));
        Interval::starting_at(start, self.duration_min)
    }
}

/// Check a new rule before it is stored. One-off rules are accepted but
/// never expanded.
pub fn validate_rule(duration_min: i64) -> Result<(), CoreError> {
    if duration_min <= 0 {
        return Err(CoreError::Validation(format!(
            "Break duration must be positive, got {duration_min} minutes"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
