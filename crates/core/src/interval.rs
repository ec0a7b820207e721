//! Half-open time intervals `[start, end)` in UTC.

use chrono::Duration;

use crate::error::CoreError;
use crate::types::Timestamp;

/// A half-open UTC interval. Two intervals that merely touch
/// (`a.end == b.start`) do not overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl Interval {
    /// Build an interval, rejecting empty or inverted ranges.
    pub fn new(start: Timestamp, end: Timestamp) -> Result<Self, CoreError> {
        if end <= start {
            return Err(CoreError::Validation(format!(
                "Interval end {end} must be after start {start}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Interval of `minutes` length starting at `start`.
    pub fn starting_at(start: Timestamp, minutes: i64) -> Result<Self, CoreError> {
        Self::new(start, start + Duration::minutes(minutes))
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// The same length, moved so that it begins at `start`.
    pub fn moved_to(&self, start: Timestamp) -> Interval {
        Interval {
            start,
            end: start + self.duration(),
        }
    }
}
