//! Booking reminders.
//!
//! Each Booked appointment gets two reminders. A reminder is due when the
//! appointment starts inside `[now + lead, now + lead + REMINDER_WINDOW)`,
//! which, with the loop running more often than the window is wide, catches
//! every appointment exactly once. The sent flags make it at-most-once.

use chrono::Duration;
use serde::Serialize;

use crate::interval::Interval;
use crate::types::Timestamp;

/// Width of the matching window, in minutes.
pub const REMINDER_WINDOW_MIN: i64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    /// Two days ahead.
    First,
    /// Two hours ahead.
    Second,
}

impl ReminderKind {
    pub const ALL: [ReminderKind; 2] = [ReminderKind::First, ReminderKind::Second];

    /// How long before the start this reminder goes out.
    pub fn lead(self) -> Duration {
        match self {
            Self::First => Duration::hours(48),
            Self::Second => Duration::hours(2),
        }
    }

    /// Appointment starts matched by a run at `now`.
    pub fn window(self, now: Timestamp) -> Interval {
        let start = now + self.lead();
        Interval {
            start,
            end: start + Duration::minutes(REMINDER_WINDOW_MIN),
        }
    }

    /// Column holding the sent flag.
    pub fn flag_column(self) -> &'static str {
        match self {
            Self::First => "reminder_first_sent",
            Self::Second => "reminder_second_sent",
        }
    }
}
