//! Appointment statuses and the state machine governing them.
//!
//! Lives in `core` so the repository layer, the engine and the background
//! loops share one definition of which transitions are legal.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::settings::CalendarSettings;
use crate::types::{StatusId, Timestamp};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Appointment status, stored as a `SMALLINT` referencing the seeded
/// `appointment_statuses` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Hold = 1,
    Booked = 2,
    Rejected = 3,
    Canceled = 4,
    Completed = 5,
}

impl AppointmentStatus {
    pub fn id(self) -> StatusId {
        self as StatusId
    }

    /// Map a database status id back to the enum.
    pub fn from_id(id: StatusId) -> Result<Self, CoreError> {
        match id {
            1 => Ok(Self::Hold),
            2 => Ok(Self::Booked),
            3 => Ok(Self::Rejected),
            4 => Ok(Self::Canceled),
            5 => Ok(Self::Completed),
            other => Err(CoreError::Integrity(format!(
                "Unknown appointment status id: {other}"
            ))),
        }
    }

    /// Statuses reachable from this one. Reschedules keep the status at
    /// Booked and are governed by the pending-proposal field instead.
    pub fn valid_transitions(self) -> &'static [AppointmentStatus] {
        match self {
            Self::Hold => &[Self::Booked, Self::Rejected],
            Self::Booked => &[Self::Canceled, Self::Completed],
            Self::Rejected | Self::Canceled | Self::Completed => &[],
        }
    }

    pub fn can_transition_to(self, to: AppointmentStatus) -> bool {
        self.valid_transitions().contains(&to)
    }
}

/// Hold and Booked occupy the calendar. Ids for `= ANY($n)` filters.
pub const ACTIVE_STATUS_IDS: &[StatusId] = &[
    AppointmentStatus::Hold as StatusId,
    AppointmentStatus::Booked as StatusId,
];

/// How a new reservation enters the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationKind {
    /// Client request awaiting operator confirmation, subject to the TTL.
    Hold,
    /// Operator walk-in booking, confirmed immediately.
    Booked,
}

impl ReservationKind {
    pub fn initial_status(self) -> AppointmentStatus {
        match self {
            Self::Hold => AppointmentStatus::Hold,
            Self::Booked => AppointmentStatus::Booked,
        }
    }

    /// Hold expiry for a reservation created at `now`, if any.
    pub fn hold_expires_at(self, settings: &CalendarSettings, now: Timestamp) -> Option<Timestamp> {
        match self {
            Self::Hold => Some(settings.hold_expiry(now)),
            Self::Booked => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Whether a client may still cancel or move an appointment starting at
/// `start`. The boundary instant itself is allowed.
pub fn client_change_allowed(settings: &CalendarSettings, start: Timestamp, now: Timestamp) -> bool {
    now <= settings.cancel_deadline(start)
}

/// Result of a client cancellation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelOutcome {
    Canceled,
    /// Not the client's appointment, or no longer Booked.
    NotAllowed,
    /// Inside the cancellation cutoff.
    TooLate,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn at(h: u32, m: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2030, 3, 4, h, m, 0).unwrap()
    }

    // -----------------------------------------------------------------------
    // Status ids
    // -----------------------------------------------------------------------

    #[test]
    fn ids_round_trip() {
        for status in [
            AppointmentStatus::Hold,
            AppointmentStatus::Booked,
            AppointmentStatus::Rejected,
            AppointmentStatus::Canceled,
            AppointmentStatus::Completed,
        ] {
            assert_eq!(AppointmentStatus::from_id(status.id()).unwrap(), status);
        }
    }

    #[test]
    fn unknown_id_is_integrity_error() {
        assert!(matches!(
            AppointmentStatus::from_id(9),
            Err(CoreError::Integrity(_))
        ));
    }

    #[test]
    fn only_hold_and_booked_are_active() {
        assert_eq!(ACTIVE_STATUS_IDS, &[1, 2]);
    }

    // -----------------------------------------------------------------------
    // Valid transitions
    // -----------------------------------------------------------------------

    #[test]
    fn hold_to_booked_or_rejected() {
        assert!(AppointmentStatus::Hold.can_transition_to(AppointmentStatus::Booked));
        assert!(AppointmentStatus::Hold.can_transition_to(AppointmentStatus::Rejected));
    }

    #[test]
    fn booked_to_canceled_or_completed() {
        assert!(AppointmentStatus::Booked.can_transition_to(AppointmentStatus::Canceled));
        assert!(AppointmentStatus::Booked.can_transition_to(AppointmentStatus::Completed));
    }

    // -----------------------------------------------------------------------
    // Terminal states
    // -----------------------------------------------------------------------

    #[test]
    fn terminal_states_have_no_transitions() {
        assert!(AppointmentStatus::Rejected.valid_transitions().is_empty());
        assert!(AppointmentStatus::Canceled.valid_transitions().is_empty());
        assert!(AppointmentStatus::Completed.valid_transitions().is_empty());
        assert!(!AppointmentStatus::Hold.valid_transitions().is_empty());
    }

    // -----------------------------------------------------------------------
    // Invalid transitions
    // -----------------------------------------------------------------------

    #[test]
    fn hold_cannot_be_canceled() {
        assert!(!AppointmentStatus::Hold.can_transition_to(AppointmentStatus::Canceled));
    }

    #[test]
    fn booked_cannot_return_to_hold() {
        assert!(!AppointmentStatus::Booked.can_transition_to(AppointmentStatus::Hold));
    }

    // -----------------------------------------------------------------------
    // Rules
    // -----------------------------------------------------------------------

    #[test]
    fn client_change_respects_cutoff_boundary() {
        let settings = CalendarSettings::default();
        let start = at(14, 0);
        let deadline = start - Duration::hours(2);
        assert!(client_change_allowed(&settings, start, deadline - Duration::minutes(1)));
        assert!(client_change_allowed(&settings, start, deadline));
        assert!(!client_change_allowed(&settings, start, deadline + Duration::minutes(1)));
    }

    #[test]
    fn hold_reservation_gets_ttl() {
        let settings = CalendarSettings::default();
        let now = at(9, 0);
        assert_eq!(
            ReservationKind::Hold.hold_expires_at(&settings, now),
            Some(now + Duration::minutes(720))
        );
        assert_eq!(ReservationKind::Booked.hold_expires_at(&settings, now), None);
    }
}
