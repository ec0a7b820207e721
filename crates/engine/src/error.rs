use bookwell_core::error::CoreError;
use bookwell_core::types::{DbId, Timestamp};
use bookwell_db::reservation::{is_overlap_violation, SlotCheck};

/// Error type for engine operations.
///
/// Conflicts and precondition failures are expected outcomes of user
/// input; [`Core`](EngineError::Core) integrity errors and database errors
/// are not.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// An active appointment overlaps the requested time.
    #[error("The requested time is already taken")]
    SlotTaken,

    /// A blocked interval overlaps the requested time.
    #[error("The requested time is blocked")]
    SlotBlocked,

    #[error("Appointment {0} is not booked")]
    NotBooked(DbId),

    #[error("Requested start {0} is in the past")]
    InPast(Timestamp),

    #[error("Appointment {0} has no pending reschedule request")]
    NoPendingProposal(DbId),

    #[error("Appointment {appointment_id} does not belong to client {client_id}")]
    NotOwner { appointment_id: DbId, client_id: DbId },

    /// Inside the cancellation cutoff, where clients can no longer change
    /// the appointment.
    #[error("Appointment {0} can no longer be changed by the client")]
    ChangeClosed(DbId),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Convenience alias for engine return values.
pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    /// `SlotTaken` or `SlotBlocked`: the caller should pick another time.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::SlotTaken | Self::SlotBlocked)
    }

    /// Classify an error from a write that touches `appointments`.
    ///
    /// The exclusion constraint fires when two writers with different slot
    /// keys raced past their re-checks; it means the same as a failed
    /// re-check.
    pub(crate) fn from_write(err: sqlx::Error) -> Self {
        if is_overlap_violation(&err) {
            Self::SlotTaken
        } else {
            Self::Database(err)
        }
    }

    pub(crate) fn not_found(entity: &'static str, id: DbId) -> Self {
        Self::Core(CoreError::NotFound { entity, id })
    }
}

/// Turn an overlap re-check into a result.
pub(crate) fn ensure_free(check: SlotCheck) -> EngineResult<()> {
    match check {
        SlotCheck::Free => Ok(()),
        SlotCheck::Taken => Err(EngineError::SlotTaken),
        SlotCheck::Blocked => Err(EngineError::SlotBlocked),
    }
}
