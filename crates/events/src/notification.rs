//! The notification envelope.

use bookwell_core::types::{DbId, Timestamp};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Who a notification is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "client_id", rename_all = "snake_case")]
pub enum Recipient {
    /// A single client, by `clients.id`.
    Client(DbId),
    /// Every operator of the calendar.
    Operators,
}

/// A message produced by a state transition.
///
/// Constructed via [`Notification::new`] and enriched with the builder
/// methods [`for_appointment`](Notification::for_appointment),
/// [`with_payload`](Notification::with_payload) and
/// [`at`](Notification::at).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Dot-separated kind, e.g. `"appointment.confirmed"`.
    pub kind: String,

    pub recipient: Recipient,

    /// Human-readable text.
    pub text: String,

    /// Appointment the notification is about, if any.
    pub appointment_id: Option<DbId>,

    /// Free-form JSON payload for the channel (buttons, ids, etc).
    pub payload: serde_json::Value,

    pub created_at: Timestamp,
}

impl Notification {
    pub fn new(kind: impl Into<String>, recipient: Recipient, text: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            recipient,
            text: text.into(),
            appointment_id: None,
            payload: serde_json::Value::Object(Default::default()),
            created_at: Utc::now(),
        }
    }

    pub fn for_appointment(mut self, appointment_id: DbId) -> Self {
        self.appointment_id = Some(appointment_id);
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Override the creation time (the engine stamps its own clock).
    pub fn at(mut self, created_at: Timestamp) -> Self {
        self.created_at = created_at;
        self
    }
}
