//! External delivery channels for notifications.

use async_trait::async_trait;

use crate::notification::Notification;

pub mod log;
pub mod webhook;

/// Error returned by a delivery channel.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error(transparent)]
    Webhook(#[from] webhook::WebhookError),

    /// The channel has no route for this recipient.
    #[error("No route for notification: {0}")]
    Unroutable(String),
}

/// Pushes a notification out of the process.
#[async_trait]
pub trait NotificationDelivery: Send + Sync {
    async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError>;
}
