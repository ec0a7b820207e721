//! Delivery channel that only writes notifications to the log.
//!
//! Used when no external endpoint is configured.

use async_trait::async_trait;

use super::{DeliveryError, NotificationDelivery};
use crate::notification::Notification;

#[derive(Debug, Default, Clone, Copy)]
pub struct LogDelivery;

#[async_trait]
impl NotificationDelivery for LogDelivery {
    async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError> {
        tracing::info!(
            kind = %notification.kind,
            recipient = ?notification.recipient,
            appointment_id = ?notification.appointment_id,
            text = %notification.text,
            "Notification"
        );
        Ok(())
    }
}
