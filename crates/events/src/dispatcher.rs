//! Drains the notification bus into a delivery channel.
//!
//! Each notification is delivered independently: a failure is logged and
//! the loop moves on. Committed state is never affected by delivery.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::delivery::NotificationDelivery;
use crate::notification::Notification;

/// Background service forwarding bus notifications to a delivery channel.
pub struct NotificationDispatcher {
    delivery: Arc<dyn NotificationDelivery>,
}

impl NotificationDispatcher {
    pub fn new(delivery: Arc<dyn NotificationDelivery>) -> Self {
        Self { delivery }
    }

    /// Run until `cancel` fires or the bus is dropped.
    pub async fn run(
        self,
        mut receiver: broadcast::Receiver<Notification>,
        cancel: CancellationToken,
    ) {
        tracing::info!("Notification dispatcher started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Notification dispatcher stopping");
                    break;
                }
                received = receiver.recv() => match received {
                    Ok(notification) => self.dispatch(&notification).await,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "Notification dispatcher lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("Notification bus closed, dispatcher shutting down");
                        break;
                    }
                },
            }
        }
    }

    async fn dispatch(&self, notification: &Notification) {
        match self.delivery.deliver(notification).await {
            Ok(()) => tracing::debug!(
                kind = %notification.kind,
                appointment_id = ?notification.appointment_id,
                "Notification delivered"
            ),
            Err(e) => tracing::error!(
                error = %e,
                kind = %notification.kind,
                appointment_id = ?notification.appointment_id,
                "Failed to deliver notification"
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
