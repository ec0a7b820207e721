//! Notification plumbing for the booking engine.
//!
//! - [`Notification`]: the message envelope addressed to a client or to
//!   the operators.
//! - [`NotificationSink`]: the fire-and-forget seam the engine publishes
//!   through. [`NotificationBus`] is the in-process implementation backed
//!   by `tokio::sync::broadcast`.
//! - [`delivery`]: delivery channels (webhook, log-only).
//! - [`NotificationDispatcher`]: background task draining the bus into a
//!   delivery channel.

pub mod bus;
pub mod delivery;
pub mod dispatcher;
pub mod notification;

pub use bus::{NotificationBus, NotificationSink};
pub use delivery::log::LogDelivery;
pub use delivery::webhook::WebhookDelivery;
pub use delivery::{DeliveryError, NotificationDelivery};
pub use dispatcher::NotificationDispatcher;
pub use notification::{Notification, Recipient};
