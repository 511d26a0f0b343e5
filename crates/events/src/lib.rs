//! Medina event bus and side-channel notification plumbing.
//!
//! - [`EventBus`] — in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`MarketEvent`] — the canonical domain event envelope.
//! - [`AdminNotificationRouter`] — background service that turns
//!   moderation-relevant events into administrator notifications.

pub mod bus;
pub mod router;

pub use bus::{EventBus, MarketEvent};
pub use router::AdminNotificationRouter;
