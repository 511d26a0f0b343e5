//! Routes moderation-relevant events to the notification collaborator.
//!
//! Runs as a spawned background task consuming a bus subscription. Delivery
//! failures are logged and dropped; the side channel must never affect the
//! operation that published the event.

use std::sync::Arc;

use tokio::sync::broadcast;

use medina_core::contracts::Notifier;

use crate::bus::{MarketEvent, EVENT_LISTING_SUBMITTED};

/// Forwards `listing.submitted` events to administrators so pending
/// listings get reviewed.
pub struct AdminNotificationRouter {
    notifier: Arc<dyn Notifier>,
}

impl AdminNotificationRouter {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    /// Consume the subscription until the bus is dropped.
    pub async fn run(self, mut events: broadcast::Receiver<MarketEvent>) {
        loop {
            match events.recv().await {
                Ok(event) => self.handle(event).await,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Notification router lagged behind the event bus");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    async fn handle(&self, event: MarketEvent) {
        if event.event_type != EVENT_LISTING_SUBMITTED {
            return;
        }

        let payload = serde_json::json!({
            "kind": "listing_pending_review",
            "listing_id": event.listing_id,
            "submitted_by": event.actor_id,
            "details": event.payload,
        });

        if let Err(err) = self.notifier.notify_administrators(payload).await {
            tracing::error!(error = %err, listing_id = ?event.listing_id,
                "Failed to notify administrators about pending listing");
        }
    }
}
