//! Log-based notification adapter.
//!
//! Moderation notifications are consumed by an external dashboard that
//! tails structured logs; in-process delivery is just an `info!` with the
//! payload attached. Swapping in a push-based notifier only requires a new
//! [`Notifier`] implementation at wiring time.

use async_trait::async_trait;

use medina_core::contracts::Notifier;
use medina_core::types::ActorId;
use medina_core::CoreError;

pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_administrators(&self, payload: serde_json::Value) -> Result<(), CoreError> {
        tracing::info!(target: "medina::notifications", audience = "administrators",
            %payload, "Notification dispatched");
        Ok(())
    }

    async fn notify_actor(
        &self,
        actor: ActorId,
        payload: serde_json::Value,
    ) -> Result<(), CoreError> {
        tracing::info!(target: "medina::notifications", audience = "actor",
            actor_id = %actor, %payload, "Notification dispatched");
        Ok(())
    }
}
