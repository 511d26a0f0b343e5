//! Append-only engagement event sink.

use async_trait::async_trait;

use medina_core::contracts::EngagementSink;
use medina_core::listing::EngagementEvent;
use medina_core::CoreError;

use crate::{map_db_err, DbPool};

#[derive(Clone)]
pub struct EngagementRepo {
    pool: DbPool,
}

impl EngagementRepo {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EngagementSink for EngagementRepo {
    async fn record(&self, event: EngagementEvent) -> Result<(), CoreError> {
        sqlx::query(
            "INSERT INTO engagement_events (item_id, event_type, actor_id, session_id, occurred_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(event.item_id)
        .bind(event.event_type.as_str())
        .bind(event.actor_id)
        .bind(event.session_id.as_deref())
        .bind(event.timestamp)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(())
    }
}
