//! Idempotency record store with reservation semantics.
//!
//! The reserve step is a single `INSERT .. ON CONFLICT DO NOTHING`, so two
//! concurrent requests for the same key can never both acquire it; the
//! uniqueness constraint, not a read-then-write, arbitrates the race.

use async_trait::async_trait;
use chrono::{Duration, Utc};

use medina_core::contracts::{IdempotencyStore, Reservation};
use medina_core::types::ActorId;
use medina_core::CoreError;

use crate::{map_db_err, DbPool};

#[derive(Clone)]
pub struct IdempotencyRepo {
    pool: DbPool,
}

impl IdempotencyRepo {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdempotencyStore for IdempotencyRepo {
    async fn reserve(
        &self,
        key: &str,
        actor: ActorId,
        ttl: Duration,
    ) -> Result<Reservation, CoreError> {
        let expires_at = Utc::now() + ttl;

        // Expired records are dead; clear them so the key can be reused.
        sqlx::query("DELETE FROM idempotency_records WHERE key = $1 AND expires_at <= NOW()")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;

        let inserted = sqlx::query(
            "INSERT INTO idempotency_records (key, actor_id, expires_at) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (key) DO NOTHING",
        )
        .bind(key)
        .bind(actor)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;

        if inserted.rows_affected() == 1 {
            return Ok(Reservation::Acquired);
        }

        let existing: Option<(Option<serde_json::Value>,)> = sqlx::query_as(
            "SELECT response_payload FROM idempotency_records \
             WHERE key = $1 AND expires_at > NOW()",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?;

        match existing {
            Some((Some(payload),)) => Ok(Reservation::Completed(payload)),
            // Row exists without a payload: the winner is still running.
            Some((None,)) => Ok(Reservation::InFlight),
            // Winner released (or expired) between our insert and select.
            None => Ok(Reservation::InFlight),
        }
    }

    async fn complete(&self, key: &str, payload: &serde_json::Value) -> Result<(), CoreError> {
        sqlx::query(
            "UPDATE idempotency_records SET response_payload = $2 \
             WHERE key = $1 AND response_payload IS NULL",
        )
        .bind(key)
        .bind(payload)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(())
    }

    async fn release(&self, key: &str) -> Result<(), CoreError> {
        sqlx::query("DELETE FROM idempotency_records WHERE key = $1 AND response_payload IS NULL")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, CoreError> {
        let row: Option<(Option<serde_json::Value>,)> = sqlx::query_as(
            "SELECT response_payload FROM idempotency_records \
             WHERE key = $1 AND expires_at > NOW()",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(row.and_then(|(payload,)| payload))
    }
}
