//! Sliding-window rate-limit counters keyed by actor + action.

use async_trait::async_trait;
use chrono::Duration;

use medina_core::contracts::{RateDecision, RateLimiter};
use medina_core::CoreError;

use crate::{map_db_err, DbPool};

/// One row per key; the counter resets when the window has elapsed. The
/// whole check-and-increment is a single upsert, atomic per window key.
#[derive(Clone)]
pub struct RateLimitRepo {
    pool: DbPool,
}

impl RateLimitRepo {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RateLimiter for RateLimitRepo {
    async fn hit(&self, key: &str, limit: i64, window: Duration) -> Result<RateDecision, CoreError> {
        let window_secs = window.num_seconds().max(1) as f64;

        let (count,): (i64,) = sqlx::query_as(
            "INSERT INTO rate_limit_windows (key, count, window_start) \
             VALUES ($1, 1, NOW()) \
             ON CONFLICT (key) DO UPDATE SET \
                count = CASE \
                    WHEN rate_limit_windows.window_start <= NOW() - ($2 * interval '1 second') \
                    THEN 1 \
                    ELSE rate_limit_windows.count + 1 \
                END, \
                window_start = CASE \
                    WHEN rate_limit_windows.window_start <= NOW() - ($2 * interval '1 second') \
                    THEN NOW() \
                    ELSE rate_limit_windows.window_start \
                END \
             RETURNING count",
        )
        .bind(key)
        .bind(window_secs)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(RateDecision {
            allowed: count <= limit,
            count,
        })
    }
}
