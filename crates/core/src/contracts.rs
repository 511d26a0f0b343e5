//! Collaborator contracts between the engine and its external services.
//!
//! The engine depends only on these traits; `medina-db` provides the
//! PostgreSQL implementations and the integration tests provide in-memory
//! ones. Every method that can fail returns [`CoreError`] so callers can
//! apply the fail-open/fail-closed policy of the error taxonomy.

use async_trait::async_trait;
use chrono::Duration;

use crate::error::CoreError;
use crate::filter::ListingFilter;
use crate::listing::{EngagementEvent, Listing, ListingStatus, ListingUpdate, NewListing};
use crate::types::{ActorId, ListingId};

/// Typed repository over the `marketplace_items` collection.
///
/// Implementations own field mapping and the soft-expiry predicate; they do
/// not enforce ownership or transition legality — the lifecycle service does
/// that against a snapshot before mutating.
#[async_trait]
pub trait ListingStore: Send + Sync {
    async fn create(&self, listing: NewListing) -> Result<Listing, CoreError>;

    async fn get_by_id(&self, id: ListingId) -> Result<Option<Listing>, CoreError>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Listing>, CoreError>;

    async fn slug_exists(&self, slug: &str) -> Result<bool, CoreError>;

    /// Apply a content-only partial update. Returns `NotFound` if the row
    /// vanished between the caller's snapshot and the write.
    async fn update_fields(&self, id: ListingId, update: &ListingUpdate) -> Result<(), CoreError>;

    /// Set the lifecycle status. With `relist` the store also clears
    /// `expires_at` and resets `created_at`/`last_bump_at` to now, returning
    /// the listing to the head of recency ordering.
    async fn set_status(
        &self,
        id: ListingId,
        status: ListingStatus,
        reason: Option<&str>,
        relist: bool,
    ) -> Result<(), CoreError>;

    /// Refresh `last_bump_at` without touching `created_at`.
    async fn bump(&self, id: ListingId) -> Result<(), CoreError>;

    async fn increment_views(&self, id: ListingId) -> Result<(), CoreError>;

    /// Hard delete of the row. Media cleanup is the caller's concern.
    async fn delete(&self, id: ListingId) -> Result<(), CoreError>;

    /// Run a filter with pagination, returning the page and the total count
    /// for the same predicate set.
    async fn query(
        &self,
        filter: &ListingFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Listing>, i64), CoreError>;
}

/// Outcome of an idempotency-key reservation attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Reservation {
    /// This request won the key; it must `complete` or `release` it.
    Acquired,
    /// Another request holds the key and has not completed yet.
    InFlight,
    /// A prior request completed; the stored response must be returned
    /// verbatim without re-executing any side effect.
    Completed(serde_json::Value),
}

/// Key → response store with TTL providing at-most-once creation semantics.
///
/// `reserve` must be atomic at the store level (insert-if-absent, not
/// read-then-write) so two concurrent requests can never both acquire a key.
#[async_trait]
pub trait IdempotencyStore: Send + Sync {
    async fn reserve(
        &self,
        key: &str,
        actor: ActorId,
        ttl: Duration,
    ) -> Result<Reservation, CoreError>;

    /// Record the final response for an acquired key. Records are read-only
    /// thereafter until expiry.
    async fn complete(&self, key: &str, payload: &serde_json::Value) -> Result<(), CoreError>;

    /// Drop an acquired reservation after a failed pipeline so a retry can
    /// run the pipeline again.
    async fn release(&self, key: &str) -> Result<(), CoreError>;

    /// Fetch the stored response for a completed, unexpired key.
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, CoreError>;
}

/// Result of one sliding-window rate-limit hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    /// Count within the current window, including this hit.
    pub count: i64,
}

/// Sliding-window counter keyed by actor + action.
///
/// The increment must be atomic per window key.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    async fn hit(&self, key: &str, limit: i64, window: Duration) -> Result<RateDecision, CoreError>;
}

/// Best-effort removal of stored listing media. Failures are logged by the
/// caller and never propagated.
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn remove(&self, path: &str) -> Result<(), CoreError>;
}

/// Side-channel notification service; failures must not fail the
/// originating operation.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_administrators(&self, payload: serde_json::Value) -> Result<(), CoreError>;

    async fn notify_actor(
        &self,
        actor: ActorId,
        payload: serde_json::Value,
    ) -> Result<(), CoreError>;
}

/// Append-only engagement sink, fire-and-forget from the caller's view.
#[async_trait]
pub trait EngagementSink: Send + Sync {
    async fn record(&self, event: EngagementEvent) -> Result<(), CoreError>;
}
