//! Listing lifecycle operations: moderation transitions, bump, and hard
//! delete.
//!
//! Every mutation works against a snapshot of the listing taken at entry:
//! ownership and transition legality are decided on that snapshot, then the
//! store applies the change. Ownership failures for non-owners are shaped
//! exactly like a missing listing so callers cannot probe for existence.

use std::sync::Arc;

use chrono::Utc;

use medina_core::contracts::{EngagementSink, ListingStore, MediaStore, RateLimiter};
use medina_core::listing::{EngagementEvent, EngagementType, Listing, ListingStatus};
use medina_core::types::ListingId;
use medina_core::{Actor, CoreError};
use medina_events::bus::{EVENT_LISTING_DELETED, EVENT_LISTING_TRANSITIONED};
use medina_events::{EventBus, MarketEvent};

use crate::cache::TaggedCache;
use crate::config::GuardPolicy;

/// A lifecycle action requested against a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingAction {
    /// Owner marks an active listing as sold.
    MarkSold,
    /// Admin approves a pending listing.
    Approve,
    /// Admin rejects a pending listing, optionally with a reason.
    Reject { reason: Option<String> },
    /// Owner returns a sold listing to active, resetting its recency.
    Relist,
    /// Owner or admin permanently deletes the listing.
    Delete,
}

impl ListingAction {
    /// Parse the wire-level action name. `Reject`'s reason travels
    /// separately in the request body.
    pub fn parse(value: &str, reason: Option<String>) -> Option<Self> {
        match value {
            "sold" => Some(ListingAction::MarkSold),
            "active" => Some(ListingAction::Approve),
            "reject" => Some(ListingAction::Reject { reason }),
            "relist" => Some(ListingAction::Relist),
            "delete" => Some(ListingAction::Delete),
            _ => None,
        }
    }

    fn requires_admin(&self) -> bool {
        matches!(self, ListingAction::Approve | ListingAction::Reject { .. })
    }
}

pub struct ListingService {
    store: Arc<dyn ListingStore>,
    media: Arc<dyn MediaStore>,
    engagement: Arc<dyn EngagementSink>,
    limiter: Arc<dyn RateLimiter>,
    bus: Arc<EventBus>,
    cache: Arc<TaggedCache>,
    policy: GuardPolicy,
}

impl ListingService {
    pub fn new(
        store: Arc<dyn ListingStore>,
        media: Arc<dyn MediaStore>,
        engagement: Arc<dyn EngagementSink>,
        limiter: Arc<dyn RateLimiter>,
        bus: Arc<EventBus>,
        cache: Arc<TaggedCache>,
        policy: GuardPolicy,
    ) -> Self {
        Self {
            store,
            media,
            engagement,
            limiter,
            bus,
            cache,
            policy,
        }
    }

    /// Apply a lifecycle action on behalf of `actor`.
    pub async fn transition(
        &self,
        actor: Actor,
        id: ListingId,
        action: ListingAction,
    ) -> Result<(), CoreError> {
        let listing = self
            .authorized_snapshot(&actor, id, action.requires_admin())
            .await?;

        if action == ListingAction::Delete {
            return self.delete_listing(actor, listing).await;
        }

        let (target, reason, relist) = match &action {
            ListingAction::MarkSold => (ListingStatus::Sold, None, false),
            ListingAction::Approve => (ListingStatus::Active, None, false),
            ListingAction::Reject { reason } => (ListingStatus::Rejected, reason.as_deref(), false),
            ListingAction::Relist => (ListingStatus::Active, None, true),
            ListingAction::Delete => unreachable!("handled above"),
        };

        // Approve and relist share a target status but not a source: approve
        // only clears the moderation queue, relist only revives a sale.
        let legal = listing.status.can_transition(target)
            && match action {
                ListingAction::Approve => listing.status == ListingStatus::Pending,
                ListingAction::Relist => listing.status == ListingStatus::Sold,
                _ => true,
            };
        if !legal {
            return Err(CoreError::Conflict(format!(
                "cannot transition listing from {} to {}",
                listing.status.as_str(),
                target.as_str()
            )));
        }

        self.store.set_status(id, target, reason, relist).await?;
        self.cache.invalidate_listings();

        self.bus.publish(
            MarketEvent::new(EVENT_LISTING_TRANSITIONED)
                .with_listing(id)
                .with_actor(actor.id)
                .with_payload(serde_json::json!({
                    "from": listing.status.as_str(),
                    "to": target.as_str(),
                })),
        );
        Ok(())
    }

    /// Refresh a listing's recency ranking without touching `created_at`.
    /// Bumps are scarce: at most `bump_limit` per actor per window.
    pub async fn bump(&self, actor: Actor, id: ListingId) -> Result<(), CoreError> {
        let listing = self.authorized_snapshot(&actor, id, false).await?;
        if listing.status != ListingStatus::Active {
            return Err(CoreError::Conflict(
                "only active listings can be bumped".into(),
            ));
        }

        let decision = self
            .limiter
            .hit(
                &format!("bump:{}", actor.id),
                self.policy.bump_limit,
                self.policy.bump_window,
            )
            .await?;
        if !decision.allowed {
            return Err(CoreError::Throttled(format!(
                "bump limit of {} per window reached",
                self.policy.bump_limit
            )));
        }

        self.store.bump(id).await?;
        self.cache.invalidate_listings();
        self.record_engagement(EngagementEvent {
            item_id: id,
            event_type: EngagementType::Bump,
            actor_id: Some(actor.id),
            session_id: None,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    async fn delete_listing(&self, actor: Actor, listing: Listing) -> Result<(), CoreError> {
        // Media removal is best-effort: a missing or unreachable file must
        // not leave the row behind.
        for image in &listing.images {
            if let Err(err) = self.media.remove(image).await {
                tracing::warn!(error = %err, path = %image,
                    "Failed to remove listing media during delete");
            }
        }

        self.store.delete(listing.id).await?;
        self.cache.invalidate_listings();

        self.bus.publish(
            MarketEvent::new(EVENT_LISTING_DELETED)
                .with_listing(listing.id)
                .with_actor(actor.id),
        );
        Ok(())
    }

    /// Load the listing and enforce who may perform `action` on it.
    ///
    /// Admin-only actions return `Forbidden` to the owner (they can see the
    /// listing exists) but `NotFound` to everyone else. Owner actions return
    /// `NotFound` to non-owners, indistinguishable from a missing id.
    async fn authorized_snapshot(
        &self,
        actor: &Actor,
        id: ListingId,
        admin_only: bool,
    ) -> Result<Listing, CoreError> {
        let listing = self
            .store
            .get_by_id(id)
            .await?
            .ok_or(CoreError::NotFound { entity: "Listing" })?;
        let is_owner = listing.seller_id == actor.id;

        if actor.is_admin() {
            return Ok(listing);
        }
        if admin_only {
            let err = CoreError::Forbidden("administrator role required".into());
            return Err(if is_owner {
                err
            } else {
                err.mask_as_not_found("Listing")
            });
        }
        if !is_owner {
            return Err(
                CoreError::Forbidden("not the listing owner".into()).mask_as_not_found("Listing")
            );
        }
        Ok(listing)
    }

    fn record_engagement(&self, event: EngagementEvent) {
        let sink = Arc::clone(&self.engagement);
        tokio::spawn(async move {
            let item_id = event.item_id;
            if let Err(err) = sink.record(event).await {
                tracing::warn!(error = %err, listing_id = %item_id,
                    "Failed to record engagement event");
            }
        });
    }
}
