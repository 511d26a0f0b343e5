//! Creation guard: the write-side pipeline for marketplace listings.
//!
//! Order matters and is part of the contract: idempotency reservation,
//! rate limit, honeypot, validation, sanitization, auto-approval, slug
//! assignment, persistence, idempotency completion, then post-commit side
//! channels. The pipeline short-circuits on the first failure. Idempotency
//! cache and rate limiter failures fail the whole creation (closed);
//! notification failures never do (open).

use std::sync::Arc;

use medina_core::contracts::{IdempotencyStore, ListingStore, RateLimiter, Reservation};
use medina_core::listing::{Listing, ListingStatus, ListingUpdate, NewListing};
use medina_core::types::ListingId;
use medina_core::validation::{
    honeypot_triggered, validate_create, validate_update, CreateListingRequest,
};
use medina_core::{sanitize, slug, Actor, CoreError};
use medina_events::bus::EVENT_LISTING_SUBMITTED;
use medina_events::{EventBus, MarketEvent};

use crate::cache::TaggedCache;
use crate::config::GuardPolicy;

/// How long a duplicate request waits for the reservation winner before
/// giving up, in poll steps.
const WINNER_POLL_ATTEMPTS: u32 = 80;
const WINNER_POLL_INTERVAL: std::time::Duration = std::time::Duration::from_millis(25);

/// Attempts to take over a key whose previous holder released it.
const RESERVE_RETRIES: u32 = 3;

/// Generic rejection for automated submissions; deliberately indistinct
/// from an ordinary validation failure.
const HONEYPOT_MESSAGE: &str = "Unable to process this request";

pub struct CreationGuard {
    store: Arc<dyn ListingStore>,
    idempotency: Arc<dyn IdempotencyStore>,
    limiter: Arc<dyn RateLimiter>,
    bus: Arc<EventBus>,
    cache: Arc<TaggedCache>,
    policy: GuardPolicy,
}

impl CreationGuard {
    pub fn new(
        store: Arc<dyn ListingStore>,
        idempotency: Arc<dyn IdempotencyStore>,
        limiter: Arc<dyn RateLimiter>,
        bus: Arc<EventBus>,
        cache: Arc<TaggedCache>,
        policy: GuardPolicy,
    ) -> Self {
        Self {
            store,
            idempotency,
            limiter,
            bus,
            cache,
            policy,
        }
    }

    /// Create a listing on behalf of `actor`.
    ///
    /// With an idempotency key, at most one submission per key ever reaches
    /// the pipeline; duplicates (sequential or concurrent) receive the
    /// winner's stored response verbatim.
    pub async fn create_listing(
        &self,
        actor: Actor,
        request: CreateListingRequest,
        idempotency_key: Option<&str>,
    ) -> Result<Listing, CoreError> {
        let Some(key) = idempotency_key else {
            return self.run_pipeline(actor, &request).await;
        };

        let mut takeover_attempts = 0u32;
        loop {
            match self
                .idempotency
                .reserve(key, actor.id, self.policy.idempotency_ttl)
                .await?
            {
                Reservation::Completed(payload) => return decode_replay(payload),
                Reservation::Acquired => break,
                Reservation::InFlight => {
                    if let Some(payload) = self.wait_for_winner(key).await? {
                        return decode_replay(payload);
                    }
                    // Winner released the key (its pipeline failed) or is
                    // unusually slow; try to take the key over.
                    takeover_attempts += 1;
                    if takeover_attempts >= RESERVE_RETRIES {
                        return Err(CoreError::Conflict(
                            "a request with this idempotency key is still in progress".into(),
                        ));
                    }
                }
            }
        }

        let result = self.run_pipeline(actor, &request).await;
        match &result {
            Ok(listing) => {
                let payload = serde_json::to_value(listing)
                    .map_err(|err| CoreError::Internal(err.to_string()))?;
                self.idempotency.complete(key, &payload).await?;
            }
            Err(_) => {
                // Free the key so a client retry can run the pipeline again.
                if let Err(release_err) = self.idempotency.release(key).await {
                    tracing::error!(error = %release_err, key,
                        "Failed to release idempotency reservation");
                }
            }
        }
        result
    }

    /// Update listing content fields.
    ///
    /// Ownership is checked before any validation work so an unauthorized
    /// caller learns nothing — not even which field was invalid — and the
    /// error is shaped exactly like a missing listing.
    pub async fn update_listing(
        &self,
        actor: Actor,
        id: ListingId,
        update: ListingUpdate,
    ) -> Result<(), CoreError> {
        let listing = self
            .store
            .get_by_id(id)
            .await?
            .ok_or(CoreError::NotFound { entity: "Listing" })?;
        if listing.seller_id != actor.id && !actor.is_admin() {
            return Err(CoreError::Forbidden("not the listing owner".into())
                .mask_as_not_found("Listing"));
        }

        let decision = self
            .limiter
            .hit(
                &format!("update:{}", actor.id),
                self.policy.update_limit,
                self.policy.create_window,
            )
            .await?;
        if !decision.allowed {
            return Err(CoreError::Throttled("update limit reached".into()));
        }

        validate_update(&update).map_err(CoreError::Validation)?;
        let clean = sanitize::sanitize_update(&update);

        self.store.update_fields(id, &clean).await?;
        self.cache.invalidate_listings();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Pipeline internals
    // -----------------------------------------------------------------------

    async fn run_pipeline(
        &self,
        actor: Actor,
        request: &CreateListingRequest,
    ) -> Result<Listing, CoreError> {
        let decision = self
            .limiter
            .hit(
                &format!("create:{}", actor.id),
                self.policy.create_limit,
                self.policy.create_window,
            )
            .await?;
        if !decision.allowed {
            return Err(CoreError::Throttled(format!(
                "creation limit of {} per window reached",
                self.policy.create_limit
            )));
        }

        if honeypot_triggered(request) {
            tracing::warn!(actor_id = %actor.id, "Honeypot field filled; rejecting as automated");
            return Err(CoreError::Validation(HONEYPOT_MESSAGE.into()));
        }

        validate_create(request).map_err(CoreError::Validation)?;
        let content = sanitize::sanitize_create(request).map_err(CoreError::Validation)?;

        // Administrative actors skip the moderation queue.
        let status = if actor.is_admin() {
            ListingStatus::Active
        } else {
            ListingStatus::Pending
        };

        let slug = self.assign_slug(&content.title).await?;

        let listing = self
            .store
            .create(NewListing {
                slug,
                title: content.title,
                description: content.description,
                price: content.price,
                price_type: content.price_type,
                category: content.category,
                condition: content.condition,
                images: content.images,
                attributes: content.attributes,
                location: content.location,
                area_id: content.area_id,
                seller_id: actor.id,
                seller_phone: content.seller_phone,
                seller_whatsapp: Some(content.seller_whatsapp),
                status,
                expires_at: None,
            })
            .await?;

        self.cache.invalidate_listings();

        if listing.status == ListingStatus::Pending {
            self.bus.publish(
                MarketEvent::new(EVENT_LISTING_SUBMITTED)
                    .with_listing(listing.id)
                    .with_actor(actor.id)
                    .with_payload(serde_json::json!({
                        "title": listing.title,
                        "category": listing.category,
                    })),
            );
        }

        Ok(listing)
    }

    async fn assign_slug(&self, title: &str) -> Result<String, CoreError> {
        let base = slug::derive(title);
        if base.is_empty() {
            return Ok(slug::with_suffix(&base));
        }
        if self.store.slug_exists(&base).await? {
            Ok(slug::with_suffix(&base))
        } else {
            Ok(base)
        }
    }

    /// Poll for the reservation winner's stored response.
    ///
    /// Returns `None` when the winner released the key or has still not
    /// completed after the full poll budget.
    async fn wait_for_winner(&self, key: &str) -> Result<Option<serde_json::Value>, CoreError> {
        for _ in 0..WINNER_POLL_ATTEMPTS {
            if let Some(payload) = self.idempotency.get(key).await? {
                return Ok(Some(payload));
            }
            tokio::time::sleep(WINNER_POLL_INTERVAL).await;
        }
        Ok(None)
    }
}

fn decode_replay(payload: serde_json::Value) -> Result<Listing, CoreError> {
    serde_json::from_value(payload)
        .map_err(|err| CoreError::Internal(format!("corrupt idempotency payload: {err}")))
}
