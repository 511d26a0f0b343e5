//! Marketplace engine: creation guard, lifecycle service, cached catalog
//! reads, home-feed composition, and personalization.
//!
//! The engine is storage-agnostic: it talks to the collaborator traits in
//! `medina-core` and publishes on the `medina-events` bus. [`Market`] bundles
//! the services over one shared cache and bus.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod feed;
pub mod guard;
pub mod listings;
pub mod personalize;

use std::sync::Arc;

use medina_core::contracts::{
    EngagementSink, IdempotencyStore, ListingStore, MediaStore, RateLimiter,
};
use medina_events::EventBus;

use crate::cache::TaggedCache;
use crate::catalog::CatalogService;
use crate::config::{CachePolicy, FeedPolicy, GuardPolicy};
use crate::feed::FeedComposer;
use crate::guard::CreationGuard;
use crate::listings::ListingService;
use crate::personalize::PersonalizationResolver;

/// External collaborators the engine is built over.
pub struct MarketDeps {
    pub store: Arc<dyn ListingStore>,
    pub idempotency: Arc<dyn IdempotencyStore>,
    pub limiter: Arc<dyn RateLimiter>,
    pub media: Arc<dyn MediaStore>,
    pub engagement: Arc<dyn EngagementSink>,
    pub bus: Arc<EventBus>,
}

/// Engine policies, typically loaded via the `from_env` constructors.
#[derive(Debug, Clone, Default)]
pub struct MarketPolicies {
    pub guard: GuardPolicy,
    pub feed: FeedPolicy,
    pub cache: CachePolicy,
}

impl MarketPolicies {
    pub fn from_env() -> Self {
        Self {
            guard: GuardPolicy::from_env(),
            feed: FeedPolicy::from_env(),
            cache: CachePolicy::from_env(),
        }
    }
}

/// The assembled marketplace engine.
pub struct Market {
    pub guard: CreationGuard,
    pub listings: ListingService,
    pub catalog: CatalogService,
    pub feed: FeedComposer,
    pub recommendations: PersonalizationResolver,
    cache: Arc<TaggedCache>,
}

impl Market {
    pub fn new(deps: MarketDeps, policies: MarketPolicies) -> Self {
        let cache = Arc::new(TaggedCache::new());

        let guard = CreationGuard::new(
            Arc::clone(&deps.store),
            Arc::clone(&deps.idempotency),
            Arc::clone(&deps.limiter),
            Arc::clone(&deps.bus),
            Arc::clone(&cache),
            policies.guard.clone(),
        );
        let listings = ListingService::new(
            Arc::clone(&deps.store),
            Arc::clone(&deps.media),
            Arc::clone(&deps.engagement),
            Arc::clone(&deps.limiter),
            Arc::clone(&deps.bus),
            Arc::clone(&cache),
            policies.guard,
        );
        let catalog = CatalogService::new(
            Arc::clone(&deps.store),
            Arc::clone(&deps.engagement),
            Arc::clone(&cache),
            policies.cache.clone(),
        );
        let feed = FeedComposer::new(
            Arc::clone(&deps.store),
            Arc::clone(&cache),
            policies.feed.clone(),
            policies.cache,
        );
        let recommendations = PersonalizationResolver::new(Arc::clone(&deps.store), policies.feed);

        Self {
            guard,
            listings,
            catalog,
            feed,
            recommendations,
            cache,
        }
    }

    /// The shared read cache; exposed for operational invalidation.
    pub fn cache(&self) -> &Arc<TaggedCache> {
        &self.cache
    }
}
