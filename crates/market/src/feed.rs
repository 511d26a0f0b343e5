//! Home feed composition.
//!
//! The default sort blends a pinned featured prefix with a shuffled organic
//! tail: up to `featured_slots` featured listings lead the feed, then the
//! remaining slots are filled from an over-fetched pool of recent organic
//! listings, shuffled so repeat visits surface different inventory. The two
//! deterministic sorts bypass the blend entirely.

use std::sync::Arc;

use rand::seq::SliceRandom;

use medina_core::contracts::ListingStore;
use medina_core::filter::{ListingFilter, ListingOrder};
use medina_core::listing::Listing;
use medina_core::CoreError;

use crate::cache::{CachedValue, TaggedCache, TAG_HOME_FEED, TAG_LISTINGS};
use crate::config::{CachePolicy, FeedPolicy};

/// Requested feed ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FeedSort {
    /// Featured prefix plus shuffled organic tail.
    #[default]
    Random,
    MostViewed,
    LowestPrice,
}

impl FeedSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedSort::Random => "random",
            FeedSort::MostViewed => "most_viewed",
            FeedSort::LowestPrice => "lowest_price",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "random" => Some(FeedSort::Random),
            "most_viewed" => Some(FeedSort::MostViewed),
            "lowest_price" => Some(FeedSort::LowestPrice),
            _ => None,
        }
    }
}

pub struct FeedComposer {
    store: Arc<dyn ListingStore>,
    cache: Arc<TaggedCache>,
    policy: FeedPolicy,
    cache_policy: CachePolicy,
}

impl FeedComposer {
    pub fn new(
        store: Arc<dyn ListingStore>,
        cache: Arc<TaggedCache>,
        policy: FeedPolicy,
        cache_policy: CachePolicy,
    ) -> Self {
        Self {
            store,
            cache,
            policy,
            cache_policy,
        }
    }

    /// Compose the home feed: at most `limit` live listings.
    ///
    /// Cached per `(sort, limit)` under both listing and feed tags, so the
    /// shuffle only re-rolls when the TTL lapses or a mutation invalidates.
    pub async fn home_feed(&self, limit: usize, sort: FeedSort) -> Result<Vec<Listing>, CoreError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let key = format!("feed:{}:{limit}", sort.as_str());
        if let Some(CachedValue::Items(items)) = self.cache.get(&key) {
            return Ok(items);
        }

        let items = match sort {
            FeedSort::MostViewed => self.ranked(ListingOrder::ViewCount, limit).await?,
            FeedSort::LowestPrice => self.ranked(ListingOrder::PriceAsc, limit).await?,
            FeedSort::Random => self.blend(limit).await?,
        };

        self.cache.put(
            key,
            CachedValue::Items(items.clone()),
            &[TAG_LISTINGS, TAG_HOME_FEED],
            self.cache_policy.feed_ttl,
        );
        Ok(items)
    }

    async fn ranked(&self, order: ListingOrder, limit: usize) -> Result<Vec<Listing>, CoreError> {
        let filter = ListingFilter {
            order,
            ..Default::default()
        };
        let (items, _) = self.store.query(&filter, limit as i64, 0).await?;
        Ok(items)
    }

    async fn blend(&self, limit: usize) -> Result<Vec<Listing>, CoreError> {
        let featured = ListingFilter {
            is_featured: Some(true),
            order: ListingOrder::Recency,
            ..Default::default()
        };
        let slots = self.policy.featured_slots.min(limit);
        let (mut feed, _) = self.store.query(&featured, slots as i64, 0).await?;

        let remaining = limit - feed.len();
        if remaining == 0 {
            return Ok(feed);
        }

        let organic = ListingFilter {
            is_featured: Some(false),
            order: ListingOrder::Recency,
            ..Default::default()
        };
        let pool_size = (remaining * self.policy.overfetch_factor) as i64;
        let (mut pool, _) = self.store.query(&organic, pool_size, 0).await?;

        pool.shuffle(&mut rand::rng());
        pool.truncate(remaining);
        feed.extend(pool);
        Ok(feed)
    }
}
