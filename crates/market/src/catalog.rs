//! Cached read paths: filtered browse queries and single-listing detail.
//!
//! Cache keys are the serialized filter plus pagination, so equal queries
//! share entries. Detail views record a view engagement asynchronously;
//! the read path never waits on or fails from the engagement sink.

use std::sync::Arc;

use chrono::Utc;

use medina_core::contracts::{EngagementSink, ListingStore};
use medina_core::filter::ListingFilter;
use medina_core::listing::{EngagementEvent, EngagementType, Listing};
use medina_core::types::{ActorId, ListingId};
use medina_core::CoreError;

use crate::cache::{CachedValue, RequestMemo, TaggedCache, TAG_LISTINGS};
use crate::config::CachePolicy;

pub struct CatalogService {
    store: Arc<dyn ListingStore>,
    engagement: Arc<dyn EngagementSink>,
    cache: Arc<TaggedCache>,
    policy: CachePolicy,
}

impl CatalogService {
    pub fn new(
        store: Arc<dyn ListingStore>,
        engagement: Arc<dyn EngagementSink>,
        cache: Arc<TaggedCache>,
        policy: CachePolicy,
    ) -> Self {
        Self {
            store,
            engagement,
            cache,
            policy,
        }
    }

    /// Run a filtered browse query with pagination, memoized per request
    /// and cached across requests.
    pub async fn browse(
        &self,
        filter: &ListingFilter,
        limit: i64,
        offset: i64,
        memo: &mut RequestMemo,
    ) -> Result<(Vec<Listing>, i64), CoreError> {
        let key = browse_key(filter, limit, offset)?;

        if let Some(CachedValue::Page { items, total }) = memo.get(&key).cloned() {
            return Ok((items, total));
        }
        if let Some(CachedValue::Page { items, total }) = self.cache.get(&key) {
            memo.put(
                key,
                CachedValue::Page {
                    items: items.clone(),
                    total,
                },
            );
            return Ok((items, total));
        }

        let (items, total) = self.store.query(filter, limit, offset).await?;
        let value = CachedValue::Page {
            items: items.clone(),
            total,
        };
        self.cache
            .put(key.clone(), value.clone(), &[TAG_LISTINGS], self.policy.browse_ttl);
        memo.put(key, value);
        Ok((items, total))
    }

    /// Look up a single listing by slug, falling back to UUID for legacy
    /// links. Records a view engagement when found.
    pub async fn detail(
        &self,
        slug_or_id: &str,
        viewer: Option<ActorId>,
        session: Option<String>,
    ) -> Result<Option<Listing>, CoreError> {
        let key = format!("detail:{slug_or_id}");

        let listing = match self.cache.get(&key) {
            Some(CachedValue::One(listing)) => Some(listing),
            _ => {
                let mut found = self.store.get_by_slug(slug_or_id).await?;
                if found.is_none() {
                    if let Ok(id) = slug_or_id.parse::<ListingId>() {
                        found = self.store.get_by_id(id).await?;
                    }
                }
                if let Some(listing) = &found {
                    self.cache.put(
                        key,
                        CachedValue::One(listing.clone()),
                        &[TAG_LISTINGS],
                        self.policy.browse_ttl,
                    );
                }
                found
            }
        };

        if let Some(listing) = &listing {
            self.record_view(listing.id, viewer, session);
        }
        Ok(listing)
    }

    fn record_view(&self, id: ListingId, viewer: Option<ActorId>, session: Option<String>) {
        let store = Arc::clone(&self.store);
        let sink = Arc::clone(&self.engagement);
        let event = EngagementEvent {
            item_id: id,
            event_type: EngagementType::View,
            actor_id: viewer,
            session_id: session,
            timestamp: Utc::now(),
        };
        tokio::spawn(async move {
            if let Err(err) = store.increment_views(id).await {
                tracing::warn!(error = %err, listing_id = %id, "Failed to increment view count");
            }
            if let Err(err) = sink.record(event).await {
                tracing::warn!(error = %err, listing_id = %id, "Failed to record view event");
            }
        });
    }
}

fn browse_key(filter: &ListingFilter, limit: i64, offset: i64) -> Result<String, CoreError> {
    let encoded = serde_json::to_string(filter)
        .map_err(|err| CoreError::Internal(format!("unencodable filter: {err}")))?;
    Ok(format!("browse:{encoded}:{limit}:{offset}"))
}
