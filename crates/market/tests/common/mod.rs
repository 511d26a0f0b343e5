//! In-memory collaborator implementations for engine integration tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use medina_core::contracts::{
    EngagementSink, IdempotencyStore, ListingStore, MediaStore, RateDecision, RateLimiter,
    Reservation,
};
use medina_core::filter::{ListingFilter, ListingOrder, StatusScope};
use medina_core::listing::{EngagementEvent, Listing, ListingStatus, ListingUpdate, NewListing};
use medina_core::types::{ActorId, ListingId};
use medina_core::validation::CreateListingRequest;
use medina_core::{Actor, ActorRole, CoreError};
use medina_events::EventBus;
use medina_market::{Market, MarketDeps, MarketPolicies};

// ---------------------------------------------------------------------------
// Listing store
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryStore {
    pub listings: Mutex<Vec<Listing>>,
    /// Counts `query` calls so tests can assert cache behavior.
    pub query_calls: AtomicUsize,
    /// When set, `query` fails for subtype filters (non-empty attributes).
    pub fail_subtype_queries: AtomicBool,
}

impl MemoryStore {
    pub fn insert(&self, listing: Listing) {
        self.listings.lock().unwrap().push(listing);
    }

    pub fn get(&self, id: ListingId) -> Option<Listing> {
        self.listings
            .lock()
            .unwrap()
            .iter()
            .find(|listing| listing.id == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.listings.lock().unwrap().len()
    }

    fn matches(listing: &Listing, filter: &ListingFilter) -> bool {
        let now = Utc::now();
        let scope_ok = match filter.status {
            StatusScope::ActiveUnexpired => listing.is_live(now),
            StatusScope::Exactly(status) => listing.status == status,
            StatusScope::Any => true,
        };
        if !scope_ok {
            return false;
        }
        if let Some(category) = &filter.category {
            if &listing.category != category {
                return false;
            }
        }
        if let Some(area_id) = &filter.area_id {
            if listing.area_id.as_ref() != Some(area_id) {
                return false;
            }
        }
        if let Some(min) = filter.min_price {
            if listing.price < min {
                return false;
            }
        }
        if let Some(max) = filter.max_price {
            if listing.price > max {
                return false;
            }
        }
        if let Some(condition) = filter.condition {
            if listing.condition != Some(condition) {
                return false;
            }
        }
        if let Some(query) = &filter.query {
            let needle = query.to_lowercase();
            if !listing.title.to_lowercase().contains(&needle)
                && !listing.description.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        for (key, value) in &filter.attributes {
            if listing.attributes.get(key) != Some(value) {
                return false;
            }
        }
        if let Some(seller_id) = filter.seller_id {
            if listing.seller_id != seller_id {
                return false;
            }
        }
        if let Some(is_featured) = filter.is_featured {
            if listing.is_featured != is_featured {
                return false;
            }
        }
        true
    }

    fn order(items: &mut [Listing], order: ListingOrder) {
        match order {
            ListingOrder::FeaturedRecency => items.sort_by(|a, b| {
                b.is_featured
                    .cmp(&a.is_featured)
                    .then(b.last_bump_at.cmp(&a.last_bump_at))
                    .then(b.created_at.cmp(&a.created_at))
            }),
            ListingOrder::Recency => items.sort_by(|a, b| {
                b.last_bump_at
                    .cmp(&a.last_bump_at)
                    .then(b.created_at.cmp(&a.created_at))
            }),
            ListingOrder::ViewCount => items.sort_by(|a, b| b.view_count.cmp(&a.view_count)),
            ListingOrder::PriceAsc => items.sort_by(|a, b| {
                a.price
                    .partial_cmp(&b.price)
                    .unwrap_or(std::cmp::Ordering::Equal)
            }),
        }
    }
}

#[async_trait]
impl ListingStore for MemoryStore {
    async fn create(&self, listing: NewListing) -> Result<Listing, CoreError> {
        let now = Utc::now();
        let created = Listing {
            id: Uuid::new_v4(),
            slug: listing.slug,
            title: listing.title,
            description: listing.description,
            price: listing.price,
            price_type: listing.price_type,
            category: listing.category,
            condition: listing.condition,
            images: listing.images,
            attributes: listing.attributes,
            location: listing.location,
            area_id: listing.area_id,
            seller_id: listing.seller_id,
            seller_phone: listing.seller_phone,
            seller_whatsapp: listing.seller_whatsapp,
            status: listing.status,
            is_featured: false,
            rejection_reason: None,
            view_count: 0,
            created_at: now,
            updated_at: now,
            expires_at: listing.expires_at,
            last_bump_at: now,
        };
        self.insert(created.clone());
        Ok(created)
    }

    async fn get_by_id(&self, id: ListingId) -> Result<Option<Listing>, CoreError> {
        Ok(self.get(id))
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Listing>, CoreError> {
        Ok(self
            .listings
            .lock()
            .unwrap()
            .iter()
            .find(|listing| listing.slug == slug)
            .cloned())
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, CoreError> {
        Ok(self
            .listings
            .lock()
            .unwrap()
            .iter()
            .any(|listing| listing.slug == slug))
    }

    async fn update_fields(&self, id: ListingId, update: &ListingUpdate) -> Result<(), CoreError> {
        let mut listings = self.listings.lock().unwrap();
        let listing = listings
            .iter_mut()
            .find(|listing| listing.id == id)
            .ok_or(CoreError::NotFound { entity: "Listing" })?;
        if let Some(title) = &update.title {
            listing.title = title.clone();
        }
        if let Some(description) = &update.description {
            listing.description = description.clone();
        }
        if let Some(price) = update.price {
            listing.price = price;
        }
        if let Some(location) = &update.location {
            listing.location = location.clone();
        }
        listing.updated_at = Utc::now();
        Ok(())
    }

    async fn set_status(
        &self,
        id: ListingId,
        status: ListingStatus,
        reason: Option<&str>,
        relist: bool,
    ) -> Result<(), CoreError> {
        let mut listings = self.listings.lock().unwrap();
        let listing = listings
            .iter_mut()
            .find(|listing| listing.id == id)
            .ok_or(CoreError::NotFound { entity: "Listing" })?;
        let now = Utc::now();
        listing.status = status;
        listing.rejection_reason = reason.map(str::to_string);
        listing.updated_at = now;
        if relist {
            listing.created_at = now;
            listing.last_bump_at = now;
            listing.expires_at = None;
        }
        Ok(())
    }

    async fn bump(&self, id: ListingId) -> Result<(), CoreError> {
        let mut listings = self.listings.lock().unwrap();
        let listing = listings
            .iter_mut()
            .find(|listing| listing.id == id)
            .ok_or(CoreError::NotFound { entity: "Listing" })?;
        listing.last_bump_at = Utc::now();
        Ok(())
    }

    async fn increment_views(&self, id: ListingId) -> Result<(), CoreError> {
        let mut listings = self.listings.lock().unwrap();
        let listing = listings
            .iter_mut()
            .find(|listing| listing.id == id)
            .ok_or(CoreError::NotFound { entity: "Listing" })?;
        listing.view_count += 1;
        Ok(())
    }

    async fn delete(&self, id: ListingId) -> Result<(), CoreError> {
        let mut listings = self.listings.lock().unwrap();
        let before = listings.len();
        listings.retain(|listing| listing.id != id);
        if listings.len() == before {
            return Err(CoreError::NotFound { entity: "Listing" });
        }
        Ok(())
    }

    async fn query(
        &self,
        filter: &ListingFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Listing>, i64), CoreError> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_subtype_queries.load(Ordering::SeqCst) && !filter.attributes.is_empty() {
            return Err(CoreError::Dependency("subtype index offline".into()));
        }
        let mut items: Vec<Listing> = self
            .listings
            .lock()
            .unwrap()
            .iter()
            .filter(|listing| Self::matches(listing, filter))
            .cloned()
            .collect();
        let total = items.len() as i64;
        Self::order(&mut items, filter.order);
        let items = items
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();
        Ok((items, total))
    }
}

// ---------------------------------------------------------------------------
// Idempotency store
// ---------------------------------------------------------------------------

/// Reservation slots: `None` = in flight, `Some` = completed.
#[derive(Default)]
pub struct MemoryIdempotency {
    slots: Mutex<HashMap<String, Option<serde_json::Value>>>,
}

#[async_trait]
impl IdempotencyStore for MemoryIdempotency {
    async fn reserve(
        &self,
        key: &str,
        _actor: ActorId,
        _ttl: Duration,
    ) -> Result<Reservation, CoreError> {
        let mut slots = self.slots.lock().unwrap();
        match slots.get(key) {
            Some(Some(payload)) => Ok(Reservation::Completed(payload.clone())),
            Some(None) => Ok(Reservation::InFlight),
            None => {
                slots.insert(key.to_string(), None);
                Ok(Reservation::Acquired)
            }
        }
    }

    async fn complete(&self, key: &str, payload: &serde_json::Value) -> Result<(), CoreError> {
        self.slots
            .lock()
            .unwrap()
            .insert(key.to_string(), Some(payload.clone()));
        Ok(())
    }

    async fn release(&self, key: &str) -> Result<(), CoreError> {
        let mut slots = self.slots.lock().unwrap();
        if matches!(slots.get(key), Some(None)) {
            slots.remove(key);
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, CoreError> {
        Ok(self.slots.lock().unwrap().get(key).cloned().flatten())
    }
}

// ---------------------------------------------------------------------------
// Rate limiter
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryLimiter {
    windows: Mutex<HashMap<String, (i64, Instant)>>,
}

impl MemoryLimiter {
    /// Force the window for `key` to be treated as elapsed.
    pub fn expire_window(&self, key: &str) {
        if let Some((_, start)) = self.windows.lock().unwrap().get_mut(key) {
            *start = Instant::now() - std::time::Duration::from_secs(86_400 * 2);
        }
    }
}

#[async_trait]
impl RateLimiter for MemoryLimiter {
    async fn hit(
        &self,
        key: &str,
        limit: i64,
        window: Duration,
    ) -> Result<RateDecision, CoreError> {
        let mut windows = self.windows.lock().unwrap();
        let now = Instant::now();
        let window = window.to_std().unwrap_or_default();
        let entry = windows.entry(key.to_string()).or_insert((0, now));
        if now.duration_since(entry.1) >= window {
            *entry = (0, now);
        }
        entry.0 += 1;
        Ok(RateDecision {
            allowed: entry.0 <= limit,
            count: entry.0,
        })
    }
}

// ---------------------------------------------------------------------------
// Media store and engagement sink
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryMedia {
    pub removed: Mutex<Vec<String>>,
    pub fail_removals: AtomicBool,
}

#[async_trait]
impl MediaStore for MemoryMedia {
    async fn remove(&self, path: &str) -> Result<(), CoreError> {
        if self.fail_removals.load(Ordering::SeqCst) {
            return Err(CoreError::Dependency("storage unreachable".into()));
        }
        self.removed.lock().unwrap().push(path.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemorySink {
    pub events: Mutex<Vec<EngagementEvent>>,
}

#[async_trait]
impl EngagementSink for MemorySink {
    async fn record(&self, event: EngagementEvent) -> Result<(), CoreError> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub market: Market,
    pub store: Arc<MemoryStore>,
    pub idempotency: Arc<MemoryIdempotency>,
    pub limiter: Arc<MemoryLimiter>,
    pub media: Arc<MemoryMedia>,
    pub sink: Arc<MemorySink>,
    pub bus: Arc<EventBus>,
}

pub fn harness() -> Harness {
    harness_with(MarketPolicies::default())
}

pub fn harness_with(policies: MarketPolicies) -> Harness {
    let store = Arc::new(MemoryStore::default());
    let idempotency = Arc::new(MemoryIdempotency::default());
    let limiter = Arc::new(MemoryLimiter::default());
    let media = Arc::new(MemoryMedia::default());
    let sink = Arc::new(MemorySink::default());
    let bus = Arc::new(EventBus::default());

    let market = Market::new(
        MarketDeps {
            store: store.clone(),
            idempotency: idempotency.clone(),
            limiter: limiter.clone(),
            media: media.clone(),
            engagement: sink.clone(),
            bus: bus.clone(),
        },
        policies,
    );

    Harness {
        market,
        store,
        idempotency,
        limiter,
        media,
        sink,
        bus,
    }
}

pub fn user() -> Actor {
    Actor {
        id: Uuid::new_v4(),
        role: ActorRole::User,
    }
}

pub fn admin() -> Actor {
    Actor {
        id: Uuid::new_v4(),
        role: ActorRole::Admin,
    }
}

pub fn valid_request(title: &str) -> CreateListingRequest {
    CreateListingRequest {
        title: title.to_string(),
        description: "Well maintained, single owner, recently serviced.".into(),
        price: 250.0,
        price_type: "fixed".into(),
        category: "vehicles".into(),
        images: vec!["img/front.jpg".into(), "img/side.jpg".into()],
        location: "Harbor District".into(),
        seller_phone: "+1 555 010 0199".into(),
        ..Default::default()
    }
}

/// Seed a live listing directly into the store, bypassing the guard.
pub fn seeded_listing(seller: ActorId, title: &str, category: &str) -> Listing {
    let now = Utc::now();
    Listing {
        id: Uuid::new_v4(),
        slug: format!("{}-{}", title.to_lowercase().replace(' ', "-"), Uuid::new_v4()),
        title: title.to_string(),
        description: "Seeded listing for tests".into(),
        price: 100.0,
        price_type: medina_core::listing::PriceType::Fixed,
        category: category.to_string(),
        condition: None,
        images: vec!["img/seed.jpg".into()],
        attributes: Default::default(),
        location: "Test Town".into(),
        area_id: None,
        seller_id: seller,
        seller_phone: "+15550100199".into(),
        seller_whatsapp: None,
        status: ListingStatus::Active,
        is_featured: false,
        rejection_reason: None,
        view_count: 0,
        created_at: now,
        updated_at: now,
        expires_at: None,
        last_bump_at: now,
    }
}
