//! Two-layer read caching.
//!
//! [`TaggedCache`] is the cross-request layer: TTL'd entries keyed by the
//! serialized query parameters and labeled with tags so mutations can
//! invalidate whole families of reads at once. [`RequestMemo`] is the
//! within-request layer: a plain memo that lives for one read flow and
//! avoids redundant store calls for the same key. They are distinct layers
//! and must not be conflated — the memo is never shared across requests.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use medina_core::listing::Listing;

/// Tag on every cached marketplace read.
pub const TAG_LISTINGS: &str = "listings";

/// Tag on home-feed entries, so feed staleness can be bounded separately.
pub const TAG_HOME_FEED: &str = "home-feed";

/// A cached read result.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    One(Listing),
    Items(Vec<Listing>),
    Page { items: Vec<Listing>, total: i64 },
}

struct Entry {
    value: CachedValue,
    tags: Vec<&'static str>,
    expires_at: Instant,
}

/// Cross-request tagged TTL cache.
#[derive(Default)]
pub struct TaggedCache {
    entries: DashMap<String, Entry>,
}

impl TaggedCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a live entry, dropping it if the TTL has lapsed.
    pub fn get(&self, key: &str) -> Option<CachedValue> {
        let expired = match self.entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove(key);
        }
        None
    }

    pub fn put(&self, key: String, value: CachedValue, tags: &[&'static str], ttl: Duration) {
        self.entries.insert(
            key,
            Entry {
                value,
                tags: tags.to_vec(),
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Drop every entry carrying the given tag.
    pub fn invalidate_tag(&self, tag: &str) {
        self.entries.retain(|_, entry| !entry.tags.contains(&tag));
    }

    /// Invalidation hook for listing mutations: clears all marketplace
    /// reads, which includes the home feed.
    pub fn invalidate_listings(&self) {
        self.invalidate_tag(TAG_LISTINGS);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Within-request memoization for a single read flow.
#[derive(Default)]
pub struct RequestMemo {
    entries: HashMap<String, CachedValue>,
}

impl RequestMemo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&CachedValue> {
        self.entries.get(key)
    }

    pub fn put(&mut self, key: String, value: CachedValue) {
        self.entries.insert(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_live_entries_only() {
        let cache = TaggedCache::new();
        cache.put(
            "k".into(),
            CachedValue::Items(vec![]),
            &[TAG_LISTINGS],
            Duration::from_secs(60),
        );
        assert_eq!(cache.get("k"), Some(CachedValue::Items(vec![])));
        assert_eq!(cache.get("missing"), None);
    }

    #[test]
    fn expired_entries_are_evicted_on_read() {
        let cache = TaggedCache::new();
        cache.put(
            "k".into(),
            CachedValue::Items(vec![]),
            &[TAG_LISTINGS],
            Duration::from_secs(0),
        );
        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn invalidate_tag_is_selective() {
        let cache = TaggedCache::new();
        cache.put(
            "feed".into(),
            CachedValue::Items(vec![]),
            &[TAG_LISTINGS, TAG_HOME_FEED],
            Duration::from_secs(60),
        );
        cache.put(
            "browse".into(),
            CachedValue::Page {
                items: vec![],
                total: 0,
            },
            &[TAG_LISTINGS],
            Duration::from_secs(60),
        );

        cache.invalidate_tag(TAG_HOME_FEED);
        assert_eq!(cache.get("feed"), None);
        assert!(cache.get("browse").is_some());

        cache.invalidate_listings();
        assert_eq!(cache.get("browse"), None);
    }

    #[test]
    fn memo_is_plain_per_request_storage() {
        let mut memo = RequestMemo::new();
        assert!(memo.get("k").is_none());
        memo.put("k".into(), CachedValue::Items(vec![]));
        assert!(memo.get("k").is_some());
    }
}
