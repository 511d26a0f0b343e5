//! Policy constants for the guard, feed, and cache layers.
//!
//! All knobs have defaults suitable for local development and can be
//! overridden via environment variables.

use chrono::Duration;

/// Default creations allowed per actor per window.
const DEFAULT_CREATE_LIMIT: i64 = 3;
/// Default creation window in seconds (one hour).
const DEFAULT_CREATE_WINDOW_SECS: i64 = 3_600;
/// Default bumps allowed per actor per window.
const DEFAULT_BUMP_LIMIT: i64 = 2;
/// Default bump window in seconds (one day).
const DEFAULT_BUMP_WINDOW_SECS: i64 = 86_400;
/// Default idempotency record lifetime in seconds (one day).
const DEFAULT_IDEMPOTENCY_TTL_SECS: i64 = 86_400;

/// Default number of featured slots at the head of the random home feed.
const DEFAULT_FEATURED_SLOTS: usize = 2;
/// Default organic candidate over-fetch multiplier for the shuffle pool.
const DEFAULT_OVERFETCH_FACTOR: usize = 3;
/// Default category for the last personalization fallback step.
const DEFAULT_CATEGORY: &str = "vehicles";

/// Default home-feed cache TTL in seconds (staleness tolerance is low).
const DEFAULT_FEED_TTL_SECS: u64 = 60;
/// Default browse/detail cache TTL in seconds.
const DEFAULT_BROWSE_TTL_SECS: u64 = 300;

/// Abuse-protection policy for the creation guard.
#[derive(Debug, Clone)]
pub struct GuardPolicy {
    pub create_limit: i64,
    pub create_window: Duration,
    pub update_limit: i64,
    pub bump_limit: i64,
    pub bump_window: Duration,
    pub idempotency_ttl: Duration,
}

impl Default for GuardPolicy {
    fn default() -> Self {
        Self {
            create_limit: DEFAULT_CREATE_LIMIT,
            create_window: Duration::seconds(DEFAULT_CREATE_WINDOW_SECS),
            update_limit: 20,
            bump_limit: DEFAULT_BUMP_LIMIT,
            bump_window: Duration::seconds(DEFAULT_BUMP_WINDOW_SECS),
            idempotency_ttl: Duration::seconds(DEFAULT_IDEMPOTENCY_TTL_SECS),
        }
    }
}

impl GuardPolicy {
    /// Load the policy from environment variables with defaults.
    ///
    /// | Env Var                   | Default |
    /// |---------------------------|---------|
    /// | `CREATE_LIMIT_PER_WINDOW` | `3`     |
    /// | `CREATE_WINDOW_SECS`      | `3600`  |
    /// | `BUMP_LIMIT_PER_WINDOW`   | `2`     |
    /// | `BUMP_WINDOW_SECS`        | `86400` |
    /// | `IDEMPOTENCY_TTL_SECS`    | `86400` |
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            create_limit: env_i64("CREATE_LIMIT_PER_WINDOW", defaults.create_limit),
            create_window: Duration::seconds(env_i64(
                "CREATE_WINDOW_SECS",
                defaults.create_window.num_seconds(),
            )),
            update_limit: defaults.update_limit,
            bump_limit: env_i64("BUMP_LIMIT_PER_WINDOW", defaults.bump_limit),
            bump_window: Duration::seconds(env_i64(
                "BUMP_WINDOW_SECS",
                defaults.bump_window.num_seconds(),
            )),
            idempotency_ttl: Duration::seconds(env_i64(
                "IDEMPOTENCY_TTL_SECS",
                defaults.idempotency_ttl.num_seconds(),
            )),
        }
    }
}

/// Blend policy for the home feed.
#[derive(Debug, Clone)]
pub struct FeedPolicy {
    /// Maximum featured listings at the head of the random feed.
    pub featured_slots: usize,
    /// Candidate pool size multiplier: `remaining × overfetch_factor`
    /// organic listings are fetched before the shuffle.
    pub overfetch_factor: usize,
    /// Category used when every personalization signal is absent or empty.
    pub default_category: String,
}

impl Default for FeedPolicy {
    fn default() -> Self {
        Self {
            featured_slots: DEFAULT_FEATURED_SLOTS,
            overfetch_factor: DEFAULT_OVERFETCH_FACTOR,
            default_category: DEFAULT_CATEGORY.to_string(),
        }
    }
}

impl FeedPolicy {
    /// Load the policy from `FEED_FEATURED_SLOTS`, `FEED_OVERFETCH_FACTOR`,
    /// and `FEED_DEFAULT_CATEGORY`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            featured_slots: env_usize("FEED_FEATURED_SLOTS", defaults.featured_slots),
            overfetch_factor: env_usize("FEED_OVERFETCH_FACTOR", defaults.overfetch_factor).max(1),
            default_category: std::env::var("FEED_DEFAULT_CATEGORY")
                .unwrap_or(defaults.default_category),
        }
    }
}

/// TTLs for the cross-request tagged cache.
#[derive(Debug, Clone)]
pub struct CachePolicy {
    pub feed_ttl: std::time::Duration,
    pub browse_ttl: std::time::Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            feed_ttl: std::time::Duration::from_secs(DEFAULT_FEED_TTL_SECS),
            browse_ttl: std::time::Duration::from_secs(DEFAULT_BROWSE_TTL_SECS),
        }
    }
}

impl CachePolicy {
    /// Load TTLs from `CACHE_FEED_TTL_SECS` and `CACHE_BROWSE_TTL_SECS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            feed_ttl: std::time::Duration::from_secs(env_u64(
                "CACHE_FEED_TTL_SECS",
                defaults.feed_ttl.as_secs(),
            )),
            browse_ttl: std::time::Duration::from_secs(env_u64(
                "CACHE_BROWSE_TTL_SECS",
                defaults.browse_ttl.as_secs(),
            )),
        }
    }
}

fn env_i64(name: &str, default: i64) -> i64 {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
