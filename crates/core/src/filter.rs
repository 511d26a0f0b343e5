//! Browse filter model translated into store queries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::listing::{Condition, ListingStatus};
use crate::types::ActorId;

/// Which lifecycle states a query sees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusScope {
    /// `status = active AND (expires_at IS NULL OR expires_at > now)`.
    /// The default scope for every public read surface.
    #[default]
    ActiveUnexpired,
    /// A single exact status, expiry ignored (moderation surfaces).
    Exactly(ListingStatus),
    /// No status predicate at all.
    Any,
}

/// Result ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingOrder {
    /// `is_featured DESC, last_bump_at DESC, created_at DESC` — the default
    /// browse ordering.
    #[default]
    FeaturedRecency,
    /// `last_bump_at DESC, created_at DESC`, featured flag ignored.
    Recency,
    ViewCount,
    PriceAsc,
}

/// Loosely-typed browse filter; present predicates are ANDed together.
///
/// Serialization of this struct is the cache key for browse reads, so field
/// order and representation must stay deterministic (`BTreeMap`, no skips).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingFilter {
    pub category: Option<String>,
    pub area_id: Option<String>,
    /// Matches listings whose area belongs to this district (area join).
    pub district: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub condition: Option<Condition>,
    /// Case-insensitive substring over title and description. Quote
    /// characters are stripped defensively before the query is built.
    pub query: Option<String>,
    /// Subset containment: every entry must match the listing's attributes.
    pub attributes: BTreeMap<String, String>,
    pub seller_id: Option<ActorId>,
    pub is_featured: Option<bool>,
    pub status: StatusScope,
    pub order: ListingOrder,
}

impl ListingFilter {
    /// Active-unexpired listings in a category, default ordering.
    pub fn for_category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            ..Default::default()
        }
    }

    /// Category plus one attribute pair — the shape used by the
    /// personalization resolver for subtype lookups.
    pub fn for_subtype(
        category: impl Into<String>,
        attr_key: impl Into<String>,
        attr_value: impl Into<String>,
    ) -> Self {
        let mut attributes = BTreeMap::new();
        attributes.insert(attr_key.into(), attr_value.into());
        Self {
            category: Some(category.into()),
            attributes,
            ..Default::default()
        }
    }
}
