//! Listing model, moderation state machine, and engagement events.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{ActorId, ListingId, Timestamp};

/// Maximum number of images a listing may carry.
pub const MAX_IMAGES: usize = 10;

/// Minimum number of images a listing must carry.
pub const MIN_IMAGES: usize = 1;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Moderation lifecycle state of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Pending,
    Active,
    Sold,
    Rejected,
    Removed,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Pending => "pending",
            ListingStatus::Active => "active",
            ListingStatus::Sold => "sold",
            ListingStatus::Rejected => "rejected",
            ListingStatus::Removed => "removed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(ListingStatus::Pending),
            "active" => Some(ListingStatus::Active),
            "sold" => Some(ListingStatus::Sold),
            "rejected" => Some(ListingStatus::Rejected),
            "removed" => Some(ListingStatus::Removed),
            _ => None,
        }
    }

    /// Whether a moderation transition from `self` to `to` is legal.
    ///
    /// Legal moves: `pending -> active | rejected`, `active -> sold`,
    /// `sold -> active` (relist), and any non-removed state `-> removed`.
    /// `removed` is terminal; `rejected` only admits removal.
    pub fn can_transition(&self, to: ListingStatus) -> bool {
        matches!(
            (self, to),
            (ListingStatus::Pending, ListingStatus::Active)
                | (ListingStatus::Pending, ListingStatus::Rejected)
                | (ListingStatus::Active, ListingStatus::Sold)
                | (ListingStatus::Sold, ListingStatus::Active)
        ) || (to == ListingStatus::Removed && *self != ListingStatus::Removed)
    }
}

/// How the asking price is to be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceType {
    Fixed,
    Negotiable,
    Contact,
}

impl PriceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceType::Fixed => "fixed",
            PriceType::Negotiable => "negotiable",
            PriceType::Contact => "contact",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "fixed" => Some(PriceType::Fixed),
            "negotiable" => Some(PriceType::Negotiable),
            "contact" => Some(PriceType::Contact),
            _ => None,
        }
    }
}

/// Physical condition of the item. A first-class field, never an entry in
/// the generic attribute bag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    New,
    LikeNew,
    Good,
    Fair,
    Poor,
}

impl Condition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::New => "new",
            Condition::LikeNew => "like_new",
            Condition::Good => "good",
            Condition::Fair => "fair",
            Condition::Poor => "poor",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "new" => Some(Condition::New),
            "like_new" => Some(Condition::LikeNew),
            "good" => Some(Condition::Good),
            "fair" => Some(Condition::Fair),
            "poor" => Some(Condition::Poor),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// A single marketplace classified ad.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    /// Human-readable unique key, immutable after creation.
    pub slug: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub price_type: PriceType,
    /// Key into the external category taxonomy.
    pub category: String,
    pub condition: Option<Condition>,
    /// Ordered image paths; always 1..=10 entries.
    pub images: Vec<String>,
    /// Category-specific open fields (e.g. `listing_type`, `brand`).
    pub attributes: BTreeMap<String, String>,
    pub location: String,
    pub area_id: Option<String>,
    pub seller_id: ActorId,
    pub seller_phone: String,
    pub seller_whatsapp: Option<String>,
    pub status: ListingStatus,
    pub is_featured: bool,
    pub rejection_reason: Option<String>,
    pub view_count: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    /// When set and in the past the listing is soft-expired: excluded from
    /// every "active" query even while `status` is still `active`.
    pub expires_at: Option<Timestamp>,
    /// Drives recency ranking independently of `created_at`.
    pub last_bump_at: Timestamp,
}

impl Listing {
    /// True when the listing should appear in active browse/feed scopes.
    pub fn is_live(&self, now: Timestamp) -> bool {
        self.status == ListingStatus::Active
            && self.expires_at.map_or(true, |expiry| expiry > now)
    }
}

/// Validated, sanitized creation record handed to the listing store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewListing {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub price_type: PriceType,
    pub category: String,
    pub condition: Option<Condition>,
    pub images: Vec<String>,
    pub attributes: BTreeMap<String, String>,
    pub location: String,
    pub area_id: Option<String>,
    pub seller_id: ActorId,
    pub seller_phone: String,
    pub seller_whatsapp: Option<String>,
    pub status: ListingStatus,
    pub expires_at: Option<Timestamp>,
}

/// Content-only partial update.
///
/// `status`, `is_featured`, and `seller_id` are deliberately absent: the
/// field-update path cannot reach them by construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub price_type: Option<PriceType>,
    pub category: Option<String>,
    pub condition: Option<Condition>,
    pub images: Option<Vec<String>>,
    pub attributes: Option<BTreeMap<String, String>>,
    pub location: Option<String>,
    pub area_id: Option<String>,
    pub seller_phone: Option<String>,
    pub seller_whatsapp: Option<String>,
}

impl ListingUpdate {
    pub fn is_empty(&self) -> bool {
        self == &ListingUpdate::default()
    }
}

// ---------------------------------------------------------------------------
// Engagement
// ---------------------------------------------------------------------------

/// Kind of engagement signal recorded against a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngagementType {
    View,
    Bump,
    Click,
}

impl EngagementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngagementType::View => "view",
            EngagementType::Bump => "bump",
            EngagementType::Click => "click",
        }
    }
}

/// Append-only engagement record; never mutated or deleted here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementEvent {
    pub item_id: ListingId,
    pub event_type: EngagementType,
    pub actor_id: Option<ActorId>,
    pub session_id: Option<String>,
    pub timestamp: Timestamp,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
