//! Shared id, time, and actor types.

use serde::{Deserialize, Serialize};

/// Listing primary keys are opaque UUIDs.
pub type ListingId = uuid::Uuid;

/// Actor (seller / administrator) identifiers.
pub type ActorId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Capability level of an authenticated actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorRole {
    /// Ordinary seller/buyer account.
    User,
    /// Administrative actor: may moderate any listing.
    Admin,
}

/// The authenticated actor on whose behalf an operation runs.
///
/// Always passed explicitly into guard and service calls; there is no
/// ambient "current user" lookup, so tests can inject arbitrary actors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: ActorId,
    pub role: ActorRole,
}

impl Actor {
    pub fn new(id: ActorId, role: ActorRole) -> Self {
        Self { id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == ActorRole::Admin
    }
}
