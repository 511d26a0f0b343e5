//! Medina marketplace domain logic.
//!
//! Pure types and rules for the marketplace listing lifecycle: the listing
//! model and its moderation state machine, creation-payload validation and
//! sanitization, slug derivation, the browse filter model, the shared error
//! taxonomy, and the collaborator contracts implemented by the storage and
//! service crates. This crate performs no I/O.

pub mod contracts;
pub mod error;
pub mod filter;
pub mod listing;
pub mod sanitize;
pub mod slug;
pub mod types;
pub mod validation;

pub use error::CoreError;
pub use listing::{Condition, Listing, ListingStatus, PriceType};
pub use types::{Actor, ActorId, ActorRole, ListingId, Timestamp};
