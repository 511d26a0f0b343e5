//! Route definitions for the listing surface.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::listings;
use crate::state::AppState;

/// Listing routes mounted at `/listings`.
///
/// The `{id}` segment of the detail route accepts a slug or a raw UUID;
/// the mutation routes require the UUID.
///
/// ```text
/// GET    /                   -> list_listings
/// POST   /                   -> create_listing
/// GET    /{id}               -> get_listing (slug or id)
/// PATCH  /{id}               -> update_listing
/// POST   /{id}/transition    -> transition_listing
/// POST   /{id}/bump          -> bump_listing
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/listings",
            get(listings::list_listings).post(listings::create_listing),
        )
        .route(
            "/listings/{id}",
            get(listings::get_listing).patch(listings::update_listing),
        )
        .route(
            "/listings/{id}/transition",
            post(listings::transition_listing),
        )
        .route("/listings/{id}/bump", post(listings::bump_listing))
}
