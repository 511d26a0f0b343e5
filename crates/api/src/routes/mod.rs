pub mod feed;
pub mod health;
pub mod listings;
pub mod recommendations;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /listings                       browse (GET), create (POST, auth)
/// /listings/{id}                  update fields (PATCH, auth)
/// /listings/{id}/transition       lifecycle action (POST, auth)
/// /listings/{id}/bump             recency bump (POST, auth)
/// /listings/{slug}                detail (GET)
///
/// /feed                           home feed (GET)
///
/// /recommendations                personalized listings (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(listings::router())
        .merge(feed::router())
        .merge(recommendations::router())
}
