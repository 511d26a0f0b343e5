//! Handler for the home feed.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use medina_market::feed::FeedSort;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

const DEFAULT_FEED_LIMIT: usize = 20;
const MAX_FEED_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct FeedParams {
    pub limit: Option<usize>,
    /// `random` (default), `most_viewed`, or `lowest_price`.
    pub sort: Option<String>,
}

/// GET /api/v1/feed
///
/// The public home feed: live listings only, featured slots pinned at the
/// head under the default sort.
pub async fn home_feed(
    State(state): State<AppState>,
    Query(params): Query<FeedParams>,
) -> AppResult<impl IntoResponse> {
    let sort = match params.sort.as_deref() {
        None => FeedSort::default(),
        Some(raw) => FeedSort::parse(raw)
            .ok_or_else(|| AppError::BadRequest(format!("unknown sort '{raw}'")))?,
    };
    let limit = params
        .limit
        .unwrap_or(DEFAULT_FEED_LIMIT)
        .min(MAX_FEED_LIMIT);

    let items = state.market.feed.home_feed(limit, sort).await?;
    Ok(Json(DataResponse { data: items }))
}
