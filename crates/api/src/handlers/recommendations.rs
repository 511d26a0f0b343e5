//! Handler for personalized recommendations.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use medina_market::personalize::BrowseHints;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

const DEFAULT_LIMIT: usize = 12;
const MAX_LIMIT: usize = 50;

/// Per-list cap on client-supplied history entries.
const MAX_HINT_ENTRIES: usize = 20;

#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    #[serde(flatten)]
    pub hints: BrowseHints,
    pub limit: Option<usize>,
}

/// POST /api/v1/recommendations
///
/// Resolve personalized listings from client-supplied browsing hints. The
/// endpoint is public: hints are untrusted and only select which live
/// listings to show, so there is nothing to protect with auth.
pub async fn recommend(
    State(state): State<AppState>,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<impl IntoResponse> {
    let mut hints = request.hints;
    hints.viewed_subtypes.truncate(MAX_HINT_ENTRIES);
    hints.viewed_categories.truncate(MAX_HINT_ENTRIES);

    let limit = request.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);

    let items = state.market.recommendations.recommend(&hints, limit).await?;
    Ok(Json(DataResponse { data: items }))
}
