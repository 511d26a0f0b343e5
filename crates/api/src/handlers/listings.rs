//! Handlers for the listing surface: creation, field updates, lifecycle
//! transitions, bumping, browse, and detail.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use medina_core::filter::{ListingFilter, ListingOrder, StatusScope};
use medina_core::listing::{Condition, ListingStatus, ListingUpdate};
use medina_core::validation::CreateListingRequest;
use medina_core::Actor;
use medina_market::cache::RequestMemo;
use medina_market::listings::ListingAction;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthUser, MaybeAuthUser};
use crate::response::{DataResponse, PageResponse};
use crate::state::AppState;

/// Header carrying the client's idempotency key for creation.
const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// Header carrying the anonymous browse session id for view attribution.
const SESSION_HEADER: &str = "x-session-id";

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

// ---------------------------------------------------------------------------
// Write surface
// ---------------------------------------------------------------------------

/// POST /api/v1/listings
///
/// Create a listing. An optional `Idempotency-Key` header makes the request
/// safely retryable: duplicates receive the original response.
pub async fn create_listing(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateListingRequest>,
) -> AppResult<impl IntoResponse> {
    let idempotency_key = headers
        .get(IDEMPOTENCY_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|key| !key.is_empty());

    let listing = state
        .market
        .guard
        .create_listing(actor, request, idempotency_key)
        .await?;

    tracing::info!(listing_id = %listing.id, seller_id = %actor.id,
        status = listing.status.as_str(), "Listing created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: listing })))
}

/// PATCH /api/v1/listings/{id}
///
/// Partial content update by the owner (or an admin).
pub async fn update_listing(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<ListingUpdate>,
) -> AppResult<impl IntoResponse> {
    state.market.guard.update_listing(actor, id, update).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub action: String,
    pub reason: Option<String>,
}

/// POST /api/v1/listings/{id}/transition
///
/// Apply a lifecycle action: `sold`, `active` (approve), `reject`,
/// `relist`, or `delete`.
pub async fn transition_listing(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<TransitionRequest>,
) -> AppResult<impl IntoResponse> {
    let action = ListingAction::parse(&request.action, request.reason)
        .ok_or_else(|| AppError::BadRequest(format!("unknown action '{}'", request.action)))?;

    state.market.listings.transition(actor, id, action).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/listings/{id}/bump
pub async fn bump_listing(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    state.market.listings.bump(actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Read surface
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct BrowseParams {
    pub category: Option<String>,
    pub area_id: Option<String>,
    pub district: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub condition: Option<String>,
    /// Free-text search over title and description.
    pub q: Option<String>,
    pub seller_id: Option<Uuid>,
    pub featured: Option<bool>,
    /// Status scope; only honored for admins and sellers browsing their
    /// own listings. `any` disables the status predicate.
    pub status: Option<String>,
    /// `recency`, `views`, or `price_asc`; defaults to featured-first
    /// recency.
    pub order: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// GET /api/v1/listings
///
/// Filtered browse with pagination. Anonymous callers only ever see
/// active, unexpired listings.
pub async fn list_listings(
    MaybeAuthUser(actor): MaybeAuthUser,
    State(state): State<AppState>,
    Query(params): Query<BrowseParams>,
) -> AppResult<impl IntoResponse> {
    let filter = build_filter(&params, actor.as_ref())?;

    let page = params.page.unwrap_or(1).max(1);
    let per_page = params
        .per_page
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = (page - 1) * per_page;

    let mut memo = RequestMemo::new();
    let (items, count) = state
        .market
        .catalog
        .browse(&filter, per_page, offset, &mut memo)
        .await?;

    Ok(Json(PageResponse { data: items, count }))
}

/// GET /api/v1/listings/{slug}
///
/// Listing detail by slug (or raw id for legacy links). Records a view
/// without blocking the response.
pub async fn get_listing(
    MaybeAuthUser(actor): MaybeAuthUser,
    State(state): State<AppState>,
    Path(slug_or_id): Path<String>,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    let session = headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let listing = state
        .market
        .catalog
        .detail(&slug_or_id, actor.map(|actor| actor.id), session)
        .await?
        .ok_or(AppError::Core(medina_core::CoreError::NotFound {
            entity: "Listing",
        }))?;

    Ok(Json(DataResponse { data: listing }))
}

fn build_filter(params: &BrowseParams, actor: Option<&Actor>) -> Result<ListingFilter, AppError> {
    let condition = match params.condition.as_deref() {
        Some(raw) => Some(
            Condition::parse(raw)
                .ok_or_else(|| AppError::BadRequest(format!("unknown condition '{raw}'")))?,
        ),
        None => None,
    };

    let order = match params.order.as_deref() {
        None => ListingOrder::FeaturedRecency,
        Some("recency") => ListingOrder::Recency,
        Some("views") => ListingOrder::ViewCount,
        Some("price_asc") => ListingOrder::PriceAsc,
        Some(other) => {
            return Err(AppError::BadRequest(format!("unknown order '{other}'")));
        }
    };

    // A wider status scope is only available to admins and to sellers
    // scoped to their own listings; everyone else gets the public scope.
    let may_widen = actor.is_some_and(|actor| {
        actor.is_admin() || params.seller_id == Some(actor.id)
    });
    let status = match params.status.as_deref() {
        Some(raw) if may_widen => match raw {
            "any" => StatusScope::Any,
            value => StatusScope::Exactly(
                ListingStatus::parse(value)
                    .ok_or_else(|| AppError::BadRequest(format!("unknown status '{value}'")))?,
            ),
        },
        _ => StatusScope::ActiveUnexpired,
    };

    Ok(ListingFilter {
        category: params.category.clone(),
        area_id: params.area_id.clone(),
        district: params.district.clone(),
        min_price: params.min_price,
        max_price: params.max_price,
        condition,
        query: params.q.clone(),
        attributes: Default::default(),
        seller_id: params.seller_id,
        is_featured: params.featured,
        status,
        order,
    })
}
