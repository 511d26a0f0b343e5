//! Shared harness for HTTP-level integration tests.
//!
//! Builds the application through [`build_app_router`] so tests exercise
//! the exact middleware stack (CORS, request ID, timeout, tracing, panic
//! recovery) that production uses.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use axum::Router;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use medina_api::auth::jwt::{generate_access_token, JwtConfig};
use medina_api::config::ServerConfig;
use medina_api::media::LocalMediaStore;
use medina_api::router::build_app_router;
use medina_api::state::AppState;
use medina_db::repositories::{EngagementRepo, IdempotencyRepo, ListingRepo, RateLimitRepo};
use medina_events::EventBus;
use medina_market::{Market, MarketDeps, MarketPolicies};

const TEST_JWT_SECRET: &str = "integration-test-secret-0123456789abcdef";

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default)
/// and a 30-second request timeout.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// Assemble the full application router over the given database pool,
/// mirroring the wiring in `main.rs`.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let event_bus = Arc::new(EventBus::default());

    let market = Arc::new(Market::new(
        MarketDeps {
            store: Arc::new(ListingRepo::new(pool.clone())),
            idempotency: Arc::new(IdempotencyRepo::new(pool.clone())),
            limiter: Arc::new(RateLimitRepo::new(pool.clone())),
            media: Arc::new(LocalMediaStore::new(std::env::temp_dir())),
            engagement: Arc::new(EngagementRepo::new(pool.clone())),
            bus: Arc::clone(&event_bus),
        },
        MarketPolicies::default(),
    ));

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        market,
        event_bus,
    };

    build_app_router(state, &config)
}

/// Mint a bearer token for an arbitrary actor id and role.
pub fn auth_token(actor_id: Uuid, role: &str) -> String {
    let config = test_config();
    generate_access_token(actor_id, role, &config.jwt).expect("token generation should succeed")
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, path: &str) -> Response {
    let request = Request::builder()
        .uri(path)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get_auth(app: Router, path: &str, token: &str) -> Response {
    let request = Request::builder()
        .uri(path)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, path: &str, body: serde_json::Value) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json_auth(
    app: Router,
    path: &str,
    token: &str,
    body: serde_json::Value,
) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// POST with both a bearer token and an `Idempotency-Key` header.
pub async fn post_json_idempotent(
    app: Router,
    path: &str,
    token: &str,
    key: &str,
    body: serde_json::Value,
) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header("idempotency-key", key)
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn patch_json_auth(
    app: Router,
    path: &str,
    token: &str,
    body: serde_json::Value,
) -> Response {
    let request = Request::builder()
        .method(Method::PATCH)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Deserialize a response body as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = http_body_util::BodyExt::collect(response.into_body())
        .await
        .unwrap()
        .to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// A creation payload that passes validation as-is.
pub fn valid_listing_body(title: &str) -> serde_json::Value {
    serde_json::json!({
        "title": title,
        "description": "A well-loved item in perfectly usable shape.",
        "price": 120.0,
        "price_type": "fixed",
        "category": "vehicles",
        "condition": "good",
        "images": ["img/a.jpg", "img/b.jpg"],
        "location": "Old Town",
        "seller_phone": "+1 555 010 0199",
        "listing_type": "offered"
    })
}
