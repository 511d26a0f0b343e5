//! HTTP-level integration tests for the listing surface: creation,
//! moderation transitions, field updates, browse, and detail.

mod common;

use axum::http::StatusCode;
use common::{
    auth_token, body_json, get, get_auth, patch_json_auth, post_json, post_json_auth,
    post_json_idempotent, valid_listing_body,
};
use sqlx::PgPool;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Creation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn creating_requires_authentication(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(app, "/api/v1/listings", valid_listing_body("Mountain Bike")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let json = body_json(response).await;
    assert_eq!(json["code"], "UNAUTHORIZED");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn user_creations_await_moderation(pool: PgPool) {
    let app = common::build_test_app(pool);
    let seller = Uuid::new_v4();
    let token = auth_token(seller, "user");

    let response = post_json_auth(
        app.clone(),
        "/api/v1/listings",
        &token,
        valid_listing_body("Mountain Bike"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "pending");
    assert_eq!(json["data"]["slug"], "mountain-bike");
    assert_eq!(json["data"]["seller_id"], seller.to_string());

    // Pending listings are invisible to the public browse...
    let response = get(app.clone(), "/api/v1/listings?category=vehicles").await;
    let json = body_json(response).await;
    assert_eq!(json["count"], 0);

    // ...but the seller can see their own, with the scope widened.
    let path = format!("/api/v1/listings?seller_id={seller}&status=any");
    let response = get_auth(app, &path, &token).await;
    let json = body_json(response).await;
    assert_eq!(json["count"], 1);
    assert_eq!(json["data"][0]["slug"], "mountain-bike");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn admin_creations_go_live_immediately(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = auth_token(Uuid::new_v4(), "admin");

    let response = post_json_auth(
        app.clone(),
        "/api/v1/listings",
        &token,
        valid_listing_body("City Bike"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "active");

    let response = get(app.clone(), "/api/v1/listings?category=vehicles").await;
    let json = body_json(response).await;
    assert_eq!(json["count"], 1);

    // Detail by slug works anonymously.
    let response = get(app, "/api/v1/listings/city-bike").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["title"], "City Bike");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn invalid_payloads_are_rejected_with_field_messages(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = auth_token(Uuid::new_v4(), "user");

    let mut body = valid_listing_body("Mountain Bike");
    body["images"] = serde_json::json!([]);

    let response = post_json_auth(app, "/api/v1/listings", &token, body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert!(json["error"].as_str().unwrap().contains("image"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn honeypot_rejections_stay_generic(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = auth_token(Uuid::new_v4(), "user");

    let mut body = valid_listing_body("Mountain Bike");
    body["website"] = serde_json::json!("https://spam.example");

    let response = post_json_auth(app, "/api/v1/listings", &token, body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    // The trap field must not be named in the response.
    assert!(!json["error"].as_str().unwrap().contains("website"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn duplicate_idempotency_keys_replay_the_original_response(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = auth_token(Uuid::new_v4(), "user");
    let body = valid_listing_body("Mountain Bike");

    let first = post_json_idempotent(
        app.clone(),
        "/api/v1/listings",
        &token,
        "key-abc",
        body.clone(),
    )
    .await;
    assert_eq!(first.status(), StatusCode::CREATED);
    let first = body_json(first).await;

    let second =
        post_json_idempotent(app.clone(), "/api/v1/listings", &token, "key-abc", body).await;
    assert_eq!(second.status(), StatusCode::CREATED);
    let second = body_json(second).await;

    assert_eq!(first, second);
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// Create an active listing through the API and return its id and slug.
async fn create_active(app: axum::Router, title: &str) -> (String, String) {
    let token = auth_token(Uuid::new_v4(), "admin");
    let response = post_json_auth(app, "/api/v1/listings", &token, valid_listing_body(title)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    (
        json["data"]["id"].as_str().unwrap().to_string(),
        json["data"]["slug"].as_str().unwrap().to_string(),
    )
}

#[sqlx::test(migrations = "../db/migrations")]
async fn admins_approve_pending_listings(pool: PgPool) {
    let app = common::build_test_app(pool);
    let seller_token = auth_token(Uuid::new_v4(), "user");
    let admin_token = auth_token(Uuid::new_v4(), "admin");

    let response = post_json_auth(
        app.clone(),
        "/api/v1/listings",
        &seller_token,
        valid_listing_body("Mountain Bike"),
    )
    .await;
    let id = body_json(response).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = post_json_auth(
        app.clone(),
        &format!("/api/v1/listings/{id}/transition"),
        &admin_token,
        serde_json::json!({ "action": "active" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get(app, "/api/v1/listings/mountain-bike").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "active");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn strangers_cannot_probe_listing_ownership(pool: PgPool) {
    let app = common::build_test_app(pool);
    let (id, _) = create_active(app.clone(), "City Bike").await;

    let stranger = auth_token(Uuid::new_v4(), "user");
    let response = post_json_auth(
        app,
        &format!("/api/v1/listings/{id}/transition"),
        &stranger,
        serde_json::json!({ "action": "sold" }),
    )
    .await;

    // Indistinguishable from a listing that does not exist.
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Listing not found");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn unknown_actions_are_bad_requests(pool: PgPool) {
    let app = common::build_test_app(pool);
    let (id, _) = create_active(app.clone(), "City Bike").await;

    let admin = auth_token(Uuid::new_v4(), "admin");
    let response = post_json_auth(
        app,
        &format!("/api/v1/listings/{id}/transition"),
        &admin,
        serde_json::json!({ "action": "vaporize" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn illegal_transitions_conflict(pool: PgPool) {
    let app = common::build_test_app(pool);
    let (id, _) = create_active(app.clone(), "City Bike").await;

    // Relist is only legal from `sold`.
    let admin = auth_token(Uuid::new_v4(), "admin");
    let response = post_json_auth(
        app,
        &format!("/api/v1/listings/{id}/transition"),
        &admin,
        serde_json::json!({ "action": "relist" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

// ---------------------------------------------------------------------------
// Updates and detail
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn owners_update_their_listings(pool: PgPool) {
    let app = common::build_test_app(pool);
    let seller = Uuid::new_v4();
    let token = auth_token(seller, "admin");

    let response = post_json_auth(
        app.clone(),
        "/api/v1/listings",
        &token,
        valid_listing_body("Old Lamp"),
    )
    .await;
    let json = body_json(response).await;
    let id = json["data"]["id"].as_str().unwrap().to_string();
    let slug = json["data"]["slug"].as_str().unwrap().to_string();

    let response = patch_json_auth(
        app.clone(),
        &format!("/api/v1/listings/{id}"),
        &token,
        serde_json::json!({ "title": "Brass Lamp", "price": 45.0 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // The detail cache was invalidated by the update.
    let response = get(app, &format!("/api/v1/listings/{slug}")).await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["title"], "Brass Lamp");
    assert_eq!(json["data"]["price"], 45.0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn empty_updates_are_rejected(pool: PgPool) {
    let app = common::build_test_app(pool);
    let (id, _) = create_active(app.clone(), "City Bike").await;

    let admin = auth_token(Uuid::new_v4(), "admin");
    let response = patch_json_auth(
        app,
        &format!("/api/v1/listings/{id}"),
        &admin,
        serde_json::json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn missing_detail_returns_404(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = get(app, "/api/v1/listings/no-such-slug").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Listing not found");
}
