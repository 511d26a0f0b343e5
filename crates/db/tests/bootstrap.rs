use sqlx::PgPool;

/// Full bootstrap test: connect, migrate, verify schema.
#[sqlx::test(migrations = "./migrations")]
async fn test_full_bootstrap(pool: PgPool) {
    medina_db::health_check(&pool).await.unwrap();

    let tables = [
        "marketplace_items",
        "idempotency_records",
        "rate_limit_windows",
        "engagement_events",
        "areas",
    ];

    for table in tables {
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS (
                 SELECT 1 FROM information_schema.tables
                 WHERE table_schema = 'public' AND table_name = $1
             )",
        )
        .bind(table)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert!(exists.0, "{table} should exist after migrations");
    }
}

/// The slug uniqueness constraint carries the `uq_` prefix the error
/// classifier maps to 409.
#[sqlx::test(migrations = "./migrations")]
async fn test_slug_constraint_name(pool: PgPool) {
    let exists: (bool,) = sqlx::query_as(
        "SELECT EXISTS (
             SELECT 1 FROM pg_constraint WHERE conname = 'uq_marketplace_items_slug'
         )",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert!(exists.0);
}

/// Image bounds are enforced at the schema level as well as in validation.
#[sqlx::test(migrations = "./migrations")]
async fn test_image_bounds_check(pool: PgPool) {
    let result = sqlx::query(
        "INSERT INTO marketplace_items
             (id, slug, title, description, price, price_type, category,
              images, location, seller_id, seller_phone)
         VALUES
             (gen_random_uuid(), 'no-images', 'No images', 'Should not insert',
              10, 'fixed', 'misc', '{}', 'Nowhere', gen_random_uuid(), '+1555')",
    )
    .execute(&pool)
    .await;
    assert!(result.is_err(), "zero-image insert should violate the CHECK");
}
