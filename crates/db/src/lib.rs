//! PostgreSQL implementations of the marketplace collaborator contracts.
//!
//! The persistence engine itself is out of scope; everything here is an
//! adapter from the `medina-core` contracts onto `sqlx` queries. Schema
//! lives in `migrations/`.

pub mod models;
pub mod repositories;

use medina_core::CoreError;

/// Convenience alias used across the workspace.
pub type DbPool = sqlx::PgPool;

/// Create a connection pool for the given database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}

/// Verify connectivity with a trivial round trip.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply pending migrations from the embedded `migrations/` directory.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Map a sqlx failure into the domain taxonomy.
///
/// Store unavailability is a `Dependency` error so the creation guard can
/// fail closed; `RowNotFound` keeps its not-found meaning.
pub(crate) fn map_db_err(err: sqlx::Error) -> CoreError {
    match err {
        sqlx::Error::RowNotFound => CoreError::NotFound { entity: "Listing" },
        other => {
            tracing::error!(error = %other, "Database error");
            CoreError::Dependency(other.to_string())
        }
    }
}
