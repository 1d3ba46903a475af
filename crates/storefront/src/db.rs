//! `PostgreSQL` connection pool for the session store.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tower_sessions_sqlx_store::PostgresStore;

/// Create a `PostgreSQL` connection pool.
///
/// # Errors
///
/// Returns an error if the database cannot be reached.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Create the session table if it does not exist yet.
///
/// Run via `dropcart migrate`; the server never migrates on startup.
///
/// # Errors
///
/// Returns an error if the migration statements fail.
pub async fn migrate_sessions(pool: &PgPool) -> Result<(), sqlx::Error> {
    PostgresStore::new(pool.clone()).migrate().await
}
