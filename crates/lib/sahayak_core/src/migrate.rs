//! Database migration support.
//!
//! Embeds and runs the SQL migrations in `sahayak_core/migrations/`, which
//! create the `users` and `revoked_tokens` tables.

use sqlx::PgPool;

/// Run all embedded database migrations against the given pool.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
