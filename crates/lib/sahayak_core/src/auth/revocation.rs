//! Revocation ledger: tokens invalidated before their natural expiry.
//!
//! Keyed by the exact token string. An entry's `expires_at` is only used for
//! housekeeping; once it has passed the token would be rejected as expired
//! anyway, so the entry may be purged.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use sqlx::PgPool;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::StoreError;

/// Insert/lookup access to revoked tokens.
#[async_trait]
pub trait RevocationLedger: Send + Sync {
    /// Record a revoked token. Inserting an existing token is a no-op.
    async fn insert(&self, token: &str, expires_at: DateTime<Utc>) -> Result<(), StoreError>;

    /// Whether the exact token string has been revoked.
    async fn contains(&self, token: &str) -> Result<bool, StoreError>;

    /// Drop entries whose expiry is at or before `now`. Returns how many.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}

/// Revocation ledger held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryRevocationLedger {
    entries: DashMap<String, DateTime<Utc>>,
}

impl InMemoryRevocationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl RevocationLedger for InMemoryRevocationLedger {
    async fn insert(&self, token: &str, expires_at: DateTime<Utc>) -> Result<(), StoreError> {
        self.entries
            .entry(token.to_string())
            .or_insert(expires_at);
        Ok(())
    }

    async fn contains(&self, token: &str) -> Result<bool, StoreError> {
        Ok(self.entries.contains_key(token))
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let before = self.entries.len();
        self.entries.retain(|_, expires_at| *expires_at > now);
        Ok(before.saturating_sub(self.entries.len()) as u64)
    }
}

/// Revocation ledger backed by the `revoked_tokens` table.
#[derive(Debug, Clone)]
pub struct PgRevocationLedger {
    pool: PgPool,
}

impl PgRevocationLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RevocationLedger for PgRevocationLedger {
    async fn insert(&self, token: &str, expires_at: DateTime<Utc>) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO revoked_tokens (token, expires_at) VALUES ($1, $2) \
             ON CONFLICT (token) DO NOTHING",
        )
        .bind(token)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn contains(&self, token: &str) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM revoked_tokens WHERE token = $1)",
        )
        .bind(token)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

/// Periodically purge expired ledger entries until `cancel` fires.
///
/// Failures are logged and retried on the next tick.
pub fn spawn_purge_task(
    ledger: Arc<dyn RevocationLedger>,
    every: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("revocation purge task stopped");
                    break;
                }
                _ = ticker.tick() => {
                    match ledger.purge_expired(Utc::now()).await {
                        Ok(0) => {}
                        Ok(purged) => info!(purged, "purged expired revocation entries"),
                        Err(e) => warn!(error = %e, "revocation purge failed"),
                    }
                }
            }
        }
    })
}
