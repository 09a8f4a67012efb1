//! Revoked-token denylist
//!
//! Records the `jti` of revoked tokens with a TTL equal to the token's
//! remaining lifetime. Entries disappear on their own once the token would
//! have expired anyway.

pub mod memory;
pub mod postgres;

pub use memory::MemoryDenylist;
pub use postgres::PgDenylist;

use crate::{config::DenylistConfig, error::AppError};
use async_trait::async_trait;
use sqlx::PgPool;
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tokio::task::JoinHandle;

/// Key prefix for revocation entries
pub const KEY_PREFIX: &str = "blacklist:";

/// Denylist key for a token id
pub fn revocation_key(token_id: &str) -> String {
    format!("{}{}", KEY_PREFIX, token_id)
}

/// Denylist backend failure
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Denylist database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Denylist store is closed")]
    Closed,

    #[error("Denylist store error: {0}")]
    Other(String),
}

/// Key-value store with expiring keys
#[async_trait]
pub trait DenylistStore: Send + Sync {
    /// Insert `key`, overwriting any previous entry, expiring after `ttl`
    async fn put(&self, key: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Whether a live (unexpired) entry exists for `key`
    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Drop expired entries, returning how many were removed
    async fn purge_expired(&self) -> Result<u64, StoreError> {
        Ok(0)
    }

    /// Release backend resources
    async fn close(&self) {}
}

/// Token-level view over a [`DenylistStore`].
///
/// Every store failure surfaces as `AppError::StoreUnavailable`, so callers
/// reject the request instead of treating the token as live.
#[derive(Clone)]
pub struct RevocationList {
    store: Arc<dyn DenylistStore>,
}

impl RevocationList {
    pub fn new(store: Arc<dyn DenylistStore>) -> Self {
        Self { store }
    }

    /// Revoke `token_id` for `ttl_secs` seconds. Non-positive TTL is a no-op.
    pub async fn revoke(&self, token_id: &str, ttl_secs: i64) -> Result<(), AppError> {
        if ttl_secs <= 0 {
            tracing::debug!(jti = %token_id, "Token already expired, nothing to revoke");
            return Ok(());
        }

        self.store
            .put(&revocation_key(token_id), Duration::from_secs(ttl_secs as u64))
            .await
            .map_err(|e| {
                tracing::error!(jti = %token_id, "Failed to write revocation entry: {}", e);
                AppError::StoreUnavailable(e.to_string())
            })?;

        tracing::info!(jti = %token_id, ttl_secs, "Token revoked");
        Ok(())
    }

    pub async fn is_revoked(&self, token_id: &str) -> Result<bool, AppError> {
        self.store
            .exists(&revocation_key(token_id))
            .await
            .map_err(|e| {
                tracing::error!(jti = %token_id, "Failed to query denylist: {}", e);
                AppError::StoreUnavailable(e.to_string())
            })
    }
}

/// 按配置打开撤销列表后端
pub fn open_store(config: &DenylistConfig, db: &PgPool) -> Result<Arc<dyn DenylistStore>, AppError> {
    let store: Arc<dyn DenylistStore> = match config.backend.to_lowercase().as_str() {
        "postgres" => Arc::new(PgDenylist::new(db.clone())),
        "memory" => {
            tracing::warn!("In-memory denylist: revocations are lost on restart and not shared between instances");
            Arc::new(MemoryDenylist::new())
        }
        other => {
            return Err(AppError::Config(format!("Unknown denylist backend: {}", other)));
        }
    };

    tracing::info!(backend = %config.backend, "Denylist store opened");
    Ok(store)
}

/// 周期性清理过期条目
pub fn spawn_purge_task(store: Arc<dyn DenylistStore>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match store.purge_expired().await {
                Ok(0) => {}
                Ok(purged) => tracing::debug!(purged, "Expired revocation entries purged"),
                Err(e) => tracing::warn!("Denylist purge failed: {}", e),
            }
        }
    })
}
