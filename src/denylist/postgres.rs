//! PostgreSQL denylist backend (`revoked_tokens` table)

use super::{DenylistStore, StoreError};
use async_trait::async_trait;
use sqlx::PgPool;
use std::time::Duration;

pub struct PgDenylist {
    db: PgPool,
}

impl PgDenylist {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DenylistStore for PgDenylist {
    async fn put(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO revoked_tokens (key, expires_at)
            VALUES ($1, NOW() + make_interval(secs => $2))
            ON CONFLICT (key) DO UPDATE SET expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(key)
        .bind(ttl.as_secs_f64())
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM revoked_tokens WHERE key = $1 AND expires_at > NOW()
            )
            "#,
        )
        .bind(key)
        .fetch_one(&self.db)
        .await?;

        Ok(exists)
    }

    async fn purge_expired(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at <= NOW()")
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected())
    }

    async fn close(&self) {
        // 连接池由 main 统一关闭
        tracing::debug!("Postgres denylist released");
    }
}
