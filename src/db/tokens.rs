//! Refresh-token tracking keyed by subject.
//!
//! Only refresh tokens are stored; access tokens are stateless and
//! short-lived. The table holds at most one row per IIN, and expiry is
//! enforced by the store itself: reads filter on `expires_at` and the
//! cleanup task sweeps stale rows.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;

use super::{RefreshTokenStore, StoreError};

/// SQLite-backed refresh-token store.
#[derive(Clone)]
pub struct SqliteRefreshStore {
    pool: SqlitePool,
}

impl SqliteRefreshStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshTokenStore for SqliteRefreshStore {
    async fn put(&self, iin: &str, token: &str, ttl: Duration) -> Result<(), StoreError> {
        let expiry_modifier = format!("+{} seconds", ttl.as_secs());
        sqlx::query(
            "INSERT INTO refresh_tokens (iin, token, expires_at)
             VALUES (?, ?, datetime('now', ?))
             ON CONFLICT(iin) DO UPDATE SET
                 token = excluded.token,
                 expires_at = excluded.expires_at",
        )
        .bind(iin)
        .bind(token)
        .bind(&expiry_modifier)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, iin: &str) -> Result<Option<String>, StoreError> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT token FROM refresh_tokens WHERE iin = ? AND expires_at > datetime('now')",
        )
        .bind(iin)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| r.0))
    }

    async fn delete_expired(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at <= datetime('now')")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
