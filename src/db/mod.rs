//! Persistence interfaces and the SQLite backend.
//!
//! Both stores are consumed through traits so production and test
//! backends are selected at process wiring time: the relational user
//! store and the keyed refresh-token store with store-enforced expiry.

mod memory;
mod tokens;
mod users;

use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use thiserror::Error;

pub use memory::MemoryRefreshStore;
pub use tokens::SqliteRefreshStore;
pub use users::SqliteUserStore;

/// Bound on waiting for a pooled connection, so a hung backend cannot
/// stall a request indefinitely.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors surfaced by the store traits. `Duplicate` is user-caused;
/// `Backend` is an unexpected infrastructure failure and is rendered to
/// clients as an opaque internal error.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record already exists")]
    Duplicate,
    #[error("store backend failure: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Duplicate,
            _ => StoreError::Backend(e.to_string()),
        }
    }
}

/// A stored user record.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub created_at: String,
    pub iin: String,
    pub username: String,
    pub password_hash: String,
    pub is_admin: bool,
}

/// Lookup and registration of user credentials.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    async fn get_by_iin(&self, iin: &str) -> Result<Option<User>, StoreError>;
    async fn insert(
        &self,
        iin: &str,
        username: &str,
        password_hash: &str,
    ) -> Result<(), StoreError>;
}

/// The currently-valid refresh token per subject. One record per IIN;
/// `put` overwrites, and the store itself enforces the TTL, so a `get`
/// after expiry reports the record as absent.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    async fn put(&self, iin: &str, token: &str, ttl: Duration) -> Result<(), StoreError>;
    async fn get(&self, iin: &str) -> Result<Option<String>, StoreError>;
    /// Purge records past their expiry. Returns the number removed.
    async fn delete_expired(&self) -> Result<u64, StoreError>;
}

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open or create a database at the given path.
    /// Use ":memory:" for an in-memory database.
    pub async fn open(path: &str) -> Result<Self, sqlx::Error> {
        let url = if path == ":memory:" {
            "sqlite::memory:".to_string()
        } else {
            format!("sqlite:{}?mode=rwc", path)
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(&url)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Get the current schema version.
    async fn get_version(&self) -> Result<i32, sqlx::Error> {
        let result: Option<(i32,)> = sqlx::query_as("SELECT version FROM schema_version LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;
        Ok(result.map(|r| r.0).unwrap_or(0))
    }

    /// Run database migrations.
    async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::query("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)")
            .execute(&self.pool)
            .await?;

        let version = self.get_version().await?;

        if version < 1 {
            self.migrate_v1().await?;
        }

        Ok(())
    }

    /// Execute a list of queries in a transaction, then set the version.
    async fn run_migration(
        &self,
        version: i32,
        queries: &[&'static str],
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        for query in queries {
            sqlx::query(*query).execute(&mut *tx).await?;
        }
        sqlx::query("DELETE FROM schema_version")
            .execute(&mut *tx)
            .await?;
        sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
            .bind(version)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn migrate_v1(&self) -> Result<(), sqlx::Error> {
        self.run_migration(
            1,
            &[
                // Users table
                "CREATE TABLE users (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    iin TEXT UNIQUE NOT NULL,
                    username TEXT UNIQUE NOT NULL COLLATE NOCASE,
                    password_hash TEXT NOT NULL,
                    is_admin INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL DEFAULT (datetime('now'))
                )",
                "CREATE INDEX idx_users_iin ON users(iin)",
                "CREATE INDEX idx_users_username ON users(username)",
                // One refresh token per subject; expiry enforced on read
                // and swept by the cleanup task.
                "CREATE TABLE refresh_tokens (
                    iin TEXT PRIMARY KEY,
                    token TEXT NOT NULL,
                    expires_at TEXT NOT NULL
                )",
                "CREATE INDEX idx_refresh_tokens_expires_at ON refresh_tokens(expires_at)",
            ],
        )
        .await
    }

    /// Get the user store.
    pub fn users(&self) -> SqliteUserStore {
        SqliteUserStore::new(self.pool.clone())
    }

    /// Get the refresh-token store.
    pub fn refresh_tokens(&self) -> SqliteRefreshStore {
        SqliteRefreshStore::new(self.pool.clone())
    }

    /// Get the underlying connection pool (for tests that need raw SQL access).
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
