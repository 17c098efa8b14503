use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;

use super::{StoreError, User, UserStore};

/// SQLite-backed user store.
#[derive(Clone)]
pub struct SqliteUserStore {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    created_at: String,
    iin: String,
    username: String,
    password_hash: String,
    is_admin: i32,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            created_at: row.created_at,
            iin: row.iin,
            username: row.username,
            password_hash: row.password_hash,
            is_admin: row.is_admin != 0,
        }
    }
}

const USER_COLUMNS: &str = "id, created_at, iin, username, password_hash, is_admin";

impl SqliteUserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn get_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn get_by_iin(&self, iin: &str) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE iin = ?"))
                .bind(iin)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(User::from))
    }

    async fn insert(
        &self,
        iin: &str,
        username: &str,
        password_hash: &str,
    ) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO users (iin, username, password_hash) VALUES (?, ?, ?)")
            .bind(iin)
            .bind(username)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
