use std::str::FromStr;

use async_trait::async_trait;
use blogbench_core::{CoreError, CoreResult, User, UserId, UserRepository};
use sqlx::sqlite::SqliteRow;
use sqlx::{query, Row, SqlitePool};

use crate::row::{format_timestamp, map_sqlx_error, parse_timestamp};

/// SQLite-backed repository for registered users.
pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn map_row(row: &SqliteRow) -> CoreResult<User> {
        let raw_id: String = row.get("user_id");
        let user_id = UserId::from_str(&raw_id)
            .map_err(|err| CoreError::internal(format!("invalid user_id: {err}")))?;
        let created_at: String = row.get("created_at");
        let updated_at: String = row.get("updated_at");
        Ok(User {
            user_id,
            name: row.get("name"),
            email: row.get("email"),
            password_hash: row.get("password_hash"),
            created_at: parse_timestamp(&created_at, "created_at")?,
            updated_at: parse_timestamp(&updated_at, "updated_at")?,
        })
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create(&self, user: &User) -> CoreResult<()> {
        query(
            r#"
            INSERT INTO users (user_id, name, email, password_hash, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(user.user_id.to_string())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(format_timestamp(user.created_at))
        .bind(format_timestamp(user.updated_at))
        .execute(&self.pool)
        .await
        .map(|_| ())
        .map_err(|err| map_sqlx_error("user", user.name.clone(), err))
    }

    async fn get_by_name(&self, name: &str) -> CoreResult<Option<User>> {
        let row = query(
            r#"
            SELECT user_id, name, email, password_hash, created_at, updated_at
            FROM users
            WHERE name = ?1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| CoreError::storage(err.to_string()))?;

        match row {
            Some(row) => Ok(Some(Self::map_row(&row)?)),
            None => Ok(None),
        }
    }
}
