use std::str::FromStr;

use async_trait::async_trait;
use blogbench_core::{
    Article, ArticleId, ArticleRepository, CoreError, CoreResult, RetryConfig, UserId,
};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{query, Row, SqlitePool};

use crate::row::{format_timestamp, map_sqlx_error, parse_timestamp};

/// SQLite-backed repository for articles and per-user favorites.
///
/// Writes that race on the single SQLite writer lock surface as "database is
/// locked" errors; those are retried with the configured backoff.
pub struct SqliteArticleRepository {
    pool: SqlitePool,
    busy_retry: RetryConfig,
}

impl SqliteArticleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            busy_retry: RetryConfig::default(),
        }
    }

    pub fn with_busy_retry(mut self, busy_retry: RetryConfig) -> Self {
        self.busy_retry = busy_retry;
        self
    }

    fn map_row(row: &SqliteRow) -> CoreResult<Article> {
        let raw_article_id: String = row.get("article_id");
        let article_id = ArticleId::from_str(&raw_article_id)
            .map_err(|err| CoreError::internal(format!("invalid article_id: {err}")))?;
        let raw_author_id: String = row.get("author_id");
        let author_id = UserId::from_str(&raw_author_id)
            .map_err(|err| CoreError::internal(format!("invalid author_id: {err}")))?;
        let created_at: String = row.get("created_at");
        let updated_at: String = row.get("updated_at");
        Ok(Article {
            article_id,
            title: row.get("title"),
            body: row.get("body"),
            author_id,
            favorite_count: row.get("favorite_count"),
            created_at: parse_timestamp(&created_at, "created_at")?,
            updated_at: parse_timestamp(&updated_at, "updated_at")?,
        })
    }

    fn is_busy(err: &CoreError) -> bool {
        matches!(err, CoreError::StorageError(message) if message.contains("locked"))
    }

    /// Records the favorite and bumps the denormalized counter in one
    /// transaction. Returns false when the pair already existed, in which
    /// case the counter is left untouched.
    async fn favorite_once(
        &self,
        user_id: UserId,
        article_id: ArticleId,
        now: DateTime<Utc>,
    ) -> CoreResult<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|err| CoreError::storage(err.to_string()))?;

        let inserted = query(
            r#"
            INSERT OR IGNORE INTO favorites (user_id, article_id, created_at)
            VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(user_id.to_string())
        .bind(article_id.to_string())
        .bind(format_timestamp(now))
        .execute(&mut *tx)
        .await
        .map_err(|err| map_sqlx_error("favorite", article_id.to_string(), err))?
        .rows_affected()
            == 1;

        if inserted {
            let updated = query(
                r#"
                UPDATE articles
                SET favorite_count = favorite_count + 1, updated_at = ?2
                WHERE article_id = ?1
                "#,
            )
            .bind(article_id.to_string())
            .bind(format_timestamp(now))
            .execute(&mut *tx)
            .await
            .map_err(|err| CoreError::storage(err.to_string()))?;
            if updated.rows_affected() == 0 {
                return Err(CoreError::not_found("article", article_id.to_string()));
            }
        }

        tx.commit()
            .await
            .map_err(|err| CoreError::storage(err.to_string()))?;
        Ok(inserted)
    }
}

#[async_trait]
impl ArticleRepository for SqliteArticleRepository {
    async fn create(&self, article: &Article) -> CoreResult<()> {
        query(
            r#"
            INSERT INTO articles
                (article_id, title, body, author_id, favorite_count, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(article.article_id.to_string())
        .bind(&article.title)
        .bind(&article.body)
        .bind(article.author_id.to_string())
        .bind(article.favorite_count)
        .bind(format_timestamp(article.created_at))
        .bind(format_timestamp(article.updated_at))
        .execute(&self.pool)
        .await
        .map(|_| ())
        .map_err(|err| map_sqlx_error("article", article.article_id.to_string(), err))
    }

    async fn get(&self, article_id: ArticleId) -> CoreResult<Option<Article>> {
        let row = query(
            r#"
            SELECT article_id, title, body, author_id, favorite_count, created_at, updated_at
            FROM articles
            WHERE article_id = ?1
            "#,
        )
        .bind(article_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| CoreError::storage(err.to_string()))?;

        match row {
            Some(row) => Ok(Some(Self::map_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_latest(&self, limit: u32) -> CoreResult<Vec<Article>> {
        let rows = query(
            r#"
            SELECT article_id, title, body, author_id, favorite_count, created_at, updated_at
            FROM articles
            ORDER BY created_at DESC, article_id DESC
            LIMIT ?1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|err| CoreError::storage(err.to_string()))?;

        rows.iter().map(Self::map_row).collect()
    }

    async fn update_content(
        &self,
        article_id: ArticleId,
        title: &str,
        body: &str,
        updated_at: DateTime<Utc>,
    ) -> CoreResult<()> {
        let result = query(
            r#"
            UPDATE articles
            SET title = ?2, body = ?3, updated_at = ?4
            WHERE article_id = ?1
            "#,
        )
        .bind(article_id.to_string())
        .bind(title)
        .bind(body)
        .bind(format_timestamp(updated_at))
        .execute(&self.pool)
        .await
        .map_err(|err| CoreError::storage(err.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(CoreError::not_found("article", article_id.to_string()));
        }
        Ok(())
    }

    async fn delete(&self, article_id: ArticleId) -> CoreResult<()> {
        let result = query("DELETE FROM articles WHERE article_id = ?1")
            .bind(article_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|err| CoreError::storage(err.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(CoreError::not_found("article", article_id.to_string()));
        }
        Ok(())
    }

    async fn favorite(
        &self,
        user_id: UserId,
        article_id: ArticleId,
        now: DateTime<Utc>,
    ) -> CoreResult<bool> {
        let mut attempt = 0;
        loop {
            match self.favorite_once(user_id, article_id, now).await {
                Err(err) if Self::is_busy(&err) && attempt < self.busy_retry.max_attempts => {
                    let backoff = self.busy_retry.backoff_for_attempt(attempt);
                    tracing::debug!(
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        "database busy, retrying favorite"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn list_favorites(&self, user_id: UserId) -> CoreResult<Vec<Article>> {
        let rows = query(
            r#"
            SELECT a.article_id, a.title, a.body, a.author_id, a.favorite_count,
                   a.created_at, a.updated_at
            FROM articles a
            JOIN favorites f ON f.article_id = a.article_id
            WHERE f.user_id = ?1
            ORDER BY f.created_at DESC, a.article_id DESC
            "#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|err| CoreError::storage(err.to_string()))?;

        rows.iter().map(Self::map_row).collect()
    }
}
