//! Article domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ArticleId, UserId};

/// Published article.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub article_id: ArticleId,
    pub title: String,
    pub body: String,
    pub author_id: UserId,
    /// Running total of favorites, bumped whenever a user favorites this article.
    pub favorite_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Article {
    /// Creates a new article with a zero favorite count.
    #[must_use]
    pub fn new(
        article_id: ArticleId,
        title: impl Into<String>,
        body: impl Into<String>,
        author_id: UserId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            article_id,
            title: title.into(),
            body: body.into(),
            author_id,
            favorite_count: 0,
            created_at: now,
            updated_at: now,
        }
    }
}
