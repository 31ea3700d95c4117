use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::article::Article;
use crate::error::CoreResult;
use crate::ids::{ArticleId, UserId};
use crate::user::User;

/// Repository interface for registered users.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Persists a newly registered user.
    async fn create(&self, user: &User) -> CoreResult<()>;

    /// Retrieves a user by their login name.
    async fn get_by_name(&self, name: &str) -> CoreResult<Option<User>>;
}

/// Repository interface for articles and favorites.
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// Persists a newly published article.
    async fn create(&self, article: &Article) -> CoreResult<()>;

    /// Retrieves an article by its identifier.
    async fn get(&self, article_id: ArticleId) -> CoreResult<Option<Article>>;

    /// Lists the newest articles, most recent first, capped at `limit`.
    async fn list_latest(&self, limit: u32) -> CoreResult<Vec<Article>>;

    /// Rewrites an article's title and body.
    async fn update_content(
        &self,
        article_id: ArticleId,
        title: &str,
        body: &str,
        updated_at: DateTime<Utc>,
    ) -> CoreResult<()>;

    /// Permanently deletes an article.
    async fn delete(&self, article_id: ArticleId) -> CoreResult<()>;

    /// Records a favorite and bumps the article's favorite count in the same
    /// transaction. Returns `false` when the user had already favorited the
    /// article, in which case nothing changes.
    async fn favorite(
        &self,
        user_id: UserId,
        article_id: ArticleId,
        now: DateTime<Utc>,
    ) -> CoreResult<bool>;

    /// Lists the articles a user has favorited, most recently favorited first.
    async fn list_favorites(&self, user_id: UserId) -> CoreResult<Vec<Article>>;
}
