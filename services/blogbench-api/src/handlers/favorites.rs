//! Favorites: marking articles and listing a user's marks.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use blogbench_core::ArticleId;
use tracing::debug;

use crate::handlers::articles::{fetch_article, ArticleListItem, ArticleListResponse};
use crate::handlers::ApiError;
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// `POST /favorite/article/:article_id`
///
/// Records the favorite and bumps the article's counter in one transaction.
/// Favoriting the same article again is a no-op that still returns 200.
pub async fn favorite_article(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(article_id): Path<ArticleId>,
) -> Result<StatusCode, ApiError> {
    // Missing articles are a 404, not a constraint violation.
    fetch_article(&state, article_id).await?;

    let inserted = state
        .articles
        .favorite(user.user_id, article_id, state.clock.now())
        .await?;

    debug!(
        article_id = %article_id,
        user_id = %user.user_id,
        inserted,
        "favorite recorded"
    );
    Ok(StatusCode::OK)
}

/// `GET /favorite/articles`
pub async fn list_favorite_articles(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<ArticleListResponse>, ApiError> {
    let articles = state.articles.list_favorites(user.user_id).await?;
    Ok(Json(ArticleListResponse {
        list: articles
            .into_iter()
            .map(|article| ArticleListItem {
                article_id: article.article_id,
                title: article.title,
            })
            .collect(),
    }))
}
