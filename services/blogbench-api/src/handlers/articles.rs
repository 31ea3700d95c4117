//! Article CRUD.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use blogbench_core::{Article, ArticleId, CoreError, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::handlers::ApiError;
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// The listing always returns the newest articles, capped here.
const LATEST_ARTICLES_LIMIT: u32 = 100;

#[derive(Debug, Deserialize)]
pub struct CreateArticleRequest {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct CreateArticleResponse {
    pub article_id: ArticleId,
}

#[derive(Debug, Serialize)]
pub struct ArticleListItem {
    pub article_id: ArticleId,
    pub title: String,
}

#[derive(Debug, Serialize)]
pub struct ArticleListResponse {
    pub list: Vec<ArticleListItem>,
}

#[derive(Debug, Serialize)]
pub struct ArticleResponse {
    pub article_id: ArticleId,
    pub title: String,
    pub body: String,
    pub author_id: UserId,
    pub favorite_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Article> for ArticleResponse {
    fn from(article: Article) -> Self {
        Self {
            article_id: article.article_id,
            title: article.title,
            body: article.body,
            author_id: article.author_id,
            favorite_count: article.favorite_count,
            created_at: article.created_at,
            updated_at: article.updated_at,
        }
    }
}

/// Absent or empty fields keep the stored value.
#[derive(Debug, Deserialize)]
pub struct UpdateArticleRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

/// `POST /article`
pub async fn create_article(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<CreateArticleRequest>,
) -> Result<Json<CreateArticleResponse>, ApiError> {
    let article = Article::new(
        ArticleId::from(state.random.next_id()),
        req.title,
        req.body,
        user.user_id,
        state.clock.now(),
    );

    state.articles.create(&article).await?;

    debug!(article_id = %article.article_id, author = %user.name, "article created");
    Ok(Json(CreateArticleResponse {
        article_id: article.article_id,
    }))
}

/// `GET /articles`
pub async fn list_articles(
    State(state): State<AppState>,
) -> Result<Json<ArticleListResponse>, ApiError> {
    let articles = state.articles.list_latest(LATEST_ARTICLES_LIMIT).await?;
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

/// `GET /article/:article_id`
pub async fn get_article(
    State(state): State<AppState>,
    Path(article_id): Path<ArticleId>,
) -> Result<Json<ArticleResponse>, ApiError> {
    let article = fetch_article(&state, article_id).await?;
    Ok(Json(article.into()))
}

/// `PATCH /article/:article_id` — author only.
pub async fn update_article(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(article_id): Path<ArticleId>,
    Json(req): Json<UpdateArticleRequest>,
) -> Result<StatusCode, ApiError> {
    let article = fetch_article(&state, article_id).await?;
    ensure_author(&article, user.user_id)?;

    let title = req
        .title
        .filter(|title| !title.is_empty())
        .unwrap_or(article.title);
    let body = req
        .body
        .filter(|body| !body.is_empty())
        .unwrap_or(article.body);

    state
        .articles
        .update_content(article_id, &title, &body, state.clock.now())
        .await?;

    Ok(StatusCode::OK)
}

/// `DELETE /article/:article_id` — author only.
pub async fn delete_article(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(article_id): Path<ArticleId>,
) -> Result<StatusCode, ApiError> {
    let article = fetch_article(&state, article_id).await?;
    ensure_author(&article, user.user_id)?;

    state.articles.delete(article_id).await?;
    Ok(StatusCode::OK)
}

pub(crate) async fn fetch_article(
    state: &AppState,
    article_id: ArticleId,
) -> Result<Article, ApiError> {
    state
        .articles
        .get(article_id)
        .await?
        .ok_or_else(|| CoreError::not_found("article", article_id.to_string()).into())
}

fn ensure_author(article: &Article, user_id: UserId) -> Result<(), ApiError> {
    if article.author_id != user_id {
        return Err(CoreError::forbidden("only the author may modify this article").into());
    }
    Ok(())
}
