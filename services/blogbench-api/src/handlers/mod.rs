//! Request handlers for the blog API, with their DTOs beside them.

mod articles;
mod favorites;
mod users;

pub use articles::{create_article, delete_article, get_article, list_articles, update_article};
pub use favorites::{favorite_article, list_favorite_articles};
pub use users::register_user;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use blogbench_core::CoreError;
use serde::Serialize;
use tracing::error;

/// Error body returned for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Maps domain errors onto HTTP statuses.
#[derive(Debug)]
pub struct ApiError(CoreError);

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            CoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            CoreError::AlreadyExists { .. } => StatusCode::CONFLICT,
            CoreError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            CoreError::Forbidden { .. } => StatusCode::FORBIDDEN,
            CoreError::ValidationError(_) => StatusCode::BAD_REQUEST,
            CoreError::Internal { .. } | CoreError::StorageError(_) => {
                error!(error = %self.0, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}
