//! Router assembly for the blog API.

use crate::{
    handlers::{
        create_article, delete_article, favorite_article, get_article, list_articles,
        list_favorite_articles, register_user, update_article,
    },
    middleware::basic_auth,
    state::AppState,
};
use axum::{
    extract::Request,
    middleware,
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::info_span;
use uuid::Uuid;

/// Builds the Axum router serving the blog surface.
///
/// Every route except `POST /user` sits behind Basic authentication; the
/// trace layer gives each request a span carrying a fresh request id.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/user", post(register_user))
        .route("/articles", get(list_articles))
        .route("/article", post(create_article))
        .route(
            "/article/:article_id",
            get(get_article).patch(update_article).delete(delete_article),
        )
        .route("/favorite/articles", get(list_favorite_articles))
        .route("/favorite/article/:article_id", post(favorite_article))
        .layer(middleware::from_fn_with_state(state.clone(), basic_auth))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request| {
                    let request_id = Uuid::new_v4();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = %request.method(),
                        uri = %request.uri(),
                    )
                })
                .on_response(
                    |response: &Response, latency: std::time::Duration, _span: &tracing::Span| {
                        let status = response.status();
                        let latency_ms = latency.as_millis();

                        if status.is_server_error() {
                            tracing::error!(status = %status, latency_ms, "request failed");
                        } else if status.is_client_error() {
                            tracing::debug!(status = %status, latency_ms, "request rejected");
                        } else {
                            tracing::debug!(status = %status, latency_ms, "request completed");
                        }
                    },
                ),
        )
}
