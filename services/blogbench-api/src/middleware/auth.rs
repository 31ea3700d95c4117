//! HTTP Basic authentication against the user store.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use blogbench_core::User;
use blogbench_store::password;
use serde_json::json;
use tracing::{debug, warn};

use crate::state::AppState;

/// The verified caller, stashed in request extensions for handlers.
#[derive(Clone)]
pub struct CurrentUser(pub User);

/// Authenticates every route except `POST /user`, which has to work before
/// any user exists.
pub async fn basic_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if request.method() == Method::POST && request.uri().path() == "/user" {
        return next.run(request).await;
    }

    let Some((name, supplied_password)) = decode_credentials(request.headers()) else {
        return challenge();
    };

    let user = match state.users.get_by_name(&name).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            debug!(name, "basic auth for unknown user");
            return challenge();
        }
        Err(err) => {
            warn!(error = %err, "user lookup failed during authentication");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "authentication unavailable" })),
            )
                .into_response();
        }
    };

    match password::verify_password(&supplied_password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            debug!(name, "basic auth password mismatch");
            return challenge();
        }
        Err(err) => {
            warn!(error = %err, "stored password hash could not be verified");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "authentication unavailable" })),
            )
                .into_response();
        }
    }

    request.extensions_mut().insert(CurrentUser(user));
    next.run(request).await
}

/// Pulls `name:password` out of an `Authorization: Basic` header.
fn decode_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = String::from_utf8(BASE64.decode(encoded).ok()?).ok()?;
    let (name, password) = decoded.split_once(':')?;
    Some((name.to_string(), password.to_string()))
}

fn challenge() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Basic realm=\"blogbench\"")],
        Json(json!({ "error": "unauthorized" })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        middleware,
        routing::{get, post},
        Router,
    };
    use blogbench_core::{SystemClock, ThreadRngSource, UserId, UserRepository};
    use blogbench_store::{
        create_sqlite_pool, run_migrations, SqliteArticleRepository, SqliteUserRepository,
    };
    use chrono::Utc;
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn state_with_user(name: &str, password_plain: &str) -> AppState {
        let pool = create_sqlite_pool("sqlite::memory:", 1).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let users = Arc::new(SqliteUserRepository::new(pool.clone()));
        let user = User::new(
            UserId::new(),
            name,
            format!("{name}@example.com"),
            password::hash_password(password_plain).unwrap(),
            Utc::now(),
        );
        users.create(&user).await.unwrap();

        AppState::new(
            users,
            Arc::new(SqliteArticleRepository::new(pool)),
            Arc::new(ThreadRngSource),
            Arc::new(SystemClock),
        )
    }

    fn app(state: AppState) -> Router {
        Router::new()
            .route("/articles", get(|| async { "ok" }))
            .route("/user", post(|| async { "open" }).get(|| async { "lookup" }))
            .layer(middleware::from_fn_with_state(state, basic_auth))
    }

    fn basic(name: &str, password_plain: &str) -> String {
        format!("Basic {}", BASE64.encode(format!("{name}:{password_plain}")))
    }

    #[tokio::test]
    async fn missing_credentials_get_a_challenge() {
        let app = app(state_with_user("alice", "secret").await);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/articles")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let app = app(state_with_user("alice", "secret").await);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/articles")
                    .header(header::AUTHORIZATION, basic("alice", "wrong"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn valid_credentials_pass_through() {
        let app = app(state_with_user("alice", "secret").await);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/articles")
                    .header(header::AUTHORIZATION, basic("alice", "secret"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn registration_skips_authentication() {
        let app = app(state_with_user("alice", "secret").await);

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/user")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn only_post_on_the_user_path_is_exempt() {
        let app = app(state_with_user("alice", "secret").await);

        let response = app
            .oneshot(Request::builder().uri("/user").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
