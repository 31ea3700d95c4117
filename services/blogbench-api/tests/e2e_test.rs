//! Full-surface router tests with pinned ids and timestamps, plus a short
//! real load run against the in-process target.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use blogbench_api::scenario::{BlogTarget, BlogWorkload};
use blogbench_api::{build_router, AppState};
use blogbench_core::{Clock, RandomSource, SystemClock, ThreadRngSource};
use blogbench_load::{ErrorSink, LoadRunner, RunConfig, ScenarioError};
use blogbench_store::{
    create_sqlite_pool, run_migrations, SqliteArticleRepository, SqliteUserRepository,
};

struct FixedClock(DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Hands out ids 1, 2, 3, ... as UUIDs so response bodies are predictable.
#[derive(Default)]
struct SequenceRandom {
    counter: AtomicU64,
}

impl RandomSource for SequenceRandom {
    fn hit(&self, rate: u32, out_of: u32) -> bool {
        rate >= out_of
    }

    fn next_id(&self) -> Uuid {
        let next = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        Uuid::from_u128(u128::from(next))
    }
}

fn pinned_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

async fn pinned_app() -> Router {
    let pool = create_sqlite_pool("sqlite::memory:", 1).await.unwrap();
    run_migrations(&pool).await.unwrap();
    build_router(AppState::new(
        Arc::new(SqliteUserRepository::new(pool.clone())),
        Arc::new(SqliteArticleRepository::new(pool)),
        Arc::new(SequenceRandom::default()),
        Arc::new(FixedClock(pinned_time())),
    ))
}

fn basic(name: &str) -> String {
    // Scenario convention: the password equals the name.
    format!("Basic {}", BASE64.encode(format!("{name}:{name}")))
}

async fn send(
    app: &Router,
    user: Option<&str>,
    method: Method,
    path: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(name) = user {
        builder = builder.header(header::AUTHORIZATION, basic(name));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn register(app: &Router, name: &str) {
    let (status, _) = send(
        app,
        None,
        Method::POST,
        "/user",
        Some(json!({
            "name": name,
            "email": format!("{name}@example.com"),
            "password": name,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

async fn create_article(app: &Router, name: &str, title: &str) -> String {
    let (status, body) = send(
        app,
        Some(name),
        Method::POST,
        "/article",
        Some(json!({ "title": title, "body": format!("{title} body") })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["article_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn registration_and_duplicate_names() {
    let app = pinned_app().await;

    register(&app, "alice").await;

    let (status, body) = send(
        &app,
        None,
        Method::POST,
        "/user",
        Some(json!({
            "name": "alice",
            "email": "alice2@example.com",
            "password": "alice",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("alice"));
}

#[tokio::test]
async fn routes_require_authentication() {
    let app = pinned_app().await;
    register(&app, "alice").await;

    let (status, _) = send(&app, None, Method::GET, "/articles", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Some("mallory"), Method::GET, "/articles", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Some("alice"), Method::GET, "/articles", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn article_ids_and_timestamps_are_pinned() {
    let app = pinned_app().await;
    register(&app, "alice").await; // consumes id 1

    let article_id = create_article(&app, "alice", "first post").await;
    assert_eq!(article_id, "00000000-0000-0000-0000-000000000002");

    let (status, body) = send(
        &app,
        Some("alice"),
        Method::GET,
        &format!("/article/{article_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "first post");
    assert_eq!(body["favorite_count"], 0);
    let created_at: DateTime<Utc> = body["created_at"].as_str().unwrap().parse().unwrap();
    assert_eq!(created_at, pinned_time());
}

#[tokio::test]
async fn listing_returns_published_articles() {
    let app = pinned_app().await;
    register(&app, "alice").await;
    let article_id = create_article(&app, "alice", "listed").await;

    let (status, body) = send(&app, Some("alice"), Method::GET, "/articles", None).await;
    assert_eq!(status, StatusCode::OK);
    let list = body["list"].as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["article_id"], article_id.as_str());
    assert_eq!(list[0]["title"], "listed");
}

#[tokio::test]
async fn only_the_author_may_update_or_delete() {
    let app = pinned_app().await;
    register(&app, "alice").await;
    register(&app, "bob").await;
    let article_id = create_article(&app, "alice", "alice's").await;

    let patch = json!({ "title": "rewritten", "body": "rewritten body" });

    let (status, _) = send(
        &app,
        Some("bob"),
        Method::PATCH,
        &format!("/article/{article_id}"),
        Some(patch.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        Some("bob"),
        Method::DELETE,
        &format!("/article/{article_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        Some("alice"),
        Method::PATCH,
        &format!("/article/{article_id}"),
        Some(patch),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(
        &app,
        Some("alice"),
        Method::GET,
        &format!("/article/{article_id}"),
        None,
    )
    .await;
    assert_eq!(body["title"], "rewritten");

    let (status, _) = send(
        &app,
        Some("alice"),
        Method::DELETE,
        &format!("/article/{article_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        Some("alice"),
        Method::GET,
        &format!("/article/{article_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_articles_are_not_found() {
    let app = pinned_app().await;
    register(&app, "alice").await;
    let missing = Uuid::from_u128(0xdead);

    for (method, body) in [
        (Method::GET, None),
        (
            Method::PATCH,
            Some(json!({ "title": "x", "body": "y" })),
        ),
        (Method::DELETE, None),
    ] {
        let (status, _) = send(
            &app,
            Some("alice"),
            method,
            &format!("/article/{missing}"),
            body,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    let (status, _) = send(
        &app,
        Some("alice"),
        Method::POST,
        &format!("/favorite/article/{missing}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn favoriting_bumps_the_count_once_per_user() {
    let app = pinned_app().await;
    register(&app, "alice").await;
    register(&app, "bob").await;
    let article_id = create_article(&app, "alice", "popular").await;

    for _ in 0..2 {
        let (status, _) = send(
            &app,
            Some("bob"),
            Method::POST,
            &format!("/favorite/article/{article_id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, body) = send(
        &app,
        Some("bob"),
        Method::GET,
        &format!("/article/{article_id}"),
        None,
    )
    .await;
    assert_eq!(body["favorite_count"], 1, "repeat favorites must not bump");

    let (status, body) = send(&app, Some("bob"), Method::GET, "/favorite/articles", None).await;
    assert_eq!(status, StatusCode::OK);
    let list = body["list"].as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["article_id"], article_id.as_str());

    // Alice never favorited anything.
    let (_, body) = send(&app, Some("alice"), Method::GET, "/favorite/articles", None).await;
    assert!(body["list"].as_array().unwrap().is_empty());
}

#[derive(Default)]
struct CollectingSink {
    reports: Mutex<Vec<String>>,
}

impl ErrorSink for CollectingSink {
    fn report(&self, _user: u64, error: &ScenarioError) {
        self.reports.lock().push(error.to_string());
    }
}

#[tokio::test]
async fn short_load_run_leaves_a_clean_report() {
    let pool = create_sqlite_pool("sqlite::memory:", 1).await.unwrap();
    run_migrations(&pool).await.unwrap();
    let state = AppState::new(
        Arc::new(SqliteUserRepository::new(pool.clone())),
        Arc::new(SqliteArticleRepository::new(pool)),
        Arc::new(ThreadRngSource),
        Arc::new(SystemClock),
    );

    let target = BlogTarget::new(build_router(state));
    let workload =
        BlogWorkload::new(Arc::new(ThreadRngSource)).with_think_time(Duration::from_millis(1));
    let sink = Arc::new(CollectingSink::default());

    let report = LoadRunner::new(
        RunConfig {
            duration: Duration::from_secs(1),
            max_concurrent_users: 5,
            spawn_rate_per_second: 20.0,
        },
        workload,
        target,
    )
    .with_error_sink(sink.clone())
    .run()
    .await
    .expect("load run should complete");

    assert!(report.spawned > 0, "at least one user must have run");
    assert_eq!(report.completed(), report.spawned);
    assert_eq!(report.failed, 0, "scenario steps must all succeed");
    assert!(
        sink.reports.lock().is_empty(),
        "error sink must stay empty: {:?}",
        sink.reports.lock()
    );
}
