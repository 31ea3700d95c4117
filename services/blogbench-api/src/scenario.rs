//! The blog workload: synthetic users driving the in-process router.
//!
//! Load mode never opens a socket; requests go straight into the router via
//! `tower::ServiceExt::oneshot`. Every simulated user registers, posts a few
//! rounds of probabilistic article traffic, and walks the seed articles
//! favoriting some of them.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use blogbench_core::RandomSource;
use blogbench_load::{ScenarioError, Workload};
use serde::Deserialize;
use serde_json::json;
use tower::ServiceExt;

/// Number of seed users (and articles) created before the ramp starts.
const SEED_COUNT: usize = 10;

/// How many article rounds each simulated user plays.
const ARTICLE_ROUNDS: usize = 5;

/// In-process handle on the blog API.
#[derive(Clone)]
pub struct BlogTarget {
    router: Router,
}

impl BlogTarget {
    pub fn new(router: Router) -> Self {
        Self { router }
    }

    async fn request(
        &self,
        credentials: Option<&Credentials>,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<(StatusCode, String), ScenarioError> {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(credentials) = credentials {
            builder = builder.header(header::AUTHORIZATION, credentials.basic_header());
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .map_err(ScenarioError::failed)?;

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .map_err(ScenarioError::failed)?;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .map_err(ScenarioError::failed)?;

        Ok((status, String::from_utf8_lossy(&bytes).into_owned()))
    }
}

/// One simulated user's login. Scenario users authenticate with their name
/// as the password.
#[derive(Clone)]
pub struct Credentials {
    pub name: String,
}

impl Credentials {
    fn basic_header(&self) -> String {
        format!(
            "Basic {}",
            BASE64.encode(format!("{}:{}", self.name, self.name))
        )
    }
}

/// Blog traffic implementing the load harness's workload contract.
pub struct BlogWorkload {
    random: Arc<dyn RandomSource>,
    think_time: Duration,
}

impl BlogWorkload {
    pub fn new(random: Arc<dyn RandomSource>) -> Self {
        Self {
            random,
            think_time: Duration::from_millis(100),
        }
    }

    /// Shrinks the pause between steps; used by tests to keep runs short.
    pub fn with_think_time(mut self, think_time: Duration) -> Self {
        self.think_time = think_time;
        self
    }

    async fn think(&self) {
        if !self.think_time.is_zero() {
            tokio::time::sleep(self.think_time).await;
        }
    }

    fn fresh_name(&self) -> String {
        self.random.next_id().simple().to_string()
    }

    async fn register(
        &self,
        target: &BlogTarget,
        name: &str,
    ) -> Result<Credentials, ScenarioError> {
        let (status, body) = target
            .request(
                None,
                Method::POST,
                "/user",
                Some(json!({
                    "name": name,
                    "email": format!("{name}@example.com"),
                    "password": name,
                })),
            )
            .await?;
        expect_status("user registration", status, &body)?;
        Ok(Credentials {
            name: name.to_string(),
        })
    }

    async fn post_article(
        &self,
        target: &BlogTarget,
        user: &Credentials,
        round: usize,
    ) -> Result<String, ScenarioError> {
        let (status, body) = target
            .request(
                Some(user),
                Method::POST,
                "/article",
                Some(json!({
                    "title": format!("title_v1 {round} by {}", user.name),
                    "body": format!("body_v1 {round} by {}", user.name),
                })),
            )
            .await?;
        expect_status("article creation", status, &body)?;

        #[derive(Deserialize)]
        struct Created {
            article_id: String,
        }
        let created: Created = serde_json::from_str(&body).map_err(ScenarioError::failed)?;
        Ok(created.article_id)
    }
}

#[async_trait]
impl Workload for BlogWorkload {
    type Target = BlogTarget;
    /// Seed article ids, favorited by every user.
    type Init = Vec<String>;
    type User = Credentials;

    async fn initialize(&self, target: &BlogTarget) -> Result<Vec<String>, ScenarioError> {
        let mut article_ids = Vec::with_capacity(SEED_COUNT);
        for round in 0..SEED_COUNT {
            let name = self.fresh_name();
            let user = self.register(target, &name).await?;
            article_ids.push(self.post_article(target, &user, round).await?);
        }
        Ok(article_ids)
    }

    async fn spawn_user(&self, target: &BlogTarget) -> Result<Credentials, ScenarioError> {
        let name = self.fresh_name();
        self.register(target, &name).await
    }

    async fn run_user_scenario(
        &self,
        target: &BlogTarget,
        seed_articles: &Vec<String>,
        user: &Credentials,
    ) -> Result<(), ScenarioError> {
        for round in 0..ARTICLE_ROUNDS {
            if !self.random.hit(90, 100) {
                continue;
            }
            let article_id = self.post_article(target, user, round).await?;
            self.think().await;

            if self.random.hit(50, 100) {
                let (status, body) = target
                    .request(Some(user), Method::GET, "/articles", None)
                    .await?;
                expect_status("article listing", status, &body)?;
                self.think().await;
            }

            if self.random.hit(50, 100) {
                let (status, body) = target
                    .request(Some(user), Method::GET, &format!("/article/{article_id}"), None)
                    .await?;
                expect_status("article fetch", status, &body)?;
                self.think().await;
            }

            if self.random.hit(20, 100) {
                let (status, body) = target
                    .request(
                        Some(user),
                        Method::PATCH,
                        &format!("/article/{article_id}"),
                        Some(json!({
                            "title": format!("title_v2 {round} by {}", user.name),
                            "body": format!("body_v2 {round} by {}", user.name),
                        })),
                    )
                    .await?;
                expect_status("article update", status, &body)?;
                self.think().await;
            }

            if self.random.hit(1, 100) {
                let (status, body) = target
                    .request(
                        Some(user),
                        Method::DELETE,
                        &format!("/article/{article_id}"),
                        None,
                    )
                    .await?;
                expect_status("article deletion", status, &body)?;
                self.think().await;
            }
        }

        if self.random.hit(30, 100) {
            let (status, body) = target
                .request(Some(user), Method::GET, "/favorite/articles", None)
                .await?;
            expect_status("favorites listing", status, &body)?;
            self.think().await;
        }

        if self.random.hit(50, 100) {
            for article_id in seed_articles {
                let (status, body) = target
                    .request(
                        Some(user),
                        Method::POST,
                        &format!("/favorite/article/{article_id}"),
                        None,
                    )
                    .await?;
                expect_status("favoriting", status, &body)?;
                if self.random.hit(10, 100) {
                    self.think().await;
                }
            }
        }

        Ok(())
    }
}

fn expect_status(step: &str, got: StatusCode, body: &str) -> Result<(), ScenarioError> {
    if got == StatusCode::OK {
        Ok(())
    } else {
        Err(ScenarioError::failed(format!(
            "{step} returned {got}: {body}"
        )))
    }
}
