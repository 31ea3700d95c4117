//! Blog API service with an embedded load harness.
//!
//! One binary, two modes: `server` serves the blog API over HTTP; `load`
//! (the default) builds the same router in-process and drives it with
//! synthetic users through `blogbench-load`.

pub mod handlers;
pub mod middleware;
pub mod rest;
pub mod scenario;
pub mod state;
pub mod telemetry;

pub use rest::build_router;
pub use state::AppState;

use std::net::SocketAddr;
use std::sync::Arc;

use blogbench_core::{AppConfig, CoreError, CoreResult, SystemClock, ThreadRngSource};
use blogbench_load::{LoadError, LoadRunner, RunConfig, RunReport, ShutdownController};
use blogbench_store::{
    create_sqlite_pool, run_migrations, SqliteArticleRepository, SqliteUserRepository,
};
use scenario::{BlogTarget, BlogWorkload};
use tokio::net::TcpListener;
use tracing::info;

/// Opens the database, applies migrations, and assembles the handler state.
async fn build_state(config: &AppConfig) -> CoreResult<AppState> {
    let pool = create_sqlite_pool(&config.database.url, config.database.max_connections)
        .await
        .map_err(|err| CoreError::storage(format!("failed to open database: {err}")))?;
    run_migrations(&pool)
        .await
        .map_err(|err| CoreError::storage(format!("migrations failed: {err}")))?;

    let articles = SqliteArticleRepository::new(pool.clone())
        .with_busy_retry(config.database.busy_retry.clone());

    Ok(AppState::new(
        Arc::new(SqliteUserRepository::new(pool)),
        Arc::new(articles),
        Arc::new(ThreadRngSource),
        Arc::new(SystemClock),
    ))
}

/// Serves the blog API over HTTP until interrupted.
pub async fn run_server(config: &AppConfig) -> CoreResult<()> {
    let state = build_state(config).await?;
    let app = rest::build_router(state);

    let addr: SocketAddr = config.server.bind_address.parse().map_err(|err| {
        CoreError::validation(format!(
            "invalid bind address '{}': {err}",
            config.server.bind_address
        ))
    })?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|err| CoreError::internal(format!("failed to bind to {addr}: {err}")))?;

    info!(%addr, "serving blog API");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| CoreError::internal(format!("server error: {err}")))?;

    info!("server shutdown complete");
    Ok(())
}

/// Drives the embedded blog API with synthetic traffic and returns the run's
/// counters. SIGINT/SIGTERM stop new spawns and drain in-flight users.
pub async fn run_load_test(config: &AppConfig) -> CoreResult<RunReport> {
    let state = build_state(config).await?;
    let random = Arc::clone(&state.random);
    let target = BlogTarget::new(rest::build_router(state));
    let workload = BlogWorkload::new(random);

    let run_config = RunConfig {
        duration: config.load.duration(),
        max_concurrent_users: config.load.max_concurrent_users,
        spawn_rate_per_second: f64::from(config.load.spawn_rate_per_second),
    };

    let interrupt = ShutdownController::new();
    let signal = interrupt.signal();
    tokio::spawn(async move {
        shutdown_signal().await;
        interrupt.shutdown();
    });

    LoadRunner::new(run_config, workload, target)
        .with_shutdown_signal(signal)
        .run()
        .await
        .map_err(|err| match err {
            LoadError::InvalidConfig(message) => CoreError::validation(message),
            LoadError::Init(source) => {
                CoreError::internal(format!("workload initialization failed: {source}"))
            }
        })
}

/// Resolves on SIGINT or, on unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C signal handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("received CTRL+C, shutting down");
        }
        _ = terminate => {
            info!("received SIGTERM, shutting down");
        }
    }
}
