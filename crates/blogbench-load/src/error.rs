//! Error types for load runs and user scenarios.

use thiserror::Error;

/// Errors that abort a load run before any users are spawned.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The run configuration is unusable.
    #[error("invalid load configuration: {0}")]
    InvalidConfig(String),

    /// Shared workload state could not be prepared.
    #[error("workload initialization failed")]
    Init(#[source] ScenarioError),
}

/// Outcome of a single user's scenario, or of workload initialization.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// The scenario was cut short on purpose. Never reported to the sink.
    #[error("scenario cancelled")]
    Cancelled,

    /// The scenario hit a real failure.
    #[error("scenario failed: {0}")]
    Failed(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ScenarioError {
    pub fn failed(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Failed(err.into())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Receives scenario failures from user tasks.
///
/// The runner filters cancellations out before calling [`ErrorSink::report`];
/// implementations only ever see genuine failures.
pub trait ErrorSink: Send + Sync {
    fn report(&self, user: u64, error: &ScenarioError);
}

/// Default sink that logs each failure at warn level.
pub struct TracingErrorSink;

impl ErrorSink for TracingErrorSink {
    fn report(&self, user: u64, error: &ScenarioError) {
        tracing::warn!(user, error = %error, "user scenario failed");
    }
}
