//! Contract between the load runner and the traffic it drives.

use async_trait::async_trait;

use crate::error::ScenarioError;

/// Pluggable unit of work executed for each simulated user.
///
/// The runner calls [`Workload::initialize`] exactly once before the ramp
/// starts; its output is shared read-only with every user task. Each spawned
/// user then gets one [`Workload::spawn_user`] call followed, on success, by
/// one [`Workload::run_user_scenario`] call.
///
/// Implementations decide what a "user" actually does against the target;
/// the runner only cares about success, failure, or cancellation.
#[async_trait]
pub trait Workload: Send + Sync + 'static {
    /// The system under load.
    type Target: Send + Sync + 'static;
    /// Shared state produced once by initialization (e.g. seed data ids).
    type Init: Send + Sync + 'static;
    /// Per-user state produced at spawn time (e.g. credentials).
    type User: Send + 'static;

    /// Prepares shared state before any user is spawned. A failure here
    /// aborts the whole run.
    async fn initialize(&self, target: &Self::Target) -> Result<Self::Init, ScenarioError>;

    /// Brings one simulated user into existence.
    async fn spawn_user(&self, target: &Self::Target) -> Result<Self::User, ScenarioError>;

    /// Runs the user's traffic. Failures are isolated to this user.
    async fn run_user_scenario(
        &self,
        target: &Self::Target,
        init: &Self::Init,
        user: &Self::User,
    ) -> Result<(), ScenarioError>;
}
