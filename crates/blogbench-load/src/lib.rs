//! Ramp-controlled concurrent load generator.
//!
//! A [`LoadRunner`] spawns a growing population of simulated users against a
//! pluggable [`Workload`]: the spawn rate follows a [`RampSchedule`], the
//! number of simultaneously active users is capped by [`UserSlots`], and a
//! run-scoped deadline (or an external [`ShutdownSignal`]) stops new spawns
//! while letting in-flight users finish.

pub mod config;
pub mod error;
pub mod limiter;
pub mod report;
pub mod runner;
pub mod schedule;
pub mod shutdown;
pub mod workload;

pub use config::RunConfig;
pub use error::{ErrorSink, LoadError, ScenarioError, TracingErrorSink};
pub use limiter::UserSlots;
pub use report::RunReport;
pub use runner::LoadRunner;
pub use schedule::RampSchedule;
pub use shutdown::{ShutdownController, ShutdownSignal};
pub use workload::Workload;
