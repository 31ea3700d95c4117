//! Run configuration for the load generator.

use std::time::Duration;

/// Parameters for one load run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// How long new users keep being spawned. In-flight users are still
    /// drained after this deadline passes.
    pub duration: Duration,
    /// Upper bound on users running at the same time (must be > 0).
    pub max_concurrent_users: u32,
    /// Target ramp rate in users per second (must be > 0).
    pub spawn_rate_per_second: f64,
}

impl RunConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.duration.is_zero() {
            return Err("duration must be > 0".to_string());
        }

        if self.max_concurrent_users == 0 {
            return Err("max_concurrent_users must be > 0".to_string());
        }

        if !self.spawn_rate_per_second.is_finite() || self.spawn_rate_per_second <= 0.0 {
            return Err("spawn_rate_per_second must be a finite number > 0".to_string());
        }

        Ok(())
    }
}
