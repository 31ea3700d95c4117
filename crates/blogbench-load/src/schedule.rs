//! Ramp pacing for user spawns.

use std::time::Duration;

/// Computes how long to wait before each spawn so that users come up at a
/// steady target rate.
///
/// The schedule is anchored to the cumulative spawn count, not to the
/// previous spawn: user `n` is due at `n / rate` seconds into the run. A
/// spawner that falls behind (for example while blocked on a slot) gets a
/// zero wait until it has caught back up, and the first user is always due
/// immediately.
#[derive(Debug, Clone, Copy)]
pub struct RampSchedule {
    per_user: Duration,
}

impl RampSchedule {
    /// Rate must already be validated as finite and > 0.
    pub fn new(spawn_rate_per_second: f64) -> Self {
        Self {
            per_user: Duration::from_secs_f64(1.0 / spawn_rate_per_second),
        }
    }

    /// Wait before spawning the next user, given how many users have been
    /// spawned so far and how far into the run we are.
    pub fn wait_before_spawn(&self, spawned_so_far: u64, elapsed: Duration) -> Duration {
        let due = self.per_user.as_nanos().saturating_mul(spawned_so_far as u128);
        let elapsed = elapsed.as_nanos();
        if due <= elapsed {
            return Duration::ZERO;
        }
        Duration::from_nanos(u64::try_from(due - elapsed).unwrap_or(u64::MAX))
    }
}
