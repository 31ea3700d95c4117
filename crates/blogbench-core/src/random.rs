//! Injectable randomness for probabilistic decisions and id generation.
//!
//! Handlers and scenarios never reach for a thread rng directly; they go
//! through [`RandomSource`] so tests can pin every roll and every id.

use rand::Rng;
use uuid::Uuid;

/// Source of random decisions and identifiers.
pub trait RandomSource: Send + Sync {
    /// Rolls a uniform integer in `[0, out_of)` and returns whether it landed
    /// below `rate`. `hit(20, 100)` is true 20% of the time. `out_of` must be
    /// greater than zero.
    fn hit(&self, rate: u32, out_of: u32) -> bool;

    /// Produces a fresh identifier.
    fn next_id(&self) -> Uuid;
}

/// Thread-local rng backed implementation used outside of tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngSource;

impl RandomSource for ThreadRngSource {
    fn hit(&self, rate: u32, out_of: u32) -> bool {
        rand::thread_rng().gen_range(0..out_of) < rate
    }

    fn next_id(&self) -> Uuid {
        Uuid::new_v4()
    }
}
