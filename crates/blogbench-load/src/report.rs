//! Summary of a finished load run.

use std::time::Duration;

/// Counters for one completed run, filled in after every user task has been
/// drained. `spawned` always equals `succeeded + failed + cancelled`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Users that acquired a slot and were launched.
    pub spawned: u64,
    /// Users whose scenario ran to completion.
    pub succeeded: u64,
    /// Users whose spawn or scenario step hit a real failure.
    pub failed: u64,
    /// Users cut short by cancellation; never counted as failures.
    pub cancelled: u64,
    /// Wall time from the start of the ramp until the last task finished.
    pub elapsed: Duration,
}

impl RunReport {
    /// Total user tasks that ran to some terminal state.
    pub fn completed(&self) -> u64 {
        self.succeeded + self.failed + self.cancelled
    }
}
