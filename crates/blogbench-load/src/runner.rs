//! Run coordinator: ramps users up, caps concurrency, drains on deadline.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::{interval, sleep, sleep_until, Instant, MissedTickBehavior};
use tracing::{info, warn};

use crate::config::RunConfig;
use crate::error::{ErrorSink, LoadError, ScenarioError, TracingErrorSink};
use crate::limiter::UserSlots;
use crate::report::RunReport;
use crate::schedule::RampSchedule;
use crate::shutdown::{ShutdownController, ShutdownSignal};
use crate::workload::Workload;

const PROGRESS_INTERVAL: Duration = Duration::from_secs(5);

/// Drives one load run from initialization through drain.
///
/// The run moves through four phases: workload initialization (untimed, its
/// failure aborts the run), ramping (users spawn at the configured rate while
/// slots are available), draining (the deadline has passed, in-flight users
/// finish), and stopped. The deadline stops new spawns only; it never cuts a
/// running user short.
pub struct LoadRunner<W: Workload> {
    config: RunConfig,
    workload: Arc<W>,
    target: Arc<W::Target>,
    sink: Arc<dyn ErrorSink>,
    shutdown: ShutdownSignal,
    // Keeps the default signal open when the caller never wires one in.
    _own_shutdown: Option<ShutdownController>,
}

enum UserOutcome {
    Succeeded,
    Failed,
    Cancelled,
}

impl<W: Workload> LoadRunner<W> {
    pub fn new(config: RunConfig, workload: W, target: W::Target) -> Self {
        let own_shutdown = ShutdownController::new();
        let shutdown = own_shutdown.signal();
        Self {
            config,
            workload: Arc::new(workload),
            target: Arc::new(target),
            sink: Arc::new(TracingErrorSink),
            shutdown,
            _own_shutdown: Some(own_shutdown),
        }
    }

    /// Replaces the default tracing sink for scenario failures.
    pub fn with_error_sink(mut self, sink: Arc<dyn ErrorSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Wires an external interrupt into the run. Firing it has the same
    /// effect as the deadline: no new spawns, in-flight users drain.
    pub fn with_shutdown_signal(mut self, signal: ShutdownSignal) -> Self {
        self.shutdown = signal;
        self._own_shutdown = None;
        self
    }

    /// Runs the load test to completion and returns its counters.
    ///
    /// Only configuration and initialization problems surface as errors;
    /// per-user failures go to the error sink and into [`RunReport::failed`].
    pub async fn run(self) -> Result<RunReport, LoadError> {
        self.config.validate().map_err(LoadError::InvalidConfig)?;

        info!("running workload initialization");
        let init = self
            .workload
            .initialize(&self.target)
            .await
            .map_err(LoadError::Init)?;
        let init = Arc::new(init);
        info!("workload initialization complete");

        // The clock starts here: the configured duration covers the ramp
        // only, never setup.
        let start = Instant::now();
        let deadline = start + self.config.duration;
        let schedule = RampSchedule::new(self.config.spawn_rate_per_second);
        let slots = UserSlots::new(self.config.max_concurrent_users);

        let ramp_done = ShutdownController::new();
        let reporter = tokio::spawn(report_progress(slots.clone(), start, ramp_done.signal()));

        info!(
            duration_secs = self.config.duration.as_secs_f64(),
            max_concurrent_users = self.config.max_concurrent_users,
            spawn_rate_per_second = self.config.spawn_rate_per_second,
            "starting ramp"
        );

        let mut tasks: JoinSet<UserOutcome> = JoinSet::new();
        let mut spawned: u64 = 0;

        loop {
            let wait = schedule.wait_before_spawn(spawned, start.elapsed());
            if !wait.is_zero() {
                tokio::select! {
                    biased;
                    () = self.shutdown.wait() => break,
                    () = sleep_until(deadline) => break,
                    () = sleep(wait) => {}
                }
            }
            if self.expired(deadline) {
                break;
            }

            let permit = tokio::select! {
                biased;
                () = self.shutdown.wait() => break,
                () = sleep_until(deadline) => break,
                permit = slots.acquire() => permit,
            };
            // A freed slot and the deadline can become ready in the same
            // instant; the deadline wins. The unused permit drops back here.
            if self.expired(deadline) {
                break;
            }

            spawned += 1;
            let user_number = spawned;
            let workload = Arc::clone(&self.workload);
            let target = Arc::clone(&self.target);
            let init = Arc::clone(&init);
            let sink = Arc::clone(&self.sink);
            tasks.spawn(async move {
                // Held until this task ends, whichever way it ends.
                let _slot = permit;
                run_user(workload, target, init, sink, user_number).await
            });
        }

        ramp_done.shutdown();
        info!(
            spawned,
            active_users = slots.active(),
            "ramp finished, draining in-flight users"
        );

        let mut report = RunReport {
            spawned,
            ..RunReport::default()
        };
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(UserOutcome::Succeeded) => report.succeeded += 1,
                Ok(UserOutcome::Failed) => report.failed += 1,
                Ok(UserOutcome::Cancelled) => report.cancelled += 1,
                // A task aborted through its handle was stopped on purpose.
                Err(err) if err.is_cancelled() => report.cancelled += 1,
                Err(err) => {
                    warn!(error = %err, "user task panicked");
                    report.failed += 1;
                }
            }
        }
        let _ = reporter.await;

        report.elapsed = start.elapsed();
        debug_assert_eq!(slots.active(), 0, "all slots must be returned after drain");
        info!(
            spawned = report.spawned,
            succeeded = report.succeeded,
            failed = report.failed,
            cancelled = report.cancelled,
            elapsed_secs = report.elapsed.as_secs_f64(),
            "load run complete"
        );
        Ok(report)
    }

    fn expired(&self, deadline: Instant) -> bool {
        self.shutdown.is_shutdown() || Instant::now() >= deadline
    }
}

async fn run_user<W: Workload>(
    workload: Arc<W>,
    target: Arc<W::Target>,
    init: Arc<W::Init>,
    sink: Arc<dyn ErrorSink>,
    user_number: u64,
) -> UserOutcome {
    let user = match workload.spawn_user(&target).await {
        Ok(user) => user,
        Err(err) => return settle(sink.as_ref(), user_number, err),
    };

    match workload.run_user_scenario(&target, &init, &user).await {
        Ok(()) => UserOutcome::Succeeded,
        Err(err) => settle(sink.as_ref(), user_number, err),
    }
}

fn settle(sink: &dyn ErrorSink, user: u64, error: ScenarioError) -> UserOutcome {
    if error.is_cancelled() {
        return UserOutcome::Cancelled;
    }
    sink.report(user, &error);
    UserOutcome::Failed
}

async fn report_progress(slots: UserSlots, start: Instant, ramp_done: ShutdownSignal) {
    let mut ticker = interval(PROGRESS_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // An interval's first tick completes immediately; skip it.
    ticker.tick().await;
    loop {
        tokio::select! {
            biased;
            () = ramp_done.wait() => return,
            _ = ticker.tick() => {
                info!(
                    elapsed_secs = start.elapsed().as_secs(),
                    active_users = slots.active(),
                    "load run progress"
                );
            }
        }
    }
}
