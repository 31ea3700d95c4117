use blogbench_api::{run_load_test, run_server, telemetry};
use blogbench_core::{AppConfig, RunMode};

#[tokio::main]
async fn main() {
    let telemetry_config = telemetry::TelemetryConfig::from_env();
    let _guard = match telemetry::init_telemetry(telemetry_config) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("failed to initialize telemetry: {err}");
            std::process::exit(1);
        }
    };

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "failed to load configuration");
            std::process::exit(1);
        }
    };

    let result = match config.mode {
        RunMode::Server => run_server(&config).await,
        RunMode::Load => run_load_test(&config).await.map(|report| {
            tracing::info!(
                spawned = report.spawned,
                succeeded = report.succeeded,
                failed = report.failed,
                cancelled = report.cancelled,
                elapsed_secs = report.elapsed.as_secs_f64(),
                "load test finished"
            );
        }),
    };

    if let Err(err) = result {
        tracing::error!(error = %err, "terminated with error");
        std::process::exit(1);
    }

    // The telemetry guard drops here, flushing pending spans.
}
