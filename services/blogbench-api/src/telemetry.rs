//! Tracing and OpenTelemetry bootstrap.
//!
//! Export is opt-in: without `BLOGBENCH_TELEMETRY_ENABLED=true` the process
//! gets plain fmt logging with the usual `RUST_LOG` filtering.

use opentelemetry::global;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::{self, RandomIdGenerator, Sampler};
use opentelemetry_sdk::Resource;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// OpenTelemetry configuration
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to exported spans
    pub service_name: String,

    /// OTLP collector endpoint (e.g., "http://localhost:4317")
    pub otlp_endpoint: String,

    /// Enable span export (off by default; logging always works)
    pub enabled: bool,

    /// Sampling ratio (0.0 to 1.0)
    pub sampling_ratio: f64,

    /// Export timeout in seconds
    pub export_timeout_secs: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "blogbench-api".to_string(),
            otlp_endpoint: "http://localhost:4317".to_string(),
            enabled: false,
            sampling_ratio: 1.0,
            export_timeout_secs: 10,
        }
    }
}

impl TelemetryConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            service_name: std::env::var("BLOGBENCH_SERVICE_NAME")
                .unwrap_or_else(|_| "blogbench-api".to_string()),
            otlp_endpoint: std::env::var("BLOGBENCH_OTLP_ENDPOINT")
                .unwrap_or_else(|_| "http://localhost:4317".to_string()),
            enabled: std::env::var("BLOGBENCH_TELEMETRY_ENABLED")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(false),
            sampling_ratio: std::env::var("BLOGBENCH_SAMPLING_RATIO")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1.0),
            export_timeout_secs: std::env::var("BLOGBENCH_EXPORT_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
        }
    }
}

/// Initialize tracing, optionally with OTLP span export.
///
/// # Returns
///
/// A guard that should be kept alive for the duration of the application.
/// Dropping the guard flushes pending spans and shuts the tracer down.
pub fn init_telemetry(
    config: TelemetryConfig,
) -> Result<TelemetryGuard, Box<dyn std::error::Error>> {
    if !config.enabled {
        init_logging_only();
        return Ok(TelemetryGuard { enabled: false });
    }

    global::set_text_map_propagator(TraceContextPropagator::new());

    let exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(&config.otlp_endpoint)
        .with_timeout(Duration::from_secs(config.export_timeout_secs));

    // Installs a batching provider as the global one and hands back a tracer
    // for the subscriber layer.
    let tracer = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(exporter)
        .with_trace_config(
            trace::config()
                .with_sampler(Sampler::TraceIdRatioBased(config.sampling_ratio))
                .with_id_generator(RandomIdGenerator::default())
                .with_resource(Resource::new(vec![
                    opentelemetry::KeyValue::new("service.name", config.service_name.clone()),
                    opentelemetry::KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
                ])),
        )
        .install_batch(opentelemetry_sdk::runtime::Tokio)?;

    let telemetry_layer = tracing_opentelemetry::layer().with_tracer(tracer);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(telemetry_layer)
        .try_init()?;

    tracing::info!(
        service_name = %config.service_name,
        endpoint = %config.otlp_endpoint,
        "OpenTelemetry export enabled"
    );

    Ok(TelemetryGuard { enabled: true })
}

/// Initialize logging without OpenTelemetry (fallback)
fn init_logging_only() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}

/// Guard to ensure telemetry is properly shutdown
///
/// When dropped, this flushes all pending spans and shuts down the tracer
/// provider.
pub struct TelemetryGuard {
    enabled: bool,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if self.enabled {
            global::shutdown_tracer_provider();
        }
    }
}
