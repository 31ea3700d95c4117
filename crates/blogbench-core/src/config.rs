//! Configuration management for blogbench.
//!
//! Configuration is assembled from three layers:
//! - hardcoded defaults
//! - an optional config file (`BLOGBENCH_CONFIG`, then `./config/blogbench`)
//! - environment variable overrides (`BLOGBENCH` prefix, `__` separator,
//!   e.g. `BLOGBENCH__LOAD__SPAWN_RATE_PER_SECOND=50`)

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration structure for blogbench.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct AppConfig {
    /// Whether this process serves HTTP or runs the load harness.
    #[serde(default)]
    pub mode: RunMode,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub load: LoadSettings,
}

/// Process mode selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Serve the blog API over HTTP.
    Server,
    /// Drive the embedded blog API with synthetic traffic.
    #[default]
    Load,
}

impl AppConfig {
    /// Load configuration from defaults, optional files, and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        builder = Self::set_defaults(builder)?;

        if let Ok(config_path) = std::env::var("BLOGBENCH_CONFIG") {
            builder = builder.add_source(File::with_name(&config_path).required(false));
        }

        builder = builder.add_source(File::with_name("./config/blogbench").required(false));

        builder = builder.add_source(
            Environment::with_prefix("BLOGBENCH")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder.build()?.try_deserialize()?;

        config.validate()?;

        Ok(config)
    }

    fn set_defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        builder
            .set_default("mode", "load")?
            // Server
            .set_default("server.bind_address", "0.0.0.0:8080")?
            // Database
            .set_default("database.url", "sqlite://blogbench.db")?
            .set_default("database.max_connections", 8)?
            .set_default("database.busy_retry.max_attempts", 5)?
            .set_default("database.busy_retry.initial_backoff_ms", 10)?
            .set_default("database.busy_retry.max_backoff_ms", 200)?
            .set_default("database.busy_retry.backoff_multiplier", 2.0)?
            // Load harness
            .set_default("load.duration_secs", 60)?
            .set_default("load.max_concurrent_users", 10)?
            .set_default("load.spawn_rate_per_second", 10)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.bind_address.is_empty() {
            return Err(ConfigError::Message(
                "server.bind_address must not be empty".to_string(),
            ));
        }

        if self.database.url.is_empty() {
            return Err(ConfigError::Message(
                "database.url must not be empty".to_string(),
            ));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Message(
                "database.max_connections must be > 0".to_string(),
            ));
        }

        if self.load.duration_secs == 0 {
            return Err(ConfigError::Message(
                "load.duration_secs must be > 0".to_string(),
            ));
        }

        if self.load.max_concurrent_users == 0 {
            return Err(ConfigError::Message(
                "load.max_concurrent_users must be > 0".to_string(),
            ));
        }

        if self.load.spawn_rate_per_second == 0 {
            return Err(ConfigError::Message(
                "load.spawn_rate_per_second must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Socket address the server binds to in server mode.
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// SQLite database configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Connection URL, e.g. `sqlite://blogbench.db` or `sqlite::memory:`.
    pub url: String,

    /// Maximum pooled connections.
    pub max_connections: u32,

    /// Retry policy for transactions that hit a busy database.
    #[serde(default)]
    pub busy_retry: RetryConfig,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://blogbench.db".to_string(),
            max_connections: 8,
            busy_retry: RetryConfig::default(),
        }
    }
}

/// Retry configuration with exponential backoff.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts.
    pub max_attempts: u32,

    /// Initial backoff delay in milliseconds.
    pub initial_backoff_ms: u64,

    /// Maximum backoff delay in milliseconds.
    pub max_backoff_ms: u64,

    /// Backoff multiplier for exponential backoff.
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff_ms: 10,
            max_backoff_ms: 200,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Calculate backoff delay for a given retry attempt.
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let delay_ms = (self.initial_backoff_ms as f64
            * self.backoff_multiplier.powi(attempt as i32))
        .min(self.max_backoff_ms as f64);
        Duration::from_millis(delay_ms as u64)
    }
}

/// Load harness settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoadSettings {
    /// How long the ramp phase runs, in seconds.
    pub duration_secs: u64,

    /// Upper bound on simultaneously active simulated users.
    pub max_concurrent_users: u32,

    /// Target number of new simulated users per second.
    pub spawn_rate_per_second: u32,
}

impl Default for LoadSettings {
    fn default() -> Self {
        Self {
            duration_secs: 60,
            max_concurrent_users: 10,
            spawn_rate_per_second: 10,
        }
    }
}

impl LoadSettings {
    /// Ramp duration as a `Duration`.
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }
}
