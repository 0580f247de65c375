//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Background worker configuration.
    #[serde(default)]
    pub worker: WorkerConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default `tracing` filter directive, overridden by `RUST_LOG`.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

fn default_log_filter() -> String {
    "tally=info".to_string()
}

/// Worker configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    /// Age in seconds after which an unfinished movement counts as interrupted.
    #[serde(default = "default_reconcile_after")]
    pub reconcile_after_secs: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            reconcile_after_secs: default_reconcile_after(),
        }
    }
}

fn default_reconcile_after() -> u64 {
    300 // 5 minutes
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("TALLY").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_environment_with_defaults() {
        temp_env::with_vars(
            [
                ("TALLY__DATABASE__URL", Some("postgres://localhost/tally_test")),
                ("RUN_MODE", Some("test-no-such-file")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.database.url, "postgres://localhost/tally_test");
                assert_eq!(config.database.max_connections, 10);
                assert_eq!(config.database.min_connections, 1);
                assert_eq!(config.logging.filter, "tally=info");
                assert!(!config.logging.json);
                assert_eq!(config.worker.reconcile_after_secs, 300);
            },
        );
    }

    #[test]
    fn test_load_overrides_nested_values() {
        temp_env::with_vars(
            [
                ("TALLY__DATABASE__URL", Some("postgres://localhost/tally_test")),
                ("TALLY__WORKER__RECONCILE_AFTER_SECS", Some("60")),
                ("TALLY__LOGGING__JSON", Some("true")),
                ("RUN_MODE", Some("test-no-such-file")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.worker.reconcile_after_secs, 60);
                assert!(config.logging.json);
            },
        );
    }

    #[test]
    fn test_load_fails_without_database_url() {
        temp_env::with_vars(
            [
                ("TALLY__DATABASE__URL", None::<&str>),
                ("RUN_MODE", Some("test-no-such-file")),
            ],
            || {
                assert!(AppConfig::load().is_err());
            },
        );
    }
}
