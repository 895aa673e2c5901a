//! Configuration for the journal engine.
//!
//! Loads YAML with environment variable interpolation and validates it.
//!
//! # Usage
//!
//! ```rust,ignore
//! use journal_engine::config::load_config;
//!
//! // Load from default path (journal.yaml)
//! let config = load_config(None)?;
//! println!("account: {}", config.broker.account_id);
//! ```

mod broker;
mod logging;
mod storage;
mod sync;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use broker::{BrokerConfig, RetrySettings};
pub use logging::LoggingConfig;
pub use storage::StorageConfig;
pub use sync::SyncConfig;

/// Default configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "journal.yaml";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JournalConfig {
    /// Broker connection.
    #[serde(default)]
    pub broker: BrokerConfig,
    /// Local document storage.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Backup mirror.
    #[serde(default)]
    pub sync: SyncConfig,
    /// Logging.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Load configuration from a YAML file with environment variable interpolation.
///
/// `path` defaults to [`DEFAULT_CONFIG_PATH`].
pub fn load_config(path: Option<&str>) -> Result<JournalConfig, ConfigError> {
    let path = path.unwrap_or(DEFAULT_CONFIG_PATH);

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_string(),
        source: e,
    })?;

    load_config_from_string(&contents)
}

/// Load configuration from a YAML string.
pub fn load_config_from_string(yaml: &str) -> Result<JournalConfig, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let config: JournalConfig = serde_yaml_bw::from_str(&interpolated)?;
    validate_config(&config)?;
    Ok(config)
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax.
fn interpolate_env_vars(input: &str) -> String {
    interpolate_with(input, |name| std::env::var(name).ok())
}

fn interpolate_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    #[allow(clippy::expect_used)] // Regex is a compile-time constant
    let re = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    re.replace_all(input, |cap: &regex::Captures<'_>| {
        let default_value = cap.get(2).map_or("", |m| m.as_str());
        match lookup(&cap[1]) {
            Some(v) if !v.is_empty() => v,
            _ => default_value.to_string(),
        }
    })
    .into_owned()
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate configuration values.
fn validate_config(config: &JournalConfig) -> Result<(), ConfigError> {
    let broker = &config.broker;

    if broker.account_id.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "broker.account_id is required".to_string(),
        ));
    }

    if broker.token.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "broker.token is required".to_string(),
        ));
    }

    if broker.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "broker.timeout_secs must be positive".to_string(),
        ));
    }

    if broker.retry.max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "broker.retry.max_attempts must be at least 1".to_string(),
        ));
    }

    if broker.retry.multiplier < 1.0 {
        return Err(ConfigError::ValidationError(
            "broker.retry.multiplier must be at least 1.0".to_string(),
        ));
    }

    if !(0.0..=1.0).contains(&broker.retry.jitter_factor) {
        return Err(ConfigError::ValidationError(
            "broker.retry.jitter_factor must be between 0.0 and 1.0".to_string(),
        ));
    }

    if config.storage.data_dir.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "storage.data_dir must not be empty".to_string(),
        ));
    }

    let level = config.logging.level.to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        return Err(ConfigError::ValidationError(format!(
            "logging.level must be one of: {LOG_LEVELS:?}"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::broker::OandaEnvironment;

    const MINIMAL: &str = r"
broker:
  account_id: 101-004-1234567-001
  token: abc123
";

    #[test]
    fn test_load_minimal_config() {
        let config = match load_config_from_string(MINIMAL) {
            Ok(c) => c,
            Err(e) => panic!("should load minimal config: {e}"),
        };
        assert_eq!(config.broker.environment, OandaEnvironment::Practice);
        assert_eq!(config.broker.timeout_secs, 30);
        assert_eq!(config.broker.retry.max_attempts, 3);
        assert_eq!(config.storage.data_dir, "./data");
        assert_eq!(config.sync.debounce_ms, 1_000);
        assert!(config.sync.mirror_path.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_full_config_parse() {
        let yaml = r#"
broker:
  environment: live
  account_id: "001-001-1234567-001"
  token: secret
  timeout_secs: 10
  base_url: "http://127.0.0.1:9000"
  retry:
    max_attempts: 5
    initial_backoff_ms: 100
    multiplier: 3.0
    jitter_factor: 0.0
storage:
  data_dir: /var/lib/journal
sync:
  debounce_ms: 250
  mirror_path: /mnt/backup/journal.json
logging:
  level: debug
"#;
        let config = match load_config_from_string(yaml) {
            Ok(c) => c,
            Err(e) => panic!("should load full config: {e}"),
        };

        assert!(config.broker.environment.is_live());
        assert_eq!(config.broker.retry.max_attempts, 5);
        assert_eq!(config.broker.retry.max_backoff_ms, 10_000);
        assert_eq!(config.storage.data_dir, "/var/lib/journal");
        assert_eq!(config.sync.debounce().as_millis(), 250);
        assert_eq!(
            config.sync.mirror_path.as_deref(),
            Some("/mnt/backup/journal.json")
        );

        let oanda = config.broker.to_oanda_config();
        assert_eq!(oanda.base_url(), "http://127.0.0.1:9000");
        assert_eq!(oanda.timeout.as_secs(), 10);
        assert_eq!(oanda.retry.max_attempts, 5);
    }

    #[test]
    fn test_debug_redacts_token() {
        let Ok(config) = load_config_from_string(MINIMAL) else {
            panic!("should load");
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("abc123"));
    }

    #[test]
    fn test_env_var_with_default_when_missing() {
        let result = interpolate_with("token: ${JOURNAL_TOKEN:-fallback}", |_| None);
        assert_eq!(result, "token: fallback");
    }

    #[test]
    fn test_env_var_uses_existing() {
        let result = interpolate_with("token: ${JOURNAL_TOKEN:-fallback}", |name| {
            (name == "JOURNAL_TOKEN").then(|| "from-env".to_string())
        });
        assert_eq!(result, "token: from-env");
    }

    #[test]
    fn test_env_var_without_default_becomes_empty() {
        let result = interpolate_with("token: ${JOURNAL_TEST_UNLIKELY_TO_EXIST}", |_| None);
        assert_eq!(result, "token: ");
    }

    #[test]
    fn test_missing_token_is_rejected() {
        let yaml = r"
broker:
  account_id: 101-004-1234567-001
";
        let Err(err) = load_config_from_string(yaml) else {
            panic!("expected error for missing token");
        };
        assert!(err.to_string().contains("broker.token"));
    }

    #[test]
    fn test_invalid_log_level_is_rejected() {
        let yaml = format!("{MINIMAL}logging:\n  level: loud\n");
        let Err(err) = load_config_from_string(&yaml) else {
            panic!("expected error for invalid level");
        };
        assert!(err.to_string().contains("logging.level"));
    }

    #[test]
    fn test_zero_attempts_is_rejected() {
        let yaml = format!("{MINIMAL}  retry:\n    max_attempts: 0\n");
        let Err(err) = load_config_from_string(&yaml) else {
            panic!("expected error for zero attempts");
        };
        assert!(err.to_string().contains("max_attempts"));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let result = load_config(Some("/nonexistent/journal.yaml"));
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }
}
