//! Broker connection configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::shared::AccountId;
use crate::infrastructure::broker::{OandaConfig, OandaEnvironment, RetryConfig};

/// OANDA connection settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Practice or live.
    #[serde(default)]
    pub environment: OandaEnvironment,
    /// Account whose ledger is read.
    #[serde(default)]
    pub account_id: String,
    /// Personal access token.
    #[serde(default)]
    pub token: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Base URL override (proxies, tests).
    #[serde(default)]
    pub base_url: Option<String>,
    /// Retry policy for transient failures.
    #[serde(default)]
    pub retry: RetrySettings,
}

impl std::fmt::Debug for BrokerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrokerConfig")
            .field("environment", &self.environment)
            .field("account_id", &self.account_id)
            .field("token", &"[REDACTED]")
            .field("timeout_secs", &self.timeout_secs)
            .field("base_url", &self.base_url)
            .field("retry", &self.retry)
            .finish()
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            environment: OandaEnvironment::default(),
            account_id: String::new(),
            token: String::new(),
            timeout_secs: default_timeout_secs(),
            base_url: None,
            retry: RetrySettings::default(),
        }
    }
}

impl BrokerConfig {
    /// Build the adapter configuration.
    #[must_use]
    pub fn to_oanda_config(&self) -> OandaConfig {
        let config = OandaConfig::new(
            self.token.clone(),
            AccountId::new(&self.account_id),
            self.environment,
        )
        .with_timeout(Duration::from_secs(self.timeout_secs))
        .with_retry(self.retry.to_retry_config());

        match &self.base_url {
            Some(url) => config.with_base_url(url),
            None => config,
        }
    }
}

/// Retry policy settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Maximum attempts, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Initial backoff in milliseconds.
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    /// Backoff cap in milliseconds.
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    /// Backoff multiplier.
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    /// Jitter as a fraction of each delay.
    #[serde(default = "default_jitter_factor")]
    pub jitter_factor: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            multiplier: default_multiplier(),
            jitter_factor: default_jitter_factor(),
        }
    }
}

impl RetrySettings {
    /// Convert to the adapter retry policy.
    #[must_use]
    pub const fn to_retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_attempts,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
            multiplier: self.multiplier,
            jitter_factor: self.jitter_factor,
        }
    }
}

const fn default_timeout_secs() -> u64 {
    30
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_initial_backoff_ms() -> u64 {
    200
}

const fn default_max_backoff_ms() -> u64 {
    10_000
}

const fn default_multiplier() -> f64 {
    2.0
}

const fn default_jitter_factor() -> f64 {
    0.1
}
