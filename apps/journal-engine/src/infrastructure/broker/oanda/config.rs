//! OANDA adapter configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::shared::AccountId;

/// OANDA v20 environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OandaEnvironment {
    /// fxTrade Practice (demo money).
    #[default]
    Practice,
    /// fxTrade (real money).
    Live,
}

impl OandaEnvironment {
    /// Base URL of the REST API.
    #[must_use]
    pub const fn base_url(&self) -> &'static str {
        match self {
            Self::Practice => "https://api-fxpractice.oanda.com",
            Self::Live => "https://api-fxtrade.oanda.com",
        }
    }

    /// Check if this is the live environment.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        matches!(self, Self::Live)
    }
}

impl std::fmt::Display for OandaEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Practice => write!(f, "PRACTICE"),
            Self::Live => write!(f, "LIVE"),
        }
    }
}

/// Configuration for the OANDA ledger adapter.
#[derive(Clone)]
pub struct OandaConfig {
    /// Personal access token.
    pub token: String,
    /// Account whose ledger is read.
    pub account_id: AccountId,
    /// Practice or live.
    pub environment: OandaEnvironment,
    /// HTTP request timeout.
    pub timeout: Duration,
    /// Retry policy configuration.
    pub retry: RetryConfig,
    /// Override of the environment base URL (tests, proxies).
    pub base_url: Option<String>,
}

impl std::fmt::Debug for OandaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OandaConfig")
            .field("token", &"[REDACTED]")
            .field("account_id", &self.account_id)
            .field("environment", &self.environment)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl OandaConfig {
    /// Create a new configuration.
    #[must_use]
    pub fn new(token: String, account_id: AccountId, environment: OandaEnvironment) -> Self {
        Self {
            token,
            account_id,
            environment,
            timeout: Duration::from_secs(30),
            retry: RetryConfig::default(),
            base_url: None,
        }
    }

    /// Set the HTTP timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry configuration.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Point the client at a different host.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Effective REST base URL, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.environment.base_url())
            .trim_end_matches('/')
    }
}

/// Retry configuration.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Initial backoff duration.
    pub initial_backoff: Duration,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
    /// Backoff multiplier.
    pub multiplier: f64,
    /// Random spread applied to each delay, as a fraction of it.
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(10),
            multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}
