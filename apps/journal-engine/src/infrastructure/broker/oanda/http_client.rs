//! HTTP client wrapper with retry logic.

use std::time::Duration;

use rand::Rng;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

use super::api_types::OandaErrorResponse;
use super::config::{OandaConfig, RetryConfig};
use super::error::OandaError;

/// HTTP client for the OANDA v20 REST API with retry logic.
///
/// Read-only: the journal never places or modifies orders.
#[derive(Clone)]
pub struct OandaHttpClient {
    client: Client,
    token: String,
    base_url: String,
    retry_config: RetryConfig,
}

impl std::fmt::Debug for OandaHttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OandaHttpClient")
            .field("base_url", &self.base_url)
            .field("retry_config", &self.retry_config)
            .finish_non_exhaustive()
    }
}

impl OandaHttpClient {
    /// Create a new HTTP client from config.
    pub fn new(config: &OandaConfig) -> Result<Self, OandaError> {
        if config.token.trim().is_empty() {
            return Err(OandaError::AuthenticationFailed);
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| OandaError::Http(e.to_string()))?;

        Ok(Self {
            client,
            token: config.token.clone(),
            base_url: config.base_url().to_string(),
            retry_config: config.retry.clone(),
        })
    }

    /// Make a GET request.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, OandaError> {
        self.get_with_query(path, &[]).await
    }

    /// Make a GET request with query parameters.
    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, OandaError> {
        let url = format!("{}{path}", self.base_url);
        let mut backoff = ExponentialBackoff::new(&self.retry_config);

        loop {
            let request = self
                .client
                .get(&url)
                .bearer_auth(&self.token)
                .header("Accept-Datetime-Format", "RFC3339")
                .query(query);

            let response = match request.send().await {
                Ok(resp) => resp,
                Err(e) => {
                    if let Some(delay) = backoff.next_backoff() {
                        tracing::warn!(
                            error = %e,
                            path,
                            delay_ms = delay.as_millis(),
                            attempt = backoff.attempt,
                            "Network error, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    if backoff.attempt <= 1 {
                        return Err(OandaError::Network(e.to_string()));
                    }
                    return Err(OandaError::MaxRetriesExceeded {
                        attempts: backoff.attempt,
                    });
                }
            };

            let status = response.status();

            if status.is_success() {
                let text = response
                    .text()
                    .await
                    .map_err(|e| OandaError::Network(e.to_string()))?;
                return serde_json::from_str(&text)
                    .map_err(|e| OandaError::JsonParse(e.to_string()));
            }

            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());

            let error_body = response.text().await.unwrap_or_default();
            let error_message = serde_json::from_str::<OandaErrorResponse>(&error_body)
                .ok()
                .and_then(|err| err.error_message)
                .unwrap_or(error_body);

            match categorize_status(status) {
                ErrorCategory::RateLimited => {
                    let delay = backoff
                        .next_backoff()
                        .map(|fallback| retry_after.map_or(fallback, Duration::from_secs));
                    if let Some(delay) = delay {
                        tracing::warn!(
                            path,
                            delay_ms = delay.as_millis(),
                            "Rate limited, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(OandaError::RateLimited {
                        retry_after_secs: retry_after.unwrap_or(60),
                    });
                }
                ErrorCategory::Retryable => {
                    if let Some(delay) = backoff.next_backoff() {
                        tracing::warn!(
                            status = status.as_u16(),
                            message = %error_message,
                            delay_ms = delay.as_millis(),
                            "Retryable error, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(OandaError::MaxRetriesExceeded {
                        attempts: backoff.attempt,
                    });
                }
                ErrorCategory::NonRetryable => {
                    return match status {
                        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                            Err(OandaError::AuthenticationFailed)
                        }
                        StatusCode::NOT_FOUND => Err(OandaError::NotFound {
                            path: path.to_string(),
                        }),
                        _ => Err(OandaError::Api {
                            status: status.as_u16(),
                            message: error_message,
                        }),
                    };
                }
            }
        }
    }
}

/// Error category for determining retry behavior.
enum ErrorCategory {
    RateLimited,
    Retryable,
    NonRetryable,
}

/// Categorize HTTP status code for retry handling.
const fn categorize_status(status: StatusCode) -> ErrorCategory {
    match status.as_u16() {
        429 => ErrorCategory::RateLimited,
        408 | 500 | 502 | 503 | 504 => ErrorCategory::Retryable,
        _ => ErrorCategory::NonRetryable,
    }
}

/// Exponential backoff calculator.
struct ExponentialBackoff {
    attempt: u32,
    max_attempts: u32,
    current_backoff: Duration,
    max_backoff: Duration,
    multiplier: f64,
    jitter_factor: f64,
}

impl ExponentialBackoff {
    const fn new(config: &RetryConfig) -> Self {
        Self {
            attempt: 0,
            max_attempts: config.max_attempts,
            current_backoff: config.initial_backoff,
            max_backoff: config.max_backoff,
            multiplier: config.multiplier,
            jitter_factor: config.jitter_factor,
        }
    }

    fn next_backoff(&mut self) -> Option<Duration> {
        self.attempt += 1;
        if self.attempt >= self.max_attempts {
            return None;
        }

        let backoff = self.current_backoff;
        self.current_backoff = Duration::from_secs_f64(
            (self.current_backoff.as_secs_f64() * self.multiplier)
                .min(self.max_backoff.as_secs_f64()),
        );

        Some(self.apply_jitter(backoff))
    }

    fn apply_jitter(&self, duration: Duration) -> Duration {
        if self.jitter_factor <= 0.0 {
            return duration;
        }
        let base = duration.as_secs_f64();
        let spread = base * self.jitter_factor;
        let mut rng = rand::rng();
        let jittered = rng.random_range((base - spread)..=(base + spread));
        Duration::from_secs_f64(jittered.max(0.0))
    }
}
