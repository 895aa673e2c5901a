//! OANDA-specific error types.

use thiserror::Error;

use crate::application::ports::LedgerError;

/// Errors from the OANDA adapter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OandaError {
    /// HTTP client could not be built or the request was malformed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status.
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// Token missing or rejected.
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// Rate limited.
    #[error("Rate limited, retry after {retry_after_secs}s")]
    RateLimited {
        /// Suggested retry delay in seconds.
        retry_after_secs: u64,
    },

    /// Network error (retryable).
    #[error("Network error: {0}")]
    Network(String),

    /// JSON parsing error.
    #[error("JSON parsing error: {0}")]
    JsonParse(String),

    /// Max retries exceeded.
    #[error("Max retries exceeded after {attempts} attempts")]
    MaxRetriesExceeded {
        /// Number of attempts made before giving up.
        attempts: u32,
    },

    /// Resource not found.
    #[error("Not found: {path}")]
    NotFound {
        /// Request path.
        path: String,
    },
}

impl From<OandaError> for LedgerError {
    fn from(err: OandaError) -> Self {
        match err {
            OandaError::AuthenticationFailed => Self::Auth,
            OandaError::NotFound { path } => Self::NotFound { resource: path },
            OandaError::Http(message) | OandaError::Network(message) => Self::Network { message },
            OandaError::MaxRetriesExceeded { attempts } => Self::Network {
                message: format!("Max retries exceeded after {attempts} attempts"),
            },
            OandaError::RateLimited { retry_after_secs } => Self::Api {
                status: 429,
                message: format!("Rate limited, retry after {retry_after_secs}s"),
            },
            OandaError::Api { status, message } => Self::Api { status, message },
            OandaError::JsonParse(message) => Self::Decode { message },
        }
    }
}
