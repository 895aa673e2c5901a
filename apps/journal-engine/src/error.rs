//! Crate-level error type.
//!
//! Each layer owns its own error enum; [`JournalError`] gathers them for the
//! binary and for callers that drive several layers at once.

use thiserror::Error;

use crate::application::ports::{LedgerError, StorageError, SyncError};
use crate::application::services::BackupError;
use crate::config::ConfigError;
use crate::infrastructure::broker::OandaError;

/// Any failure surfaced by the journal engine.
#[derive(Debug, Error)]
pub enum JournalError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The broker adapter could not be constructed.
    #[error(transparent)]
    Broker(#[from] OandaError),

    /// The ledger could not be read.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Local documents could not be read or written.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The backup mirror failed.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// A backup bundle could not be produced or applied.
    #[error(transparent)]
    Backup(#[from] BackupError),
}

impl JournalError {
    /// Whether the broker rejected the configured credentials.
    #[must_use]
    pub const fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::Ledger(LedgerError::Auth) | Self::Broker(OandaError::AuthenticationFailed)
        )
    }
}

/// Result alias using [`JournalError`].
pub type JournalResult<T> = Result<T, JournalError>;
