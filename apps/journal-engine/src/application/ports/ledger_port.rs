//! Ledger Ports (Driven Ports)
//!
//! Read-only access to the broker's trade ledger and transaction log.

use async_trait::async_trait;

use crate::domain::shared::{TradeId, TransactionId};
use crate::domain::trade::LedgerTrade;
use crate::domain::transaction::TransactionRecord;

/// Ledger port error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// Credentials were rejected.
    #[error("Broker rejected credentials")]
    Auth,

    /// The requested resource does not exist.
    #[error("Not found: {resource}")]
    NotFound {
        /// What was requested.
        resource: String,
    },

    /// The broker could not be reached.
    #[error("Broker network error: {message}")]
    Network {
        /// Error details.
        message: String,
    },

    /// The broker answered with an error.
    #[error("Broker API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the broker.
        message: String,
    },

    /// The response body could not be understood.
    #[error("Malformed broker response: {message}")]
    Decode {
        /// Error details.
        message: String,
    },
}

impl LedgerError {
    /// Whether this is a missing-resource error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Port for fetching the trade ledger.
#[async_trait]
pub trait TradeLedgerPort: Send + Sync {
    /// Fetch every open and closed trade, most recent entry first.
    ///
    /// All-or-nothing: an error is returned if either list fails.
    async fn fetch_trades(&self) -> Result<Vec<LedgerTrade>, LedgerError>;
}

/// Port for reading the immutable transaction log.
#[async_trait]
pub trait TransactionLogPort: Send + Sync {
    /// Fetch a single transaction by id.
    async fn transaction(&self, id: TransactionId) -> Result<TransactionRecord, LedgerError>;

    /// Fetch every transaction in the inclusive id range.
    async fn transaction_range(
        &self,
        from: TransactionId,
        to: TransactionId,
    ) -> Result<Vec<TransactionRecord>, LedgerError>;

    /// Id of the newest transaction on the account.
    async fn latest_transaction_id(&self) -> Result<TransactionId, LedgerError>;

    /// Ids of the transactions that closed a trade, oldest first.
    async fn closing_transaction_ids(
        &self,
        trade_id: &TradeId,
    ) -> Result<Vec<TransactionId>, LedgerError>;
}
