//! OANDA v20 Ledger Adapter
//!
//! Read-only implementation of the ledger ports for the OANDA v20 REST API:
//! - Trade lists, transaction log and trade detail
//! - Account, instrument and candle metadata
//! - Retry logic with exponential backoff
//! - Practice vs live environment selection

mod adapter;
mod api_types;
mod config;
mod error;
mod http_client;

pub use adapter::OandaLedgerAdapter;
pub use config::{OandaConfig, OandaEnvironment, RetryConfig};
pub use error::OandaError;
