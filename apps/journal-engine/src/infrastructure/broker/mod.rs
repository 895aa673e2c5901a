//! Broker Adapters
//!
//! Implementations of the ledger ports for supported brokers.

pub mod oanda;

pub use oanda::{OandaConfig, OandaEnvironment, OandaError, OandaLedgerAdapter, RetryConfig};
