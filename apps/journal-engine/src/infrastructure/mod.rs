//! Infrastructure Layer
//!
//! Adapters implementing the ports defined in the application layer:
//!
//! - `broker/`: OANDA v20 REST adapter for the ledger and transaction log
//! - `persistence/`: Local document storage (files, in-memory)
//! - `sync_target/`: External backup mirror targets
//! - `config/`: Dependency wiring

pub mod broker;
pub mod config;
pub mod persistence;
pub mod sync_target;
