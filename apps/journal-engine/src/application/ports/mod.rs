//! Application Ports (Driven)
//!
//! Ports define interfaces for the external systems the engine reads from and
//! writes to: the broker, the local device, and the backup mirror.

mod ledger_port;
mod local_storage_port;
mod sync_target_port;

pub use ledger_port::{LedgerError, TradeLedgerPort, TransactionLogPort};
pub use local_storage_port::{LocalStoragePort, StorageError};
pub use sync_target_port::{SyncError, SyncTargetPort};
