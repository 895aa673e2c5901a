//! Application Services
//!
//! Long-lived services that own journal state or run background work:
//! the local stores, the log walker and its scheduler, the ledger merge,
//! and the backup mirror.

mod annotation_store;
mod backup_sync;
mod enrichment_scheduler;
mod preferences_store;
mod reconciliation_merger;
mod trade_book;
pub(crate) mod transaction_log_walker;

pub use annotation_store::{ANNOTATIONS_KEY, AnnotationStore};
pub use backup_sync::{
    BackupError, BackupSyncCoordinator, DEFAULT_SYNC_DEBOUNCE, ImportSummary, SyncEvent,
};
pub use enrichment_scheduler::LazyEnrichmentScheduler;
pub use preferences_store::{PREFERENCES_KEY, Preferences, PreferencesStore};
pub use reconciliation_merger::{merge, merge_records};
pub use trade_book::TradeBook;
pub use transaction_log_walker::TransactionLogWalker;
