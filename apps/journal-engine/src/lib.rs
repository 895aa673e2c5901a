// Allow unwrap/expect in tests - tests should panic on unexpected errors
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::default_trait_access,
        clippy::items_after_statements
    )
)]

//! Journal Engine - Trade Reconciliation Core
//!
//! Merges the broker's trade ledger with locally-owned journal annotations,
//! reconstructs the historical context of each trade from the transaction
//! log, and mirrors the journal to an external backup file.
//!
//! # Architecture (Hexagonal)
//!
//! ## Layers (inside → outside)
//!
//! - **Domain**: Trades, annotations, transaction records, backup bundles
//!   - `trade`: Ledger trade, unified trade, direction and status
//!   - `annotation`: User-owned journal fields and patches
//!   - `transaction`: Exhaustive transaction log records
//!   - `enrichment`: Reconstructed facts and stop validation
//!   - `backup`: Versioned backup bundle and sync status
//!
//! - **Application**: Ports, services and use cases
//!   - `ports`: `TradeLedgerPort`, `TransactionLogPort`, `LocalStoragePort`, `SyncTargetPort`
//!   - `services`: Stores, log walker, merger, enrichment scheduler, sync coordinator
//!   - `use_cases`: `RefreshJournal`
//!
//! - **Infrastructure**: Adapters
//!   - `broker`: OANDA v20 REST adapter
//!   - `persistence`: File and in-memory document storage
//!   - `sync_target`: File mirror
//!   - `config`: Dependency injection container

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

/// Domain layer - Core journal types with no I/O.
pub mod domain;

/// Application layer - Use cases, services and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

pub mod config;
pub mod error;
pub mod telemetry;

// Domain re-exports
pub use domain::annotation::{AnnotationPatch, AnnotationRecord};
pub use domain::backup::{BackupSnapshot, Strategy, SyncStatus};
pub use domain::enrichment::{EnrichmentResult, StopLossResolution};
pub use domain::shared::{AccountId, StrategyId, Symbol, TradeId, TransactionId};
pub use domain::trade::{Direction, LedgerTrade, Trade, TradeStatus};
pub use domain::transaction::{EntryOrderType, ExitReason, TransactionRecord};

// Application re-exports
pub use application::events::{EventBus, JournalEvent};
pub use application::ports::{
    LedgerError, LocalStoragePort, StorageError, SyncError, SyncTargetPort, TradeLedgerPort,
    TransactionLogPort,
};
pub use application::services::{
    AnnotationStore, BackupError, BackupSyncCoordinator, LazyEnrichmentScheduler,
    PreferencesStore, TradeBook, TransactionLogWalker, merge,
};
pub use application::use_cases::RefreshJournalUseCase;

// Infrastructure re-exports
pub use infrastructure::broker::{OandaConfig, OandaEnvironment, OandaError, OandaLedgerAdapter};
pub use infrastructure::config::Container;
pub use infrastructure::persistence::{FileStorage, InMemoryStorage};
pub use infrastructure::sync_target::FileMirrorTarget;

pub use error::{JournalError, JournalResult};
