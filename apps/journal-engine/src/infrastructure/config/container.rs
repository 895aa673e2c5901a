//! Dependency Injection Container
//!
//! Manages creation and wiring of all engine components.

use std::sync::Arc;
use std::time::Duration;

use crate::application::events::EventBus;
use crate::application::ports::{
    LocalStoragePort, StorageError, TradeLedgerPort, TransactionLogPort,
};
use crate::application::services::{
    AnnotationStore, BackupSyncCoordinator, LazyEnrichmentScheduler, PreferencesStore, TradeBook,
    TransactionLogWalker,
};
use crate::application::use_cases::RefreshJournalUseCase;
use crate::config::JournalConfig;
use crate::error::JournalResult;
use crate::infrastructure::broker::OandaLedgerAdapter;
use crate::infrastructure::persistence::FileStorage;

/// Dependency injection container.
///
/// One container is one engine instance: it owns the event bus, the stores,
/// the current trade book and the background services built on them.
pub struct Container<L>
where
    L: TradeLedgerPort + TransactionLogPort + 'static,
{
    ledger: Arc<L>,
    events: EventBus,
    annotations: Arc<AnnotationStore>,
    preferences: Arc<PreferencesStore>,
    book: Arc<TradeBook>,
    scheduler: Arc<LazyEnrichmentScheduler<L>>,
    coordinator: Arc<BackupSyncCoordinator>,
}

impl<L> Container<L>
where
    L: TradeLedgerPort + TransactionLogPort + 'static,
{
    /// Create a new container from a ledger and a local store.
    pub fn new(
        ledger: Arc<L>,
        storage: Arc<dyn LocalStoragePort>,
        sync_debounce: Duration,
    ) -> Result<Self, StorageError> {
        let events = EventBus::default();
        let annotations = Arc::new(AnnotationStore::open(
            Arc::clone(&storage),
            events.clone(),
        )?);
        let preferences = Arc::new(PreferencesStore::open(storage, events.clone())?);
        let book = Arc::new(TradeBook::new());

        let scheduler = Arc::new(LazyEnrichmentScheduler::new(
            TransactionLogWalker::new(Arc::clone(&ledger)),
            Arc::clone(&annotations),
            Arc::clone(&book),
        ));
        let coordinator = Arc::new(BackupSyncCoordinator::new(
            Arc::clone(&annotations),
            Arc::clone(&preferences),
            sync_debounce,
        ));

        Ok(Self {
            ledger,
            events,
            annotations,
            preferences,
            book,
            scheduler,
            coordinator,
        })
    }

    /// Get the ledger adapter.
    pub fn ledger(&self) -> Arc<L> {
        Arc::clone(&self.ledger)
    }

    /// Get the change notification bus.
    pub const fn events(&self) -> &EventBus {
        &self.events
    }

    /// Get the annotation store.
    pub fn annotations(&self) -> Arc<AnnotationStore> {
        Arc::clone(&self.annotations)
    }

    /// Get the preferences store.
    pub fn preferences(&self) -> Arc<PreferencesStore> {
        Arc::clone(&self.preferences)
    }

    /// Get the current trade book.
    pub fn book(&self) -> Arc<TradeBook> {
        Arc::clone(&self.book)
    }

    /// Get the enrichment scheduler.
    pub fn scheduler(&self) -> Arc<LazyEnrichmentScheduler<L>> {
        Arc::clone(&self.scheduler)
    }

    /// Get the backup sync coordinator.
    pub fn coordinator(&self) -> Arc<BackupSyncCoordinator> {
        Arc::clone(&self.coordinator)
    }

    /// Create a `RefreshJournalUseCase`.
    pub fn refresh_journal_use_case(&self) -> RefreshJournalUseCase<L> {
        RefreshJournalUseCase::new(
            Arc::clone(&self.ledger),
            Arc::clone(&self.annotations),
            Arc::clone(&self.book),
        )
    }
}

impl Container<OandaLedgerAdapter> {
    /// Build the production wiring: OANDA ledger and file storage.
    pub fn from_config(config: &JournalConfig) -> JournalResult<Self> {
        let ledger = Arc::new(OandaLedgerAdapter::new(config.broker.to_oanda_config())?);
        let storage: Arc<dyn LocalStoragePort> =
            Arc::new(FileStorage::open(&config.storage.data_dir)?);

        tracing::info!(
            account_id = %ledger.account_id(),
            data_dir = %config.storage.data_dir,
            live = ledger.is_live(),
            "Container wired"
        );
        Ok(Self::new(ledger, storage, config.sync.debounce())?)
    }
}
