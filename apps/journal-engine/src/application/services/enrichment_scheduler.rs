//! Lazy Enrichment Scheduler
//!
//! Runs the transaction log walker for trades as they become visible. Each
//! trade is attempted at most once per session, and only one walk is in
//! flight at a time across all callers.
//!
//! The attempted marker is set before any I/O and never cleared, so an
//! attempt interrupted by a crash or a transient failure is not retried until
//! the next session.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use tokio::task::JoinHandle;

use crate::application::ports::TransactionLogPort;
use crate::application::services::{AnnotationStore, TradeBook, TransactionLogWalker};
use crate::domain::annotation::AnnotationPatch;
use crate::domain::enrichment::{EnrichmentResult, StopLossResolution};
use crate::domain::shared::TradeId;
use crate::domain::trade::{LedgerTrade, Trade};

/// Drives background enrichment of visible trades.
pub struct LazyEnrichmentScheduler<L: ?Sized> {
    walker: TransactionLogWalker<L>,
    annotations: Arc<AnnotationStore>,
    book: Arc<TradeBook>,
    attempted: Mutex<HashSet<TradeId>>,
    pending: Mutex<HashSet<TradeId>>,
    results: RwLock<HashMap<TradeId, EnrichmentResult>>,
    serial: tokio::sync::Mutex<()>,
}

impl<L> LazyEnrichmentScheduler<L>
where
    L: TransactionLogPort + ?Sized + 'static,
{
    /// Create a scheduler.
    pub fn new(
        walker: TransactionLogWalker<L>,
        annotations: Arc<AnnotationStore>,
        book: Arc<TradeBook>,
    ) -> Self {
        Self {
            walker,
            annotations,
            book,
            attempted: Mutex::new(HashSet::new()),
            pending: Mutex::new(HashSet::new()),
            results: RwLock::new(HashMap::new()),
            serial: tokio::sync::Mutex::new(()),
        }
    }

    /// Queue enrichment for trades that have not been attempted yet.
    ///
    /// Returns immediately; the returned handle completes once this call's
    /// trades have been walked.
    pub fn on_visible(self: &Arc<Self>, trades: &[Trade]) -> JoinHandle<()> {
        let fresh: Vec<LedgerTrade> = {
            let mut attempted = self.attempted.lock();
            trades
                .iter()
                .filter(|trade| attempted.insert(trade.id().clone()))
                .map(|trade| trade.ledger.clone())
                .collect()
        };

        if !fresh.is_empty() {
            tracing::debug!(count = fresh.len(), "Queued trades for enrichment");
        }

        let this = Arc::clone(self);
        tokio::spawn(async move {
            for trade in fresh {
                this.enrich(&trade).await;
            }
        })
    }

    /// Whether a trade's walk is currently in flight.
    pub fn is_pending(&self, trade_id: &TradeId) -> bool {
        self.pending.lock().contains(trade_id)
    }

    /// Whether a trade has been queued this session.
    pub fn was_attempted(&self, trade_id: &TradeId) -> bool {
        self.attempted.lock().contains(trade_id)
    }

    /// Last reconstructed result for a trade.
    pub fn result_for(&self, trade_id: &TradeId) -> Option<EnrichmentResult> {
        self.results.read().get(trade_id).cloned()
    }

    async fn enrich(&self, trade: &LedgerTrade) {
        let _turn = self.serial.lock().await;

        self.pending.lock().insert(trade.id.clone());
        let result = self.walker.reconstruct(trade).await;
        self.pending.lock().remove(&trade.id);

        if let StopLossResolution::Value(stop) = result.initial_stop_loss {
            self.promote(&trade.id, stop);
        }
        self.results.write().insert(trade.id.clone(), result);
    }

    /// Pin a reconstructed stop so it is not derived again.
    fn promote(&self, trade_id: &TradeId, stop: Decimal) {
        if self.annotations.pinned_initial_stop(trade_id) == Some(stop) {
            return;
        }

        match self
            .annotations
            .put(trade_id, AnnotationPatch::default().initial_stop_loss(stop))
        {
            Ok(_) => {
                self.book.pin_initial_stop(trade_id, stop);
                tracing::info!(trade_id = %trade_id, initial_stop_loss = %stop, "Initial stop promoted");
            }
            Err(e) => {
                tracing::warn!(trade_id = %trade_id, error = %e, "Failed to pin initial stop");
            }
        }
    }
}
