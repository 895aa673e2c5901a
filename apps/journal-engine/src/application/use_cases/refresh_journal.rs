//! Refresh Journal Use Case

use std::sync::Arc;

use crate::application::ports::{LedgerError, TradeLedgerPort};
use crate::application::services::{AnnotationStore, TradeBook, merge};
use crate::domain::trade::Trade;

/// Use case for pulling the ledger and rebuilding the unified trade list.
pub struct RefreshJournalUseCase<T>
where
    T: TradeLedgerPort + ?Sized,
{
    ledger: Arc<T>,
    annotations: Arc<AnnotationStore>,
    book: Arc<TradeBook>,
}

impl<T> RefreshJournalUseCase<T>
where
    T: TradeLedgerPort + ?Sized,
{
    /// Create a new RefreshJournalUseCase.
    pub const fn new(ledger: Arc<T>, annotations: Arc<AnnotationStore>, book: Arc<TradeBook>) -> Self {
        Self {
            ledger,
            annotations,
            book,
        }
    }

    /// Fetch, merge, and replace the trade book.
    ///
    /// On error the book keeps its previous contents.
    pub async fn execute(&self) -> Result<Vec<Trade>, LedgerError> {
        let ledger = match self.ledger.fetch_trades().await {
            Ok(ledger) => ledger,
            Err(e) => {
                tracing::error!(error = %e, "Ledger refresh failed, keeping previous trades");
                return Err(e);
            }
        };

        let trades = self.book.replace_with(|| merge(ledger, &self.annotations));

        tracing::info!(
            trades = trades.len(),
            open = trades.iter().filter(|t| !t.ledger.is_closed()).count(),
            "Journal refreshed"
        );
        Ok(trades)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::events::EventBus;
    use crate::domain::annotation::AnnotationPatch;
    use crate::domain::shared::TradeId;
    use crate::domain::trade::LedgerTrade;
    use crate::domain::trade::fixtures::ledger_trade;
    use crate::infrastructure::persistence::InMemoryStorage;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    struct StubLedger {
        response: Mutex<Result<Vec<LedgerTrade>, LedgerError>>,
    }

    #[async_trait]
    impl TradeLedgerPort for StubLedger {
        async fn fetch_trades(&self) -> Result<Vec<LedgerTrade>, LedgerError> {
            self.response.lock().clone()
        }
    }

    fn setup(
        response: Result<Vec<LedgerTrade>, LedgerError>,
    ) -> (RefreshJournalUseCase<StubLedger>, Arc<StubLedger>, Arc<AnnotationStore>, Arc<TradeBook>) {
        let ledger = Arc::new(StubLedger {
            response: Mutex::new(response),
        });
        let annotations = Arc::new(
            AnnotationStore::open(Arc::new(InMemoryStorage::new()), EventBus::default()).unwrap(),
        );
        let book = Arc::new(TradeBook::new());
        let use_case =
            RefreshJournalUseCase::new(Arc::clone(&ledger), Arc::clone(&annotations), Arc::clone(&book));
        (use_case, ledger, annotations, book)
    }

    #[tokio::test]
    async fn refresh_overlays_annotations() {
        let (use_case, _, annotations, book) = setup(Ok(vec![ledger_trade("2"), ledger_trade("1")]));
        annotations
            .put(&TradeId::new("1"), AnnotationPatch::default().notes("patient entry"))
            .unwrap();

        let trades = use_case.execute().await.unwrap();

        assert_eq!(trades.len(), 2);
        assert_eq!(trades[1].annotation.notes, "patient entry");
        assert_eq!(book.len(), 2);
    }

    #[tokio::test]
    async fn auth_failure_preserves_previous_book() {
        let (use_case, ledger, _, book) = setup(Ok(vec![ledger_trade("1")]));
        use_case.execute().await.unwrap();

        *ledger.response.lock() = Err(LedgerError::Auth);
        let result = use_case.execute().await;

        assert_eq!(result, Err(LedgerError::Auth));
        assert_eq!(book.len(), 1);
        assert_eq!(book.trades()[0].id(), &TradeId::new("1"));
    }

    #[tokio::test]
    async fn annotations_survive_resync() {
        let (use_case, ledger, annotations, _) = setup(Ok(vec![ledger_trade("1")]));
        annotations
            .put(&TradeId::new("1"), AnnotationPatch::default().tags(["a+"]))
            .unwrap();
        use_case.execute().await.unwrap();

        *ledger.response.lock() = Ok(vec![]);
        use_case.execute().await.unwrap();
        *ledger.response.lock() = Ok(vec![ledger_trade("1")]);
        let trades = use_case.execute().await.unwrap();

        assert!(trades[0].annotation.tags.contains("a+"));
    }
}
