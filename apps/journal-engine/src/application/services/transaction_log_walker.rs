//! Transaction Log Walker
//!
//! Reconstructs point-in-time order facts for a trade from the broker's
//! immutable transaction log:
//!
//! 1. the opening fill (by the trade's id),
//! 2. the originating entry order, for its type and planned price,
//! 3. the stop-loss directive attached to the fill or order,
//! 4. otherwise one bounded scan for a stop-loss order created after entry,
//! 5. the first closing fill, for the exit reason.
//!
//! Each step degrades independently: a failed step leaves its field absent
//! and the walk continues. The walker never retries and never errors.

use std::sync::Arc;

use crate::application::ports::{LedgerError, TransactionLogPort};
use crate::domain::enrichment::{
    EnrichmentResult, StopLossResolution, fallback_scan_range, is_valid_initial_stop,
};
use crate::domain::shared::{TradeId, TransactionId};
use crate::domain::trade::LedgerTrade;
use crate::domain::transaction::{ExitReason, OrderFill, StopLossOnFill, TransactionRecord};

/// Walks the transaction log for one trade at a time.
pub struct TransactionLogWalker<L: ?Sized> {
    log: Arc<L>,
}

impl<L: ?Sized> Clone for TransactionLogWalker<L> {
    fn clone(&self) -> Self {
        Self {
            log: Arc::clone(&self.log),
        }
    }
}

impl<L> TransactionLogWalker<L>
where
    L: TransactionLogPort + ?Sized,
{
    /// Create a walker over a transaction log.
    pub const fn new(log: Arc<L>) -> Self {
        Self { log }
    }

    /// Reconstruct the historical context of `trade`.
    pub async fn reconstruct(&self, trade: &LedgerTrade) -> EnrichmentResult {
        let mut result = EnrichmentResult::unknown();

        let Some(opening_id) = trade.opening_transaction_id() else {
            tracing::debug!(trade_id = %trade.id, "Trade id is not a transaction id, skipping walk");
            return result;
        };

        match self.log.transaction(opening_id).await {
            Ok(TransactionRecord::OrderFill(fill)) => {
                let order_directive = self.read_entry_order(trade, &fill, &mut result).await;
                result.initial_stop_loss = self
                    .resolve_initial_stop(trade, opening_id, fill.stop_loss_on_fill.or(order_directive))
                    .await;
            }
            Ok(other) => {
                tracing::debug!(
                    trade_id = %trade.id,
                    kind = other.kind(),
                    "Opening transaction is not a fill"
                );
                return result;
            }
            Err(e) => log_step_failure(&trade.id, "opening_fill", &e),
        }

        if trade.is_closed() {
            result.exit_reason = self.exit_reason(&trade.id).await;
        }

        tracing::debug!(
            trade_id = %trade.id,
            initial_stop_loss = ?result.initial_stop_loss,
            entry_order_type = ?result.entry_order_type,
            exit_reason = ?result.exit_reason,
            "Trade history reconstructed"
        );
        result
    }

    /// Step 2: classify the originating order. Returns its stop directive.
    async fn read_entry_order(
        &self,
        trade: &LedgerTrade,
        fill: &OrderFill,
        result: &mut EnrichmentResult,
    ) -> Option<StopLossOnFill> {
        let order_id = fill.order_id?;

        match self.log.transaction(order_id).await {
            Ok(TransactionRecord::OrderCreate(order)) => {
                result.entry_order_type = Some(order.order_type);
                if order.order_type.is_pending() {
                    result.initial_entry_price = order.price;
                }
                order.stop_loss_on_fill
            }
            Ok(other) => {
                tracing::debug!(
                    trade_id = %trade.id,
                    order_id = %order_id,
                    kind = other.kind(),
                    "Originating transaction is not an entry order"
                );
                None
            }
            Err(e) => {
                log_step_failure(&trade.id, "entry_order", &e);
                None
            }
        }
    }

    /// Steps 3 and 4: attached directive first, then the bounded scan.
    async fn resolve_initial_stop(
        &self,
        trade: &LedgerTrade,
        opening_id: TransactionId,
        directive: Option<StopLossOnFill>,
    ) -> StopLossResolution {
        if let Some(directive) = directive {
            let candidate = directive.resolve(trade.direction, trade.entry_price);
            if is_valid_initial_stop(trade.direction, trade.entry_price, candidate) {
                return StopLossResolution::Value(candidate);
            }
            tracing::debug!(
                trade_id = %trade.id,
                candidate = %candidate,
                entry_price = %trade.entry_price,
                "Attached stop on wrong side of entry, discarded"
            );
        }

        self.scan_for_stop(trade, opening_id).await
    }

    async fn scan_for_stop(
        &self,
        trade: &LedgerTrade,
        opening_id: TransactionId,
    ) -> StopLossResolution {
        let latest = match self.log.latest_transaction_id().await {
            Ok(latest) => latest,
            Err(e) => {
                log_step_failure(&trade.id, "latest_transaction_id", &e);
                return StopLossResolution::Unknown;
            }
        };

        let Some((from, to)) = fallback_scan_range(opening_id, latest) else {
            tracing::debug!(trade_id = %trade.id, latest = %latest, "Log ends before opening fill");
            return StopLossResolution::Unknown;
        };

        let records = match self.log.transaction_range(from, to).await {
            Ok(records) => records,
            Err(e) => {
                log_step_failure(&trade.id, "fallback_scan", &e);
                return StopLossResolution::Unknown;
            }
        };

        let mut candidates: Vec<_> = records
            .iter()
            .filter_map(|record| record.stop_loss_for(&trade.id))
            .collect();
        if candidates.is_empty() {
            return StopLossResolution::NotSet;
        }
        candidates.sort_by_key(|order| order.id);

        for order in candidates {
            if is_valid_initial_stop(trade.direction, trade.entry_price, order.price) {
                return StopLossResolution::Value(order.price);
            }
            tracing::debug!(
                trade_id = %trade.id,
                transaction_id = %order.id,
                candidate = %order.price,
                "Scanned stop on wrong side of entry, discarded"
            );
        }
        StopLossResolution::Unknown
    }

    /// Step 5: reason code of the first closing fill.
    async fn exit_reason(&self, trade_id: &TradeId) -> Option<ExitReason> {
        let closing_ids = match self.log.closing_transaction_ids(trade_id).await {
            Ok(ids) => ids,
            Err(e) => {
                log_step_failure(trade_id, "trade_detail", &e);
                return None;
            }
        };
        let first = *closing_ids.first()?;

        match self.log.transaction(first).await {
            Ok(TransactionRecord::OrderFill(fill)) => Some(ExitReason::from_fill_reason(&fill.reason)),
            Ok(_) => Some(ExitReason::Other),
            Err(e) => {
                log_step_failure(trade_id, "closing_fill", &e);
                None
            }
        }
    }
}

fn log_step_failure(trade_id: &TradeId, step: &'static str, error: &LedgerError) {
    if error.is_not_found() {
        tracing::debug!(trade_id = %trade_id, step, error = %error, "No data for walk step");
    } else {
        tracing::warn!(trade_id = %trade_id, step, error = %error, "Walk step failed");
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::ScriptedLog;
    use super::*;
    use crate::domain::trade::fixtures::ledger_trade;
    use crate::domain::trade::{Direction, TradeStatus};
    use crate::domain::transaction::{EntryOrderType, OrderCreate, ProtectiveOrder};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn fill(id: u64, order_id: Option<u64>, stop: Option<StopLossOnFill>) -> TransactionRecord {
        TransactionRecord::OrderFill(OrderFill {
            id: TransactionId::new(id),
            order_id: order_id.map(TransactionId::new),
            trade_opened: Some(TradeId::new(id.to_string())),
            trades_closed: vec![],
            price: dec!(1.1000),
            reason: "MARKET_ORDER".to_string(),
            stop_loss_on_fill: stop,
        })
    }

    fn order(id: u64, order_type: EntryOrderType, price: Option<Decimal>) -> TransactionRecord {
        TransactionRecord::OrderCreate(OrderCreate {
            id: TransactionId::new(id),
            order_type,
            price,
            stop_loss_on_fill: None,
            reason: "CLIENT_ORDER".to_string(),
        })
    }

    fn stop_order(id: u64, trade: &str, price: Decimal) -> TransactionRecord {
        TransactionRecord::StopLossOrder(ProtectiveOrder {
            id: TransactionId::new(id),
            trade_id: TradeId::new(trade),
            price,
            reason: "REPLACEMENT".to_string(),
        })
    }

    fn walker(log: ScriptedLog) -> (TransactionLogWalker<ScriptedLog>, Arc<ScriptedLog>) {
        let log = Arc::new(log);
        (TransactionLogWalker::new(Arc::clone(&log)), log)
    }

    #[tokio::test]
    async fn attached_stop_is_accepted_without_scan() {
        let (walker, log) = walker(ScriptedLog::with([fill(
            100,
            None,
            Some(StopLossOnFill::Price(dec!(1.0950))),
        )]));

        let result = walker.reconstruct(&ledger_trade("100")).await;

        assert_eq!(result.initial_stop_loss, StopLossResolution::Value(dec!(1.0950)));
        assert_eq!(log.call_count("range"), 0);
    }

    #[tokio::test]
    async fn attached_distance_is_converted_from_entry() {
        let (walker, _) = walker(ScriptedLog::with([fill(
            100,
            None,
            Some(StopLossOnFill::Distance(dec!(0.0030))),
        )]));

        let result = walker.reconstruct(&ledger_trade("100")).await;
        assert_eq!(result.initial_stop_loss, StopLossResolution::Value(dec!(1.0970)));
    }

    #[tokio::test]
    async fn fallback_scan_finds_later_stop() {
        let (walker, log) = walker(ScriptedLog::with([
            fill(100, None, None),
            stop_order(103, "100", dec!(1.0950)),
        ]));

        let result = walker.reconstruct(&ledger_trade("100")).await;

        assert_eq!(result.initial_stop_loss, StopLossResolution::Value(dec!(1.0950)));
        assert_eq!(log.call_count("range:100-103"), 1);
    }

    #[tokio::test]
    async fn fallback_rejects_wrong_side_stop() {
        let (walker, _) = walker(ScriptedLog::with([
            fill(100, None, None),
            stop_order(103, "100", dec!(1.1050)),
        ]));

        let result = walker.reconstruct(&ledger_trade("100")).await;
        assert_eq!(result.initial_stop_loss, StopLossResolution::Unknown);
        assert_eq!(result.initial_stop_loss.value(), None);
    }

    #[tokio::test]
    async fn fallback_takes_first_valid_in_id_order() {
        let (walker, _) = walker(ScriptedLog::with([
            fill(100, None, None),
            stop_order(101, "100", dec!(1.1200)),
            stop_order(102, "999", dec!(1.0900)),
            stop_order(104, "100", dec!(1.0960)),
            stop_order(106, "100", dec!(1.0990)),
        ]));

        let result = walker.reconstruct(&ledger_trade("100")).await;
        assert_eq!(result.initial_stop_loss, StopLossResolution::Value(dec!(1.0960)));
    }

    #[tokio::test]
    async fn no_stop_records_means_not_set() {
        let (walker, _) = walker(ScriptedLog::with([fill(100, None, None)]));
        let result = walker.reconstruct(&ledger_trade("100")).await;
        assert_eq!(result.initial_stop_loss, StopLossResolution::NotSet);
    }

    #[tokio::test]
    async fn failed_scan_means_unknown() {
        let mut log = ScriptedLog::with([fill(100, None, None)]);
        log.fail_range = true;
        let (walker, _) = walker(log);

        let result = walker.reconstruct(&ledger_trade("100")).await;
        assert_eq!(result.initial_stop_loss, StopLossResolution::Unknown);
    }

    #[tokio::test]
    async fn scan_window_is_capped() {
        let mut log = ScriptedLog::with([fill(100, None, None)]);
        log.latest = Some(TransactionId::new(10_000));
        let (walker, log) = walker(log);

        walker.reconstruct(&ledger_trade("100")).await;
        assert_eq!(log.call_count("range:100-199"), 1);
    }

    #[tokio::test]
    async fn pending_entry_order_reports_planned_price() {
        let (walker, _) = walker(ScriptedLog::with([
            order(99, EntryOrderType::Limit, Some(dec!(1.0995))),
            fill(100, Some(99), Some(StopLossOnFill::Price(dec!(1.0950)))),
        ]));

        let result = walker.reconstruct(&ledger_trade("100")).await;
        assert_eq!(result.entry_order_type, Some(EntryOrderType::Limit));
        assert_eq!(result.initial_entry_price, Some(dec!(1.0995)));
    }

    #[tokio::test]
    async fn market_entry_order_has_no_planned_price() {
        let (walker, _) = walker(ScriptedLog::with([
            order(99, EntryOrderType::Market, Some(dec!(1.1001))),
            fill(100, Some(99), None),
        ]));

        let result = walker.reconstruct(&ledger_trade("100")).await;
        assert_eq!(result.entry_order_type, Some(EntryOrderType::Market));
        assert_eq!(result.initial_entry_price, None);
    }

    #[tokio::test]
    async fn order_directive_used_when_fill_has_none() {
        let record = OrderCreate {
            id: TransactionId::new(99),
            order_type: EntryOrderType::Stop,
            price: Some(dec!(1.1002)),
            stop_loss_on_fill: Some(StopLossOnFill::Price(dec!(1.0940))),
            reason: "CLIENT_ORDER".to_string(),
        };
        let (walker, log) = walker(ScriptedLog::with([
            TransactionRecord::OrderCreate(record),
            fill(100, Some(99), None),
        ]));

        let result = walker.reconstruct(&ledger_trade("100")).await;
        assert_eq!(result.initial_stop_loss, StopLossResolution::Value(dec!(1.0940)));
        assert_eq!(log.call_count("range"), 0);
    }

    #[tokio::test]
    async fn missing_entry_order_keeps_other_steps() {
        let (walker, _) = walker(ScriptedLog::with([
            fill(100, Some(42), None),
            stop_order(101, "100", dec!(1.0950)),
        ]));

        let result = walker.reconstruct(&ledger_trade("100")).await;
        assert_eq!(result.entry_order_type, None);
        assert_eq!(result.initial_stop_loss, StopLossResolution::Value(dec!(1.0950)));
    }

    #[tokio::test]
    async fn non_fill_opening_record_is_all_absent() {
        let (walker, log) = walker(ScriptedLog::with([TransactionRecord::Other {
            id: TransactionId::new(100),
            kind: "DAILY_FINANCING".to_string(),
        }]));

        let result = walker.reconstruct(&ledger_trade("100")).await;
        assert_eq!(result, EnrichmentResult::unknown());
        assert_eq!(log.call_count("latest"), 0);
    }

    #[tokio::test]
    async fn short_trade_stop_must_be_above_entry() {
        let mut trade = ledger_trade("100");
        trade.direction = Direction::Short;
        let (walker, _) = walker(ScriptedLog::with([
            fill(100, None, Some(StopLossOnFill::Price(dec!(1.0950)))),
            stop_order(102, "100", dec!(1.1040)),
        ]));

        let result = walker.reconstruct(&trade).await;
        assert_eq!(result.initial_stop_loss, StopLossResolution::Value(dec!(1.1040)));
    }

    #[tokio::test]
    async fn closed_trade_gets_exit_reason() {
        let mut log = ScriptedLog::with([
            fill(100, None, Some(StopLossOnFill::Price(dec!(1.0950)))),
            TransactionRecord::OrderFill(OrderFill {
                id: TransactionId::new(150),
                order_id: None,
                trade_opened: None,
                trades_closed: vec![TradeId::new("100")],
                price: dec!(1.0950),
                reason: "STOP_LOSS_ORDER".to_string(),
                stop_loss_on_fill: None,
            }),
        ]);
        log.closing
            .insert(TradeId::new("100"), vec![TransactionId::new(150)]);
        let (walker, _) = walker(log);

        let mut trade = ledger_trade("100");
        trade.status = TradeStatus::Loss;
        let result = walker.reconstruct(&trade).await;

        assert_eq!(result.exit_reason, Some(ExitReason::StopLoss));
    }

    #[tokio::test]
    async fn open_trade_skips_exit_lookup() {
        let (walker, log) = walker(ScriptedLog::with([fill(100, None, None)]));
        let result = walker.reconstruct(&ledger_trade("100")).await;
        assert_eq!(result.exit_reason, None);
        assert_eq!(log.call_count("detail"), 0);
    }
}
