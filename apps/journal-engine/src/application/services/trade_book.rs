//! In-memory unified trade list.

use parking_lot::RwLock;
use rust_decimal::Decimal;

use crate::domain::shared::TradeId;
use crate::domain::trade::Trade;

/// The unified trades currently shown to collaborators.
///
/// A refresh replaces the whole list; enrichment patches single trades.
#[derive(Debug, Default)]
pub struct TradeBook {
    trades: RwLock<Vec<Trade>>,
}

impl TradeBook {
    /// Create an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every trade.
    pub fn replace(&self, trades: Vec<Trade>) {
        *self.trades.write() = trades;
    }

    /// Replace every trade with the list `build` returns, holding the write
    /// lock while it runs.
    ///
    /// A pin issued while `build` reads the annotation store waits and then
    /// lands on the new list instead of the one being discarded.
    pub fn replace_with(&self, build: impl FnOnce() -> Vec<Trade>) -> Vec<Trade> {
        let mut trades = self.trades.write();
        *trades = build();
        trades.clone()
    }

    /// Copy of every trade, in ledger order.
    pub fn trades(&self) -> Vec<Trade> {
        self.trades.read().clone()
    }

    /// Trade by id.
    pub fn get(&self, trade_id: &TradeId) -> Option<Trade> {
        self.trades.read().iter().find(|t| t.id() == trade_id).cloned()
    }

    /// Set the pinned initial stop of one trade. Returns whether it was found.
    pub fn pin_initial_stop(&self, trade_id: &TradeId, stop: Decimal) -> bool {
        let mut trades = self.trades.write();
        match trades.iter_mut().find(|t| t.id() == trade_id) {
            Some(trade) => {
                trade.annotation.initial_stop_loss = Some(stop);
                true
            }
            None => false,
        }
    }

    /// Number of trades.
    pub fn len(&self) -> usize {
        self.trades.read().len()
    }

    /// Whether the book is empty.
    pub fn is_empty(&self) -> bool {
        self.trades.read().is_empty()
    }
}
