//! Trades: the broker-owned ledger record and the unified journal view.
//!
//! Field ownership is structural. [`LedgerTrade`] holds every field the broker
//! is authoritative for and [`AnnotationRecord`] holds every field the user is
//! authoritative for; a unified [`Trade`] is simply the pair, so there is no
//! field both authorities could write.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::annotation::AnnotationRecord;
use crate::domain::shared::{Symbol, TradeId, TransactionId};

/// Position direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Bought first, profits when price rises.
    Long,
    /// Sold first, profits when price falls.
    Short,
}

impl Direction {
    /// Direction implied by the sign of a signed unit count.
    #[must_use]
    pub fn from_units(units: Decimal) -> Self {
        if units.is_sign_negative() && !units.is_zero() {
            Self::Short
        } else {
            Self::Long
        }
    }
}

/// Trade outcome as shown in the journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TradeStatus {
    /// Position still open.
    Open,
    /// Closed with positive realized P&L.
    Win,
    /// Closed with negative realized P&L.
    Loss,
    /// Closed flat.
    BreakEven,
}

impl TradeStatus {
    /// Outcome of a closed trade from its realized P&L.
    #[must_use]
    pub fn from_realized_pnl(pnl: Decimal) -> Self {
        if pnl > Decimal::ZERO {
            Self::Win
        } else if pnl < Decimal::ZERO {
            Self::Loss
        } else {
            Self::BreakEven
        }
    }

    /// Whether the trade has been closed.
    #[must_use]
    pub const fn is_closed(self) -> bool {
        !matches!(self, Self::Open)
    }
}

/// A trade exactly as the broker reports it, after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerTrade {
    /// Broker-assigned id (equal to the opening fill's transaction id).
    pub id: TradeId,
    /// Normalized symbol.
    pub symbol: Symbol,
    /// Long or short.
    pub direction: Direction,
    /// Open / win / loss / break-even.
    pub status: TradeStatus,
    /// Average fill price at entry.
    pub entry_price: Decimal,
    /// Average close price, once closed.
    pub exit_price: Option<Decimal>,
    /// Absolute initial units.
    pub quantity: Decimal,
    /// Live stop-loss currently attached to the trade.
    pub stop_loss: Option<Decimal>,
    /// Live take-profit currently attached to the trade.
    pub take_profit: Option<Decimal>,
    /// Time the trade was opened.
    pub entry_time: DateTime<Utc>,
    /// Time the trade was closed.
    pub exit_time: Option<DateTime<Utc>>,
    /// Realized P&L in account currency.
    pub realized_pnl: Decimal,
    /// Unrealized P&L in account currency (zero once closed).
    pub unrealized_pnl: Decimal,
}

impl LedgerTrade {
    /// Transaction id of the fill that opened the trade.
    #[must_use]
    pub fn opening_transaction_id(&self) -> Option<TransactionId> {
        self.id.opening_transaction_id()
    }

    /// Whether the trade is closed.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.status.is_closed()
    }
}

/// Order a ledger so the most recently opened trade comes first.
///
/// Ties on entry time fall back to the numeric trade id (descending), then
/// to the raw id, so the order is total and deterministic.
pub fn sort_most_recent_first(trades: &mut [LedgerTrade]) {
    trades.sort_by(|a, b| {
        b.entry_time
            .cmp(&a.entry_time)
            .then_with(|| b.opening_transaction_id().cmp(&a.opening_transaction_id()))
            .then_with(|| b.id.cmp(&a.id))
    });
}

/// The unified journal view of a trade: ledger facts plus annotations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Broker-owned fields.
    pub ledger: LedgerTrade,
    /// User-owned fields.
    pub annotation: AnnotationRecord,
}

impl Trade {
    /// Trade id.
    #[must_use]
    pub const fn id(&self) -> &TradeId {
        &self.ledger.id
    }

    /// Pinned (or defaulted) initial stop-loss.
    #[must_use]
    pub const fn initial_stop_loss(&self) -> Option<Decimal> {
        self.annotation.initial_stop_loss
    }

    /// Initial risk per unit: distance between entry and initial stop.
    #[must_use]
    pub fn initial_risk(&self) -> Option<Decimal> {
        let stop = self.initial_stop_loss()?;
        let risk = (self.ledger.entry_price - stop).abs();
        (!risk.is_zero()).then_some(risk)
    }

    /// Realized reward expressed in multiples of the initial risk.
    ///
    /// `None` while the trade is open or when no usable stop is known.
    #[must_use]
    pub fn risk_multiple(&self) -> Option<Decimal> {
        let exit = self.ledger.exit_price?;
        let risk = self.initial_risk()?;
        let reward = match self.ledger.direction {
            Direction::Long => exit - self.ledger.entry_price,
            Direction::Short => self.ledger.entry_price - exit,
        };
        reward.checked_div(risk).map(|r| r.round_dp(2))
    }
}
