//! Broker transaction log records.
//!
//! The log is immutable and append-only. Each record kind the engine reasons
//! about gets its own variant so that every access is an exhaustive match
//! rather than a probe for optional fields.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::{TradeId, TransactionId};
use crate::domain::trade::Direction;

/// Type of the order that opened a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryOrderType {
    /// Executed immediately at the market.
    Market,
    /// Pending order filled at the limit price or better.
    Limit,
    /// Pending order triggered when price trades through the stop.
    Stop,
    /// Pending order that becomes a market order once touched.
    MarketIfTouched,
}

impl EntryOrderType {
    /// Whether this order waits for a price, so its planned price can differ
    /// from the eventual fill.
    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::Limit | Self::Stop | Self::MarketIfTouched)
    }

    /// Wire code used by the broker for an order-create transaction.
    #[must_use]
    pub const fn wire_code(self) -> &'static str {
        match self {
            Self::Market => "MARKET_ORDER",
            Self::Limit => "LIMIT_ORDER",
            Self::Stop => "STOP_ORDER",
            Self::MarketIfTouched => "MARKET_IF_TOUCHED_ORDER",
        }
    }

    /// Parse a broker order-create transaction type.
    #[must_use]
    pub fn from_wire_code(code: &str) -> Option<Self> {
        match code {
            "MARKET_ORDER" => Some(Self::Market),
            "LIMIT_ORDER" => Some(Self::Limit),
            "STOP_ORDER" => Some(Self::Stop),
            "MARKET_IF_TOUCHED_ORDER" => Some(Self::MarketIfTouched),
            _ => None,
        }
    }
}

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExitReason {
    /// Protective stop triggered.
    StopLoss,
    /// Take-profit triggered.
    TakeProfit,
    /// Closed by the trader.
    ManualClose,
    /// Trailing stop triggered.
    TrailingStop,
    /// Anything else (margin closeout, corporate action, ...).
    Other,
}

impl ExitReason {
    /// Map the reason code of a closing fill to a journal label.
    #[must_use]
    pub fn from_fill_reason(reason: &str) -> Self {
        match reason {
            "STOP_LOSS_ORDER" | "GUARANTEED_STOP_LOSS_ORDER" => Self::StopLoss,
            "TAKE_PROFIT_ORDER" => Self::TakeProfit,
            "TRAILING_STOP_LOSS_ORDER" => Self::TrailingStop,
            "MARKET_ORDER"
            | "MARKET_ORDER_TRADE_CLOSE"
            | "MARKET_ORDER_POSITION_CLOSEOUT"
            | "LIMIT_ORDER"
            | "STOP_ORDER"
            | "MARKET_IF_TOUCHED_ORDER" => Self::ManualClose,
            _ => Self::Other,
        }
    }
}

/// A stop-loss attached to an order or fill at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StopLossOnFill {
    /// Absolute stop price.
    Price(Decimal),
    /// Distance from the entry price.
    Distance(Decimal),
}

impl StopLossOnFill {
    /// Resolve to an absolute price relative to the entry.
    ///
    /// A distance is placed on the losing side of the entry for the given
    /// direction; the result still has to pass direction validation.
    #[must_use]
    pub fn resolve(self, direction: Direction, entry_price: Decimal) -> Decimal {
        match self {
            Self::Price(price) => price,
            Self::Distance(distance) => match direction {
                Direction::Long => entry_price - distance,
                Direction::Short => entry_price + distance,
            },
        }
    }
}

/// Execution of an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderFill {
    /// Transaction id.
    pub id: TransactionId,
    /// Order-create transaction this fill executed.
    pub order_id: Option<TransactionId>,
    /// Trade opened by this fill, if any.
    pub trade_opened: Option<TradeId>,
    /// Trades closed (fully or partially) by this fill.
    pub trades_closed: Vec<TradeId>,
    /// Fill price.
    pub price: Decimal,
    /// Reason code (what kind of order filled).
    pub reason: String,
    /// Stop-loss directive carried on the fill itself.
    pub stop_loss_on_fill: Option<StopLossOnFill>,
}

/// Creation of an entry order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderCreate {
    /// Transaction id.
    pub id: TransactionId,
    /// Kind of order created.
    pub order_type: EntryOrderType,
    /// Requested price (absent for market orders).
    pub price: Option<Decimal>,
    /// Stop-loss directive attached to the order.
    pub stop_loss_on_fill: Option<StopLossOnFill>,
    /// Reason code.
    pub reason: String,
}

/// Creation of a stop-loss or take-profit order on an existing trade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectiveOrder {
    /// Transaction id.
    pub id: TransactionId,
    /// Trade the order protects.
    pub trade_id: TradeId,
    /// Trigger price.
    pub price: Decimal,
    /// Reason code.
    pub reason: String,
}

/// Creation of a trailing stop-loss order on an existing trade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrailingStopOrder {
    /// Transaction id.
    pub id: TransactionId,
    /// Trade the order protects.
    pub trade_id: TradeId,
    /// Trailing distance.
    pub distance: Decimal,
    /// Reason code.
    pub reason: String,
}

/// One immutable entry of the broker transaction log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionRecord {
    /// An order was executed.
    OrderFill(OrderFill),
    /// An entry order was created.
    OrderCreate(OrderCreate),
    /// A stop-loss order was created.
    StopLossOrder(ProtectiveOrder),
    /// A take-profit order was created.
    TakeProfitOrder(ProtectiveOrder),
    /// A trailing stop-loss order was created.
    TrailingStopLossOrder(TrailingStopOrder),
    /// Any record kind the engine does not reason about.
    Other {
        /// Transaction id.
        id: TransactionId,
        /// Raw broker kind.
        kind: String,
    },
}

impl TransactionRecord {
    /// Transaction id.
    #[must_use]
    pub const fn id(&self) -> TransactionId {
        match self {
            Self::OrderFill(fill) => fill.id,
            Self::OrderCreate(order) => order.id,
            Self::StopLossOrder(order) | Self::TakeProfitOrder(order) => order.id,
            Self::TrailingStopLossOrder(order) => order.id,
            Self::Other { id, .. } => *id,
        }
    }

    /// Short label for logging.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::OrderFill(_) => "ORDER_FILL",
            Self::OrderCreate(order) => order.order_type.wire_code(),
            Self::StopLossOrder(_) => "STOP_LOSS_ORDER",
            Self::TakeProfitOrder(_) => "TAKE_PROFIT_ORDER",
            Self::TrailingStopLossOrder(_) => "TRAILING_STOP_LOSS_ORDER",
            Self::Other { kind, .. } => kind,
        }
    }

    /// The stop-loss order this record creates for `trade_id`, if any.
    #[must_use]
    pub fn stop_loss_for(&self, trade_id: &TradeId) -> Option<&ProtectiveOrder> {
        match self {
            Self::StopLossOrder(order) if &order.trade_id == trade_id => Some(order),
            _ => None,
        }
    }
}
