//! OANDA v20 response types.
//!
//! These types map directly to OANDA's REST format. Transactions are read
//! through one loose struct and converted into the exhaustive
//! [`TransactionRecord`] here, so nothing past the adapter sees optional
//! wire fields.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::market::{AccountRef, AccountSummary, Candle, Instrument};
use crate::domain::shared::{AccountId, Symbol, TradeId, TransactionId};
use crate::domain::trade::{Direction, LedgerTrade, TradeStatus};
use crate::domain::transaction::{
    EntryOrderType, OrderCreate, OrderFill, ProtectiveOrder, StopLossOnFill, TrailingStopOrder,
    TransactionRecord,
};

use super::error::OandaError;

/// Error body returned by OANDA.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OandaErrorResponse {
    /// Human-readable message.
    #[serde(default)]
    pub error_message: Option<String>,
}

// ============================================================================
// Accounts and instruments
// ============================================================================

/// `GET /v3/accounts`.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountsResponse {
    /// Accounts visible to the token.
    pub accounts: Vec<OandaAccountRef>,
}

/// Entry of the accounts list.
#[derive(Debug, Clone, Deserialize)]
pub struct OandaAccountRef {
    /// Account id.
    pub id: String,
    /// Account tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl OandaAccountRef {
    /// Convert to the domain type.
    #[must_use]
    pub fn into_domain(self) -> AccountRef {
        AccountRef {
            id: AccountId::new(self.id),
            tags: self.tags,
        }
    }
}

/// `GET /v3/accounts/{id}/summary`.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountSummaryResponse {
    /// Account summary.
    pub account: OandaAccountSummary,
}

/// Account summary body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OandaAccountSummary {
    /// Account id.
    pub id: String,
    /// Home currency.
    pub currency: String,
    /// Balance.
    pub balance: Decimal,
    /// Net asset value.
    #[serde(rename = "NAV")]
    pub nav: Decimal,
    /// Unrealized P&L.
    #[serde(rename = "unrealizedPL")]
    pub unrealized_pl: Decimal,
    /// Open trade count.
    #[serde(default)]
    pub open_trade_count: u32,
    /// Newest transaction id.
    #[serde(rename = "lastTransactionID", default)]
    pub last_transaction_id: String,
}

impl OandaAccountSummary {
    /// Convert to the domain type.
    #[must_use]
    pub fn into_domain(self) -> AccountSummary {
        AccountSummary {
            id: AccountId::new(self.id),
            currency: self.currency,
            balance: self.balance,
            nav: self.nav,
            unrealized_pnl: self.unrealized_pl,
            open_trade_count: self.open_trade_count,
            last_transaction_id: self.last_transaction_id,
        }
    }
}

/// `GET /v3/accounts/{id}/instruments`.
#[derive(Debug, Clone, Deserialize)]
pub struct InstrumentsResponse {
    /// Tradeable instruments.
    pub instruments: Vec<OandaInstrument>,
}

/// Instrument body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OandaInstrument {
    /// Instrument name, e.g. `EUR_USD`.
    pub name: String,
    /// Display name, e.g. `EUR/USD`.
    #[serde(default)]
    pub display_name: String,
    /// CURRENCY, CFD or METAL.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Pip location.
    #[serde(default)]
    pub pip_location: i32,
}

impl OandaInstrument {
    /// Convert to the domain type.
    #[must_use]
    pub fn into_domain(self) -> Instrument {
        Instrument {
            name: self.name,
            display_name: self.display_name,
            kind: self.kind,
            pip_location: self.pip_location,
        }
    }
}

/// `GET /v3/instruments/{instrument}/candles`.
#[derive(Debug, Clone, Deserialize)]
pub struct CandlesResponse {
    /// Candles, oldest first.
    #[serde(default)]
    pub candles: Vec<OandaCandle>,
}

/// Candle body.
#[derive(Debug, Clone, Deserialize)]
pub struct OandaCandle {
    /// Open time.
    pub time: DateTime<Utc>,
    /// Tick volume.
    #[serde(default)]
    pub volume: u64,
    /// Whether the candle is closed.
    #[serde(default)]
    pub complete: bool,
    /// Mid prices; absent when other price components were requested.
    pub mid: Option<OandaOhlc>,
}

/// OHLC prices.
#[derive(Debug, Clone, Deserialize)]
pub struct OandaOhlc {
    /// Open.
    pub o: Decimal,
    /// High.
    pub h: Decimal,
    /// Low.
    pub l: Decimal,
    /// Close.
    pub c: Decimal,
}

impl OandaCandle {
    /// Convert to the domain type; candles without mid prices are dropped.
    #[must_use]
    pub fn into_domain(self) -> Option<Candle> {
        let mid = self.mid?;
        Some(Candle {
            time: self.time,
            open: mid.o,
            high: mid.h,
            low: mid.l,
            close: mid.c,
            volume: self.volume,
            complete: self.complete,
        })
    }
}

// ============================================================================
// Trades
// ============================================================================

/// `GET /v3/accounts/{id}/trades`.
#[derive(Debug, Clone, Deserialize)]
pub struct TradesResponse {
    /// Trades in the requested state.
    pub trades: Vec<OandaTrade>,
}

/// `GET /v3/accounts/{id}/trades/{tradeId}`.
#[derive(Debug, Clone, Deserialize)]
pub struct TradeResponse {
    /// Trade detail.
    pub trade: OandaTrade,
}

/// Order attached to a trade (stop-loss or take-profit).
#[derive(Debug, Clone, Deserialize)]
pub struct OandaAttachedOrder {
    /// Trigger price.
    pub price: Option<Decimal>,
}

/// Trade body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OandaTrade {
    /// Trade id (id of the opening fill).
    pub id: String,
    /// Instrument, e.g. `EUR_USD`.
    pub instrument: String,
    /// Fill price of the opening fill.
    pub price: Decimal,
    /// Open time.
    pub open_time: DateTime<Utc>,
    /// OPEN, CLOSED or CLOSE_WHEN_TRADEABLE.
    pub state: String,
    /// Signed units at open; negative for shorts.
    pub initial_units: Decimal,
    /// Realized P&L.
    #[serde(rename = "realizedPL", default)]
    pub realized_pl: Decimal,
    /// Unrealized P&L.
    #[serde(rename = "unrealizedPL", default)]
    pub unrealized_pl: Decimal,
    /// Average price of the closing fills.
    #[serde(default)]
    pub average_close_price: Option<Decimal>,
    /// Close time.
    #[serde(default)]
    pub close_time: Option<DateTime<Utc>>,
    /// Live stop-loss order.
    #[serde(default)]
    pub stop_loss_order: Option<OandaAttachedOrder>,
    /// Live take-profit order.
    #[serde(default)]
    pub take_profit_order: Option<OandaAttachedOrder>,
    /// Ids of the fills that closed the trade.
    #[serde(rename = "closingTransactionIDs", default)]
    pub closing_transaction_ids: Vec<String>,
}

impl OandaTrade {
    /// Normalize into a ledger trade.
    #[must_use]
    pub fn to_ledger_trade(&self) -> LedgerTrade {
        let status = if self.state == "OPEN" {
            TradeStatus::Open
        } else {
            TradeStatus::from_realized_pnl(self.realized_pl)
        };

        LedgerTrade {
            id: TradeId::new(&self.id),
            symbol: Symbol::new(&self.instrument),
            direction: Direction::from_units(self.initial_units),
            status,
            entry_price: self.price,
            exit_price: self.average_close_price,
            quantity: self.initial_units.abs(),
            stop_loss: self.stop_loss_order.as_ref().and_then(|o| o.price),
            take_profit: self.take_profit_order.as_ref().and_then(|o| o.price),
            entry_time: self.open_time,
            exit_time: self.close_time,
            realized_pnl: self.realized_pl,
            unrealized_pnl: self.unrealized_pl,
        }
    }

    /// Parse the closing transaction ids.
    pub fn closing_ids(&self) -> Result<Vec<TransactionId>, OandaError> {
        self.closing_transaction_ids
            .iter()
            .map(String::as_str)
            .map(parse_transaction_id)
            .collect()
    }
}

// ============================================================================
// Transactions
// ============================================================================

/// `GET /v3/accounts/{id}/transactions/{transactionId}`.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionResponse {
    /// The transaction.
    pub transaction: OandaTransaction,
}

/// `GET /v3/accounts/{id}/transactions/idrange`.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionsResponse {
    /// Transactions in the range, oldest first.
    #[serde(default)]
    pub transactions: Vec<OandaTransaction>,
}

/// `GET /v3/accounts/{id}/transactions`.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionPagesResponse {
    /// Newest transaction id.
    #[serde(rename = "lastTransactionID")]
    pub last_transaction_id: String,
}

/// Trade reference inside a fill.
#[derive(Debug, Clone, Deserialize)]
pub struct OandaTradeRef {
    /// Trade id.
    #[serde(rename = "tradeID")]
    pub trade_id: String,
}

/// Stop-loss directive attached to an order or fill.
#[derive(Debug, Clone, Deserialize)]
pub struct OandaStopLossDetails {
    /// Absolute price.
    #[serde(default)]
    pub price: Option<Decimal>,
    /// Distance from the fill price.
    #[serde(default)]
    pub distance: Option<Decimal>,
}

impl OandaStopLossDetails {
    fn into_domain(self) -> Option<StopLossOnFill> {
        self.price
            .map(StopLossOnFill::Price)
            .or_else(|| self.distance.map(StopLossOnFill::Distance))
    }
}

/// Loose wire shape of every transaction kind.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OandaTransaction {
    /// Transaction id.
    pub id: String,
    /// Transaction type.
    #[serde(rename = "type")]
    pub kind: String,
    /// Order this fill executed.
    #[serde(rename = "orderID", default)]
    pub order_id: Option<String>,
    /// Trade a protective order belongs to.
    #[serde(rename = "tradeID", default)]
    pub trade_id: Option<String>,
    /// Price (fill price or trigger price).
    #[serde(default)]
    pub price: Option<Decimal>,
    /// Trailing distance.
    #[serde(default)]
    pub distance: Option<Decimal>,
    /// Reason code.
    #[serde(default)]
    pub reason: Option<String>,
    /// Trade opened by a fill.
    #[serde(default)]
    pub trade_opened: Option<OandaTradeRef>,
    /// Trades closed by a fill.
    #[serde(default)]
    pub trades_closed: Vec<OandaTradeRef>,
    /// Trade reduced by a fill.
    #[serde(default)]
    pub trade_reduced: Option<OandaTradeRef>,
    /// Stop-loss directive.
    #[serde(default)]
    pub stop_loss_on_fill: Option<OandaStopLossDetails>,
}

impl OandaTransaction {
    /// Convert into the exhaustive record.
    ///
    /// A known kind missing a field it needs degrades to
    /// [`TransactionRecord::Other`]; only an unparsable id is an error.
    pub fn into_record(self) -> Result<TransactionRecord, OandaError> {
        let id = parse_transaction_id(&self.id)?;
        let reason = self.reason.clone().unwrap_or_default();
        let kind = self.kind.clone();

        let record = match kind.as_str() {
            "ORDER_FILL" => self.price.map(|price| {
                let trades_closed = self
                    .trades_closed
                    .iter()
                    .chain(self.trade_reduced.as_ref())
                    .map(|t| TradeId::new(&t.trade_id))
                    .collect();
                TransactionRecord::OrderFill(OrderFill {
                    id,
                    order_id: self.order_id.as_deref().and_then(|o| o.parse().ok()),
                    trade_opened: self.trade_opened.map(|t| TradeId::new(t.trade_id)),
                    trades_closed,
                    price,
                    reason,
                    stop_loss_on_fill: self
                        .stop_loss_on_fill
                        .and_then(OandaStopLossDetails::into_domain),
                })
            }),
            "STOP_LOSS_ORDER" | "TAKE_PROFIT_ORDER" => {
                match (self.trade_id, self.price) {
                    (Some(trade_id), Some(price)) => {
                        let order = ProtectiveOrder {
                            id,
                            trade_id: TradeId::new(trade_id),
                            price,
                            reason,
                        };
                        Some(if kind == "STOP_LOSS_ORDER" {
                            TransactionRecord::StopLossOrder(order)
                        } else {
                            TransactionRecord::TakeProfitOrder(order)
                        })
                    }
                    _ => None,
                }
            }
            "TRAILING_STOP_LOSS_ORDER" => match (self.trade_id, self.distance) {
                (Some(trade_id), Some(distance)) => {
                    Some(TransactionRecord::TrailingStopLossOrder(TrailingStopOrder {
                        id,
                        trade_id: TradeId::new(trade_id),
                        distance,
                        reason,
                    }))
                }
                _ => None,
            },
            code => EntryOrderType::from_wire_code(code).map(|order_type| {
                TransactionRecord::OrderCreate(OrderCreate {
                    id,
                    order_type,
                    price: self.price,
                    stop_loss_on_fill: self
                        .stop_loss_on_fill
                        .and_then(OandaStopLossDetails::into_domain),
                    reason,
                })
            }),
        };

        Ok(record.unwrap_or_else(|| {
            if matches!(
                kind.as_str(),
                "ORDER_FILL" | "STOP_LOSS_ORDER" | "TAKE_PROFIT_ORDER" | "TRAILING_STOP_LOSS_ORDER"
            ) {
                tracing::debug!(transaction_id = %id, kind = %kind, "Transaction missing fields");
            }
            TransactionRecord::Other { id, kind }
        }))
    }
}

/// Parse a transaction id from a string field.
pub fn parse_transaction_id(raw: &str) -> Result<TransactionId, OandaError> {
    raw.parse()
        .map_err(|_| OandaError::JsonParse(format!("invalid transaction id: {raw}")))
}
