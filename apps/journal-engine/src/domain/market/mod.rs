//! Account and instrument metadata read from the broker.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::AccountId;

/// An account visible to the configured token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRef {
    /// Account id.
    pub id: AccountId,
    /// Broker tags attached to the account.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Balance snapshot of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    /// Account id.
    pub id: AccountId,
    /// Home currency.
    pub currency: String,
    /// Cash balance.
    pub balance: Decimal,
    /// Balance plus unrealized P&L.
    pub nav: Decimal,
    /// Total unrealized P&L.
    pub unrealized_pnl: Decimal,
    /// Number of open trades.
    pub open_trade_count: u32,
    /// Id of the newest transaction on the account.
    pub last_transaction_id: String,
}

/// A tradeable instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    /// Broker instrument name (e.g. `EUR_USD`).
    pub name: String,
    /// Human readable name.
    pub display_name: String,
    /// Instrument kind (CURRENCY, CFD, METAL).
    pub kind: String,
    /// Location of the pip relative to the decimal point.
    pub pip_location: i32,
}

/// Candle granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Granularity {
    /// One minute.
    M1,
    /// Five minutes.
    M5,
    /// Fifteen minutes.
    M15,
    /// One hour.
    H1,
    /// Four hours.
    H4,
    /// One day.
    D,
}

impl Granularity {
    /// Broker query code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::M1 => "M1",
            Self::M5 => "M5",
            Self::M15 => "M15",
            Self::H1 => "H1",
            Self::H4 => "H4",
            Self::D => "D",
        }
    }
}

/// One mid-price OHLC candle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candle {
    /// Candle open time.
    pub time: DateTime<Utc>,
    /// Open.
    pub open: Decimal,
    /// High.
    pub high: Decimal,
    /// Low.
    pub low: Decimal,
    /// Close.
    pub close: Decimal,
    /// Tick volume.
    pub volume: u64,
    /// Whether the candle is final.
    pub complete: bool,
}
