//! Reconstructed point-in-time order facts.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::TransactionId;
use crate::domain::trade::Direction;
use crate::domain::transaction::{EntryOrderType, ExitReason};

/// Number of transaction ids covered by the fallback stop-loss scan.
///
/// A stop created later than this many transactions after entry is not found.
/// This is a known approximation, not a guarantee.
pub const FALLBACK_SCAN_WINDOW: u64 = 100;

/// Outcome of reconstructing a trade's initial stop-loss.
///
/// Distinguishes "history shows no stop was ever placed" from "history could
/// not tell us", which a bare `Option` would conflate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "price", rename_all = "kebab-case")]
pub enum StopLossResolution {
    /// A validated initial stop price.
    Value(Decimal),
    /// The searched history contains no stop-loss for the trade.
    NotSet,
    /// The history could not be read, or every candidate was rejected.
    Unknown,
}

impl StopLossResolution {
    /// The stop price, if one was found.
    #[must_use]
    pub const fn value(self) -> Option<Decimal> {
        match self {
            Self::Value(price) => Some(price),
            Self::NotSet | Self::Unknown => None,
        }
    }
}

/// Facts reconstructed for one trade from the transaction log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentResult {
    /// Stop-loss in force at (or shortly after) entry.
    pub initial_stop_loss: StopLossResolution,
    /// Planned entry price of a pending entry order.
    pub initial_entry_price: Option<Decimal>,
    /// Kind of order that opened the trade.
    pub entry_order_type: Option<EntryOrderType>,
    /// Why the trade closed.
    pub exit_reason: Option<ExitReason>,
}

impl EnrichmentResult {
    /// A result with nothing reconstructed.
    #[must_use]
    pub const fn unknown() -> Self {
        Self {
            initial_stop_loss: StopLossResolution::Unknown,
            initial_entry_price: None,
            entry_order_type: None,
            exit_reason: None,
        }
    }
}

impl Default for EnrichmentResult {
    fn default() -> Self {
        Self::unknown()
    }
}

/// Whether `candidate` can be the protective stop of a position entered at
/// `entry_price`.
///
/// A long stop must sit strictly below the entry and a short stop strictly
/// above it; anything else is noise in the history and is discarded.
#[must_use]
pub fn is_valid_initial_stop(direction: Direction, entry_price: Decimal, candidate: Decimal) -> bool {
    match direction {
        Direction::Long => candidate < entry_price,
        Direction::Short => candidate > entry_price,
    }
}

/// Inclusive id range scanned for a stop-loss created after entry.
///
/// Starts at the opening transaction and spans at most
/// [`FALLBACK_SCAN_WINDOW`] ids, clamped to the latest id in the log.
/// Returns `None` when the log's latest id precedes the opening id.
#[must_use]
pub fn fallback_scan_range(
    opening_id: TransactionId,
    latest_id: TransactionId,
) -> Option<(TransactionId, TransactionId)> {
    if latest_id < opening_id {
        return None;
    }
    let end = opening_id.forward(FALLBACK_SCAN_WINDOW - 1).min(latest_id);
    Some((opening_id, end))
}
