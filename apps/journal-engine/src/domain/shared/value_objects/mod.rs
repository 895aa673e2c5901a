//! Value objects shared across the journal domain.

mod identifiers;
mod symbol;

pub use identifiers::{AccountId, StrategyId, TradeId, TransactionId};
pub use symbol::Symbol;
