//! Domain Layer
//!
//! The innermost layer containing journal logic with zero infrastructure dependencies.
//! This layer defines:
//!
//! - **Value Objects**: Identifiers, symbols, prices
//! - **Entities**: Broker-owned ledger trades and locally-owned annotations
//! - **Domain Services**: Pure validation and mapping rules
//!
//! # Bounded Contexts
//!
//! - [`trade`]: Ledger trades and the unified (ledger + annotation) view
//! - [`annotation`]: Locally-owned journal fields
//! - [`transaction`]: Immutable broker transaction log records
//! - [`enrichment`]: Reconstructed point-in-time order facts
//! - [`backup`]: Export/import bundle and sync status
//! - [`market`]: Account and instrument metadata read from the broker

pub mod annotation;
pub mod backup;
pub mod enrichment;
pub mod market;
pub mod shared;
pub mod trade;
pub mod transaction;
