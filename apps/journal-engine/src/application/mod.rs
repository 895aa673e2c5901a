//! Application Layer
//!
//! The application layer orchestrates domain logic through services and use
//! cases. It defines:
//!
//! - **Ports**: Interfaces for the broker, local storage and the backup mirror
//! - **Services**: Stores, the log walker, enrichment and sync coordination
//! - **Use Cases**: Request-scoped workflows such as a ledger refresh
//! - **Events**: The instance-scoped change notification bus

pub mod events;
pub mod ports;
pub mod services;
pub mod use_cases;

pub use events::{EventBus, JournalEvent};
pub use ports::*;
pub use services::*;
pub use use_cases::*;
