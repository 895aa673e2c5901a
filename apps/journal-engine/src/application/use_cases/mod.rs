//! Application Use Cases
//!
//! Use cases orchestrate domain logic to fulfill application requirements.

mod refresh_journal;

pub use refresh_journal::RefreshJournalUseCase;
