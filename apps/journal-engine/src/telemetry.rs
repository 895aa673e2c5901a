//! Tracing Setup
//!
//! Console logging through `tracing-subscriber`.
//!
//! # Configuration
//!
//! - `RUST_LOG`: filter directives; overrides the configured level when set
//! - `JOURNAL_LOG_ANSI`: set to `false` to disable colored output

use tracing_subscriber::EnvFilter;

/// Build the filter: `RUST_LOG` if set, otherwise `default_level`.
#[must_use]
pub fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Initialize console tracing.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing(default_level: &str) {
    let ansi = std::env::var("JOURNAL_LOG_ANSI")
        .map(|v| v != "false")
        .unwrap_or(true);

    let result = tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .with_target(false)
        .with_ansi(ansi)
        .try_init();

    if result.is_ok() {
        tracing::debug!(default_level, "Tracing initialized");
    }
}
