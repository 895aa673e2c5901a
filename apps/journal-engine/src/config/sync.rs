//! Backup mirror configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Backup mirror settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Quiet period before a burst of edits is mirrored.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// File to mirror the journal bundle to. Sync stays off when unset.
    #[serde(default)]
    pub mirror_path: Option<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            mirror_path: None,
        }
    }
}

impl SyncConfig {
    /// Debounce as a duration.
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

const fn default_debounce_ms() -> u64 {
    1_000
}
