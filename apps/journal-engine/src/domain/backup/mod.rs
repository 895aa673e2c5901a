//! Backup bundle and mirror status.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::annotation::AnnotationRecord;
use crate::domain::shared::{StrategyId, TradeId};

/// Current bundle format version.
pub const BACKUP_VERSION: u32 = 1;

/// A user-defined trading strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Strategy {
    /// Stable id.
    pub id: StrategyId,
    /// Display name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Entry checklist.
    #[serde(default)]
    pub entry_rules: Vec<String>,
    /// Exit checklist.
    #[serde(default)]
    pub exit_rules: Vec<String>,
}

impl Strategy {
    /// Create a strategy with a freshly generated id.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: StrategyId::generate(),
            name: name.into(),
            description: String::new(),
            entry_rules: Vec::new(),
            exit_rules: Vec::new(),
        }
    }
}

/// The full journal bundle written to the mirror and used for import/export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupSnapshot {
    /// When the bundle was produced.
    pub timestamp: DateTime<Utc>,
    /// Format version.
    pub version: u32,
    /// Strategies.
    #[serde(default)]
    pub strategies: Vec<Strategy>,
    /// Annotation records keyed by trade id.
    #[serde(default)]
    pub journal_data: BTreeMap<TradeId, AnnotationRecord>,
    /// Watched symbols.
    #[serde(default)]
    pub watchlist: Vec<String>,
    /// Opaque UI preferences.
    #[serde(default)]
    pub ui_prefs: Value,
    /// Opaque journal column configuration.
    #[serde(default)]
    pub journal_config: Value,
    /// Free-form settings; `null` means explicitly cleared.
    #[serde(default)]
    pub settings: BTreeMap<String, Option<String>>,
}

/// State of the external mirror.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    /// Whether auto-sync is writing to the mirror.
    pub is_active: bool,
    /// Completion time of the last successful write.
    pub last_sync_time: Option<DateTime<Utc>>,
    /// Name of the connected mirror file.
    pub file_name: Option<String>,
    /// Last error, cleared on reconnect.
    pub error: Option<String>,
}
