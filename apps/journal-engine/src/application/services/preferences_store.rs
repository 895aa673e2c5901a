//! Preferences Store
//!
//! Strategies, watchlist, UI preferences, journal configuration and free-form
//! settings. Persisted as one document next to the annotation overlay.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::application::events::{EventBus, JournalEvent};
use crate::application::ports::{LocalStoragePort, StorageError};
use crate::domain::backup::Strategy;
use crate::domain::shared::StrategyId;

/// Storage key of the preferences document.
pub const PREFERENCES_KEY: &str = "preferences";

/// Everything in the bundle that is not an annotation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    /// Strategies, in creation order.
    #[serde(default)]
    pub strategies: Vec<Strategy>,
    /// Watched symbols.
    #[serde(default)]
    pub watchlist: Vec<String>,
    /// Opaque UI preferences.
    #[serde(default)]
    pub ui_prefs: Value,
    /// Opaque journal column configuration.
    #[serde(default)]
    pub journal_config: Value,
    /// Free-form settings.
    #[serde(default)]
    pub settings: BTreeMap<String, Option<String>>,
}

/// Local preferences store.
pub struct PreferencesStore {
    prefs: RwLock<Preferences>,
    storage: Arc<dyn LocalStoragePort>,
    events: EventBus,
}

impl std::fmt::Debug for PreferencesStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreferencesStore")
            .field("strategies", &self.prefs.read().strategies.len())
            .finish_non_exhaustive()
    }
}

impl PreferencesStore {
    /// Load preferences from storage.
    pub fn open(storage: Arc<dyn LocalStoragePort>, events: EventBus) -> Result<Self, StorageError> {
        let prefs = match storage.read(PREFERENCES_KEY)? {
            Some(raw) => serde_json::from_str(&raw).map_err(|e| StorageError::Corrupt {
                key: PREFERENCES_KEY.to_string(),
                message: e.to_string(),
            })?,
            None => Preferences::default(),
        };

        Ok(Self {
            prefs: RwLock::new(prefs),
            storage,
            events,
        })
    }

    /// Copy of every preference.
    pub fn snapshot(&self) -> Preferences {
        self.prefs.read().clone()
    }

    /// All strategies.
    pub fn strategies(&self) -> Vec<Strategy> {
        self.prefs.read().strategies.clone()
    }

    /// Strategy by id.
    pub fn strategy(&self, id: &StrategyId) -> Option<Strategy> {
        self.prefs
            .read()
            .strategies
            .iter()
            .find(|s| &s.id == id)
            .cloned()
    }

    /// Insert a strategy, or replace the one with the same id.
    pub fn upsert_strategy(&self, strategy: Strategy) -> Result<(), StorageError> {
        self.mutate(&[JournalEvent::StrategiesChanged], |prefs| {
            upsert_by_id(&mut prefs.strategies, strategy);
        })
    }

    /// Remove a strategy. Returns whether it existed.
    pub fn remove_strategy(&self, id: &StrategyId) -> Result<bool, StorageError> {
        self.mutate(&[JournalEvent::StrategiesChanged], |prefs| {
            let before = prefs.strategies.len();
            prefs.strategies.retain(|s| &s.id != id);
            prefs.strategies.len() != before
        })
    }

    /// Watched symbols.
    pub fn watchlist(&self) -> Vec<String> {
        self.prefs.read().watchlist.clone()
    }

    /// Replace the watchlist.
    pub fn set_watchlist(&self, symbols: Vec<String>) -> Result<(), StorageError> {
        self.mutate(&[JournalEvent::WatchlistChanged], |prefs| {
            prefs.watchlist = symbols;
        })
    }

    /// Replace the UI preferences.
    pub fn set_ui_prefs(&self, ui_prefs: Value) -> Result<(), StorageError> {
        self.mutate(&[JournalEvent::UiPrefsChanged], |prefs| {
            prefs.ui_prefs = ui_prefs;
        })
    }

    /// Replace the journal column configuration.
    pub fn set_journal_config(&self, journal_config: Value) -> Result<(), StorageError> {
        self.mutate(&[JournalEvent::JournalConfigChanged], |prefs| {
            prefs.journal_config = journal_config;
        })
    }

    /// A single setting; `None` if unset or cleared.
    pub fn setting(&self, key: &str) -> Option<String> {
        self.prefs.read().settings.get(key).cloned().flatten()
    }

    /// Set or clear a setting.
    pub fn set_setting(&self, key: impl Into<String>, value: Option<String>) -> Result<(), StorageError> {
        let key = key.into();
        self.mutate(&[JournalEvent::SettingsChanged], |prefs| {
            prefs.settings.insert(key, value);
        })
    }

    /// Absorb the non-annotation part of an imported bundle.
    ///
    /// Strategies are overlaid by id (foreign replaces local, local-only
    /// kept). Settings are overlaid by key. The watchlist and the opaque
    /// preference documents are replaced when the bundle carries them.
    pub fn import(&self, incoming: Preferences) -> Result<(), StorageError> {
        let events = [
            JournalEvent::StrategiesChanged,
            JournalEvent::WatchlistChanged,
            JournalEvent::UiPrefsChanged,
            JournalEvent::JournalConfigChanged,
            JournalEvent::SettingsChanged,
        ];
        self.mutate(&events, |prefs| {
            for strategy in incoming.strategies {
                upsert_by_id(&mut prefs.strategies, strategy);
            }
            if !incoming.watchlist.is_empty() {
                prefs.watchlist = incoming.watchlist;
            }
            if !incoming.ui_prefs.is_null() {
                prefs.ui_prefs = incoming.ui_prefs;
            }
            if !incoming.journal_config.is_null() {
                prefs.journal_config = incoming.journal_config;
            }
            prefs.settings.extend(incoming.settings);
        })
    }

    /// Restore a previous snapshot (used to undo a failed import).
    pub fn restore(&self, previous: Preferences) -> Result<(), StorageError> {
        self.mutate(&[], |prefs| *prefs = previous)
    }

    fn mutate<R>(
        &self,
        events: &[JournalEvent],
        f: impl FnOnce(&mut Preferences) -> R,
    ) -> Result<R, StorageError> {
        let result = {
            let mut prefs = self.prefs.write();
            let previous = prefs.clone();
            let result = f(&mut prefs);

            if let Err(e) = self.persist(&prefs) {
                *prefs = previous;
                tracing::warn!(error = %e, "Preferences write failed, rolled back");
                return Err(e);
            }
            result
        };

        for event in events {
            self.events.publish(event.clone());
        }
        Ok(result)
    }

    fn persist(&self, prefs: &Preferences) -> Result<(), StorageError> {
        let json = serde_json::to_string(prefs).map_err(|e| StorageError::Serialize {
            message: e.to_string(),
        })?;
        self.storage.write(PREFERENCES_KEY, &json)
    }
}

fn upsert_by_id(strategies: &mut Vec<Strategy>, strategy: Strategy) {
    match strategies.iter_mut().find(|s| s.id == strategy.id) {
        Some(existing) => *existing = strategy,
        None => strategies.push(strategy),
    }
}
