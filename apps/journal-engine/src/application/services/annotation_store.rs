//! Annotation Store
//!
//! Durable, id-keyed overlay of the user-owned trade fields. Every mutation is
//! persisted through the local storage port before it becomes visible, and
//! announced on the event bus after it has been persisted.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use parking_lot::RwLock;
use rust_decimal::Decimal;

use crate::application::events::{EventBus, JournalEvent};
use crate::application::ports::{LocalStoragePort, StorageError};
use crate::domain::annotation::{AnnotationPatch, AnnotationRecord};
use crate::domain::shared::TradeId;

/// Storage key of the annotation map.
pub const ANNOTATIONS_KEY: &str = "journal_data";

/// Local annotation overlay.
pub struct AnnotationStore {
    records: RwLock<BTreeMap<TradeId, AnnotationRecord>>,
    storage: Arc<dyn LocalStoragePort>,
    events: EventBus,
}

impl std::fmt::Debug for AnnotationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnotationStore")
            .field("records", &self.records.read().len())
            .finish_non_exhaustive()
    }
}

impl AnnotationStore {
    /// Load the overlay from storage.
    ///
    /// A missing document is an empty overlay; an unparsable one is an error
    /// so that a corrupt file is never silently replaced.
    pub fn open(storage: Arc<dyn LocalStoragePort>, events: EventBus) -> Result<Self, StorageError> {
        let records = match storage.read(ANNOTATIONS_KEY)? {
            Some(raw) => serde_json::from_str(&raw).map_err(|e| StorageError::Corrupt {
                key: ANNOTATIONS_KEY.to_string(),
                message: e.to_string(),
            })?,
            None => BTreeMap::new(),
        };

        tracing::debug!(records = records.len(), "Annotation store loaded");

        Ok(Self {
            records: RwLock::new(records),
            storage,
            events,
        })
    }

    /// Annotation record for a trade.
    pub fn get(&self, trade_id: &TradeId) -> Option<AnnotationRecord> {
        self.records.read().get(trade_id).cloned()
    }

    /// Merge `patch` into the trade's record, creating it if needed.
    ///
    /// On a persistence failure the in-memory state is rolled back and no
    /// event is published.
    pub fn put(
        &self,
        trade_id: &TradeId,
        patch: AnnotationPatch,
    ) -> Result<AnnotationRecord, StorageError> {
        if patch.is_empty() {
            return Ok(self.get(trade_id).unwrap_or_default());
        }

        let updated = {
            let mut records = self.records.write();
            let previous = records.get(trade_id).cloned();
            let mut record = previous.clone().unwrap_or_default();
            patch.apply_to(&mut record);
            records.insert(trade_id.clone(), record.clone());

            if let Err(e) = self.persist(&records) {
                match previous {
                    Some(previous) => records.insert(trade_id.clone(), previous),
                    None => records.remove(trade_id),
                };
                tracing::warn!(trade_id = %trade_id, error = %e, "Annotation write failed, rolled back");
                return Err(e);
            }
            record
        };

        self.events.publish(JournalEvent::AnnotationChanged {
            trade_id: trade_id.clone(),
        });
        Ok(updated)
    }

    /// Every tag used on any record, deduplicated and sorted.
    pub fn all_tags(&self) -> BTreeSet<String> {
        self.records
            .read()
            .values()
            .flat_map(|record| record.tags.iter().cloned())
            .collect()
    }

    /// Pinned initial stop-loss for a trade.
    pub fn pinned_initial_stop(&self, trade_id: &TradeId) -> Option<Decimal> {
        self.records
            .read()
            .get(trade_id)
            .and_then(|record| record.initial_stop_loss)
    }

    /// Copy of the whole overlay.
    pub fn snapshot(&self) -> BTreeMap<TradeId, AnnotationRecord> {
        self.records.read().clone()
    }

    /// Run `f` against the overlay without copying it.
    pub fn with_records<R>(&self, f: impl FnOnce(&BTreeMap<TradeId, AnnotationRecord>) -> R) -> R {
        f(&self.records.read())
    }

    /// Replace records wholesale by id; ids not in `incoming` are kept.
    ///
    /// One persist and one notification for the whole batch. Returns the
    /// number of records written.
    pub fn overlay(
        &self,
        incoming: BTreeMap<TradeId, AnnotationRecord>,
    ) -> Result<usize, StorageError> {
        let count = incoming.len();
        if count == 0 {
            return Ok(0);
        }

        {
            let mut records = self.records.write();
            let previous = records.clone();
            records.extend(incoming);

            if let Err(e) = self.persist(&records) {
                *records = previous;
                return Err(e);
            }
        }

        self.events
            .publish(JournalEvent::AnnotationsImported { count });
        Ok(count)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether no trade has been annotated.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    fn persist(&self, records: &BTreeMap<TradeId, AnnotationRecord>) -> Result<(), StorageError> {
        let json = serde_json::to_string(records).map_err(|e| StorageError::Serialize {
            message: e.to_string(),
        })?;
        self.storage.write(ANNOTATIONS_KEY, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::InMemoryStorage;
    use rust_decimal_macros::dec;

    struct FailingStorage;

    impl LocalStoragePort for FailingStorage {
        fn read(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn write(&self, key: &str, _contents: &str) -> Result<(), StorageError> {
            Err(StorageError::Io {
                key: key.to_string(),
                message: "disk full".to_string(),
            })
        }
    }

    fn store() -> (AnnotationStore, Arc<InMemoryStorage>, EventBus) {
        let storage = Arc::new(InMemoryStorage::new());
        let events = EventBus::default();
        let store = AnnotationStore::open(storage.clone(), events.clone()).unwrap();
        (store, storage, events)
    }

    #[test]
    fn put_creates_then_merges() {
        let (store, _, _) = store();
        let id = TradeId::new("10");

        store
            .put(&id, AnnotationPatch::default().notes("first"))
            .unwrap();
        store
            .put(&id, AnnotationPatch::default().tags(["a", "b"]))
            .unwrap();

        let record = store.get(&id).unwrap();
        assert_eq!(record.notes, "first");
        assert_eq!(record.tags.len(), 2);
    }

    #[test]
    fn put_persists_and_reopens() {
        let (store, storage, events) = store();
        store
            .put(
                &TradeId::new("10"),
                AnnotationPatch::default().initial_stop_loss(dec!(1.0950)),
            )
            .unwrap();

        let reopened = AnnotationStore::open(storage, events).unwrap();
        assert_eq!(
            reopened.pinned_initial_stop(&TradeId::new("10")),
            Some(dec!(1.0950))
        );
    }

    #[test]
    fn put_rolls_back_on_storage_failure() {
        let store = AnnotationStore::open(Arc::new(FailingStorage), EventBus::default()).unwrap();
        let result = store.put(&TradeId::new("1"), AnnotationPatch::default().notes("x"));

        assert!(matches!(result, Err(StorageError::Io { .. })));
        assert!(store.get(&TradeId::new("1")).is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn put_publishes_change_event() {
        let (store, _, events) = store();
        let mut rx = events.subscribe();

        store
            .put(&TradeId::new("5"), AnnotationPatch::default().emotion("calm"))
            .unwrap();

        assert_eq!(
            rx.recv().await.unwrap(),
            JournalEvent::AnnotationChanged {
                trade_id: TradeId::new("5")
            }
        );
    }

    #[test]
    fn empty_patch_creates_nothing() {
        let (store, _, _) = store();
        store
            .put(&TradeId::new("1"), AnnotationPatch::default())
            .unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn all_tags_are_deduplicated_and_sorted() {
        let (store, _, _) = store();
        store
            .put(&TradeId::new("1"), AnnotationPatch::default().tags(["zeta", "alpha"]))
            .unwrap();
        store
            .put(&TradeId::new("2"), AnnotationPatch::default().tags(["alpha", "mid"]))
            .unwrap();

        let tags: Vec<String> = store.all_tags().into_iter().collect();
        assert_eq!(tags, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn overlay_replaces_by_id_and_keeps_local_only() {
        let (store, _, _) = store();
        store
            .put(
                &TradeId::new("1"),
                AnnotationPatch::default().notes("local").setup("breakout"),
            )
            .unwrap();
        store
            .put(&TradeId::new("2"), AnnotationPatch::default().notes("keep"))
            .unwrap();

        let incoming = BTreeMap::from([
            (
                TradeId::new("1"),
                AnnotationRecord {
                    notes: "foreign".to_string(),
                    ..AnnotationRecord::default()
                },
            ),
            (TradeId::new("3"), AnnotationRecord::default()),
        ]);
        assert_eq!(store.overlay(incoming).unwrap(), 2);

        let replaced = store.get(&TradeId::new("1")).unwrap();
        assert_eq!(replaced.notes, "foreign");
        assert_eq!(replaced.setup, "");
        assert_eq!(store.get(&TradeId::new("2")).unwrap().notes, "keep");
        assert!(store.get(&TradeId::new("3")).is_some());
    }

    #[test]
    fn corrupt_document_is_an_error() {
        let storage = Arc::new(InMemoryStorage::new());
        storage.write(ANNOTATIONS_KEY, "{not json").unwrap();
        let result = AnnotationStore::open(storage, EventBus::default());
        assert!(matches!(result, Err(StorageError::Corrupt { .. })));
    }
}
