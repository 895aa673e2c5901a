//! Backup Sync Coordinator
//!
//! Mirrors the journal bundle (annotations plus preferences) to an external
//! target and absorbs foreign bundles back into the local stores.
//!
//! # Write path
//!
//! Local mutations arrive on the engine [`EventBus`]. The auto-sync task
//! waits for the bus to stay quiet for the debounce delay, then performs one
//! write. Writes from any source go through a single async mutex, so at most
//! one write is in flight and later writes queue behind it.
//!
//! # Permission loss
//!
//! Every write re-checks permission first. A denial deactivates the mirror
//! exactly once: the status flips to inactive with the error recorded, one
//! [`SyncEvent::Deactivated`] is published, and every later write is skipped
//! until [`BackupSyncCoordinator::connect`] is called again.

use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::application::events::{EventBus, JournalEvent};
use crate::application::ports::{StorageError, SyncError, SyncTargetPort};
use crate::application::services::{AnnotationStore, Preferences, PreferencesStore};
use crate::domain::backup::{BACKUP_VERSION, BackupSnapshot, SyncStatus};

/// Default debounce delay between the last mutation and the mirror write.
pub const DEFAULT_SYNC_DEBOUNCE: Duration = Duration::from_secs(1);

/// Import/export error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackupError {
    /// The bundle could not be parsed.
    #[error("Malformed backup: {message}")]
    Malformed {
        /// Parser message.
        message: String,
    },

    /// The bundle was written by a newer format.
    #[error("Unsupported backup version {found} (max {supported})")]
    UnsupportedVersion {
        /// Version in the bundle.
        found: u32,
        /// Newest version this build reads.
        supported: u32,
    },

    /// The bundle could not be serialized.
    #[error("Backup serialization error: {message}")]
    Serialize {
        /// Error details.
        message: String,
    },

    /// Writing the imported data locally failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Mirror lifecycle notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// A target was connected.
    Connected {
        /// Target file name.
        file_name: String,
    },
    /// A write completed.
    Synced {
        /// Completion time.
        at: DateTime<Utc>,
    },
    /// The target lost write permission and auto-sync stopped.
    Deactivated {
        /// Recorded error.
        error: String,
    },
}

/// Counts reported by an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Strategies written.
    pub strategies: usize,
    /// Annotation records written.
    pub annotations: usize,
}

/// Coordinates the external mirror.
pub struct BackupSyncCoordinator {
    annotations: Arc<AnnotationStore>,
    preferences: Arc<PreferencesStore>,
    target: RwLock<Option<Arc<dyn SyncTargetPort>>>,
    status: RwLock<SyncStatus>,
    write_guard: tokio::sync::Mutex<()>,
    sync_tx: broadcast::Sender<SyncEvent>,
    debounce: Duration,
}

impl std::fmt::Debug for BackupSyncCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackupSyncCoordinator")
            .field("status", &*self.status.read())
            .field("debounce", &self.debounce)
            .finish_non_exhaustive()
    }
}

impl BackupSyncCoordinator {
    /// Create a coordinator with no target connected.
    #[must_use]
    pub fn new(
        annotations: Arc<AnnotationStore>,
        preferences: Arc<PreferencesStore>,
        debounce: Duration,
    ) -> Self {
        let (sync_tx, _) = broadcast::channel(64);
        Self {
            annotations,
            preferences,
            target: RwLock::new(None),
            status: RwLock::new(SyncStatus::default()),
            write_guard: tokio::sync::Mutex::new(()),
            sync_tx,
            debounce,
        }
    }

    /// Current mirror status.
    pub fn status(&self) -> SyncStatus {
        self.status.read().clone()
    }

    /// Whether auto-sync is writing to a target.
    pub fn is_active(&self) -> bool {
        self.status.read().is_active
    }

    /// Subscribe to lifecycle notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.sync_tx.subscribe()
    }

    /// Connect a target and write the current bundle to it.
    ///
    /// A target that fails the permission check is not connected; the
    /// returned status carries the error.
    pub async fn connect(&self, target: Arc<dyn SyncTargetPort>) -> SyncStatus {
        let file_name = target.name();

        {
            let _writer = self.write_guard.lock().await;

            if let Err(e) = target.check_permission().await {
                tracing::warn!(target = %file_name, error = %e, "Sync target not writable");
                let mut status = self.status.write();
                status.is_active = false;
                status.error = Some(e.to_string());
                return status.clone();
            }

            *self.target.write() = Some(target);
            {
                let mut status = self.status.write();
                status.is_active = true;
                status.file_name = Some(file_name.clone());
                status.error = None;
            }
        }

        tracing::info!(target = %file_name, "Sync target connected");
        let _ = self.sync_tx.send(SyncEvent::Connected { file_name });

        if let Err(e) = self.sync_now().await {
            tracing::warn!(error = %e, "Initial sync failed");
        }
        self.status()
    }

    /// Disconnect the current target without recording an error.
    pub async fn disconnect(&self) {
        let _writer = self.write_guard.lock().await;
        *self.target.write() = None;
        self.status.write().is_active = false;
    }

    /// Serialize the bundle and write it to the connected target.
    ///
    /// Queues behind any write already in flight.
    pub async fn sync_now(&self) -> Result<(), SyncError> {
        let _writer = self.write_guard.lock().await;

        let target = {
            if !self.status.read().is_active {
                return Err(SyncError::Inactive);
            }
            self.target.read().clone().ok_or(SyncError::Inactive)?
        };

        let json = self.export_json().map_err(|e| SyncError::Serialize {
            message: e.to_string(),
        })?;

        if let Err(e) = target.check_permission().await {
            self.deactivate(&e);
            return Err(e);
        }

        if let Err(e) = target.write(&json).await {
            if matches!(e, SyncError::PermissionRevoked { .. }) {
                self.deactivate(&e);
            } else {
                tracing::warn!(target = %target.name(), error = %e, "Sync write failed");
                self.status.write().error = Some(e.to_string());
            }
            return Err(e);
        }

        let at = Utc::now();
        {
            let mut status = self.status.write();
            status.last_sync_time = Some(at);
            status.error = None;
        }
        tracing::debug!(target = %target.name(), bytes = json.len(), "Journal mirrored");
        let _ = self.sync_tx.send(SyncEvent::Synced { at });
        Ok(())
    }

    fn deactivate(&self, error: &SyncError) {
        let message = error.to_string();
        {
            let mut status = self.status.write();
            if !status.is_active {
                return;
            }
            status.is_active = false;
            status.error = Some(message.clone());
        }
        tracing::warn!(error = %message, "Sync target deactivated");
        let _ = self.sync_tx.send(SyncEvent::Deactivated { error: message });
    }

    /// Start the debounced auto-sync task.
    ///
    /// The task holds only a weak reference and exits when the coordinator is
    /// dropped, the bus closes, or `shutdown` is cancelled.
    pub fn spawn_auto_sync(
        self: &Arc<Self>,
        events: &EventBus,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        let rx = events.subscribe();
        let weak = Arc::downgrade(self);
        let debounce = self.debounce;
        tokio::spawn(auto_sync_loop(weak, rx, debounce, shutdown))
    }

    /// Current bundle.
    pub fn export(&self) -> BackupSnapshot {
        let prefs = self.preferences.snapshot();
        BackupSnapshot {
            timestamp: Utc::now(),
            version: BACKUP_VERSION,
            strategies: prefs.strategies,
            journal_data: self.annotations.snapshot(),
            watchlist: prefs.watchlist,
            ui_prefs: prefs.ui_prefs,
            journal_config: prefs.journal_config,
            settings: prefs.settings,
        }
    }

    /// Current bundle as pretty-printed JSON.
    pub fn export_json(&self) -> Result<String, BackupError> {
        serde_json::to_string_pretty(&self.export()).map_err(|e| BackupError::Serialize {
            message: e.to_string(),
        })
    }

    /// Parse and absorb a foreign bundle.
    ///
    /// Nothing is mutated if the bundle does not parse.
    pub fn import_json(&self, json: &str) -> Result<ImportSummary, BackupError> {
        let snapshot: BackupSnapshot =
            serde_json::from_str(json).map_err(|e| BackupError::Malformed {
                message: e.to_string(),
            })?;
        self.import(snapshot)
    }

    /// Absorb a foreign bundle.
    ///
    /// Strategies and annotation records are overlaid per id: a foreign
    /// entry replaces the local one wholesale, local-only entries are kept,
    /// foreign-only entries are added.
    pub fn import(&self, snapshot: BackupSnapshot) -> Result<ImportSummary, BackupError> {
        if snapshot.version > BACKUP_VERSION {
            return Err(BackupError::UnsupportedVersion {
                found: snapshot.version,
                supported: BACKUP_VERSION,
            });
        }

        let summary = ImportSummary {
            strategies: snapshot.strategies.len(),
            annotations: snapshot.journal_data.len(),
        };

        let previous = self.preferences.snapshot();
        self.preferences.import(Preferences {
            strategies: snapshot.strategies,
            watchlist: snapshot.watchlist,
            ui_prefs: snapshot.ui_prefs,
            journal_config: snapshot.journal_config,
            settings: snapshot.settings,
        })?;

        if let Err(e) = self.annotations.overlay(snapshot.journal_data) {
            if let Err(restore) = self.preferences.restore(previous) {
                tracing::error!(error = %restore, "Failed to roll back preferences after import");
            }
            return Err(e.into());
        }

        tracing::info!(
            strategies = summary.strategies,
            annotations = summary.annotations,
            "Backup imported"
        );
        Ok(summary)
    }
}

async fn auto_sync_loop(
    coordinator: Weak<BackupSyncCoordinator>,
    mut rx: broadcast::Receiver<JournalEvent>,
    debounce: Duration,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            received = rx.recv() => {
                if matches!(received, Err(broadcast::error::RecvError::Closed)) {
                    break;
                }
            }
            () = shutdown.cancelled() => break,
        }

        let mut deadline = Instant::now() + debounce;
        let mut closed = false;
        loop {
            tokio::select! {
                () = tokio::time::sleep_until(deadline) => break,
                received = rx.recv() => match received {
                    Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {
                        deadline = Instant::now() + debounce;
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        closed = true;
                        break;
                    }
                },
                () = shutdown.cancelled() => return,
            }
        }

        let Some(this) = coordinator.upgrade() else {
            break;
        };
        if this.is_active() {
            if let Err(e) = this.sync_now().await {
                tracing::debug!(error = %e, "Debounced sync skipped");
            }
        }
        if closed {
            break;
        }
    }
    tracing::debug!("Auto-sync task stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::annotation::AnnotationPatch;
    use crate::domain::shared::TradeId;
    use crate::infrastructure::persistence::InMemoryStorage;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct RecordingTarget {
        revoked: AtomicBool,
        writes: Mutex<Vec<String>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        write_delay: Option<Duration>,
    }

    #[async_trait]
    impl SyncTargetPort for RecordingTarget {
        fn name(&self) -> String {
            "journal-backup.json".to_string()
        }

        async fn check_permission(&self) -> Result<(), SyncError> {
            if self.revoked.load(Ordering::SeqCst) {
                return Err(SyncError::PermissionRevoked {
                    target: self.name(),
                    reason: "access denied".to_string(),
                });
            }
            Ok(())
        }

        async fn write(&self, contents: &str) -> Result<(), SyncError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if let Some(delay) = self.write_delay {
                tokio::time::sleep(delay).await;
            }
            self.writes.lock().push(contents.to_string());
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Fixture {
        coordinator: Arc<BackupSyncCoordinator>,
        annotations: Arc<AnnotationStore>,
        events: EventBus,
    }

    fn fixture() -> Fixture {
        let storage = Arc::new(InMemoryStorage::new());
        let events = EventBus::default();
        let annotations = Arc::new(AnnotationStore::open(storage.clone(), events.clone()).unwrap());
        let preferences = Arc::new(PreferencesStore::open(storage, events.clone()).unwrap());
        let coordinator = Arc::new(BackupSyncCoordinator::new(
            Arc::clone(&annotations),
            preferences,
            Duration::from_millis(500),
        ));
        Fixture {
            coordinator,
            annotations,
            events,
        }
    }

    #[tokio::test]
    async fn connect_activates_and_writes_initial_bundle() {
        let f = fixture();
        let target = Arc::new(RecordingTarget::default());

        let status = f.coordinator.connect(target.clone()).await;

        assert!(status.is_active);
        assert_eq!(status.file_name.as_deref(), Some("journal-backup.json"));
        assert!(status.last_sync_time.is_some());
        assert_eq!(target.writes.lock().len(), 1);
    }

    #[tokio::test]
    async fn connect_to_unwritable_target_reports_error() {
        let f = fixture();
        let target = Arc::new(RecordingTarget::default());
        target.revoked.store(true, Ordering::SeqCst);

        let status = f.coordinator.connect(target.clone()).await;

        assert!(!status.is_active);
        assert!(status.error.is_some());
        assert!(target.writes.lock().is_empty());
    }

    #[tokio::test]
    async fn revoked_permission_deactivates_once() {
        let f = fixture();
        let target = Arc::new(RecordingTarget::default());
        f.coordinator.connect(target.clone()).await;
        let mut rx = f.coordinator.subscribe();

        target.revoked.store(true, Ordering::SeqCst);
        let first = f.coordinator.sync_now().await;
        let second = f.coordinator.sync_now().await;

        assert!(matches!(first, Err(SyncError::PermissionRevoked { .. })));
        assert_eq!(second, Err(SyncError::Inactive));

        let status = f.coordinator.status();
        assert!(!status.is_active);
        assert!(status.error.unwrap().contains("access denied"));

        assert!(matches!(rx.try_recv(), Ok(SyncEvent::Deactivated { .. })));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn reconnect_clears_error() {
        let f = fixture();
        let target = Arc::new(RecordingTarget::default());
        f.coordinator.connect(target.clone()).await;
        target.revoked.store(true, Ordering::SeqCst);
        let _ = f.coordinator.sync_now().await;

        target.revoked.store(false, Ordering::SeqCst);
        let status = f.coordinator.connect(target.clone()).await;

        assert!(status.is_active);
        assert_eq!(status.error, None);
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_writes_are_serialized() {
        let f = fixture();
        let target = Arc::new(RecordingTarget {
            write_delay: Some(Duration::from_millis(50)),
            ..RecordingTarget::default()
        });
        f.coordinator.connect(target.clone()).await;

        let (a, b) = tokio::join!(f.coordinator.sync_now(), f.coordinator.sync_now());

        assert!(a.is_ok() && b.is_ok());
        assert_eq!(target.writes.lock().len(), 3);
        assert_eq!(target.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn burst_of_edits_is_coalesced_into_one_write() {
        let f = fixture();
        let target = Arc::new(RecordingTarget::default());
        f.coordinator.connect(target.clone()).await;
        let shutdown = CancellationToken::new();
        let task = f.coordinator.spawn_auto_sync(&f.events, shutdown.clone());

        for i in 0..5 {
            f.annotations
                .put(
                    &TradeId::new(i.to_string()),
                    AnnotationPatch::default().notes("burst"),
                )
                .unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        tokio::time::sleep(Duration::from_millis(1_000)).await;

        assert_eq!(target.writes.lock().len(), 2);
        let last = target.writes.lock().last().cloned().unwrap();
        assert!(last.contains("\"4\""));

        shutdown.cancel();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn auto_sync_stays_quiet_when_inactive() {
        let f = fixture();
        let target = Arc::new(RecordingTarget::default());
        f.coordinator.connect(target.clone()).await;
        target.revoked.store(true, Ordering::SeqCst);
        let shutdown = CancellationToken::new();
        let _task = f.coordinator.spawn_auto_sync(&f.events, shutdown.clone());

        for i in 0..2 {
            f.annotations
                .put(&TradeId::new(i.to_string()), AnnotationPatch::default().notes("x"))
                .unwrap();
            tokio::time::sleep(Duration::from_millis(1_000)).await;
        }

        let status = f.coordinator.status();
        assert!(!status.is_active);
        assert_eq!(target.writes.lock().len(), 1);
        shutdown.cancel();
    }

    #[test]
    fn malformed_import_mutates_nothing() {
        let f = fixture();
        f.annotations
            .put(&TradeId::new("1"), AnnotationPatch::default().notes("keep"))
            .unwrap();

        let result = f.coordinator.import_json("{\"version\": 1, \"journalData\": [");

        assert!(matches!(result, Err(BackupError::Malformed { .. })));
        assert_eq!(f.annotations.len(), 1);
        assert_eq!(f.annotations.get(&TradeId::new("1")).unwrap().notes, "keep");
    }

    #[test]
    fn newer_version_is_rejected() {
        let f = fixture();
        let mut snapshot = f.coordinator.export();
        snapshot.version = BACKUP_VERSION + 1;
        assert!(matches!(
            f.coordinator.import(snapshot),
            Err(BackupError::UnsupportedVersion { .. })
        ));
    }
}
