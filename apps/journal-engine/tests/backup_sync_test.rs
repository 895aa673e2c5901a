//! Integration Tests for Backup, Import and the File Mirror
//!
//! Uses real file storage and a real mirror file in temporary directories.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use rust_decimal_macros::dec;
use serde_json::Value;
use tempfile::TempDir;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use journal_engine::application::services::SyncEvent;
use journal_engine::{
    AnnotationPatch, AnnotationStore, BackupSyncCoordinator, EventBus, FileMirrorTarget,
    FileStorage, PreferencesStore, Strategy, StrategyId, SyncError, TradeId,
};

struct Stack {
    events: EventBus,
    annotations: Arc<AnnotationStore>,
    preferences: Arc<PreferencesStore>,
    coordinator: Arc<BackupSyncCoordinator>,
}

fn open_stack(dir: &TempDir) -> Stack {
    let storage = Arc::new(FileStorage::open(dir.path().join("data")).unwrap());
    let events = EventBus::default();
    let annotations = Arc::new(AnnotationStore::open(storage.clone(), events.clone()).unwrap());
    let preferences = Arc::new(PreferencesStore::open(storage, events.clone()).unwrap());
    let coordinator = Arc::new(BackupSyncCoordinator::new(
        Arc::clone(&annotations),
        Arc::clone(&preferences),
        Duration::from_millis(20),
    ));
    Stack {
        events,
        annotations,
        preferences,
        coordinator,
    }
}

/// Wait for mirror writes until the written bundle satisfies `done`.
async fn wait_for_mirror(
    rx: &mut broadcast::Receiver<SyncEvent>,
    path: &std::path::Path,
    done: impl Fn(&Value) -> bool,
) -> Value {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let SyncEvent::Synced { .. } = rx.recv().await.unwrap() {
                let written = read_mirror(path);
                if done(&written) {
                    return written;
                }
            }
        }
    })
    .await
    .unwrap()
}

fn read_mirror(path: &std::path::Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

fn set_read_only(path: &std::path::Path, read_only: bool) {
    let mut permissions = std::fs::metadata(path).unwrap().permissions();
    permissions.set_readonly(read_only);
    std::fs::set_permissions(path, permissions).unwrap();
}

#[tokio::test]
async fn mirror_follows_edits_after_debounce() {
    let dir = TempDir::new().unwrap();
    let stack = open_stack(&dir);
    let mirror = dir.path().join("journal-backup.json");

    let status = stack
        .coordinator
        .connect(Arc::new(FileMirrorTarget::new(&mirror)))
        .await;
    assert!(status.is_active);
    assert_eq!(status.file_name.as_deref(), Some("journal-backup.json"));
    assert!(status.last_sync_time.is_some());

    let shutdown = CancellationToken::new();
    let task = stack
        .coordinator
        .spawn_auto_sync(&stack.events, shutdown.clone());
    let mut rx = stack.coordinator.subscribe();

    let trade = TradeId::new("100");
    for notes in ["first", "second", "final"] {
        stack
            .annotations
            .put(&trade, AnnotationPatch::default().notes(notes))
            .unwrap();
    }
    stack.preferences.set_watchlist(vec!["EURUSD".into()]).unwrap();

    let written = wait_for_mirror(&mut rx, &mirror, |bundle| {
        bundle["watchlist"][0] == "EURUSD"
    })
    .await;
    assert_eq!(written["version"], 1);
    assert_eq!(written["journalData"]["100"]["notes"], "final");
    assert_eq!(written["watchlist"][0], "EURUSD");

    shutdown.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn export_then_import_restores_a_fresh_journal() {
    let source_dir = TempDir::new().unwrap();
    let source = open_stack(&source_dir);
    source
        .annotations
        .put(
            &TradeId::new("100"),
            AnnotationPatch::default()
                .setup("London open breakout")
                .tags(["breakout", "eur"])
                .initial_stop_loss(dec!(1.0950)),
        )
        .unwrap();
    source
        .preferences
        .upsert_strategy(Strategy::new("Breakout"))
        .unwrap();
    source
        .preferences
        .set_setting("theme", Some("dark".into()))
        .unwrap();

    let bundle = source.coordinator.export_json().unwrap();

    let target_dir = TempDir::new().unwrap();
    let target = open_stack(&target_dir);
    let summary = target.coordinator.import_json(&bundle).unwrap();

    assert_eq!(summary.strategies, 1);
    assert_eq!(summary.annotations, 1);
    assert_eq!(
        target.annotations.get(&TradeId::new("100")),
        source.annotations.get(&TradeId::new("100"))
    );
    assert_eq!(target.preferences.strategies(), source.preferences.strategies());
    assert_eq!(target.preferences.setting("theme").as_deref(), Some("dark"));

    // Imported data is durable.
    drop(target);
    let reopened = open_stack(&target_dir);
    assert_eq!(
        reopened.annotations.pinned_initial_stop(&TradeId::new("100")),
        Some(dec!(1.0950))
    );
    assert_eq!(reopened.preferences.strategies().len(), 1);
}

#[tokio::test]
async fn foreign_strategy_replaces_local_one_with_the_same_id() {
    let dir = TempDir::new().unwrap();
    let stack = open_stack(&dir);

    let mut local = Strategy::new("Local breakout");
    local.id = StrategyId::new("abc");
    local.entry_rules = vec!["wait for retest".into()];
    stack.preferences.upsert_strategy(local).unwrap();

    let mut keep = Strategy::new("Mean reversion");
    keep.id = StrategyId::new("xyz");
    stack.preferences.upsert_strategy(keep.clone()).unwrap();

    let foreign = r#"{
        "timestamp": "2024-03-01T12:00:00Z",
        "version": 1,
        "strategies": [{"id": "abc", "name": "Foreign breakout"}]
    }"#;
    stack.coordinator.import_json(foreign).unwrap();

    let replaced = stack.preferences.strategy(&StrategyId::new("abc")).unwrap();
    assert_eq!(replaced.name, "Foreign breakout");
    assert!(replaced.entry_rules.is_empty());
    assert_eq!(stack.preferences.strategy(&StrategyId::new("xyz")), Some(keep));
}

#[tokio::test]
async fn malformed_bundle_changes_nothing() {
    let dir = TempDir::new().unwrap();
    let stack = open_stack(&dir);
    stack
        .annotations
        .put(&TradeId::new("7"), AnnotationPatch::default().notes("keep me"))
        .unwrap();

    let result = stack.coordinator.import_json("{\"journalData\": [");

    assert!(result.is_err());
    assert_eq!(stack.annotations.get(&TradeId::new("7")).unwrap().notes, "keep me");
}

#[tokio::test]
async fn revoked_permission_deactivates_once() {
    let dir = TempDir::new().unwrap();
    let stack = open_stack(&dir);
    let mirror = dir.path().join("journal-backup.json");

    stack
        .coordinator
        .connect(Arc::new(FileMirrorTarget::new(&mirror)))
        .await;
    assert!(stack.coordinator.is_active());
    let mut rx = stack.coordinator.subscribe();

    set_read_only(&mirror, true);

    stack
        .annotations
        .put(&TradeId::new("100"), AnnotationPatch::default().notes("one"))
        .unwrap();
    let first = stack.coordinator.sync_now().await;
    stack
        .annotations
        .put(&TradeId::new("100"), AnnotationPatch::default().notes("two"))
        .unwrap();
    let second = stack.coordinator.sync_now().await;

    assert!(matches!(first, Err(SyncError::PermissionRevoked { .. })));
    assert_eq!(second, Err(SyncError::Inactive));

    let status = stack.coordinator.status();
    assert!(!status.is_active);
    assert!(status.error.is_some());

    let mut deactivations = 0;
    while let Ok(event) = rx.try_recv() {
        if matches!(event, SyncEvent::Deactivated { .. }) {
            deactivations += 1;
        }
    }
    assert_eq!(deactivations, 1);

    // Reconnecting after permission is restored resumes mirroring.
    set_read_only(&mirror, false);
    let status = stack
        .coordinator
        .connect(Arc::new(FileMirrorTarget::new(&mirror)))
        .await;
    assert!(status.is_active);
    assert!(status.error.is_none());
    assert_eq!(read_mirror(&mirror)["journalData"]["100"]["notes"], "two");
}
