//! Integration tests for the snapshot stores and the persistence worker.
//!
//! File store tests write into `tempfile` directories. Worker tests use the
//! in-memory store and paused tokio time, so periods elapse instantly.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use roster_agents::{PopulationParams, compute_snapshot, create_population};
use roster_db::{
    FileSnapshotStore, MemorySnapshotStore, SaveObserver, SaveOutcome, SnapshotStore,
    load_latest, run_persistence,
};
use roster_types::{PersistedState, RosterView};
use tokio::sync::{oneshot, watch};

fn view(tick: u64, size: u32) -> RosterView {
    let mut rng = StdRng::seed_from_u64(tick);
    let minions = create_population(size, &PopulationParams::default(), &mut rng).unwrap();
    RosterView {
        tick,
        sim_time: DateTime::from_timestamp(1_735_711_200, 0).unwrap(),
        aggregate: compute_snapshot(&minions),
        minions,
        activity: Vec::new(),
    }
}

fn snapshot(tick: u64) -> PersistedState {
    PersistedState::from_view(&view(tick, 12), Utc::now())
}

#[derive(Default)]
struct Recorder {
    outcomes: Mutex<Vec<SaveOutcome>>,
}

impl Recorder {
    fn outcomes(&self) -> Vec<SaveOutcome> {
        self.outcomes.lock().unwrap().clone()
    }
}

impl SaveObserver for Recorder {
    fn on_outcome(&self, outcome: &SaveOutcome) {
        self.outcomes.lock().unwrap().push(outcome.clone());
    }
}

// =========================================================================
// File store
// =========================================================================

#[tokio::test]
async fn file_round_trip_preserves_entities_and_aggregate() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileSnapshotStore::new(dir.path().join("nested").join("snapshot.json"));
    let state = snapshot(7);

    store.save(&state).await.unwrap();
    let loaded = store.load().await.unwrap().expect("snapshot present");

    assert_eq!(loaded.entities, state.entities);
    assert_eq!(loaded.aggregate, state.aggregate);
    assert_eq!(loaded.tick, 7);
}

#[tokio::test]
async fn document_uses_expected_top_level_keys() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snapshot.json");
    let store = FileSnapshotStore::new(&path);
    store.save(&snapshot(1)).await.unwrap();

    let raw: serde_json::Value =
        serde_json::from_slice(&tokio::fs::read(&path).await.unwrap()).unwrap();
    assert!(raw.get("entities").is_some_and(serde_json::Value::is_array));
    let entity = raw.get("entities").and_then(|e| e.get(0)).unwrap();
    assert!(entity.get("hoursWorkedInShift").is_some());
    assert!(raw.get("aggregate").is_some());
    assert!(raw.get("savedAt").is_some_and(serde_json::Value::is_string));
}

#[tokio::test]
async fn save_replaces_and_leaves_no_temp_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snapshot.json");
    let store = FileSnapshotStore::new(&path);

    store.save(&snapshot(1)).await.unwrap();
    store.save(&snapshot(2)).await.unwrap();

    assert_eq!(store.load().await.unwrap().unwrap().tick, 2);
    let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await.unwrap() {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    assert_eq!(names, vec!["snapshot.json".to_owned()]);
}

#[tokio::test]
async fn corrupt_file_loads_as_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snapshot.json");
    tokio::fs::write(&path, b"not json at all").await.unwrap();
    let store = FileSnapshotStore::new(&path);

    assert!(store.load().await.is_err());
    assert!(load_latest(&store).await.is_none());
}

#[tokio::test]
async fn missing_file_loads_as_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileSnapshotStore::new(dir.path().join("never-written.json"));
    assert!(load_latest(&store).await.is_none());
}

// =========================================================================
// Memory store
// =========================================================================

#[tokio::test]
async fn failed_save_keeps_previous_snapshot() {
    let store = MemorySnapshotStore::new();
    store.save(&snapshot(3)).await.unwrap();
    store.fail_next_saves(1);

    assert!(store.save(&snapshot(4)).await.is_err());
    assert_eq!(store.current().await.unwrap().tick, 3);

    store.save(&snapshot(5)).await.unwrap();
    assert_eq!(store.current().await.unwrap().tick, 5);
    assert_eq!(store.save_attempts(), 3);
}

// =========================================================================
// Worker
// =========================================================================

#[tokio::test(start_paused = true)]
async fn worker_saves_on_its_own_period() {
    let store = Arc::new(MemorySnapshotStore::new());
    let recorder = Arc::new(Recorder::default());
    let (views_tx, views_rx) = watch::channel(None);
    let (stop_tx, stop_rx) = oneshot::channel();

    let worker = tokio::spawn(run_persistence(
        Arc::clone(&store),
        views_rx,
        Duration::from_secs(30),
        recorder.clone(),
        stop_rx,
    ));

    views_tx.send_replace(Some(Arc::new(view(10, 5))));
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(store.save_attempts(), 0);

    tokio::time::sleep(Duration::from_secs(25)).await;
    assert_eq!(store.current().await.unwrap().tick, 10);

    stop_tx.send(()).unwrap();
    let report = worker.await.unwrap();
    assert_eq!(report.saves, 2);
    assert_eq!(report.last_saved_tick, Some(10));
    assert!(
        recorder
            .outcomes()
            .iter()
            .all(|o| matches!(o, SaveOutcome::Saved { tick: 10, .. }))
    );
}

#[tokio::test(start_paused = true)]
async fn failed_save_is_reported_and_retried() {
    let store = Arc::new(MemorySnapshotStore::new());
    store.fail_next_saves(1);
    let recorder = Arc::new(Recorder::default());
    let (views_tx, views_rx) = watch::channel(None);
    let (stop_tx, stop_rx) = oneshot::channel();

    let worker = tokio::spawn(run_persistence(
        Arc::clone(&store),
        views_rx,
        Duration::from_secs(1),
        recorder.clone(),
        stop_rx,
    ));

    views_tx.send_replace(Some(Arc::new(view(3, 4))));
    tokio::time::sleep(Duration::from_millis(1_500)).await;
    assert!(matches!(
        recorder.outcomes().first(),
        Some(SaveOutcome::Failed { tick: 3, .. })
    ));
    assert!(store.current().await.is_none());

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(store.current().await.unwrap().tick, 3);

    stop_tx.send(()).unwrap();
    let report = worker.await.unwrap();
    assert_eq!(report.failures, 1);
}

#[tokio::test(start_paused = true)]
async fn shutdown_flushes_latest_view() {
    let store = Arc::new(MemorySnapshotStore::new());
    let (views_tx, views_rx) = watch::channel(None);
    let (stop_tx, stop_rx) = oneshot::channel();

    let worker = tokio::spawn(run_persistence(
        Arc::clone(&store),
        views_rx,
        Duration::from_secs(3_600),
        Arc::new(roster_db::IgnoreOutcomes),
        stop_rx,
    ));

    views_tx.send_replace(Some(Arc::new(view(42, 3))));
    stop_tx.send(()).unwrap();
    let report = worker.await.unwrap();

    assert_eq!(report.saves, 1);
    assert_eq!(store.current().await.unwrap().tick, 42);
}
