//! End-to-end tests for the assembled roster system.
//!
//! Runs use paused tokio time, so tick sleeps and persistence periods
//! elapse instantly and in order.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use roster_core::config::RosterConfig;
use roster_core::operator::SimulationEndReason;
use roster_db::{FileSnapshotStore, MemorySnapshotStore, SnapshotStore};
use roster_engine::{EngineError, RosterSystem};
use roster_types::{ActivityKind, Status};

fn config(size: u32, max_ticks: u64) -> RosterConfig {
    let mut config = RosterConfig::default();
    config.population.size = size;
    config.world.tick_interval_ms = 100;
    config.simulation.max_ticks = max_ticks;
    config.activity.max_length = 10_000;
    config
}

#[test]
fn zero_population_refuses_to_start() {
    let result = RosterSystem::new(config(0, 10), Arc::new(MemorySnapshotStore::new()));
    assert!(matches!(result, Err(EngineError::Config { .. })));
}

#[tokio::test(start_paused = true)]
async fn fifty_ticks_keep_invariants_and_credits() {
    let mut config = config(10, 50);
    config.probabilities.spending_scale = 0.0;
    let store = Arc::new(MemorySnapshotStore::new());
    let mut system = RosterSystem::new(config, Arc::clone(&store)).unwrap();

    system.start().await.unwrap();
    let initial = system.snapshot().expect("initial view published");
    assert_eq!(initial.population, 10);

    let report = system.wait().await.unwrap();
    assert_eq!(report.simulation.end_reason, SimulationEndReason::MaxTicksReached);
    assert_eq!(report.simulation.total_ticks, 50);

    let view = system.view().unwrap();
    assert_eq!(view.tick, 50);
    assert_eq!(view.minions.len(), 10);
    let by_status: u32 = Status::ALL.iter().map(|s| view.aggregate.count(*s)).sum();
    assert_eq!(by_status, 10);
    assert_eq!(
        view.minions.iter().map(|m| m.credits).sum::<u64>(),
        view.aggregate.total_credits
    );
    assert!(view.aggregate.total_credits >= initial.total_credits);

    // Final flush captured the last tick.
    assert_eq!(store.current().await.unwrap().tick, 50);
    assert!(report.persistence.unwrap().saves >= 1);
}

#[tokio::test(start_paused = true)]
async fn injected_save_failure_does_not_stop_ticks() {
    let mut config = config(6, 30);
    config.persistence.interval_ms = 1_000;
    let store = Arc::new(MemorySnapshotStore::new());
    store.fail_next_saves(1);
    let mut system = RosterSystem::new(config, Arc::clone(&store)).unwrap();

    system.start().await.unwrap();
    let report = system.wait().await.unwrap();

    assert_eq!(report.simulation.total_ticks, 30);
    let persistence = report.persistence.unwrap();
    assert_eq!(persistence.failures, 1);
    assert!(persistence.saves >= 1);

    let health = system.operator().persistence_health();
    assert!(health.last_error.is_some());
    assert_eq!(health.consecutive_failures, 0);
    assert_eq!(store.current().await.unwrap().tick, 30);

    let activity = system.recent_activity(10_000);
    assert!(
        activity
            .iter()
            .any(|r| r.kind == ActivityKind::Fault && r.message.contains("failed to save"))
    );
}

#[tokio::test(start_paused = true)]
async fn restart_resumes_from_saved_snapshot() {
    let store = Arc::new(MemorySnapshotStore::new());

    let mut first = RosterSystem::new(config(5, 5), Arc::clone(&store)).unwrap();
    first.start().await.unwrap();
    first.wait().await.unwrap();
    let saved = store.current().await.unwrap();
    assert_eq!(saved.tick, 5);

    let mut second = RosterSystem::new(config(5, 8), Arc::clone(&store)).unwrap();
    second.start().await.unwrap();
    let restored = second.view().unwrap();
    assert_eq!(restored.tick, 5);
    assert_eq!(restored.minions, saved.entities);

    let report = second.wait().await.unwrap();
    assert_eq!(report.simulation.total_ticks, 3);
    assert_eq!(report.simulation.final_summary.unwrap().tick, 8);
}

#[tokio::test(start_paused = true)]
async fn mismatched_snapshot_falls_back_to_fresh_population() {
    let store = Arc::new(MemorySnapshotStore::new());
    let mut first = RosterSystem::new(config(4, 3), Arc::clone(&store)).unwrap();
    first.start().await.unwrap();
    first.wait().await.unwrap();

    let mut second = RosterSystem::new(config(7, 3), Arc::clone(&store)).unwrap();
    second.start().await.unwrap();
    let view = second.view().unwrap();
    assert_eq!(view.tick, 0);
    assert_eq!(view.minions.len(), 7);
    second.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn stop_finishes_tick_and_flushes() {
    let store = Arc::new(MemorySnapshotStore::new());
    let mut system = RosterSystem::new(config(3, 0), Arc::clone(&store)).unwrap();
    system.start().await.unwrap();
    assert!(system.is_running());

    tokio::time::sleep(std::time::Duration::from_millis(1_050)).await;
    let report = system.stop().await.unwrap();

    assert_eq!(report.simulation.end_reason, SimulationEndReason::OperatorStop);
    assert!(!system.is_running());
    let last_tick = system.view().unwrap().tick;
    assert!(last_tick >= 1);
    assert_eq!(store.current().await.unwrap().tick, last_tick);
    assert!(matches!(system.wait().await, Err(EngineError::NotRunning)));
}

#[tokio::test(start_paused = true)]
async fn second_start_is_rejected() {
    let mut system =
        RosterSystem::new(config(2, 0), Arc::new(MemorySnapshotStore::new())).unwrap();
    system.start().await.unwrap();
    assert!(matches!(system.start().await, Err(EngineError::AlreadyRunning)));
    system.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn disabled_persistence_never_saves() {
    let mut config = config(3, 4);
    config.persistence.enabled = false;
    let store = Arc::new(MemorySnapshotStore::new());
    let mut system = RosterSystem::new(config, Arc::clone(&store)).unwrap();

    system.start().await.unwrap();
    let report = system.wait().await.unwrap();

    assert!(report.persistence.is_none());
    assert_eq!(store.save_attempts(), 0);
}

#[tokio::test(start_paused = true)]
async fn reset_regenerates_population_before_first_tick() {
    let mut system =
        RosterSystem::new(config(5, 3), Arc::new(MemorySnapshotStore::new())).unwrap();
    system.reset();
    system.start().await.unwrap();
    system.wait().await.unwrap();

    let view = system.view().unwrap();
    assert_eq!(view.tick, 3);
    assert_eq!(view.minions.len(), 5);
    let resets: Vec<u64> = view
        .activity
        .iter()
        .filter(|r| r.kind == ActivityKind::Operator)
        .map(|r| r.tick)
        .collect();
    assert_eq!(resets, vec![0]);
}

#[tokio::test]
async fn recent_activity_is_newest_first() {
    let mut system =
        RosterSystem::new(config(4, 6), Arc::new(MemorySnapshotStore::new())).unwrap();
    system.start().await.unwrap();
    system.wait().await.unwrap();

    let activity = system.recent_activity(5);
    assert!(activity.len() <= 5);
    assert!(activity.windows(2).all(|w| matches!(w, [a, b] if a.tick >= b.tick)));
}

#[tokio::test]
async fn file_store_round_trip_through_system() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileSnapshotStore::new(dir.path().join("roster.json")));
    let mut system = RosterSystem::new(config(3, 2), Arc::clone(&store)).unwrap();
    system.start().await.unwrap();
    system.wait().await.unwrap();

    let loaded = store.load().await.unwrap().unwrap();
    assert_eq!(loaded.tick, 2);
    assert_eq!(loaded.entities, system.view().unwrap().minions);
}
