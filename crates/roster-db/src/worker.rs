//! Background persistence worker.
//!
//! The run loop publishes each completed view on a `watch` channel and
//! carries on; it never waits for I/O. This worker wakes on its own fixed
//! period, takes whatever view is current and saves it. A failed save is
//! reported and logged, and the same (or a newer) view is tried again at
//! the next period. On shutdown the latest view is flushed once more.
//!
//! ```text
//! run loop --(watch: Arc<RosterView>)--> worker --(save)--> SnapshotStore
//!                                          |
//!                                          +--(SaveOutcome)--> SaveObserver
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use roster_types::{PersistedState, RosterView};
use tokio::sync::{oneshot, watch};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info};

use crate::snapshot_store::SnapshotStore;

/// Result of one save attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The snapshot was written.
    Saved {
        /// Tick captured by the snapshot.
        tick: u64,
        /// Wall-clock time of the save.
        saved_at: DateTime<Utc>,
    },
    /// The write failed; it will be retried at the next period.
    Failed {
        /// Tick that was being saved.
        tick: u64,
        /// Wall-clock time of the attempt.
        attempted_at: DateTime<Utc>,
        /// The underlying cause.
        error: String,
    },
}

/// Receives every save outcome. Must not block.
pub trait SaveObserver: Send + Sync {
    /// Called after each save attempt.
    fn on_outcome(&self, outcome: &SaveOutcome);
}

/// An observer that ignores outcomes.
pub struct IgnoreOutcomes;

impl SaveObserver for IgnoreOutcomes {
    fn on_outcome(&self, _outcome: &SaveOutcome) {}
}

/// Totals for a finished worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistenceReport {
    /// Successful saves, the final flush included.
    pub saves: u32,
    /// Failed saves, the final flush included.
    pub failures: u32,
    /// Tick of the last successful save.
    pub last_saved_tick: Option<u64>,
}

/// Save the latest published view every `period` until `shutdown` fires,
/// then flush once more.
///
/// The first save happens one full period after start. A period with no
/// new tick since the last successful save is skipped.
pub async fn run_persistence<S: SnapshotStore>(
    store: Arc<S>,
    mut views: watch::Receiver<Option<Arc<RosterView>>>,
    period: Duration,
    observer: Arc<dyn SaveObserver>,
    mut shutdown: oneshot::Receiver<()>,
) -> PersistenceReport {
    let mut report = PersistenceReport::default();
    let mut timer = interval(period.max(Duration::from_millis(1)));
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick of an interval completes immediately.
    timer.tick().await;

    info!(
        period_ms = u64::try_from(period.as_millis()).unwrap_or(u64::MAX),
        "Persistence worker started"
    );

    loop {
        tokio::select! {
            _ = timer.tick() => {
                let view = views.borrow_and_update().clone();
                match view {
                    Some(view) if report.last_saved_tick == Some(view.tick) => {
                        debug!(tick = view.tick, "No new tick since last save");
                    }
                    Some(view) => {
                        save_view(store.as_ref(), &view, observer.as_ref(), &mut report).await;
                    }
                    None => debug!("Nothing published yet"),
                }
            }
            _ = &mut shutdown => break,
        }
    }

    // Final flush, even if this tick was already saved.
    let view = views.borrow().clone();
    if let Some(view) = view {
        save_view(store.as_ref(), &view, observer.as_ref(), &mut report).await;
    }
    info!(
        saves = report.saves,
        failures = report.failures,
        last_saved_tick = report.last_saved_tick,
        "Persistence worker stopped"
    );
    report
}

/// Save one view and report the outcome.
pub async fn save_view<S: SnapshotStore>(
    store: &S,
    view: &RosterView,
    observer: &dyn SaveObserver,
    report: &mut PersistenceReport,
) {
    let now = Utc::now();
    let state = PersistedState::from_view(view, now);
    let outcome = match store.save(&state).await {
        Ok(()) => {
            debug!(tick = view.tick, saved_at = %now, "Snapshot saved");
            report.saves = report.saves.saturating_add(1);
            report.last_saved_tick = Some(view.tick);
            SaveOutcome::Saved {
                tick: view.tick,
                saved_at: now,
            }
        }
        Err(err) => {
            error!(
                operation = "save",
                timestamp = %now,
                tick = view.tick,
                error = %err,
                "Snapshot save failed, will retry next interval"
            );
            report.failures = report.failures.saturating_add(1);
            SaveOutcome::Failed {
                tick: view.tick,
                attempted_at: now,
                error: err.to_string(),
            }
        }
    };
    observer.on_outcome(&outcome);
}
