//! The roster system context object.
//!
//! [`RosterSystem`] owns everything a run needs: the validated
//! configuration, the snapshot store, the operator state and the channel
//! on which each completed tick is published. Nothing is global; every
//! collaborator is handed in at construction.
//!
//! # Lifecycle
//!
//! 1. [`RosterSystem::new`] validates the configuration (a bad value is
//!    fatal here and nowhere else).
//! 2. [`RosterSystem::start`] restores the latest snapshot or generates a
//!    fresh population, publishes the initial view, then spawns the tick
//!    loop and the persistence worker.
//! 3. [`RosterSystem::stop`] lets the in-flight tick finish, stops the
//!    loop, flushes a final save and returns the run report.
//!    [`RosterSystem::wait`] does the same for a run that ends by itself.

use std::sync::Arc;
use std::time::Duration;

use roster_core::config::RosterConfig;
use roster_core::operator::OperatorState;
use roster_core::restore::restore_state;
use roster_core::runner::{RunnerError, SimulationResult, log_simulation_end, run_simulation};
use roster_core::tick::{SimulationState, TickError};
use roster_db::{PersistenceReport, SnapshotStore, load_latest, run_persistence};
use roster_observer::AppState;
use roster_types::{ActivityKind, ActivityRecord, AggregateSnapshot, RosterView};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::callback::{PublishCallback, ViewSender, publish};
use crate::error::EngineError;
use crate::health::OperatorSaveObserver;

/// What a finished run produced.
#[derive(Debug)]
pub struct RunReport {
    /// How the tick loop ended.
    pub simulation: SimulationResult,
    /// Persistence totals, `None` when persistence is disabled.
    pub persistence: Option<PersistenceReport>,
}

struct PersistenceTask {
    handle: JoinHandle<PersistenceReport>,
    stop: oneshot::Sender<()>,
}

impl PersistenceTask {
    async fn finish(self) -> Result<PersistenceReport, EngineError> {
        if self.stop.send(()).is_err() {
            debug!("Persistence worker already gone");
        }
        self.handle.await.map_err(|e| EngineError::Task {
            message: format!("persistence worker: {e}"),
        })
    }
}

struct Running {
    simulation: JoinHandle<Result<SimulationResult, RunnerError>>,
    persistence: Option<PersistenceTask>,
}

/// The assembled simulation: scheduler, persistence and readers.
pub struct RosterSystem<S> {
    config: RosterConfig,
    store: Arc<S>,
    operator: Arc<OperatorState>,
    views: Arc<ViewSender>,
    app: Arc<AppState>,
    running: Option<Running>,
}

impl<S: SnapshotStore + 'static> RosterSystem<S> {
    /// Assemble a system around `store`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] if the configuration is invalid.
    pub fn new(config: RosterConfig, store: Arc<S>) -> Result<Self, EngineError> {
        config.validate()?;
        let operator = Arc::new(OperatorState::new(
            config.world.tick_interval_ms,
            &config.simulation,
        ));
        let (views, views_rx) = watch::channel(None);
        let app = Arc::new(AppState::with_operator(views_rx, Arc::clone(&operator)));
        Ok(Self {
            config,
            store,
            operator,
            views: Arc::new(views),
            app,
            running: None,
        })
    }

    /// Restore or generate the population and start the background tasks.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::AlreadyRunning`] on a second call, or
    /// [`EngineError::Init`] if a fresh population cannot be built.
    pub async fn start(&mut self) -> Result<(), EngineError> {
        if self.running.is_some() {
            return Err(EngineError::AlreadyRunning);
        }

        let mut state = self.bootstrap().await?;
        publish(&self.views, &state);

        let persistence = self.config.persistence.enabled.then(|| {
            let (stop, stop_rx) = oneshot::channel();
            let handle = tokio::spawn(run_persistence(
                Arc::clone(&self.store),
                self.views.subscribe(),
                Duration::from_millis(self.config.persistence.interval_ms),
                Arc::new(OperatorSaveObserver::new(Arc::clone(&self.operator))),
                stop_rx,
            ));
            PersistenceTask { handle, stop }
        });

        let operator = Arc::clone(&self.operator);
        let mut callback = PublishCallback::new(Arc::clone(&self.views), Arc::clone(&self.app));
        let simulation = tokio::spawn(async move {
            let result = run_simulation(&mut state, &operator, &mut callback).await;
            if let Ok(ref result) = result {
                log_simulation_end(result);
            }
            result
        });

        info!(
            persistence = self.config.persistence.enabled,
            tick_interval_ms = self.config.world.tick_interval_ms,
            "Roster system started"
        );
        self.running = Some(Running {
            simulation,
            persistence,
        });
        Ok(())
    }

    /// Request a clean stop and wait for it.
    ///
    /// # Errors
    ///
    /// See [`RosterSystem::wait`].
    pub async fn stop(&mut self) -> Result<RunReport, EngineError> {
        self.operator.request_stop();
        self.wait().await
    }

    /// Wait for the tick loop to end, then flush the final save.
    ///
    /// The flush happens even if the loop failed.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotRunning`] if the system was never
    /// started, [`EngineError::Runner`] if the loop failed, or
    /// [`EngineError::Task`] if a background task panicked.
    pub async fn wait(&mut self) -> Result<RunReport, EngineError> {
        let running = self.running.take().ok_or(EngineError::NotRunning)?;
        let outcome = running.simulation.await;

        let persistence = match running.persistence {
            Some(task) => Some(task.finish().await?),
            None => None,
        };

        let simulation = outcome.map_err(|e| EngineError::Task {
            message: format!("simulation loop: {e}"),
        })??;
        Ok(RunReport {
            simulation,
            persistence,
        })
    }

    /// Whether the background tasks have been started and not yet joined.
    pub const fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// The latest published view, `None` before [`RosterSystem::start`].
    pub fn view(&self) -> Option<Arc<RosterView>> {
        self.views.borrow().clone()
    }

    /// Aggregate metrics of the latest published view.
    pub fn snapshot(&self) -> Option<AggregateSnapshot> {
        self.views.borrow().as_ref().map(|view| view.aggregate.clone())
    }

    /// Up to `n` activity records, most recent first.
    pub fn recent_activity(&self, n: usize) -> Vec<ActivityRecord> {
        self.views
            .borrow()
            .as_ref()
            .map(|view| view.activity.iter().rev().take(n).cloned().collect())
            .unwrap_or_default()
    }

    /// Regenerate the whole population before the next tick.
    ///
    /// The tick counter and activity log carry on; the reset itself is
    /// logged as an `Operator` record.
    pub fn reset(&self) {
        self.operator.request_reset();
    }

    /// Shared operator controls.
    pub fn operator(&self) -> Arc<OperatorState> {
        Arc::clone(&self.operator)
    }

    /// State for the observer server.
    pub fn app_state(&self) -> Arc<AppState> {
        Arc::clone(&self.app)
    }

    /// The configuration the system was built with.
    pub const fn config(&self) -> &RosterConfig {
        &self.config
    }

    /// The snapshot store.
    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }

    async fn bootstrap(&self) -> Result<SimulationState, EngineError> {
        if self.config.persistence.enabled
            && let Some(snapshot) = load_latest(self.store.as_ref()).await
        {
            let saved_tick = snapshot.tick;
            match restore_state(snapshot, &self.config) {
                Ok(mut state) => {
                    let message = format!(
                        "Restored {} minions from snapshot of tick {saved_tick}",
                        state.store.len()
                    );
                    state
                        .record_system(ActivityKind::Persistence, message)
                        .map_err(TickError::from)?;
                    return Ok(state);
                }
                Err(err) => warn!(
                    operation = "load",
                    error = %err,
                    "Snapshot rejected, generating a fresh population"
                ),
            }
        }

        let mut state = SimulationState::generate(&self.config)?;
        let message = format!("Generated {} minions", state.store.len());
        state
            .record_system(ActivityKind::Persistence, message)
            .map_err(TickError::from)?;
        Ok(state)
    }
}
