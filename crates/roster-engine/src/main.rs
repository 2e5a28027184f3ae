//! Roster engine binary.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `roster-config.yaml` (or `ROSTER_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Assemble the system around the file snapshot store
//! 4. Restore or generate the population and start the tick loop
//! 5. Start the Observer API server
//! 6. Wait for the run to end (bounds, operator stop, or Ctrl-C)
//! 7. Flush the final snapshot and stop the server

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use roster_core::config::{LoggingConfig, RosterConfig};
use roster_db::FileSnapshotStore;
use roster_engine::RosterSystem;
use roster_observer::{ServerConfig, start_server};
use tokio::sync::oneshot;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

/// Default location of the configuration file.
const DEFAULT_CONFIG_PATH: &str = "roster-config.yaml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Configuration.
    let (config, config_path) = load_config()?;

    // 2. Logging.
    init_logging(&config.logging);
    info!(
        world_name = %config.world.name,
        seed = config.world.seed,
        population = config.population.size,
        tick_interval_ms = config.world.tick_interval_ms,
        persistence_interval_ms = config.persistence.interval_ms,
        config_file = ?config_path,
        "roster-engine starting"
    );

    // 3. Assemble. Invalid values refuse to start here.
    let store = Arc::new(FileSnapshotStore::new(config.persistence.path.clone()));
    let observer = config.observer.clone();
    let mut system = RosterSystem::new(config, store).context("invalid configuration")?;

    // 4. Start the tick loop.
    system.start().await.context("failed to start simulation")?;

    // 5. Observer server.
    let (server_stop, server_stop_rx) = oneshot::channel::<()>();
    let server = observer.enabled.then(|| {
        let server_config = ServerConfig {
            host: observer.host.clone(),
            port: observer.port,
        };
        let app = system.app_state();
        tokio::spawn(async move {
            let shutdown = async move {
                drop(server_stop_rx.await);
            };
            start_server(&server_config, app, shutdown).await
        })
    });

    // Ctrl-C becomes an operator stop so the in-flight tick completes.
    let operator = system.operator();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, stopping after the current tick");
            operator.request_stop();
        }
    });

    // 6-7. Run to completion; the final save is flushed inside `wait`.
    let report = system.wait().await.context("simulation failed")?;
    info!(
        end_reason = ?report.simulation.end_reason,
        total_ticks = report.simulation.total_ticks,
        saves = report.persistence.map(|p| p.saves),
        save_failures = report.persistence.map(|p| p.failures),
        "Simulation complete"
    );

    if server_stop.send(()).is_err() {
        debug!("Observer server already stopped");
    }
    if let Some(server) = server {
        match server.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(error = %e, "Observer server failed"),
            Err(e) => error!(error = %e, "Observer server task failed"),
        }
    }

    info!("roster-engine shutdown complete");
    Ok(())
}

/// Load configuration. Validation happens when the system is assembled.
///
/// Uses `ROSTER_CONFIG` when set, otherwise `roster-config.yaml` in the
/// working directory. A missing default file means defaults; a missing
/// explicit file is an error.
fn load_config() -> anyhow::Result<(RosterConfig, Option<PathBuf>)> {
    let (path, explicit) = std::env::var("ROSTER_CONFIG").map_or_else(
        |_| (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        |p| (PathBuf::from(p), true),
    );

    if explicit || path.exists() {
        let config = RosterConfig::from_file(&path)
            .with_context(|| format!("failed to load {}", path.display()))?;
        Ok((config, Some(path)))
    } else {
        let mut config = RosterConfig::default();
        config.apply_env_overrides();
        Ok((config, None))
    }
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins; otherwise `logging.level` from the config applies.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}
