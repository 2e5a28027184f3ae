//! Tick callback that publishes each completed tick to readers.
//!
//! After each tick this callback swaps a fresh [`RosterView`] into the
//! `watch` channel shared by the observer and the persistence worker, and
//! broadcasts the [`TickSummary`] to connected `WebSocket` clients.

use std::sync::Arc;

use roster_core::runner::TickCallback;
use roster_core::tick::{SimulationState, TickSummary};
use roster_observer::AppState;
use roster_types::RosterView;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Sender half of the published-view channel.
pub type ViewSender = watch::Sender<Option<Arc<RosterView>>>;

/// Callback that bridges the tick loop to every reader.
pub struct PublishCallback {
    views: Arc<ViewSender>,
    app: Arc<AppState>,
}

impl PublishCallback {
    /// Create a callback publishing into `views` and broadcasting via `app`.
    pub const fn new(views: Arc<ViewSender>, app: Arc<AppState>) -> Self {
        Self { views, app }
    }
}

/// Publish a consistent copy of `state`.
///
/// Readers keep whatever `Arc` they already hold; the swap never waits on
/// them.
pub fn publish(views: &ViewSender, state: &SimulationState) {
    match state.view() {
        Ok(view) => {
            views.send_replace(Some(Arc::new(view)));
        }
        Err(err) => warn!(
            tick = state.clock.tick(),
            error = %err,
            "Could not build view, readers keep the previous one"
        ),
    }
}

impl TickCallback for PublishCallback {
    fn on_tick(&mut self, summary: &TickSummary, state: &SimulationState) {
        publish(&self.views, state);
        let receivers = self.app.broadcast(summary);
        debug!(tick = summary.tick, receivers, "Tick broadcast sent");
    }
}
