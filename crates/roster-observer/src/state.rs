//! Shared application state for the Observer API server.
//!
//! [`AppState`] holds the broadcast channel for tick summaries and a
//! `watch` receiver for the latest published [`RosterView`]. The engine
//! swaps in a new `Arc<RosterView>` after every tick; handlers clone the
//! `Arc` and never hold a lock across an await, so the observer never
//! blocks the tick loop.

use std::sync::Arc;

use roster_core::operator::OperatorState;
use roster_core::tick::TickSummary;
use roster_types::RosterView;
use tokio::sync::{broadcast, watch};

use crate::error::ObserverError;

/// Capacity of the broadcast channel for tick summaries.
///
/// If a subscriber falls behind by more than this many messages it will
/// receive a [`broadcast::error::RecvError::Lagged`] and skip to the
/// newest message.
const BROADCAST_CAPACITY: usize = 256;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Broadcast sender for tick summary messages.
    pub tx: broadcast::Sender<TickSummary>,
    /// The latest published view, `None` before the first publish.
    pub views: watch::Receiver<Option<Arc<RosterView>>>,
    /// Shared operator control state (present when the simulation is running).
    pub operator_state: Option<Arc<OperatorState>>,
}

impl AppState {
    /// Create a new application state reading views from `views`.
    pub fn new(views: watch::Receiver<Option<Arc<RosterView>>>) -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            tx,
            views,
            operator_state: None,
        }
    }

    /// Create a new application state with operator control state attached.
    pub fn with_operator(
        views: watch::Receiver<Option<Arc<RosterView>>>,
        operator: Arc<OperatorState>,
    ) -> Self {
        Self {
            operator_state: Some(operator),
            ..Self::new(views)
        }
    }

    /// The latest published view.
    ///
    /// # Errors
    ///
    /// Returns [`ObserverError::Unavailable`] before the first publish.
    pub fn view(&self) -> Result<Arc<RosterView>, ObserverError> {
        self.views
            .borrow()
            .clone()
            .ok_or_else(|| ObserverError::Unavailable("no snapshot published yet".to_owned()))
    }

    /// The attached operator state.
    ///
    /// # Errors
    ///
    /// Returns [`ObserverError::Unavailable`] if none is attached.
    pub fn operator(&self) -> Result<&Arc<OperatorState>, ObserverError> {
        self.operator_state
            .as_ref()
            .ok_or_else(|| ObserverError::Unavailable("operator state not available".to_owned()))
    }

    /// Subscribe to the tick broadcast channel.
    pub fn subscribe(&self) -> broadcast::Receiver<TickSummary> {
        self.tx.subscribe()
    }

    /// Publish a tick summary to all connected clients.
    ///
    /// Returns the number of receivers that received the message.
    /// Returns 0 if no clients are connected (this is not an error).
    pub fn broadcast(&self, summary: &TickSummary) -> usize {
        // send returns Err only when there are zero receivers,
        // which is normal when no WebSocket clients are connected.
        self.tx.send(summary.clone()).unwrap_or(0)
    }
}
