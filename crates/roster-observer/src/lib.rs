//! Observer API server for the roster simulation.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`WebSocket` endpoint** (`/ws/ticks`) streaming tick summaries via
//!   [`tokio::sync::broadcast`]
//! - **REST endpoints** for the aggregate snapshot, recent activity,
//!   individual minions, top performers and persistence health
//! - **Operator REST endpoints** for runtime control (pause, resume,
//!   speed, status, stop)
//! - **Minimal HTML page** (`GET /`) with the headline numbers
//!
//! # Architecture
//!
//! The observer reads the latest [`RosterView`] published by the run loop
//! on a `watch` channel. Handlers clone an `Arc` and never hold a lock
//! across an await, so readers never block the tick.
//!
//! [`RosterView`]: roster_types::RosterView

pub mod error;
pub mod handlers;
pub mod operator;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::AppState;
