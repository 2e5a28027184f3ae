//! Simulated clock, tick scheduler, and run loop for the roster simulation.
//!
//! This crate owns every time-based mutation of the population. The run
//! loop drives [`tick::run_tick`] on a fixed real-time period; each tick
//! visits every minion once, in store order, and applies the state machine
//! rules through the entity store.
//!
//! # Modules
//!
//! - [`activity`] -- Bounded activity log (ring buffer).
//! - [`clock`] -- Simulated clock mapping ticks to simulated time.
//! - [`config`] -- Configuration loading from `roster-config.yaml` into
//!   strongly-typed structs, with validation.
//! - [`narrative`] -- Display phrasing (hedged wording, milestone names).
//! - [`operator`] -- Shared operator controls and persistence health.
//! - [`restore`] -- Rebuilding state from a persisted snapshot.
//! - [`runner`] -- The async run loop with pause, speed, stop and bounds.
//! - [`tick`] -- The per-tick scheduler.

pub mod activity;
pub mod clock;
pub mod config;
pub mod narrative;
pub mod operator;
pub mod restore;
pub mod runner;
pub mod tick;
