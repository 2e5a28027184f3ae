//! Shared type definitions for the roster simulation.
//!
//! This crate is the single source of truth for the data model used across
//! the workspace. Types flow downstream to `TypeScript` via `ts-rs` for the
//! dashboard that renders the roster.
//!
//! # Modules
//!
//! - [`ids`] -- Stable minion identifiers
//! - [`enums`] -- Status, role, specialty, shift, task and purchase catalogs
//! - [`structs`] -- Minions, activity records, aggregates, persisted state

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{
    ActivityKind, Difficulty, PurchaseItem, Role, Shift, Specialty, Status, TaskKind, WorkCycle,
};
pub use ids::MinionId;
pub use structs::{ActivityRecord, AggregateSnapshot, Minion, PersistedState, RosterView};

#[cfg(test)]
mod tests {
    //! Binding generation for the dashboard.

    #[test]
    fn export_bindings() {
        // ts-rs writes the files to `bindings/` relative to the crate root
        // when `export_all` is invoked.
        use ts_rs::TS;

        let _ = crate::ids::MinionId::export_all();
        let _ = crate::enums::Status::export_all();
        let _ = crate::enums::ActivityKind::export_all();
        let _ = crate::structs::Minion::export_all();
        let _ = crate::structs::ActivityRecord::export_all();
        let _ = crate::structs::AggregateSnapshot::export_all();
        let _ = crate::structs::RosterView::export_all();
        let _ = crate::structs::PersistedState::export_all();
    }
}
