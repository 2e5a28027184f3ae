//! Tunable parameters for population generation and the store.
//!
//! The engine builds a [`PopulationParams`] from `roster-config.yaml` at
//! startup and hands it to the store. Tests use the defaults.

/// Parameters for generating and maintaining a population.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopulationParams {
    /// Lowest starting balance (inclusive, default: 200).
    pub starting_credits_min: u64,

    /// Highest starting balance (inclusive, default: 700).
    pub starting_credits_max: u64,

    /// Highest tier a minion can be promoted to (default: 5).
    pub max_tier: u8,
}

impl Default for PopulationParams {
    fn default() -> Self {
        Self {
            starting_credits_min: 200,
            starting_credits_max: 700,
            max_tier: 5,
        }
    }
}
