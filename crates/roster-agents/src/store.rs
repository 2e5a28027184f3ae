//! The entity store.
//!
//! [`MinionStore`] owns the canonical population. It is the only type that
//! hands out mutable access to a minion, and it only does so through
//! [`MinionStore::apply`]. The population size is fixed once the store is
//! built; [`MinionStore::replace_all`] swaps the whole population at once.

use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;
use roster_types::{Minion, MinionId};
use tracing::debug;

use crate::aggregate::top_performers;
use crate::config::PopulationParams;
use crate::error::AgentError;
use crate::population::create_population;
use crate::transition::{Transition, apply_transition};

/// The canonical collection of minions, in creation order.
#[derive(Debug, Clone)]
pub struct MinionStore {
    minions: Vec<Minion>,
    index: BTreeMap<MinionId, usize>,
    max_tier: u8,
}

impl MinionStore {
    /// Generate a fresh population of `size` minions.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::EmptyPopulation`] if `size` is 0.
    pub fn generate(
        size: u32,
        params: &PopulationParams,
        rng: &mut impl Rng,
    ) -> Result<Self, AgentError> {
        let minions = create_population(size, params, rng)?;
        debug!(population = minions.len(), "generated population");
        Self::restore(minions, params)
    }

    /// Build a store from an existing population, e.g. a loaded snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::EmptyPopulation`] for an empty list and
    /// [`AgentError::DuplicateId`] if two minions share an id.
    pub fn restore(minions: Vec<Minion>, params: &PopulationParams) -> Result<Self, AgentError> {
        let index = build_index(&minions)?;
        Ok(Self {
            minions,
            index,
            max_tier: params.max_tier,
        })
    }

    /// Look up one minion.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::MinionNotFound`] if no minion has this id.
    pub fn get(&self, id: &MinionId) -> Result<&Minion, AgentError> {
        self.index
            .get(id)
            .and_then(|slot| self.minions.get(*slot))
            .ok_or_else(|| AgentError::MinionNotFound(id.clone()))
    }

    /// Apply a transition to one minion and return its new state.
    ///
    /// On error the stored minion is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::MinionNotFound`] for an unknown id, or any
    /// error from [`apply_transition`].
    pub fn apply(&mut self, id: &MinionId, transition: &Transition) -> Result<&Minion, AgentError> {
        let slot = self
            .index
            .get(id)
            .copied()
            .ok_or_else(|| AgentError::MinionNotFound(id.clone()))?;
        let current = self
            .minions
            .get_mut(slot)
            .ok_or_else(|| AgentError::MinionNotFound(id.clone()))?;
        *current = apply_transition(current, transition, self.max_tier)?;
        Ok(current)
    }

    /// Put back a state of one minion read earlier, undoing every transition
    /// applied to it since.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::MinionNotFound`] if the id is not in the store.
    pub fn revert(&mut self, saved: Minion) -> Result<(), AgentError> {
        let current = self
            .index
            .get(&saved.id)
            .copied()
            .and_then(|slot| self.minions.get_mut(slot))
            .ok_or_else(|| AgentError::MinionNotFound(saved.id.clone()))?;
        *current = saved;
        Ok(())
    }

    /// Every minion, in creation order.
    pub fn all(&self) -> &[Minion] {
        &self.minions
    }

    /// Every id, in creation order.
    pub fn ids(&self) -> Vec<MinionId> {
        self.minions.iter().map(|m| m.id.clone()).collect()
    }

    /// Population size.
    pub const fn len(&self) -> usize {
        self.minions.len()
    }

    /// Whether the store holds no minions. Never true for a built store.
    pub const fn is_empty(&self) -> bool {
        self.minions.is_empty()
    }

    /// Highest tier promotions may reach.
    pub const fn max_tier(&self) -> u8 {
        self.max_tier
    }

    /// Replace the whole population (reset).
    ///
    /// # Errors
    ///
    /// Same as [`MinionStore::restore`]. The current population is kept on
    /// error.
    pub fn replace_all(&mut self, minions: Vec<Minion>) -> Result<(), AgentError> {
        let index = build_index(&minions)?;
        self.minions = minions;
        self.index = index;
        Ok(())
    }

    /// The `n` highest lifetime earners, ties broken by id.
    pub fn top_performers(&self, n: usize) -> Vec<&Minion> {
        top_performers(&self.minions, n)
    }
}

fn build_index(minions: &[Minion]) -> Result<BTreeMap<MinionId, usize>, AgentError> {
    if minions.is_empty() {
        return Err(AgentError::EmptyPopulation);
    }
    let mut seen = BTreeSet::new();
    let mut index = BTreeMap::new();
    for (slot, minion) in minions.iter().enumerate() {
        if !seen.insert(minion.id.clone()) {
            return Err(AgentError::DuplicateId(minion.id.clone()));
        }
        index.insert(minion.id.clone(), slot);
    }
    Ok(index)
}
