//! Species registry.
//!
//! Species group agents by ancestry. The registry is owned by the ecosystem
//! and its populations are recomputed from a full census every tick.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::agent::Agent;
use super::traits::{GeneticTraits, TraitRanges};

/// Intensity of the baseline perturbation applied when a species splits off.
pub const SPECIATION_INTENSITY: f32 = 0.5;

/// A registry entry grouping agents that share ancestry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Species {
    /// Unique identifier.
    pub id: u32,
    /// Baseline traits new members are derived from.
    pub baseline: GeneticTraits,
    /// Live members at the last census.
    pub population: usize,
    /// Wall-clock creation time.
    pub created_at: DateTime<Utc>,
    /// Simulation tick at creation.
    pub created_tick: u64,
    /// Species this one split from.
    pub parent: Option<u32>,
}

/// Mapping from species id to species.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeciesRegistry {
    species: BTreeMap<u32, Species>,
    next_id: u32,
}

impl SpeciesRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Founds a species whose baseline is sampled around the middle of every
    /// trait range. Returns its id.
    pub fn create_new_species<R: Rng + ?Sized>(
        &mut self,
        ranges: &TraitRanges,
        tick: u64,
        rng: &mut R,
    ) -> u32 {
        let baseline = GeneticTraits::random_centered(ranges, rng);
        let id = self.insert(baseline, tick, None);
        info!("Founded species {id}");
        id
    }

    /// Splits a new species off `parent` by perturbing its baseline.
    ///
    /// Returns `None` if `parent` is not registered.
    pub fn create_from_parent<R: Rng + ?Sized>(
        &mut self,
        parent: u32,
        ranges: &TraitRanges,
        tick: u64,
        rng: &mut R,
    ) -> Option<u32> {
        let mut baseline = self.species.get(&parent)?.baseline.clone();
        baseline.mutate(ranges, SPECIATION_INTENSITY, rng);
        let id = self.insert(baseline, tick, Some(parent));
        info!("Species {id} split from species {parent}");
        Some(id)
    }

    /// Registers a species under an explicit id, e.g. one seen in restored
    /// agents. Existing entries are left untouched.
    pub fn register(&mut self, id: u32, baseline: GeneticTraits, tick: u64) {
        if self.species.contains_key(&id) {
            return;
        }
        self.species.insert(
            id,
            Species {
                id,
                baseline,
                population: 0,
                created_at: Utc::now(),
                created_tick: tick,
                parent: None,
            },
        );
        self.next_id = self.next_id.max(id.saturating_add(1));
    }

    fn insert(&mut self, baseline: GeneticTraits, tick: u64, parent: Option<u32>) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.species.insert(
            id,
            Species {
                id,
                baseline,
                population: 0,
                created_at: Utc::now(),
                created_tick: tick,
                parent,
            },
        );
        id
    }

    /// Recounts populations from the live agents.
    ///
    /// Species seen for the first time are registered with the averaged
    /// traits of their members. Species with no members are deleted; their
    /// ids are returned.
    pub fn census(&mut self, agents: &[Agent], tick: u64) -> Vec<u32> {
        let mut members: BTreeMap<u32, Vec<&GeneticTraits>> = BTreeMap::new();
        for agent in agents {
            members.entry(agent.species).or_default().push(&agent.traits);
        }

        for (&id, traits) in &members {
            if !self.species.contains_key(&id) {
                if let Some(baseline) = GeneticTraits::average(traits.iter().copied()) {
                    debug!("Registering unseen species {id}");
                    self.register(id, baseline, tick);
                }
            }
        }

        for species in self.species.values_mut() {
            species.population = members.get(&species.id).map_or(0, Vec::len);
        }

        let extinct: Vec<u32> = self
            .species
            .values()
            .filter(|s| s.population == 0)
            .map(|s| s.id)
            .collect();
        for id in &extinct {
            self.species.remove(id);
            info!("Species {id} went extinct");
        }
        extinct
    }

    /// Species by id.
    pub fn get(&self, id: u32) -> Option<&Species> {
        self.species.get(&id)
    }

    /// All species in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Species> {
        self.species.values()
    }

    /// Number of registered species.
    pub fn len(&self) -> usize {
        self.species.len()
    }

    /// Whether no species are registered.
    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::geometry::vec2;
    use crate::simulation::params::Params;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn ids_are_unique() {
        let ranges = TraitRanges::default();
        let mut rng = StdRng::seed_from_u64(1);
        let mut registry = SpeciesRegistry::new();
        let a = registry.create_new_species(&ranges, 0, &mut rng);
        let b = registry.create_new_species(&ranges, 0, &mut rng);
        let c = registry.create_from_parent(a, &ranges, 0, &mut rng).unwrap();
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_eq!(registry.get(c).unwrap().parent, Some(a));
        assert!(registry.create_from_parent(99, &ranges, 0, &mut rng).is_none());
    }

    #[test]
    fn census_counts_registers_and_prunes() {
        let params = Params::default();
        let mut rng = StdRng::seed_from_u64(2);
        let mut registry = SpeciesRegistry::new();
        let empty = registry.create_new_species(&params.traits, 0, &mut rng);

        let traits = GeneticTraits::from_defaults(&params.traits);
        let agents: Vec<Agent> = (0..3)
            .map(|i| Agent::new(i, traits.clone(), 7, vec2(0.0, 0.0), &params, &mut rng))
            .collect();

        let extinct = registry.census(&agents, 1);
        assert_eq!(extinct, vec![empty]);
        assert_eq!(registry.len(), 1);
        let species = registry.get(7).unwrap();
        assert_eq!(species.population, 3);
        assert!((species.baseline.body_size - traits.body_size).abs() < 1e-4);
        assert!((species.baseline.mutation_rate - traits.mutation_rate).abs() < 1e-4);

        // new species never reuse a registered id
        let next = registry.create_new_species(&params.traits, 1, &mut rng);
        assert!(next > 7);
    }
}
