//! Gene pool snapshot used to recover from total extinction.
//!
//! Holds clones of the fittest agents, sorted by fitness (highest first).

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::agent::Agent;
use super::brain::Brain;
use super::traits::GeneticTraits;

/// Genetic material retained from one elite agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenomeTemplate {
    /// Trait copy.
    pub traits: GeneticTraits,
    /// Brain copy.
    pub brain: Brain,
    /// Species of the source agent.
    pub species: u32,
    /// Home cluster of the source agent.
    pub cluster: Option<usize>,
    /// Fitness at the time of the snapshot.
    pub fitness: f32,
    /// Generation of the source agent.
    pub generation: u32,
}

impl GenomeTemplate {
    /// Copies an agent's genetic material.
    pub fn from_agent(agent: &Agent) -> Self {
        Self {
            traits: agent.traits.clone(),
            brain: agent.brain.clone(),
            species: agent.species,
            cluster: agent.cluster,
            fitness: agent.fitness,
            generation: agent.generation,
        }
    }
}

/// The retained set of elite templates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenePool {
    templates: Vec<GenomeTemplate>,
}

impl GenePool {
    /// Creates an empty gene pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the snapshot with the top `selection_rate` fraction of
    /// `agents` by fitness (at least one when any agents exist).
    ///
    /// An empty population leaves the previous snapshot in place.
    pub fn refresh(&mut self, agents: &[Agent], selection_rate: f32) {
        if agents.is_empty() {
            return;
        }

        let keep = ((agents.len() as f32 * selection_rate).ceil() as usize).clamp(1, agents.len());
        let mut ranked: Vec<&Agent> = agents.iter().collect();
        ranked.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));

        self.templates = ranked
            .into_iter()
            .take(keep)
            .map(GenomeTemplate::from_agent)
            .collect();
        info!(
            "Gene pool refreshed with {} templates (best fitness {:.1})",
            self.templates.len(),
            self.templates.first().map_or(0.0, |t| t.fitness)
        );
    }

    /// Templates from the given cluster, fittest first.
    pub fn for_cluster(&self, cluster: usize) -> Vec<&GenomeTemplate> {
        self.templates
            .iter()
            .filter(|t| t.cluster == Some(cluster))
            .collect()
    }

    /// Random template from any cluster.
    pub fn any<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&GenomeTemplate> {
        self.templates.choose(rng)
    }

    /// All templates, fittest first.
    pub fn templates(&self) -> &[GenomeTemplate] {
        &self.templates
    }

    /// Number of templates.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::geometry::vec2;
    use crate::simulation::params::Params;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn population(params: &Params, rng: &mut StdRng) -> Vec<Agent> {
        let traits = GeneticTraits::from_defaults(&params.traits);
        (0..10)
            .map(|i| {
                let mut a = Agent::new(i, traits.clone(), 0, vec2(0.0, 0.0), params, rng);
                a.fitness = i as f32 * 10.0;
                a.cluster = Some((i % 2) as usize);
                a
            })
            .collect()
    }

    #[test]
    fn keeps_top_fraction_sorted() {
        let params = Params::default();
        let mut rng = StdRng::seed_from_u64(4);
        let agents = population(&params, &mut rng);

        let mut pool = GenePool::new();
        pool.refresh(&agents, 0.2);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.templates()[0].fitness, 90.0);
        assert_eq!(pool.templates()[1].fitness, 80.0);
        assert_eq!(pool.for_cluster(0).first().map(|t| t.fitness), Some(80.0));
        assert_eq!(pool.for_cluster(1).first().map(|t| t.fitness), Some(90.0));
        assert!(pool.for_cluster(2).is_empty());
    }

    #[test]
    fn empty_population_keeps_snapshot() {
        let params = Params::default();
        let mut rng = StdRng::seed_from_u64(4);
        let agents = population(&params, &mut rng);

        let mut pool = GenePool::new();
        pool.refresh(&agents, 0.5);
        pool.refresh(&[], 0.5);
        assert_eq!(pool.len(), 5);
        assert!(pool.any(&mut rng).is_some());
    }

    #[test]
    fn cluster_templates_are_ordered_by_fitness() {
        let params = Params::default();
        let mut rng = StdRng::seed_from_u64(4);
        let agents = population(&params, &mut rng);

        let mut pool = GenePool::new();
        pool.refresh(&agents, 1.0);
        let fitness: Vec<f32> = pool.for_cluster(1).iter().map(|t| t.fitness).collect();
        assert_eq!(fitness, vec![90.0, 70.0, 50.0, 30.0, 10.0]);
    }
}
