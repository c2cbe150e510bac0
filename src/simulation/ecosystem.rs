//! Population orchestrator.
//!
//! The ecosystem owns every agent, resource, species and cluster, plus the
//! random generator all genetic operators draw from. It handles:
//! - Continuous ticks: census, aging and death, reproduction, extinction
//!   mitigation and periodic statistics
//! - Parallel perception and brain evaluation using rayon
//! - Spatial queries using k-d trees
//! - Gene-pool snapshots for recovery from total extinction

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::agent::{Agent, AgentId, AgentView, Decision, build_brain};
use super::brain::{Brain, BrainError};
use super::cluster::ClusterLayout;
use super::gene_pool::{GenePool, GenomeTemplate};
use super::geometry::{Vec2, length, vec2, wrap_around};
use super::params::{ConfigError, Params};
use super::perception::WorldView;
use super::reproduction;
use super::resource::Resource;
use super::sampling::chance;
use super::spatial::SpatialIndex;
use super::species::SpeciesRegistry;
use super::stats::{StatsHistory, StatsSnapshot};
use super::traits::GeneticTraits;

/// Mutation amplification applied to diversity injections.
const DIVERSITY_AMPLIFICATION: f32 = 3.0;

/// The simulation root.
pub struct Ecosystem {
    params: Params,
    agents: Vec<Agent>,
    resources: Vec<Resource>,
    species: SpeciesRegistry,
    clusters: Option<ClusterLayout>,
    gene_pool: GenePool,
    /// Highest generation alive at the last gene-pool refresh.
    pool_generation: Option<u32>,
    history: StatsHistory,
    rng: StdRng,
    tick: u64,
    next_id: AgentId,
    births: usize,
    deaths: usize,
}

impl Ecosystem {
    /// Creates an ecosystem with its initial population and resources.
    pub fn new(params: Params) -> Result<Self, ConfigError> {
        let mut ecosystem = Self::empty(params)?;
        ecosystem.populate();
        ecosystem.replenish_resources(usize::MAX);
        ecosystem.refresh_gene_pool();
        Ok(ecosystem)
    }

    /// Creates an ecosystem with no agents and no resources.
    pub fn empty(params: Params) -> Result<Self, ConfigError> {
        params.validate()?;
        let rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Ok(Self {
            clusters: params.clusters.as_ref().map(ClusterLayout::from_params),
            history: StatsHistory::new(params.stats_history),
            params,
            agents: Vec::new(),
            resources: Vec::new(),
            species: SpeciesRegistry::new(),
            gene_pool: GenePool::new(),
            pool_generation: None,
            rng,
            tick: 0,
            next_id: 0,
            births: 0,
            deaths: 0,
        })
    }

    fn populate(&mut self) {
        let species: Vec<u32> = (0..self.params.initial_species.max(1))
            .map(|_| {
                self.species
                    .create_new_species(&self.params.traits, self.tick, &mut self.rng)
            })
            .collect();

        for i in 0..self.params.population_size {
            let id = species[i % species.len()];
            let mut traits = self
                .species
                .get(id)
                .map_or_else(|| GeneticTraits::from_defaults(&self.params.traits), |s| s.baseline.clone());
            traits.mutate(&self.params.traits, self.params.mutation_rate, &mut self.rng);

            let cluster = self.clusters.as_ref().map(|layout| i % layout.len());
            let pos = self.spawn_point(cluster);
            let mut agent = self.new_agent(traits, id, pos);
            agent.cluster = cluster;
            self.agents.push(agent);
        }
        info!(
            "Spawned {} agents across {} species",
            self.agents.len(),
            species.len()
        );
    }

    /// Runs the population algorithm for one tick: census, aging and death,
    /// reproduction, extinction mitigation and statistics.
    ///
    /// Agents do not move or eat; feed them through [`Agent::consume`].
    pub fn tick(&mut self) {
        self.advance(false);
    }

    /// Runs one full frame: [`Ecosystem::tick`] plus perception, movement and
    /// feeding between aging and reproduction.
    pub fn step(&mut self) {
        self.advance(true);
    }

    fn advance(&mut self, simulate_bodies: bool) {
        self.tick += 1;

        self.census();
        self.age_and_cull();
        if simulate_bodies {
            self.act();
            self.feed();
        }
        self.reproduce_all();
        self.maintain_gene_pool();
        self.mitigate_extinction();
        self.record_stats();

        debug!(
            "Tick {}: {} agents, {} species",
            self.tick,
            self.agents.len(),
            self.species.len()
        );
    }

    fn census(&mut self) {
        self.species.census(&self.agents, self.tick);
    }

    fn age_and_cull(&mut self) {
        let max_age = self.params.max_age;
        for agent in &mut self.agents {
            agent.age = agent.age.saturating_add(1);
        }
        let before = self.agents.len();
        self.agents.retain(|a| a.is_alive() && a.age < max_age);
        let died = before - self.agents.len();
        if died > 0 {
            debug!("{died} agents died");
        }
        self.deaths += died;
    }

    fn act(&mut self) {
        let index = match SpatialIndex::build(&self.agents, &self.resources) {
            Ok(index) => Some(index),
            Err(e) => {
                warn!("Falling back to exhaustive perception: {e:?}");
                None
            }
        };

        let world = WorldView {
            agents: &self.agents,
            resources: &self.resources,
            width: self.params.world_width,
            height: self.params.world_height,
            index: index.as_ref(),
        };
        let decisions: Vec<Result<Decision, BrainError>> =
            self.agents.par_iter().map(|agent| agent.decide(&world)).collect();

        for (agent, decision) in self.agents.iter_mut().zip(decisions) {
            match decision {
                Ok(decision) => agent.apply(decision, &self.params),
                Err(e) => warn!("Agent {} could not think: {e}", agent.id),
            }
        }
    }

    fn feed(&mut self) {
        for agent in &mut self.agents {
            let reach = agent.traits.body_size * 0.5;
            for resource in &mut self.resources {
                if resource.is_consumed() {
                    continue;
                }
                if length(agent.pos - resource.pos) < reach + resource.radius {
                    agent.consume(resource.consume());
                }
            }
        }
        self.resources.retain(|r| !r.is_consumed());
        self.replenish_resources(self.params.resource_spawn_per_tick);
    }

    /// Spawns up to `limit` resources without exceeding the configured count.
    fn replenish_resources(&mut self, limit: usize) {
        let missing = self
            .params
            .resource_count
            .saturating_sub(self.resources.len())
            .min(limit);
        for _ in 0..missing {
            self.resources.push(Resource::new_random(
                self.clusters.as_ref(),
                self.params.world_width,
                self.params.world_height,
                self.params.resource_radius,
                self.params.resource_energy,
                &mut self.rng,
            ));
        }
    }

    fn soft_cap(&self) -> usize {
        (self.params.population_soft_cap * self.params.population_size as f32) as usize
    }

    fn reproduce_all(&mut self) {
        let eligible: Vec<usize> = (0..self.agents.len())
            .filter(|&i| self.agents[i].can_reproduce(&self.params))
            .collect();
        let cap = self.soft_cap();

        for index in eligible {
            if self.agents.len() > cap {
                debug!("Population soft cap of {cap} reached");
                break;
            }
            // mates may have spent energy earlier this tick
            if self.agents[index].can_reproduce(&self.params) {
                self.reproduce(index);
            }
        }
    }

    /// Runs the reproduction protocol for the agent at `index` and appends
    /// any children. Returns the number of children born.
    pub fn reproduce(&mut self, index: usize) -> usize {
        let children = reproduction::reproduce(
            index,
            &mut self.agents,
            &mut self.species,
            &mut self.next_id,
            self.tick,
            &self.params,
            &mut self.rng,
        );
        let born = children.len();
        self.agents.extend(children);
        self.births += born;
        born
    }

    fn maintain_gene_pool(&mut self) {
        let population = self.agents.len();
        if population == 0 {
            return;
        }
        let max_generation = self.agents.iter().map(|a| a.generation).max().unwrap_or(0);
        let advanced = self.pool_generation.is_none_or(|g| max_generation > g);
        let endangered = population < self.params.extinction_threshold;
        if advanced || endangered {
            self.refresh_gene_pool();
        }
    }

    /// Snapshots the fittest agents into the gene pool.
    pub fn refresh_gene_pool(&mut self) {
        self.gene_pool.refresh(&self.agents, self.params.selection_rate);
        if let Some(max_generation) = self.agents.iter().map(|a| a.generation).max() {
            self.pool_generation = Some(max_generation);
        }
    }

    fn mitigate_extinction(&mut self) {
        let population = self.agents.len();
        if population == 0 {
            self.recover_from_extinction();
        } else if population < self.params.extinction_threshold
            && chance(&mut self.rng, self.params.diversity_injection_chance)
        {
            self.inject_diversity();
        }
    }

    fn recover_from_extinction(&mut self) {
        let Some(layout) = self.clusters.clone() else {
            warn!("Population is extinct but no cluster layout is available; deferring recovery");
            return;
        };

        let count = ((self.params.population_size as f32 * self.params.emergency_spawn_rate).ceil()
            as usize)
            .max(1);
        let age = (self.params.fertile_age_min + 1).min(self.params.fertile_age_max);

        for i in 0..count {
            let cluster = i % layout.len();
            let round = i / layout.len();
            let pos = layout
                .random_point_in(cluster, &mut self.rng)
                .unwrap_or_else(|| vec2(0.0, 0.0));
            let mut agent = self.emergency_agent(cluster, round, pos);
            agent.cluster = Some(cluster);
            agent.age = age;
            agent.energy = self.params.emergency_energy_fraction * agent.max_energy();
            agent.update_fitness();
            self.agents.push(agent);
        }
        self.births += count;
        info!(
            "Population went extinct; respawned {count} agents from a gene pool of {}",
            self.gene_pool.len()
        );
    }

    /// Builds the `round`-th emergency spawn for `cluster`.
    ///
    /// Cluster elites are handed out fittest first; once every elite of the
    /// cluster has been cloned, further rounds reuse them with the diversity
    /// boost applied.
    fn emergency_agent(&mut self, cluster: usize, round: usize, pos: Vec2) -> Agent {
        let elites = self.gene_pool.for_cluster(cluster);
        if !elites.is_empty() {
            let reused = round >= elites.len();
            let elite = elites[round % elites.len()].clone();
            return if reused && self.params.diversity_boost {
                self.boosted_clone(elite, pos)
            } else {
                let mut agent = self.new_agent(elite.traits, elite.species, pos);
                agent.brain = elite.brain;
                agent.generation = elite.generation;
                agent
            };
        }

        if let Some(elite) = self.gene_pool.any(&mut self.rng).cloned() {
            return self.boosted_clone(elite, pos);
        }

        let species = self
            .species
            .create_new_species(&self.params.traits, self.tick, &mut self.rng);
        let traits = self
            .species
            .get(species)
            .map_or_else(|| GeneticTraits::from_defaults(&self.params.traits), |s| s.baseline.clone());
        self.new_agent(traits, species, pos)
    }

    /// Trait clone plus weight transfer, mutated when the diversity boost is
    /// enabled.
    fn boosted_clone(&mut self, elite: GenomeTemplate, pos: Vec2) -> Agent {
        let mut traits = elite.traits;
        if self.params.diversity_boost {
            traits.mutate(&self.params.traits, self.params.mutation_rate, &mut self.rng);
        }
        let mut agent = self.new_agent(traits, elite.species, pos);
        agent.brain.transfer_weights_from(&elite.brain, None, &mut self.rng);
        if self.params.diversity_boost {
            agent
                .brain
                .mutate(self.params.mutation_rate, self.params.mutation_strategy, &mut self.rng);
        }
        agent.generation = elite.generation;
        agent
    }

    fn inject_diversity(&mut self) {
        let Some(source) = self.agents.choose(&mut self.rng).cloned() else {
            return;
        };
        let rate = self.params.mutation_rate * DIVERSITY_AMPLIFICATION;

        let mut traits = source.traits.clone();
        traits.mutate(&self.params.traits, rate, &mut self.rng);

        let jitter = self.params.spawn_jitter;
        let offset = vec2(
            self.rng.random_range(-1.0_f32..=1.0) * jitter,
            self.rng.random_range(-1.0_f32..=1.0) * jitter,
        );
        let pos = wrap_around(source.pos + offset, self.params.world_width, self.params.world_height);

        let mut agent = self.new_agent(traits, source.species, pos);
        agent
            .brain
            .transfer_weights_from(&source.brain, None, &mut self.rng);
        agent
            .brain
            .mutate(rate, self.params.mutation_strategy, &mut self.rng);
        agent.parent_ids = vec![source.id];
        agent.generation = source.generation + 1;
        agent.cluster = source.cluster;
        agent.energy = self.params.child_energy_fraction * agent.max_energy();

        debug!("Injected agent {} cloned from {}", agent.id, source.id);
        self.agents.push(agent);
        self.births += 1;
    }

    fn record_stats(&mut self) {
        if self.tick % self.params.stats_interval.max(1) != 0 || self.agents.is_empty() {
            return;
        }
        let snapshot = StatsSnapshot::collect(
            self.tick,
            &self.agents,
            self.species.len(),
            self.births,
            self.deaths,
        );
        info!(
            "Tick {}: population {}, avg fitness {:.1}, max fitness {:.1}, {} species, {} births, {} deaths",
            snapshot.tick,
            snapshot.population,
            snapshot.avg_fitness,
            snapshot.max_fitness,
            snapshot.species_count,
            snapshot.births,
            snapshot.deaths
        );
        self.history.push(snapshot);
        self.births = 0;
        self.deaths = 0;
    }

    fn spawn_point(&mut self, cluster: Option<usize>) -> Vec2 {
        cluster
            .and_then(|id| {
                self.clusters
                    .as_ref()
                    .and_then(|layout| layout.random_point_in(id, &mut self.rng))
            })
            .unwrap_or_else(|| {
                vec2(
                    self.rng.random_range(-0.5_f32..=0.5) * self.params.world_width,
                    self.rng.random_range(-0.5_f32..=0.5) * self.params.world_height,
                )
            })
    }

    /// Creates a root agent with the next free id and a fresh brain. The
    /// agent is not inserted.
    pub fn new_agent(&mut self, traits: GeneticTraits, species: u32, pos: Vec2) -> Agent {
        let id = self.next_id;
        self.next_id += 1;
        Agent::new(id, traits, species, pos, &self.params, &mut self.rng)
    }

    /// Inserts an agent built elsewhere, keeping future ids unique.
    pub fn insert_agent(&mut self, agent: Agent) {
        self.next_id = self.next_id.max(agent.id + 1);
        self.agents.push(agent);
    }

    /// Builds a fresh brain sized for `traits` from the ecosystem's generator.
    pub fn build_brain(&mut self, traits: &GeneticTraits) -> Brain {
        build_brain(traits, &self.params, &mut self.rng)
    }

    /// Cloned public views of every agent, taken between ticks.
    pub fn snapshot(&self) -> Vec<AgentView> {
        self.agents.iter().map(Agent::view).collect()
    }

    /// Live agents.
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Mutable access to the live agents.
    pub fn agents_mut(&mut self) -> &mut Vec<Agent> {
        &mut self.agents
    }

    /// Resources.
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    /// Species registry.
    pub fn species(&self) -> &SpeciesRegistry {
        &self.species
    }

    /// Cluster layout, if configured.
    pub fn clusters(&self) -> Option<&ClusterLayout> {
        self.clusters.as_ref()
    }

    /// Gene-pool snapshot.
    pub fn gene_pool(&self) -> &GenePool {
        &self.gene_pool
    }

    /// Statistics history.
    pub fn history(&self) -> &StatsHistory {
        &self.history
    }

    /// Parameters the ecosystem was built with.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Ticks run so far.
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Number of live agents.
    pub fn population(&self) -> usize {
        self.agents.len()
    }
}
