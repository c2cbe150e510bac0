//! Reproduction protocol.
//!
//! A reproduction is planned first and only carried out if the parent and
//! every chosen mate can pay for it. An unaffordable plan creates no children
//! and costs nothing.

use std::collections::BTreeMap;

use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::debug;

use super::agent::{Agent, AgentId};
use super::geometry::{vec2, wrap_around};
use super::params::Params;
use super::sampling::{cascade_depth, chance};
use super::species::SpeciesRegistry;
use super::traits::GeneticTraits;

/// One child of a plan.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedChild {
    /// Index of the mate, or `None` for asexual reproduction.
    pub mate: Option<usize>,
    /// Traits after crossover or cloning and trait mutation.
    pub traits: GeneticTraits,
    /// Energy the child starts with.
    pub energy: f32,
}

/// Children planned by one parent and what they cost.
#[derive(Debug, Clone, PartialEq)]
pub struct ReproductionPlan {
    /// Index of the parent.
    pub parent: usize,
    /// Planned children.
    pub children: Vec<PlannedChild>,
    /// Total the parent pays: every child's energy plus the overhead.
    pub parent_cost: f32,
    /// What each mate pays, grouped by mate index.
    pub mate_costs: BTreeMap<usize, f32>,
}

impl ReproductionPlan {
    /// Whether the parent and every mate hold enough energy.
    pub fn is_affordable(&self, agents: &[Agent]) -> bool {
        let parent_ok = agents
            .get(self.parent)
            .is_some_and(|p| p.energy >= self.parent_cost);
        parent_ok
            && self
                .mate_costs
                .iter()
                .all(|(&mate, &cost)| agents.get(mate).is_some_and(|m| m.energy >= cost))
    }
}

/// Indices of agents that could mate with `parent`: same species, eligible,
/// and not the parent itself.
pub fn eligible_mates(parent: usize, agents: &[Agent], params: &Params) -> Vec<usize> {
    let Some(p) = agents.get(parent) else {
        return Vec::new();
    };
    agents
        .iter()
        .enumerate()
        .filter(|&(i, a)| i != parent && a.species == p.species && a.can_reproduce(params))
        .map(|(i, _)| i)
        .collect()
}

/// Plans the children of `parent` without touching any agent.
///
/// Returns `None` if `parent` is out of range or plans no children.
pub fn plan<R: Rng + ?Sized>(
    parent: usize,
    agents: &[Agent],
    params: &Params,
    rng: &mut R,
) -> Option<ReproductionPlan> {
    let p = agents.get(parent)?;
    let count = p.traits.offspring();
    if count == 0 {
        return None;
    }

    let mates = eligible_mates(parent, agents, params);
    let mut children = Vec::with_capacity(count);
    let mut mate_costs: BTreeMap<usize, f32> = BTreeMap::new();

    for _ in 0..count {
        let mate = if !mates.is_empty() && chance(rng, params.sexual_reproduction_chance) {
            mates.choose(rng).copied()
        } else {
            None
        };

        let mut traits = match mate {
            Some(m) => GeneticTraits::crossover(&p.traits, &agents[m].traits, &params.traits, rng),
            None => p.traits.clone(),
        };
        traits.mutate(&params.traits, p.traits.mutation_rate, rng);

        let energy = params.child_energy_fraction * traits.max_energy_capacity;
        if let Some(m) = mate {
            *mate_costs.entry(m).or_default() += params.mate_contribution * energy;
        }
        children.push(PlannedChild {
            mate,
            traits,
            energy,
        });
    }

    let parent_cost = children.iter().map(|c| c.energy).sum::<f32>()
        + params.reproduction_overhead * p.traits.max_energy_capacity;

    Some(ReproductionPlan {
        parent,
        children,
        parent_cost,
        mate_costs,
    })
}

/// Carries out an affordable plan: deducts energy and builds the children.
///
/// Returns no children, and deducts nothing, if the plan is unaffordable.
pub fn execute<R: Rng + ?Sized>(
    plan: ReproductionPlan,
    agents: &mut [Agent],
    registry: &mut SpeciesRegistry,
    next_id: &mut AgentId,
    tick: u64,
    params: &Params,
    rng: &mut R,
) -> Vec<Agent> {
    if !plan.is_affordable(agents) {
        debug!(
            "Agent {} cannot afford {} children",
            agents.get(plan.parent).map_or(0, |a| a.id),
            plan.children.len()
        );
        return Vec::new();
    }

    agents[plan.parent].spend(plan.parent_cost);
    for (&mate, &cost) in &plan.mate_costs {
        agents[mate].spend(cost);
    }

    let parent = &agents[plan.parent];
    plan.children
        .into_iter()
        .map(|planned| {
            let mate = planned.mate.map(|m| &agents[m]);
            let child = build_child(parent, mate, planned, *next_id, registry, tick, params, rng);
            *next_id += 1;
            child
        })
        .collect()
}

/// Plans and executes one reproduction of `parent`.
pub fn reproduce<R: Rng + ?Sized>(
    parent: usize,
    agents: &mut [Agent],
    registry: &mut SpeciesRegistry,
    next_id: &mut AgentId,
    tick: u64,
    params: &Params,
    rng: &mut R,
) -> Vec<Agent> {
    match plan(parent, agents, params, rng) {
        Some(plan) => execute(plan, agents, registry, next_id, tick, params, rng),
        None => Vec::new(),
    }
}

#[allow(clippy::too_many_arguments)]
fn build_child<R: Rng + ?Sized>(
    parent: &Agent,
    mate: Option<&Agent>,
    planned: PlannedChild,
    id: AgentId,
    registry: &mut SpeciesRegistry,
    tick: u64,
    params: &Params,
    rng: &mut R,
) -> Agent {
    // a founder keeps the traits its energy was planned from
    let traits = planned.traits;
    let species = if chance(rng, params.speciation_rate) {
        registry
            .create_from_parent(parent.species, &params.traits, tick, rng)
            .unwrap_or(parent.species)
    } else {
        parent.species
    };

    let jitter = params.spawn_jitter;
    let offset = vec2(
        rng.random_range(-1.0_f32..=1.0) * jitter,
        rng.random_range(-1.0_f32..=1.0) * jitter,
    );
    let pos = wrap_around(parent.pos + offset, params.world_width, params.world_height);

    let mut child = Agent::new(id, traits, species, pos, params, rng);
    child
        .brain
        .transfer_weights_from(&parent.brain, mate.map(|m| &m.brain), rng);

    let rate = child.traits.mutation_rate * child.traits.learning_rate;
    for _ in 0..cascade_depth(rng, params.max_mutation_cascade) {
        child.brain.mutate(rate, params.mutation_strategy, rng);
    }

    child.parent_ids = std::iter::once(parent.id).chain(mate.map(|m| m.id)).collect();
    child.generation = mate.map_or(parent.generation, |m| m.generation.max(parent.generation)) + 1;
    child.cluster = parent.cluster;
    child.energy = planned.energy.clamp(0.0, child.max_energy());
    child.fitness = 0.0;
    child.age = 0;

    debug!(
        "Agent {} born to {:?} (species {}, generation {})",
        child.id, child.parent_ids, child.species, child.generation
    );
    child
}
