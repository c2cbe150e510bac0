//! Saving and loading populations.
//!
//! A saved population is a flat JSON list of agent records. Each record's
//! `genome` is the agent's flattened brain: per layer, biases then weights,
//! in construction order.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use super::agent::Agent;
use super::brain::BrainError;
use super::ecosystem::Ecosystem;
use super::geometry::Vec2;
use super::traits::GeneticTraits;

/// Errors raised while saving or loading a population.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Reading or writing the file failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not a valid record list.
    #[error("invalid population file: {0}")]
    Json(#[from] serde_json::Error),
    /// A genome does not fit the brain it was restored into.
    #[error("genome does not fit the brain: {0}")]
    Brain(#[from] BrainError),
}

/// One saved agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRecord {
    /// Position.
    pub position: Vec2,
    /// Body width.
    pub width: f32,
    /// Body length.
    pub height: f32,
    /// Fitness.
    pub fitness: f32,
    /// Energy.
    pub energy: f32,
    /// Age in ticks.
    pub age: u32,
    /// Generation.
    pub generation: u32,
    /// Species id.
    pub species: u32,
    /// Flattened brain parameters.
    pub genome: Vec<f32>,
    /// Genetic traits; default traits are assumed when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traits: Option<GeneticTraits>,
}

impl AgentRecord {
    /// Captures an agent.
    pub fn from_agent(agent: &Agent) -> Self {
        let (width, height) = agent.dimensions();
        Self {
            position: agent.pos,
            width,
            height,
            fitness: agent.fitness,
            energy: agent.energy,
            age: agent.age,
            generation: agent.generation,
            species: agent.species,
            genome: agent.brain.to_flat_vector(),
            traits: Some(agent.traits.clone()),
        }
    }
}

/// Records for every agent, in population order.
pub fn records(agents: &[Agent]) -> Vec<AgentRecord> {
    agents.iter().map(AgentRecord::from_agent).collect()
}

/// Writes a population to a JSON file.
pub fn save_to_file(agents: &[Agent], path: impl AsRef<Path>) -> Result<(), PersistenceError> {
    let json = serde_json::to_string_pretty(&records(agents))?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Reads records from a JSON file.
pub fn load_from_file(path: impl AsRef<Path>) -> Result<Vec<AgentRecord>, PersistenceError> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

/// Rebuilds one agent inside `ecosystem` without inserting it.
///
/// The brain is sized from the record's traits (or the configured defaults)
/// and must accept the genome exactly.
pub fn restore_agent(ecosystem: &mut Ecosystem, record: &AgentRecord) -> Result<Agent, PersistenceError> {
    let mut traits = record
        .traits
        .clone()
        .unwrap_or_else(|| GeneticTraits::from_defaults(&ecosystem.params().traits));
    traits.clamp(&ecosystem.params().traits);

    let mut agent = ecosystem.new_agent(traits, record.species, record.position);
    agent.brain.restore(&record.genome)?;
    agent.generation = record.generation;
    agent.age = record.age;
    agent.energy = record.energy.clamp(0.0, agent.max_energy());
    agent.fitness = record.fitness.clamp(0.0, 100.0);
    Ok(agent)
}

/// Restores records into `ecosystem`, skipping any whose genome does not fit.
/// Returns the number of agents restored.
pub fn restore_into(ecosystem: &mut Ecosystem, records: &[AgentRecord]) -> usize {
    let mut restored = 0;
    for (i, record) in records.iter().enumerate() {
        match restore_agent(ecosystem, record) {
            Ok(agent) => {
                ecosystem.insert_agent(agent);
                restored += 1;
            }
            Err(e) => warn!("Skipping saved agent {i}: {e}"),
        }
    }
    info!("Restored {restored} of {} saved agents", records.len());
    restored
}
