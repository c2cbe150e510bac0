//! # Ecosim - Evolving Agent Ecosystem
//!
//! A simulation of agents with neural network brains that perceive the world
//! through rays and evolve through a continuous genetic algorithm.
//!
//! ## Features
//!
//! - Feedforward neural controllers with evolvable, per-agent architecture
//! - Ray-based perception of other agents and resources
//! - Genetic traits with mutation, crossover and speciation
//! - Reproduction with all-or-nothing energy accounting
//! - Territorial clusters and recovery from total extinction
//! - Seeded, replayable randomness
//! - Save/load of populations
//!
//! ## Core Modules
//!
//! - [`simulation::agent`] - Agent behavior and state
//! - [`simulation::brain`] - Neural network implementation
//! - [`simulation::ecosystem`] - Main simulation logic
//! - [`simulation::perception`] - Raycasting senses
//! - [`simulation::reproduction`] - Reproduction protocol
//! - [`simulation::species`] - Species registry

/// Core simulation logic and data structures.
pub mod simulation {
    /// Agent state, lifecycle and per-tick behavior.
    pub mod agent;
    /// Neural network implementation for agent brains.
    pub mod brain;
    /// Territorial cluster layout.
    pub mod cluster;
    /// Main ecosystem simulation with parallel updates.
    pub mod ecosystem;
    /// Fitness scoring.
    pub mod fitness;
    /// Elite snapshots used for extinction recovery.
    pub mod gene_pool;
    /// Geometric utility functions for raycasting and world wrapping.
    pub mod geometry;
    /// Trait for locatable entities.
    ///
    /// The [`locatable::Locatable`] trait is implemented by all entities that have
    /// a position in 2D space (Agent, Resource).
    pub mod locatable;
    /// Simulation parameters.
    pub mod params;
    /// Raycasting perception.
    pub mod perception;
    /// Population save/load.
    pub mod persistence;
    /// Reproduction protocol.
    pub mod reproduction;
    /// Resources agents consume for energy.
    pub mod resource;
    /// Random sampling helpers.
    pub mod sampling;
    /// KD-tree spatial index.
    pub mod spatial;
    /// Species registry.
    pub mod species;
    /// Population statistics.
    pub mod stats;
    /// Genetic traits.
    pub mod traits;
}
