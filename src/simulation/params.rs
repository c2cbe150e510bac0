use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::brain::{Activation, InitStrategy, MutationStrategy};
use super::traits::{Gene, TraitRanges};

/// Largest accepted `stats_history`.
pub const MAX_STATS_HISTORY: usize = 100_000;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A scalar parameter is out of its allowed domain.
    #[error("invalid parameter `{name}`: {reason}")]
    Invalid {
        /// Parameter name.
        name: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },
    /// A trait range is degenerate or inconsistent.
    #[error("invalid trait range for {gene:?}: {reason}")]
    TraitRange {
        /// Offending gene.
        gene: Gene,
        /// What is wrong with it.
        reason: &'static str,
    },
    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    /// The configuration file is not valid JSON for [`Params`].
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Geometry of the territorial cluster layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterParams {
    /// Number of clusters. Zero is treated as one.
    pub count: usize,
    /// Radius of each cluster.
    pub radius: f32,
    /// Distance between neighboring cluster centers.
    pub spacing: f32,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            count: 3,
            radius: 150.0,
            spacing: 500.0,
        }
    }
}

/// Simulation parameters, loaded once per reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Seed for the simulation's random generator; `None` seeds from the OS.
    pub seed: Option<u64>,
    /// Simulation area width (centered on the origin).
    pub world_width: f32,
    /// Simulation area height (centered on the origin).
    pub world_height: f32,
    /// Target population size.
    pub population_size: usize,
    /// Species created for the initial population.
    pub initial_species: usize,
    /// Fraction of top-fitness agents retained in the gene pool snapshot.
    pub selection_rate: f32,
    /// Base controller mutation rate for emergency spawns and diversity injection.
    pub mutation_rate: f32,
    /// How controller parameters are perturbed.
    pub mutation_strategy: MutationStrategy,
    /// How new controller layers are initialized.
    pub init_strategy: InitStrategy,
    /// Controller activation function.
    pub activation: Activation,
    /// Upper bound on mutation passes applied to a newborn.
    pub max_mutation_cascade: u32,
    /// Agents die once their age reaches this value.
    pub max_age: u32,
    /// First age at which an agent may reproduce.
    pub fertile_age_min: u32,
    /// Last age at which an agent may reproduce.
    pub fertile_age_max: u32,
    /// Probability of choosing a mate when one is eligible.
    pub sexual_reproduction_chance: f32,
    /// Child energy as a fraction of the child's own capacity.
    pub child_energy_fraction: f32,
    /// Fixed reproduction overhead as a fraction of the parent's capacity.
    pub reproduction_overhead: f32,
    /// Share of each child's energy a mate pays.
    pub mate_contribution: f32,
    /// No offspring once population exceeds this multiple of `population_size`.
    pub population_soft_cap: f32,
    /// Probability that a child founds a new species.
    pub speciation_rate: f32,
    /// Distance from the parent at which children are placed.
    pub spawn_jitter: f32,
    /// Extinction mitigation runs below this population.
    pub extinction_threshold: usize,
    /// Fraction of `population_size` respawned after a total collapse.
    pub emergency_spawn_rate: f32,
    /// Energy of emergency spawns as a fraction of their capacity.
    pub emergency_energy_fraction: f32,
    /// Mutate emergency clones for diversity.
    pub diversity_boost: bool,
    /// Per-tick probability of a diversity injection while endangered.
    pub diversity_injection_chance: f32,
    /// Energy drained per tick before the efficiency trait is applied.
    pub metabolic_cost: f32,
    /// Whether agents may rotate.
    pub rotation_enabled: bool,
    /// Ticks between statistics snapshots.
    pub stats_interval: u64,
    /// Maximum statistics snapshots retained.
    pub stats_history: usize,
    /// Target resource count.
    pub resource_count: usize,
    /// Resources spawned per tick while below target.
    pub resource_spawn_per_tick: usize,
    /// Energy contained in a resource.
    pub resource_energy: f32,
    /// Radius of a resource circle.
    pub resource_radius: f32,
    /// Territorial cluster layout; `None` disables clusters.
    pub clusters: Option<ClusterParams>,
    /// Ranges for every genetic trait.
    pub traits: TraitRanges,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            seed: None,
            world_width: 2000.0,
            world_height: 2000.0,
            population_size: 60,
            initial_species: 4,
            selection_rate: 0.2,
            mutation_rate: 0.1,
            mutation_strategy: MutationStrategy::Gaussian,
            init_strategy: InitStrategy::Xavier,
            activation: Activation::Tanh,
            max_mutation_cascade: 8,
            max_age: 3000,
            fertile_age_min: 100,
            fertile_age_max: 2500,
            sexual_reproduction_chance: 0.7,
            child_energy_fraction: 0.5,
            reproduction_overhead: 0.1,
            mate_contribution: 0.3,
            population_soft_cap: 1.5,
            speciation_rate: 0.01,
            spawn_jitter: 20.0,
            extinction_threshold: 10,
            emergency_spawn_rate: 0.25,
            emergency_energy_fraction: 0.9,
            diversity_boost: true,
            diversity_injection_chance: 0.02,
            metabolic_cost: 0.05,
            rotation_enabled: true,
            stats_interval: 60,
            stats_history: 100,
            resource_count: 150,
            resource_spawn_per_tick: 2,
            resource_energy: 30.0,
            resource_radius: 5.0,
            clusters: Some(ClusterParams::default()),
            traits: TraitRanges::default(),
        }
    }
}

fn probability(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            name,
            reason: "must be within [0, 1]",
        })
    }
}

fn non_negative(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            name,
            reason: "must be finite and non-negative",
        })
    }
}

fn positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            name,
            reason: "must be finite and positive",
        })
    }
}

impl Params {
    /// Parses and validates parameters from JSON.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let params: Self = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    /// Reads, parses and validates parameters from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Checks every parameter and trait range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("world_width", self.world_width)?;
        positive("world_height", self.world_height)?;
        if self.population_size == 0 {
            return Err(ConfigError::Invalid {
                name: "population_size",
                reason: "must be at least 1",
            });
        }
        if !(self.selection_rate > 0.0 && self.selection_rate <= 1.0) {
            return Err(ConfigError::Invalid {
                name: "selection_rate",
                reason: "must be within (0, 1]",
            });
        }
        non_negative("mutation_rate", self.mutation_rate)?;
        if self.max_age == 0 {
            return Err(ConfigError::Invalid {
                name: "max_age",
                reason: "must be at least 1",
            });
        }
        if self.fertile_age_min > self.fertile_age_max {
            return Err(ConfigError::Invalid {
                name: "fertile_age_min",
                reason: "must not exceed fertile_age_max",
            });
        }
        probability("sexual_reproduction_chance", self.sexual_reproduction_chance)?;
        probability("speciation_rate", self.speciation_rate)?;
        probability("diversity_injection_chance", self.diversity_injection_chance)?;
        probability("emergency_spawn_rate", self.emergency_spawn_rate)?;
        probability("emergency_energy_fraction", self.emergency_energy_fraction)?;
        non_negative("child_energy_fraction", self.child_energy_fraction)?;
        non_negative("reproduction_overhead", self.reproduction_overhead)?;
        non_negative("mate_contribution", self.mate_contribution)?;
        positive("population_soft_cap", self.population_soft_cap)?;
        non_negative("spawn_jitter", self.spawn_jitter)?;
        non_negative("metabolic_cost", self.metabolic_cost)?;
        non_negative("resource_energy", self.resource_energy)?;
        positive("resource_radius", self.resource_radius)?;
        if self.stats_interval == 0 {
            return Err(ConfigError::Invalid {
                name: "stats_interval",
                reason: "must be at least 1",
            });
        }
        if self.stats_history > MAX_STATS_HISTORY {
            return Err(ConfigError::Invalid {
                name: "stats_history",
                reason: "must not exceed 100000",
            });
        }

        if let Some(clusters) = &self.clusters {
            non_negative("clusters.radius", clusters.radius)?;
            non_negative("clusters.spacing", clusters.spacing)?;
        }

        self.validate_traits()
    }

    fn validate_traits(&self) -> Result<(), ConfigError> {
        for gene in Gene::ALL {
            let range = self.traits.range(gene);
            let error = |reason| ConfigError::TraitRange { gene, reason };

            if !(range.min.is_finite() && range.max.is_finite() && range.default.is_finite()) {
                return Err(error("bounds must be finite"));
            }
            if range.min >= range.max {
                return Err(error("min must be strictly below max"));
            }
            if !(range.min..=range.max).contains(&range.default) {
                return Err(error("default must lie within [min, max]"));
            }
        }

        for gene in [Gene::RayCount, Gene::HiddenNeurons] {
            if self.traits.range(gene).min < 1.0 {
                return Err(ConfigError::TraitRange {
                    gene,
                    reason: "minimum must be at least 1",
                });
            }
        }
        for gene in [
            Gene::OffspringCount,
            Gene::MaxEnergyCapacity,
            Gene::BodySize,
            Gene::RayLength,
            Gene::EnergyEfficiency,
        ] {
            if self.traits.range(gene).min < 0.0 {
                return Err(ConfigError::TraitRange {
                    gene,
                    reason: "minimum must be non-negative",
                });
            }
        }
        if self.traits.energy_efficiency.min <= 0.0 {
            return Err(ConfigError::TraitRange {
                gene: Gene::EnergyEfficiency,
                reason: "minimum must be positive",
            });
        }

        Ok(())
    }

    /// Layer sizes of a controller for the given ray and hidden counts.
    pub fn layer_sizes(rays: usize, hidden: usize) -> Vec<usize> {
        vec![
            super::perception::input_size(rays),
            hidden,
            super::agent::OUTPUT_SIZE,
        ]
    }
}
