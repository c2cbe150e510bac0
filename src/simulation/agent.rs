//! Agent state, lifecycle and per-tick behavior.
//!
//! Agents have genetic traits, a neural network brain sized from those traits,
//! and perceive the world through rays. Each tick they decide on six motor
//! outputs, move, pay a metabolic cost and re-score their fitness.

use ndarray::Array1;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::brain::{Brain, BrainError};
use super::fitness::{self, Vitals};
use super::geometry::{Vec2, heading_vector, left_vector, length, rectangle_corners, wrap_around};
use super::locatable::Locatable;
use super::params::Params;
use super::perception::{self, RayHit, WorldView};
use super::traits::GeneticTraits;

/// Number of controller outputs.
pub const OUTPUT_SIZE: usize = 6;

/// Ratio of an agent's length to its width.
pub const BODY_ASPECT: f32 = 1.5;

/// Unique agent identifier.
pub type AgentId = u64;

/// Motor commands, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Motors {
    /// Move along the heading.
    pub forward: f32,
    /// Move against the heading.
    pub backward: f32,
    /// Move to the left of the heading.
    pub strafe_left: f32,
    /// Move to the right of the heading.
    pub strafe_right: f32,
    /// Turn clockwise.
    pub rotate_cw: f32,
    /// Turn counterclockwise.
    pub rotate_ccw: f32,
}

impl Motors {
    /// Reads the six controller outputs, clamping each into `[0, 1]`.
    ///
    /// Missing outputs read as zero.
    pub fn from_outputs(outputs: &Array1<f32>) -> Self {
        let at = |i: usize| {
            outputs
                .get(i)
                .copied()
                .filter(|v| v.is_finite())
                .map_or(0.0, |v| v.clamp(0.0, 1.0))
        };
        Self {
            forward: at(0),
            backward: at(1),
            strafe_left: at(2),
            strafe_right: at(3),
            rotate_cw: at(4),
            rotate_ccw: at(5),
        }
    }
}

/// What an agent decided to do this tick, computed from a read-only world.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    /// Ray hits that produced the decision.
    pub rays: Vec<RayHit>,
    /// Motor commands.
    pub motors: Motors,
}

/// A simulated organism.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Unique identifier.
    pub id: AgentId,
    /// Zero, one or two parents.
    pub parent_ids: Vec<AgentId>,
    /// 0 for root agents, otherwise one more than the oldest parent generation.
    pub generation: u32,
    /// Species id.
    pub species: u32,
    /// Home cluster, if a layout was configured.
    pub cluster: Option<usize>,
    /// Position in a world centered on the origin.
    pub pos: Vec2,
    /// Heading in radians; 0 faces +y.
    pub heading: f32,
    /// Current energy in `[0, max_energy_capacity]`.
    pub energy: f32,
    /// Fitness in `[0, 100]`.
    pub fitness: f32,
    /// Ticks lived.
    pub age: u32,
    /// Genetic traits.
    pub traits: GeneticTraits,
    /// Controller sized from the traits.
    pub brain: Brain,
    /// Resources eaten.
    pub resources_consumed: u32,
    /// Total distance moved.
    pub distance_traveled: f32,
    /// Ray hits from the last decision, kept for renderers.
    #[serde(skip)]
    pub rays: Vec<RayHit>,
}

impl Agent {
    /// Creates a root agent with a fresh brain built for its traits.
    ///
    /// # Arguments
    ///
    /// * `id` - Unique identifier
    /// * `traits` - Genetic traits; they fix the brain's architecture
    /// * `species` - Species id
    /// * `pos` - Starting position
    /// * `params` - Simulation parameters
    /// * `rng` - Random source for heading and brain initialization
    pub fn new<R: Rng + ?Sized>(
        id: AgentId,
        traits: GeneticTraits,
        species: u32,
        pos: Vec2,
        params: &Params,
        rng: &mut R,
    ) -> Self {
        let brain = build_brain(&traits, params, rng);
        Self {
            id,
            parent_ids: Vec::new(),
            generation: 0,
            species,
            cluster: None,
            pos,
            heading: rng.random_range(0.0..std::f32::consts::TAU),
            energy: traits.max_energy_capacity,
            fitness: 0.0,
            age: 0,
            traits,
            brain,
            resources_consumed: 0,
            distance_traveled: 0.0,
            rays: Vec::new(),
        }
    }

    /// Width and length of the body.
    pub fn dimensions(&self) -> (f32, f32) {
        let width = self.traits.body_size;
        (width, width * BODY_ASPECT)
    }

    /// Corners of the body rectangle, in order around the outline.
    pub fn outline(&self) -> [Vec2; 4] {
        let (width, height) = self.dimensions();
        rectangle_corners(self.pos, width, height, self.heading)
    }

    /// Energy capacity.
    pub fn max_energy(&self) -> f32 {
        self.traits.max_energy_capacity
    }

    /// Checks if the agent is alive.
    pub fn is_alive(&self) -> bool {
        self.energy > 0.0
    }

    /// Checks energy against the reproduction threshold and age against the
    /// fertile window.
    pub fn can_reproduce(&self, params: &Params) -> bool {
        self.energy >= self.traits.reproduction_threshold
            && (params.fertile_age_min..=params.fertile_age_max).contains(&self.age)
    }

    /// Perceives the world and runs the brain.
    pub fn decide(&self, world: &WorldView) -> Result<Decision, BrainError> {
        let rays = perception::cast_rays(self, world);
        let inputs = perception::encode_inputs(self, &rays, world.width, world.height);
        let outputs = self.brain.think(&inputs)?;
        Ok(Decision {
            rays,
            motors: Motors::from_outputs(&outputs),
        })
    }

    /// Moves and turns according to a decision, then pays the metabolic cost
    /// and re-scores fitness.
    pub fn apply(&mut self, decision: Decision, params: &Params) {
        let Motors {
            forward,
            backward,
            strafe_left,
            strafe_right,
            rotate_cw,
            rotate_ccw,
        } = decision.motors;
        let speed = self.traits.movement_speed;

        let displacement = heading_vector(self.heading) * ((forward - backward) * speed)
            + left_vector(self.heading) * ((strafe_left - strafe_right) * speed);
        self.pos = wrap_around(self.pos + displacement, params.world_width, params.world_height);
        self.distance_traveled += length(displacement);

        if params.rotation_enabled {
            self.heading = (self.heading + (rotate_cw - rotate_ccw) * self.traits.turn_rate)
                .rem_euclid(std::f32::consts::TAU);
        }

        self.rays = decision.rays;
        self.spend(params.metabolic_cost / self.traits.energy_efficiency);
        self.update_fitness();
    }

    /// Removes energy, never going below zero.
    pub fn spend(&mut self, amount: f32) {
        self.energy = (self.energy - amount).max(0.0);
    }

    /// Eats a resource worth `energy`, scaled by the digestion rate.
    pub fn consume(&mut self, energy: f32) {
        let gained = energy * self.traits.digestion_rate;
        self.energy = (self.energy + gained).clamp(0.0, self.max_energy());
        self.resources_consumed += 1;
    }

    /// Fitness inputs.
    pub fn vitals(&self) -> Vitals {
        Vitals {
            energy: self.energy,
            max_energy: self.max_energy(),
            age: self.age,
            resources_consumed: self.resources_consumed,
            distance_traveled: self.distance_traveled,
        }
    }

    /// Recomputes fitness from the current state.
    pub fn update_fitness(&mut self) {
        self.fitness = fitness::evaluate(&self.vitals());
    }

    /// Public view of this agent.
    pub fn view(&self) -> AgentView {
        AgentView {
            id: self.id,
            parent_ids: self.parent_ids.clone(),
            species: self.species,
            generation: self.generation,
            position: self.pos,
            heading: self.heading,
            energy: self.energy,
            fitness: self.fitness,
            age: self.age,
            genetic_traits: self.traits.clone(),
        }
    }
}

impl Locatable for Agent {
    fn pos(&self) -> Vec2 {
        self.pos
    }

    fn bounding_radius(&self) -> f32 {
        let (width, height) = self.dimensions();
        0.5 * width.hypot(height)
    }
}

/// Builds a freshly initialized brain sized for `traits`.
pub fn build_brain<R: Rng + ?Sized>(traits: &GeneticTraits, params: &Params, rng: &mut R) -> Brain {
    Brain::new(
        &Params::layer_sizes(traits.rays(), traits.hidden_width()),
        params.init_strategy,
        params.activation,
        rng,
    )
}

/// Snapshot of an agent's public fields, as consumed by lineage and
/// visualization tooling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentView {
    /// Unique identifier.
    pub id: AgentId,
    /// Parent ids.
    pub parent_ids: Vec<AgentId>,
    /// Species id.
    pub species: u32,
    /// Generation.
    pub generation: u32,
    /// Position.
    pub position: Vec2,
    /// Heading in radians.
    pub heading: f32,
    /// Energy.
    pub energy: f32,
    /// Fitness.
    pub fitness: f32,
    /// Age in ticks.
    pub age: u32,
    /// Genetic traits.
    pub genetic_traits: GeneticTraits,
}
