//! Ray-based perception.
//!
//! Every agent casts a fan of rays centered on its heading. Each ray reports
//! the nearest obstacle (another agent's outline) and the nearest resource
//! as a normalized offset along the ray, and the closer of the two becomes
//! the controller input for that ray.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::agent::Agent;
use super::geometry::{Vec2, heading_vector, line_point_distance, ray_circle_intersection, segment_intersection};
use super::locatable::Locatable;
use super::resource::Resource;
use super::spatial::SpatialIndex;

/// Position and heading inputs preceding the ray inputs.
pub const PROPRIOCEPTION_INPUTS: usize = 3;

/// Number of controller inputs produced for an agent with `rays` rays.
pub fn input_size(rays: usize) -> usize {
    PROPRIOCEPTION_INPUTS + 2 * rays
}

/// Nearest hits along one ray, as offsets in `[0, 1]` from the agent to the
/// ray tip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RayHit {
    /// Nearest agent outline edge.
    pub obstacle: Option<f32>,
    /// Nearest resource circle.
    pub resource: Option<f32>,
}

impl RayHit {
    /// Proximities fed to the controller as `(obstacle, resource)`.
    ///
    /// Only the closer hit is reported; the other channel reads zero.
    pub fn proximities(&self) -> (f32, f32) {
        match (self.obstacle, self.resource) {
            (Some(o), Some(r)) if r < o => (0.0, 1.0 - r),
            (Some(o), _) => (1.0 - o, 0.0),
            (None, Some(r)) => (0.0, 1.0 - r),
            (None, None) => (0.0, 0.0),
        }
    }
}

/// Read-only view of the world a perceiving agent sees.
#[derive(Clone, Copy)]
pub struct WorldView<'a> {
    /// All live agents, the perceiving agent included.
    pub agents: &'a [Agent],
    /// All resources.
    pub resources: &'a [Resource],
    /// World width.
    pub width: f32,
    /// World height.
    pub height: f32,
    /// Broadphase index over `agents` and `resources`; `None` tests everything.
    pub index: Option<&'a SpatialIndex>,
}

/// Ray angles spread symmetrically across `fov` around `heading`.
pub fn ray_angles(heading: f32, fov: f32, count: usize) -> Vec<f32> {
    match count {
        0 => Vec::new(),
        1 => vec![heading],
        n => {
            let step = fov / (n - 1) as f32;
            (0..n).map(|i| heading - fov * 0.5 + i as f32 * step).collect()
        }
    }
}

/// Casts all of an agent's rays.
pub fn cast_rays(agent: &Agent, world: &WorldView) -> Vec<RayHit> {
    let reach = agent.traits.ray_length;

    let (agent_candidates, resource_candidates) = match world.index {
        Some(index) => (
            index.query_agents(agent.pos, reach),
            index.query_resources(agent.pos, reach),
        ),
        None => (
            (0..world.agents.len()).collect(),
            (0..world.resources.len()).collect(),
        ),
    };

    let others: Vec<(&Agent, [Vec2; 4])> = agent_candidates
        .into_iter()
        .filter_map(|i| world.agents.get(i))
        .filter(|other| other.id != agent.id)
        .map(|other| (other, other.outline()))
        .collect();
    let resources: Vec<&Resource> = resource_candidates
        .into_iter()
        .filter_map(|i| world.resources.get(i))
        .filter(|r| !r.is_consumed())
        .collect();

    ray_angles(agent.heading, agent.traits.field_of_view, agent.traits.rays())
        .into_iter()
        .map(|angle| {
            let end = agent.pos + heading_vector(angle) * reach;
            RayHit {
                obstacle: nearest_obstacle(agent.pos, end, &others),
                resource: nearest_resource(agent.pos, end, &resources),
            }
        })
        .collect()
}

fn nearest_obstacle(start: Vec2, end: Vec2, others: &[(&Agent, [Vec2; 4])]) -> Option<f32> {
    others
        .iter()
        .filter(|(other, _)| line_point_distance(start, end, other.pos) <= other.bounding_radius())
        .flat_map(|(_, corners)| {
            (0..4).filter_map(move |i| {
                segment_intersection(start, end, corners[i], corners[(i + 1) % 4])
            })
        })
        .reduce(f32::min)
}

fn nearest_resource(start: Vec2, end: Vec2, resources: &[&Resource]) -> Option<f32> {
    resources
        .iter()
        .filter_map(|r| ray_circle_intersection(start, end, r.pos, r.radius))
        .reduce(f32::min)
}

/// Builds the controller input vector from an agent's pose and ray hits.
///
/// Layout: normalized x, normalized y, normalized heading, then one obstacle
/// proximity per ray, then one resource proximity per ray.
pub fn encode_inputs(agent: &Agent, hits: &[RayHit], width: f32, height: f32) -> Array1<f32> {
    let rays = hits.len();
    let mut inputs = Array1::zeros(input_size(rays));

    inputs[0] = agent.pos.x / (width * 0.5);
    inputs[1] = agent.pos.y / (height * 0.5);
    inputs[2] = agent.heading.rem_euclid(std::f32::consts::TAU) / std::f32::consts::TAU;

    for (i, hit) in hits.iter().enumerate() {
        let (obstacle, resource) = hit.proximities();
        inputs[PROPRIOCEPTION_INPUTS + i] = obstacle;
        inputs[PROPRIOCEPTION_INPUTS + rays + i] = resource;
    }

    inputs
}
