//! Resources agents consume for energy.
//!
//! Resources are circles the perception system can see and agents can eat.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::cluster::ClusterLayout;
use super::geometry::{Vec2, vec2};

/// A circular food item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Center of the resource.
    pub pos: Vec2,
    /// Collision and visibility radius.
    pub radius: f32,
    /// Energy remaining; zero once consumed.
    pub energy: f32,
}

impl Resource {
    /// Creates a resource.
    pub fn new(pos: Vec2, radius: f32, energy: f32) -> Self {
        Self {
            pos,
            radius,
            energy,
        }
    }

    /// Creates a resource at a random position.
    ///
    /// With a cluster layout the resource lands inside a random cluster,
    /// otherwise anywhere in the world.
    pub fn new_random<R: Rng + ?Sized>(
        clusters: Option<&ClusterLayout>,
        world_width: f32,
        world_height: f32,
        radius: f32,
        energy: f32,
        rng: &mut R,
    ) -> Self {
        let pos = clusters
            .and_then(|layout| {
                let id = rng.random_range(0..layout.len().max(1));
                layout.random_point_in(id, rng)
            })
            .unwrap_or_else(|| {
                vec2(
                    rng.random_range(-0.5_f32..=0.5) * world_width,
                    rng.random_range(-0.5_f32..=0.5) * world_height,
                )
            });

        Self::new(pos, radius, energy)
    }

    /// Checks if this resource has been fully consumed.
    pub fn is_consumed(&self) -> bool {
        self.energy <= 0.0
    }

    /// Marks the resource consumed and returns the energy it held.
    pub fn consume(&mut self) -> f32 {
        let energy = self.energy.max(0.0);
        self.energy = 0.0;
        energy
    }
}
