//! Spatial indexing for efficient neighbor queries.
//!
//! Perception only needs the entities within reach of an agent's rays, so
//! positions are indexed in KD-trees once per frame.

use kdtree::distance::squared_euclidean;
use kdtree::{ErrorKind as KdTreeError, KdTree};

use super::geometry::Vec2;
use super::locatable::Locatable;

/// Type alias for 2D spatial KD-tree used for efficient neighbor queries.
pub type Tree2D = KdTree<f32, usize, Vec<f32>>;

/// Spatial index over agents and resources.
pub struct SpatialIndex {
    agents: Tree2D,
    resources: Tree2D,
    max_agent_radius: f32,
    max_resource_radius: f32,
}

impl SpatialIndex {
    /// Builds the index from the current agents and resources.
    ///
    /// Fails if any position is not finite.
    pub fn build<A: Locatable, B: Locatable>(
        agents: &[A],
        resources: &[B],
    ) -> Result<Self, KdTreeError> {
        Ok(Self {
            agents: build_tree(agents)?,
            resources: build_tree(resources)?,
            max_agent_radius: max_radius(agents),
            max_resource_radius: max_radius(resources),
        })
    }

    /// Indices of agents whose outline may reach within `radius` of `pos`.
    pub fn query_agents(&self, pos: Vec2, radius: f32) -> Vec<usize> {
        query(&self.agents, pos, radius + self.max_agent_radius)
    }

    /// Indices of resources whose circle may reach within `radius` of `pos`.
    pub fn query_resources(&self, pos: Vec2, radius: f32) -> Vec<usize> {
        query(&self.resources, pos, radius + self.max_resource_radius)
    }
}

fn max_radius<T: Locatable>(items: &[T]) -> f32 {
    items
        .iter()
        .map(Locatable::bounding_radius)
        .fold(0.0, f32::max)
}

fn query(tree: &Tree2D, pos: Vec2, radius: f32) -> Vec<usize> {
    tree.within(&[pos.x, pos.y], radius.powi(2), &squared_euclidean)
        .unwrap_or_default()
        .into_iter()
        .map(|(_, &idx)| idx)
        .collect()
}

/// Helper function to build a KD-tree from a collection of items.
fn build_tree<T: Locatable>(items: &[T]) -> Result<Tree2D, KdTreeError> {
    let mut tree = KdTree::with_capacity(2, items.len().max(1));
    for (i, item) in items.iter().enumerate() {
        let pos = item.pos();
        tree.add(vec![pos.x, pos.y], i)?;
    }
    Ok(tree)
}
