//! Deterministic placement of territorial clusters.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::geometry::{Vec2, vec2};
use super::params::ClusterParams;

/// A circular territorial zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// Index of the cluster in its layout.
    pub id: usize,
    /// Center of the zone.
    pub center: Vec2,
    /// Radius of the zone.
    pub radius: f32,
}

/// Immutable set of clusters computed from count, radius and spacing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterLayout {
    clusters: Vec<Cluster>,
}

impl ClusterLayout {
    /// Computes the layout.
    ///
    /// One cluster sits at the origin; two sit at `±spacing / 2` on the x
    /// axis; three or more sit on the vertices of a regular polygon whose
    /// circumradius makes neighbors exactly `spacing` apart. A count of zero
    /// is treated as one.
    pub fn new(count: usize, radius: f32, spacing: f32) -> Self {
        let count = count.max(1);

        let centers: Vec<Vec2> = match count {
            1 => vec![vec2(0.0, 0.0)],
            2 => vec![vec2(-spacing * 0.5, 0.0), vec2(spacing * 0.5, 0.0)],
            k => {
                let step = std::f32::consts::TAU / k as f32;
                let circumradius = spacing / (2.0 * (std::f32::consts::PI / k as f32).sin());
                (0..k)
                    .map(|i| {
                        let angle = i as f32 * step;
                        vec2(circumradius * angle.cos(), circumradius * angle.sin())
                    })
                    .collect()
            }
        };

        let clusters = centers
            .into_iter()
            .enumerate()
            .map(|(id, center)| Cluster { id, center, radius })
            .collect();

        Self { clusters }
    }

    /// Builds the layout described by the configuration.
    pub fn from_params(params: &ClusterParams) -> Self {
        Self::new(params.count, params.radius, params.spacing)
    }

    /// All clusters in id order.
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// Number of clusters.
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// Always false: a layout holds at least one cluster.
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Cluster by id.
    pub fn get(&self, id: usize) -> Option<&Cluster> {
        self.clusters.get(id)
    }

    /// Random point inside a cluster.
    ///
    /// Angle and distance are both uniform, so samples concentrate toward the
    /// center rather than being uniform by area.
    pub fn random_point_in<R: Rng + ?Sized>(&self, id: usize, rng: &mut R) -> Option<Vec2> {
        let cluster = self.get(id)?;
        let angle = rng.random_range(0.0..std::f32::consts::TAU);
        let distance = rng.random_range(0.0..=cluster.radius);
        Some(cluster.center + vec2(angle.cos(), angle.sin()) * distance)
    }
}
