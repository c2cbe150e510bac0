//! Genetic traits: the evolvable parameter vector of an agent.
//!
//! Every numeric trait lives inside a configured `[min, max]` range and is
//! clamped back into it after any genetic operation. Ray count and
//! hidden-neuron count determine the agent's controller architecture.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::sampling::gaussian;

/// Spread of a full-intensity trait mutation, as a fraction of the range span.
const MUTATION_SPREAD: f32 = 0.1;
/// Half-width of the center-biased sampling window, as a fraction of the span.
const CENTER_BIAS: f32 = 0.4;
/// Chance per unit intensity that a boolean trait flips.
const FLIP_CHANCE: f32 = 0.1;

/// Identifies one numeric trait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum Gene {
    BodySize,
    MovementSpeed,
    Acceleration,
    TurnRate,
    Drag,
    RayCount,
    RayLength,
    SensorPrecision,
    FieldOfView,
    EnergyEfficiency,
    DigestionRate,
    MaxEnergyCapacity,
    MutationRate,
    ReproductionThreshold,
    OffspringCount,
    LearningRate,
    HiddenNeurons,
    Aggression,
    Hue,
    Shape,
}

impl Gene {
    /// All numeric genes in declaration order.
    pub const ALL: [Gene; 20] = [
        Gene::BodySize,
        Gene::MovementSpeed,
        Gene::Acceleration,
        Gene::TurnRate,
        Gene::Drag,
        Gene::RayCount,
        Gene::RayLength,
        Gene::SensorPrecision,
        Gene::FieldOfView,
        Gene::EnergyEfficiency,
        Gene::DigestionRate,
        Gene::MaxEnergyCapacity,
        Gene::MutationRate,
        Gene::ReproductionThreshold,
        Gene::OffspringCount,
        Gene::LearningRate,
        Gene::HiddenNeurons,
        Gene::Aggression,
        Gene::Hue,
        Gene::Shape,
    ];
}

/// Inclusive range with a default value for one trait.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraitRange {
    /// Lower bound.
    pub min: f32,
    /// Upper bound.
    pub max: f32,
    /// Value used when no other information is available.
    pub default: f32,
}

impl TraitRange {
    /// Creates a range.
    pub const fn new(min: f32, max: f32, default: f32) -> Self {
        Self { min, max, default }
    }

    /// Width of the range.
    pub fn span(&self) -> f32 {
        self.max - self.min
    }

    /// Midpoint of the range.
    pub fn midpoint(&self) -> f32 {
        (self.min + self.max) * 0.5
    }

    /// Clamps a value into the range.
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            self.default
        } else {
            value.clamp(self.min, self.max)
        }
    }
}

/// Configured ranges for every numeric trait.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
#[serde(default)]
pub struct TraitRanges {
    pub body_size: TraitRange,
    pub movement_speed: TraitRange,
    pub acceleration: TraitRange,
    pub turn_rate: TraitRange,
    pub drag: TraitRange,
    pub ray_count: TraitRange,
    pub ray_length: TraitRange,
    pub sensor_precision: TraitRange,
    pub field_of_view: TraitRange,
    pub energy_efficiency: TraitRange,
    pub digestion_rate: TraitRange,
    pub max_energy_capacity: TraitRange,
    pub mutation_rate: TraitRange,
    pub reproduction_threshold: TraitRange,
    pub offspring_count: TraitRange,
    pub learning_rate: TraitRange,
    pub hidden_neurons: TraitRange,
    pub aggression: TraitRange,
    pub hue: TraitRange,
    pub shape: TraitRange,
}

impl Default for TraitRanges {
    fn default() -> Self {
        Self {
            body_size: TraitRange::new(6.0, 16.0, 10.0),
            movement_speed: TraitRange::new(0.5, 3.0, 1.5),
            acceleration: TraitRange::new(0.05, 0.5, 0.2),
            turn_rate: TraitRange::new(0.02, 0.3, 0.1),
            drag: TraitRange::new(0.01, 0.2, 0.05),
            ray_count: TraitRange::new(3.0, 12.0, 6.0),
            ray_length: TraitRange::new(40.0, 200.0, 100.0),
            sensor_precision: TraitRange::new(0.1, 1.0, 0.5),
            field_of_view: TraitRange::new(0.5, 6.0, 2.0),
            energy_efficiency: TraitRange::new(0.5, 2.0, 1.0),
            digestion_rate: TraitRange::new(0.5, 2.0, 1.0),
            max_energy_capacity: TraitRange::new(80.0, 200.0, 120.0),
            mutation_rate: TraitRange::new(0.01, 0.3, 0.1),
            reproduction_threshold: TraitRange::new(40.0, 150.0, 80.0),
            offspring_count: TraitRange::new(1.0, 4.0, 1.0),
            learning_rate: TraitRange::new(0.1, 2.0, 1.0),
            hidden_neurons: TraitRange::new(4.0, 24.0, 12.0),
            aggression: TraitRange::new(0.0, 1.0, 0.5),
            hue: TraitRange::new(0.0, 360.0, 180.0),
            shape: TraitRange::new(0.0, 1.0, 0.5),
        }
    }
}

impl TraitRanges {
    /// Range of a single gene.
    pub fn range(&self, gene: Gene) -> &TraitRange {
        match gene {
            Gene::BodySize => &self.body_size,
            Gene::MovementSpeed => &self.movement_speed,
            Gene::Acceleration => &self.acceleration,
            Gene::TurnRate => &self.turn_rate,
            Gene::Drag => &self.drag,
            Gene::RayCount => &self.ray_count,
            Gene::RayLength => &self.ray_length,
            Gene::SensorPrecision => &self.sensor_precision,
            Gene::FieldOfView => &self.field_of_view,
            Gene::EnergyEfficiency => &self.energy_efficiency,
            Gene::DigestionRate => &self.digestion_rate,
            Gene::MaxEnergyCapacity => &self.max_energy_capacity,
            Gene::MutationRate => &self.mutation_rate,
            Gene::ReproductionThreshold => &self.reproduction_threshold,
            Gene::OffspringCount => &self.offspring_count,
            Gene::LearningRate => &self.learning_rate,
            Gene::HiddenNeurons => &self.hidden_neurons,
            Gene::Aggression => &self.aggression,
            Gene::Hue => &self.hue,
            Gene::Shape => &self.shape,
        }
    }
}

/// The evolvable parameter vector defining an agent's body, senses,
/// metabolism and reproduction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct GeneticTraits {
    pub body_size: f32,
    pub movement_speed: f32,
    pub acceleration: f32,
    pub turn_rate: f32,
    pub drag: f32,
    pub ray_count: f32,
    pub ray_length: f32,
    pub sensor_precision: f32,
    pub field_of_view: f32,
    /// Whether the agent distinguishes resources from obstacles.
    pub color_perception: bool,
    pub energy_efficiency: f32,
    pub digestion_rate: f32,
    pub max_energy_capacity: f32,
    pub mutation_rate: f32,
    pub reproduction_threshold: f32,
    pub offspring_count: f32,
    pub learning_rate: f32,
    pub hidden_neurons: f32,
    pub aggression: f32,
    pub hue: f32,
    pub shape: f32,
}

impl GeneticTraits {
    /// Traits at every range's default value.
    pub fn from_defaults(ranges: &TraitRanges) -> Self {
        let mut traits = Self {
            body_size: 0.0,
            movement_speed: 0.0,
            acceleration: 0.0,
            turn_rate: 0.0,
            drag: 0.0,
            ray_count: 0.0,
            ray_length: 0.0,
            sensor_precision: 0.0,
            field_of_view: 0.0,
            color_perception: true,
            energy_efficiency: 0.0,
            digestion_rate: 0.0,
            max_energy_capacity: 0.0,
            mutation_rate: 0.0,
            reproduction_threshold: 0.0,
            offspring_count: 0.0,
            learning_rate: 0.0,
            hidden_neurons: 0.0,
            aggression: 0.0,
            hue: 0.0,
            shape: 0.0,
        };
        for gene in Gene::ALL {
            traits.set(gene, ranges.range(gene).default);
        }
        traits
    }

    /// Samples every trait near its range midpoint (±40% of the span).
    pub fn random_centered<R: Rng + ?Sized>(ranges: &TraitRanges, rng: &mut R) -> Self {
        let mut traits = Self::from_defaults(ranges);
        for gene in Gene::ALL {
            let range = ranges.range(gene);
            let offset = rng.random_range(-CENTER_BIAS..=CENTER_BIAS) * range.span();
            traits.set(gene, range.clamp(range.midpoint() + offset));
        }
        traits.color_perception = rng.random_bool(0.5);
        traits
    }

    /// Value of a numeric trait.
    pub fn get(&self, gene: Gene) -> f32 {
        match gene {
            Gene::BodySize => self.body_size,
            Gene::MovementSpeed => self.movement_speed,
            Gene::Acceleration => self.acceleration,
            Gene::TurnRate => self.turn_rate,
            Gene::Drag => self.drag,
            Gene::RayCount => self.ray_count,
            Gene::RayLength => self.ray_length,
            Gene::SensorPrecision => self.sensor_precision,
            Gene::FieldOfView => self.field_of_view,
            Gene::EnergyEfficiency => self.energy_efficiency,
            Gene::DigestionRate => self.digestion_rate,
            Gene::MaxEnergyCapacity => self.max_energy_capacity,
            Gene::MutationRate => self.mutation_rate,
            Gene::ReproductionThreshold => self.reproduction_threshold,
            Gene::OffspringCount => self.offspring_count,
            Gene::LearningRate => self.learning_rate,
            Gene::HiddenNeurons => self.hidden_neurons,
            Gene::Aggression => self.aggression,
            Gene::Hue => self.hue,
            Gene::Shape => self.shape,
        }
    }

    /// Sets a numeric trait without clamping.
    pub fn set(&mut self, gene: Gene, value: f32) {
        let slot = match gene {
            Gene::BodySize => &mut self.body_size,
            Gene::MovementSpeed => &mut self.movement_speed,
            Gene::Acceleration => &mut self.acceleration,
            Gene::TurnRate => &mut self.turn_rate,
            Gene::Drag => &mut self.drag,
            Gene::RayCount => &mut self.ray_count,
            Gene::RayLength => &mut self.ray_length,
            Gene::SensorPrecision => &mut self.sensor_precision,
            Gene::FieldOfView => &mut self.field_of_view,
            Gene::EnergyEfficiency => &mut self.energy_efficiency,
            Gene::DigestionRate => &mut self.digestion_rate,
            Gene::MaxEnergyCapacity => &mut self.max_energy_capacity,
            Gene::MutationRate => &mut self.mutation_rate,
            Gene::ReproductionThreshold => &mut self.reproduction_threshold,
            Gene::OffspringCount => &mut self.offspring_count,
            Gene::LearningRate => &mut self.learning_rate,
            Gene::HiddenNeurons => &mut self.hidden_neurons,
            Gene::Aggression => &mut self.aggression,
            Gene::Hue => &mut self.hue,
            Gene::Shape => &mut self.shape,
        };
        *slot = value;
    }

    /// Clamps every numeric trait into its configured range.
    pub fn clamp(&mut self, ranges: &TraitRanges) {
        for gene in Gene::ALL {
            let value = ranges.range(gene).clamp(self.get(gene));
            self.set(gene, value);
        }
    }

    /// Perturbs every trait with Gaussian noise scaled by `intensity` and the
    /// range span, then clamps.
    pub fn mutate<R: Rng + ?Sized>(&mut self, ranges: &TraitRanges, intensity: f32, rng: &mut R) {
        let intensity = if intensity.is_finite() {
            intensity.max(0.0)
        } else {
            0.0
        };

        for gene in Gene::ALL {
            let range = ranges.range(gene);
            let delta = gaussian(rng) * intensity * range.span() * MUTATION_SPREAD;
            self.set(gene, range.clamp(self.get(gene) + delta));
        }

        if rng.random::<f32>() < intensity * FLIP_CHANCE {
            self.color_perception = !self.color_perception;
        }
    }

    /// Combines two parents gene by gene: each gene is either copied from one
    /// parent or blended with a random weight.
    pub fn crossover<R: Rng + ?Sized>(
        parent1: &GeneticTraits,
        parent2: &GeneticTraits,
        ranges: &TraitRanges,
        rng: &mut R,
    ) -> Self {
        let mut child = parent1.clone();
        for gene in Gene::ALL {
            let (a, b) = (parent1.get(gene), parent2.get(gene));
            let value = if rng.random_bool(0.5) {
                if rng.random_bool(0.5) { a } else { b }
            } else {
                let alpha = rng.random::<f32>();
                a * alpha + b * (1.0 - alpha)
            };
            child.set(gene, ranges.range(gene).clamp(value));
        }
        child.color_perception = if rng.random_bool(0.5) {
            parent1.color_perception
        } else {
            parent2.color_perception
        };
        child
    }

    /// Element-wise mean of a set of trait vectors, or `None` if empty.
    pub fn average<'a>(members: impl IntoIterator<Item = &'a GeneticTraits>) -> Option<Self> {
        let mut iter = members.into_iter();
        let mut sum = iter.next()?.clone();
        let mut count = 1usize;
        let mut perceiving = usize::from(sum.color_perception);

        for traits in iter {
            for gene in Gene::ALL {
                sum.set(gene, sum.get(gene) + traits.get(gene));
            }
            perceiving += usize::from(traits.color_perception);
            count += 1;
        }

        for gene in Gene::ALL {
            sum.set(gene, sum.get(gene) / count as f32);
        }
        sum.color_perception = perceiving * 2 >= count;
        Some(sum)
    }

    /// Number of perception rays.
    pub fn rays(&self) -> usize {
        self.ray_count.round().max(1.0) as usize
    }

    /// Width of the controller's hidden layer.
    pub fn hidden_width(&self) -> usize {
        self.hidden_neurons.round().max(1.0) as usize
    }

    /// Number of children planned per reproduction.
    pub fn offspring(&self) -> usize {
        self.offspring_count.round().max(0.0) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn defaults_match_ranges() {
        let ranges = TraitRanges::default();
        let traits = GeneticTraits::from_defaults(&ranges);
        for gene in Gene::ALL {
            assert_eq!(traits.get(gene), ranges.range(gene).default);
        }
    }

    #[test]
    fn centered_samples_stay_in_inner_window() {
        let ranges = TraitRanges::default();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..200 {
            let traits = GeneticTraits::random_centered(&ranges, &mut rng);
            for gene in Gene::ALL {
                let r = ranges.range(gene);
                let v = traits.get(gene);
                assert!(v >= r.min + 0.1 * r.span() - 1e-3);
                assert!(v <= r.max - 0.1 * r.span() + 1e-3);
            }
        }
    }

    #[test]
    fn heavy_mutation_is_clamped() {
        let ranges = TraitRanges::default();
        let mut rng = StdRng::seed_from_u64(2);
        let mut traits = GeneticTraits::from_defaults(&ranges);
        for _ in 0..50 {
            traits.mutate(&ranges, 100.0, &mut rng);
            for gene in Gene::ALL {
                let r = ranges.range(gene);
                assert!((r.min..=r.max).contains(&traits.get(gene)));
            }
        }
    }

    #[test]
    fn zero_intensity_mutation_is_identity() {
        let ranges = TraitRanges::default();
        let mut rng = StdRng::seed_from_u64(3);
        let original = GeneticTraits::random_centered(&ranges, &mut rng);
        let mut traits = original.clone();
        traits.mutate(&ranges, 0.0, &mut rng);
        assert_eq!(traits, original);
    }

    #[test]
    fn crossover_stays_between_parents() {
        let ranges = TraitRanges::default();
        let mut rng = StdRng::seed_from_u64(4);
        let a = GeneticTraits::random_centered(&ranges, &mut rng);
        let b = GeneticTraits::random_centered(&ranges, &mut rng);
        let child = GeneticTraits::crossover(&a, &b, &ranges, &mut rng);
        for gene in Gene::ALL {
            let lo = a.get(gene).min(b.get(gene));
            let hi = a.get(gene).max(b.get(gene));
            let v = child.get(gene);
            assert!(v >= lo - 1e-4 && v <= hi + 1e-4);
        }
    }

    #[test]
    fn average_of_two() {
        let ranges = TraitRanges::default();
        let mut a = GeneticTraits::from_defaults(&ranges);
        let mut b = a.clone();
        a.body_size = 8.0;
        b.body_size = 12.0;
        let mean = GeneticTraits::average([&a, &b]).unwrap();
        assert!((mean.body_size - 10.0).abs() < 1e-6);
        assert!(GeneticTraits::average(std::iter::empty()).is_none());
    }

    #[test]
    fn derived_sizes_round() {
        let mut traits = GeneticTraits::from_defaults(&TraitRanges::default());
        traits.ray_count = 4.6;
        traits.hidden_neurons = 0.2;
        traits.offspring_count = 1.4;
        assert_eq!(traits.rays(), 5);
        assert_eq!(traits.hidden_width(), 1);
        assert_eq!(traits.offspring(), 1);
    }
}
