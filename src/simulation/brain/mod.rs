//! Neural controller for agent behavior.
//!
//! A fixed-topology feedforward network with support for the genetic
//! operators the evolution engine needs: mutation, uniform crossover,
//! weight transfer between differently shaped networks, and a flat genome
//! encoding for persistence.

use ndarray::Array1;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::sampling::gaussian;

pub mod layer;

pub use layer::Layer;

/// Every weight and bias stays within `[-PARAM_BOUND, PARAM_BOUND]` after mutation.
pub const PARAM_BOUND: f32 = 2.0;

/// Activation function applied after every layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    /// Leaky rectified linear unit (slope 0.01 below zero).
    LeakyRelu,
    /// Swish / SiLU: `x · sigmoid(x)`.
    Swish,
    /// Exponential linear unit.
    Elu,
    /// Hyperbolic tangent.
    #[default]
    Tanh,
}

impl Activation {
    /// Applies the activation to a single value.
    #[inline]
    pub fn apply(self, x: f32) -> f32 {
        match self {
            Activation::LeakyRelu => {
                if x > 0.0 {
                    x
                } else {
                    0.01 * x
                }
            }
            Activation::Swish => x / (1.0 + (-x).exp()),
            Activation::Elu => {
                if x > 0.0 {
                    x
                } else {
                    x.exp() - 1.0
                }
            }
            Activation::Tanh => x.tanh(),
        }
    }
}

/// Weight initialization strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitStrategy {
    /// Uniform in `[-1, 1]`.
    Random,
    /// Uniform in `±√(2 / (fan_in + fan_out))`.
    #[default]
    Xavier,
    /// Uniform in `±√(2 / fan_in)`.
    He,
}

impl InitStrategy {
    /// Weight scale for a layer with the given fan-in and fan-out.
    pub fn scale(self, fan_in: usize, fan_out: usize) -> f32 {
        match self {
            InitStrategy::Random => 1.0,
            InitStrategy::Xavier => (2.0 / (fan_in + fan_out).max(1) as f32).sqrt(),
            InitStrategy::He => (2.0 / fan_in.max(1) as f32).sqrt(),
        }
    }
}

/// How [`Brain::mutate`] perturbs a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationStrategy {
    /// Add a Gaussian sample scaled by the rate.
    #[default]
    Gaussian,
    /// Move toward a fresh uniform `[-1, 1]` value by the rate.
    Interpolate,
}

impl MutationStrategy {
    /// Returns the perturbed value, clamped to the parameter bound.
    pub fn perturb<R: Rng + ?Sized>(self, value: f32, rate: f32, rng: &mut R) -> f32 {
        let rate = if rate.is_finite() { rate } else { 0.0 };
        let next = match self {
            MutationStrategy::Gaussian => value + gaussian(rng) * rate,
            MutationStrategy::Interpolate => {
                let target = rng.random_range(-1.0_f32..=1.0);
                value + (target - value) * rate
            }
        };
        if next.is_nan() {
            value.clamp(-PARAM_BOUND, PARAM_BOUND)
        } else {
            next.clamp(-PARAM_BOUND, PARAM_BOUND)
        }
    }
}

/// Errors raised by controller operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BrainError {
    /// The input vector does not match the first layer.
    #[error("controller expects {expected} inputs, got {actual}")]
    InputSize {
        /// Inputs the first layer consumes.
        expected: usize,
        /// Inputs provided.
        actual: usize,
    },
    /// Crossover requires identical layer sizes.
    #[error("architecture mismatch: {left:?} vs {right:?}")]
    ArchitectureMismatch {
        /// Layer sizes of the receiver.
        left: Vec<usize>,
        /// Layer sizes of the other controller.
        right: Vec<usize>,
    },
    /// A flat genome has the wrong number of values.
    #[error("genome has {actual} values, controller needs {expected}")]
    GenomeLength {
        /// Parameters the controller holds.
        expected: usize,
        /// Values supplied.
        actual: usize,
    },
}

/// A feedforward neural network, the "brain" that controls an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brain {
    /// Ordered layers from input to output.
    pub layers: Vec<Layer>,
    /// Activation applied after every layer.
    pub activation: Activation,
}

impl Brain {
    /// Creates a new brain. `layer_sizes` lists the input width followed by every layer's output width.
    pub fn new<R: Rng + ?Sized>(
        layer_sizes: &[usize],
        init: InitStrategy,
        activation: Activation,
        rng: &mut R,
    ) -> Self {
        let layers = layer_sizes
            .windows(2)
            .map(|pair| Layer::new(pair[0], pair[1], init, rng))
            .collect();

        Self { layers, activation }
    }

    /// Input width followed by every layer's output width.
    pub fn layer_sizes(&self) -> Vec<usize> {
        let mut sizes = Vec::with_capacity(self.layers.len() + 1);
        if let Some(first) = self.layers.first() {
            sizes.push(first.input_size());
        }
        sizes.extend(self.layers.iter().map(Layer::output_size));
        sizes
    }

    /// Number of inputs [`Brain::think`] expects.
    pub fn input_size(&self) -> usize {
        self.layers.first().map_or(0, Layer::input_size)
    }

    /// Total number of weights and biases, equal to `to_flat_vector().len()`.
    pub fn parameter_count(&self) -> usize {
        self.layers.iter().map(Layer::parameter_count).sum()
    }

    /// Runs a forward pass through all layers.
    ///
    /// Purely deterministic given the inputs and parameters.
    pub fn think(&self, inputs: &Array1<f32>) -> Result<Array1<f32>, BrainError> {
        if !self.layers.is_empty() && inputs.len() != self.input_size() {
            return Err(BrainError::InputSize {
                expected: self.input_size(),
                actual: inputs.len(),
            });
        }

        let mut output = inputs.clone();
        for layer in &self.layers {
            output = layer.forward(&output, self.activation);
        }
        Ok(output)
    }

    /// Mutates every parameter of every layer.
    pub fn mutate<R: Rng + ?Sized>(&mut self, rate: f32, strategy: MutationStrategy, rng: &mut R) {
        for layer in &mut self.layers {
            layer.mutate(rate, strategy, rng);
        }
    }

    /// Creates a child whose every parameter is copied from one of the parents.
    pub fn crossover<R: Rng + ?Sized>(&self, other: &Brain, rng: &mut R) -> Result<Self, BrainError> {
        let (left, right) = (self.layer_sizes(), other.layer_sizes());
        if left != right {
            return Err(BrainError::ArchitectureMismatch { left, right });
        }

        let layers = self
            .layers
            .iter()
            .zip(&other.layers)
            .map(|(a, b)| a.crossover(b, rng))
            .collect();

        Ok(Self {
            layers,
            activation: self.activation,
        })
    }

    /// Copies overlapping parameters from one or two source brains.
    ///
    /// Used when a child's architecture differs from its parents'. Positions
    /// that exist in a source are copied verbatim; with two sources each
    /// shared position comes from one of them. New positions keep their
    /// freshly initialized values.
    pub fn transfer_weights_from<R: Rng + ?Sized>(
        &mut self,
        primary: &Brain,
        secondary: Option<&Brain>,
        rng: &mut R,
    ) {
        for (index, layer) in self.layers.iter_mut().enumerate() {
            let a = primary.layers.get(index);
            let b = secondary.and_then(|brain| brain.layers.get(index));
            layer.transfer_from(a, b, rng);
        }
    }

    /// Flattens the brain: per layer, biases then weights, in construction order.
    pub fn to_flat_vector(&self) -> Vec<f32> {
        let mut flat = Vec::with_capacity(self.parameter_count());
        for layer in &self.layers {
            layer.flatten_into(&mut flat);
        }
        flat
    }

    /// Restores all parameters from a vector produced by [`Brain::to_flat_vector`].
    ///
    /// The vector must hold exactly [`Brain::parameter_count`] values; on a
    /// mismatch nothing is modified.
    pub fn restore(&mut self, values: &[f32]) -> Result<(), BrainError> {
        let expected = self.parameter_count();
        if values.len() != expected {
            return Err(BrainError::GenomeLength {
                expected,
                actual: values.len(),
            });
        }

        let mut offset = 0;
        for layer in &mut self.layers {
            offset += layer.restore_from(&values[offset..]);
        }
        Ok(())
    }
}
