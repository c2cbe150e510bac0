//! Dense layer of the neural controller.

use ndarray::{Array1, Array2};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{Activation, InitStrategy, MutationStrategy};

/// A single fully connected layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    /// Weight matrix (`input_size` × `output_size`), `weights[[j, i]]` connects input `j` to output `i`.
    pub weights: Array2<f32>,
    /// Bias vector (`output_size`).
    pub biases: Array1<f32>,
}

impl Layer {
    /// Creates a new layer initialized with the given strategy.
    ///
    /// Biases are drawn at half the weight scale.
    pub fn new<R: Rng + ?Sized>(
        input_size: usize,
        output_size: usize,
        init: InitStrategy,
        rng: &mut R,
    ) -> Self {
        let scale = init.scale(input_size, output_size);
        let bias_scale = scale * 0.5;

        Self {
            weights: Array2::from_shape_fn((input_size, output_size), |_| {
                rng.random_range(-scale..=scale)
            }),
            biases: Array1::from_shape_fn(output_size, |_| {
                rng.random_range(-bias_scale..=bias_scale)
            }),
        }
    }

    /// Number of inputs this layer consumes.
    pub fn input_size(&self) -> usize {
        self.weights.nrows()
    }

    /// Number of outputs this layer produces.
    pub fn output_size(&self) -> usize {
        self.biases.len()
    }

    /// Number of weights plus biases.
    pub fn parameter_count(&self) -> usize {
        self.weights.len() + self.biases.len()
    }

    /// Performs the forward pass: `activation(bias[i] + Σ input[j]·weight[j][i])`.
    #[inline]
    pub fn forward(&self, inputs: &Array1<f32>, activation: Activation) -> Array1<f32> {
        let mut output = inputs.dot(&self.weights);
        output += &self.biases;
        output.mapv_inplace(|x| activation.apply(x));
        output
    }

    /// Mutates every weight and bias with the given strategy.
    pub fn mutate<R: Rng + ?Sized>(&mut self, rate: f32, strategy: MutationStrategy, rng: &mut R) {
        for value in self.weights.iter_mut().chain(self.biases.iter_mut()) {
            *value = strategy.perturb(*value, rate, rng);
        }
    }

    /// Creates a new layer taking each parameter from one parent or the other.
    ///
    /// Both layers must have the same shape.
    pub fn crossover<R: Rng + ?Sized>(&self, other: &Layer, rng: &mut R) -> Self {
        Self {
            weights: Array2::from_shape_fn(self.weights.dim(), |idx| {
                if rng.random_bool(0.5) {
                    self.weights[idx]
                } else {
                    other.weights[idx]
                }
            }),
            biases: Array1::from_shape_fn(self.biases.len(), |idx| {
                if rng.random_bool(0.5) {
                    self.biases[idx]
                } else {
                    other.biases[idx]
                }
            }),
        }
    }

    /// Copies every position that also exists in `primary` (or `secondary`).
    ///
    /// Positions present in both sources are taken from one of them at random.
    /// Positions present in neither keep their current value.
    pub fn transfer_from<R: Rng + ?Sized>(
        &mut self,
        primary: Option<&Layer>,
        secondary: Option<&Layer>,
        rng: &mut R,
    ) {
        for (idx, weight) in self.weights.indexed_iter_mut() {
            let a = primary.and_then(|layer| layer.weights.get(idx).copied());
            let b = secondary.and_then(|layer| layer.weights.get(idx).copied());
            if let Some(value) = pick(a, b, rng) {
                *weight = value;
            }
        }

        for (idx, bias) in self.biases.indexed_iter_mut() {
            let a = primary.and_then(|layer| layer.biases.get(idx).copied());
            let b = secondary.and_then(|layer| layer.biases.get(idx).copied());
            if let Some(value) = pick(a, b, rng) {
                *bias = value;
            }
        }
    }

    /// Appends biases, then weights, to `flat`.
    pub fn flatten_into(&self, flat: &mut Vec<f32>) {
        flat.extend(self.biases.iter().copied());
        flat.extend(self.weights.iter().copied());
    }

    /// Overwrites biases, then weights, from the front of `values`.
    ///
    /// Returns the number of values consumed. The caller checks the length.
    pub fn restore_from(&mut self, values: &[f32]) -> usize {
        let mut consumed = 0;
        for (bias, value) in self.biases.iter_mut().zip(values) {
            *bias = *value;
            consumed += 1;
        }
        for (weight, value) in self.weights.iter_mut().zip(&values[consumed..]) {
            *weight = *value;
            consumed += 1;
        }
        consumed
    }
}

fn pick<R: Rng + ?Sized>(a: Option<f32>, b: Option<f32>, rng: &mut R) -> Option<f32> {
    match (a, b) {
        (Some(a), Some(b)) => Some(if rng.random_bool(0.5) { a } else { b }),
        (a, b) => a.or(b),
    }
}
