//! Feed-Forward Block
//!
//! LayerNorm → Linear → ReLU → Linear. The residual is added by the caller.

use ndarray::{Array1, Array2};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::math::{from_rows, from_vec, layer_norm, normal_matrix, to_rows, INIT_STD, LAYER_NORM_EPS};
use crate::logic::error::EngineResult;

/// Serialized feed-forward parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedForwardWeights {
    pub w1: Vec<Vec<f32>>,
    pub b1: Vec<f32>,
    pub w2: Vec<Vec<f32>>,
    pub b2: Vec<f32>,
    pub ln_weight: Vec<f32>,
    pub ln_bias: Vec<f32>,
    pub hidden_dim: usize,
    pub ff_dim: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedForward {
    hidden_dim: usize,
    ff_dim: usize,
    w1: Array2<f32>,
    b1: Array1<f32>,
    w2: Array2<f32>,
    b2: Array1<f32>,
    ln_weight: Array1<f32>,
    ln_bias: Array1<f32>,
}

impl FeedForward {
    /// `ff_dim` defaults to 4 × hidden
    pub fn new<R: Rng + ?Sized>(hidden_dim: usize, ff_dim: Option<usize>, rng: &mut R) -> Self {
        let ff_dim = ff_dim.unwrap_or(hidden_dim * 4);
        Self {
            hidden_dim,
            ff_dim,
            w1: normal_matrix(hidden_dim, ff_dim, INIT_STD, rng),
            b1: Array1::zeros(ff_dim),
            w2: normal_matrix(ff_dim, hidden_dim, INIT_STD, rng),
            b2: Array1::zeros(hidden_dim),
            ln_weight: Array1::ones(hidden_dim),
            ln_bias: Array1::zeros(hidden_dim),
        }
    }

    pub fn from_weights(weights: &FeedForwardWeights) -> EngineResult<Self> {
        let (h, f) = (weights.hidden_dim, weights.ff_dim);
        Ok(Self {
            hidden_dim: h,
            ff_dim: f,
            w1: from_rows("ffn.w1", &weights.w1, (h, f))?,
            b1: from_vec("ffn.b1", &weights.b1, f)?,
            w2: from_rows("ffn.w2", &weights.w2, (f, h))?,
            b2: from_vec("ffn.b2", &weights.b2, h)?,
            ln_weight: from_vec("ffn.ln_weight", &weights.ln_weight, h)?,
            ln_bias: from_vec("ffn.ln_bias", &weights.ln_bias, h)?,
        })
    }

    pub fn weights(&self) -> FeedForwardWeights {
        FeedForwardWeights {
            w1: to_rows(&self.w1),
            b1: self.b1.to_vec(),
            w2: to_rows(&self.w2),
            b2: self.b2.to_vec(),
            ln_weight: self.ln_weight.to_vec(),
            ln_bias: self.ln_bias.to_vec(),
            hidden_dim: self.hidden_dim,
            ff_dim: self.ff_dim,
        }
    }

    pub fn hidden_dim(&self) -> usize {
        self.hidden_dim
    }

    pub fn ff_dim(&self) -> usize {
        self.ff_dim
    }

    pub fn parameter_count(&self) -> usize {
        2 * self.hidden_dim * self.ff_dim + self.ff_dim + 3 * self.hidden_dim
    }

    pub fn forward(&self, x: &Array2<f32>) -> Array2<f32> {
        let normed = layer_norm(x, &self.ln_weight, &self.ln_bias, LAYER_NORM_EPS);
        let hidden = (normed.dot(&self.w1) + &self.b1).mapv(|v| v.max(0.0));
        hidden.dot(&self.w2) + &self.b2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_default_ff_dim() {
        let mut rng = StdRng::seed_from_u64(1);
        let ffn = FeedForward::new(8, None, &mut rng);
        assert_eq!(ffn.ff_dim(), 32);
        assert_eq!(ffn.parameter_count(), 2 * 8 * 32 + 32 + 24);
    }

    #[test]
    fn test_output_shape_matches_input() {
        let mut rng = StdRng::seed_from_u64(2);
        let ffn = FeedForward::new(8, Some(16), &mut rng);
        let x = normal_matrix(3, 8, 1.0, &mut rng);
        assert_eq!(ffn.forward(&x).dim(), (3, 8));
    }

    #[test]
    fn test_constant_rows_normalise_to_bias() {
        // constant rows normalise to zero, so with zero ln_bias and b1/b2
        // the whole block outputs zeros
        let mut rng = StdRng::seed_from_u64(3);
        let ffn = FeedForward::new(4, None, &mut rng);
        let x = Array2::from_elem((2, 4), 3.0);
        assert!(ffn.forward(&x).iter().all(|v| v.abs() < 1e-6));
    }

    #[test]
    fn test_weights_roundtrip() {
        let mut rng = StdRng::seed_from_u64(4);
        let ffn = FeedForward::new(4, None, &mut rng);
        assert_eq!(FeedForward::from_weights(&ffn.weights()).unwrap(), ffn);

        let mut broken = ffn.weights();
        broken.b1.pop();
        assert!(FeedForward::from_weights(&broken).is_err());
    }
}
