//! Transformer Block
//!
//! `x' = x + Attention(x, x, x, mask)`, `out = x' + FeedForward(x')`.

use ndarray::Array2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::attention::{AttentionWeights, MultiHeadAttention};
use super::feed_forward::{FeedForward, FeedForwardWeights};
use crate::logic::error::EngineResult;

/// Serialized per-layer bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerWeights {
    pub attention: AttentionWeights,
    #[serde(rename = "ffn")]
    pub feed_forward: FeedForwardWeights,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransformerBlock {
    attention: MultiHeadAttention,
    feed_forward: FeedForward,
}

impl TransformerBlock {
    pub fn new<R: Rng + ?Sized>(hidden_dim: usize, num_heads: usize, rng: &mut R) -> EngineResult<Self> {
        Ok(Self {
            attention: MultiHeadAttention::new(hidden_dim, num_heads, rng)?,
            feed_forward: FeedForward::new(hidden_dim, None, rng),
        })
    }

    pub fn from_parts(attention: MultiHeadAttention, feed_forward: FeedForward) -> Self {
        Self { attention, feed_forward }
    }

    pub fn from_weights(weights: &LayerWeights) -> EngineResult<Self> {
        Ok(Self {
            attention: MultiHeadAttention::from_weights(&weights.attention)?,
            feed_forward: FeedForward::from_weights(&weights.feed_forward)?,
        })
    }

    pub fn weights(&self) -> LayerWeights {
        LayerWeights {
            attention: self.attention.weights(),
            feed_forward: self.feed_forward.weights(),
        }
    }

    pub fn attention(&self) -> &MultiHeadAttention {
        &self.attention
    }

    pub fn feed_forward(&self) -> &FeedForward {
        &self.feed_forward
    }

    pub fn parameter_count(&self) -> usize {
        self.attention.parameter_count() + self.feed_forward.parameter_count()
    }

    pub fn forward(&self, x: &Array2<f32>, mask: Option<&Array2<f32>>) -> Array2<f32> {
        let x = x + &self.attention.forward(x, x, x, mask);
        let ff = self.feed_forward.forward(&x);
        x + ff
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_block_is_residual() {
        // zero attention + zero-output ffn → identity
        let mut rng = StdRng::seed_from_u64(5);
        let mut ffn_weights = FeedForward::new(4, None, &mut rng).weights();
        for row in ffn_weights.w2.iter_mut() {
            row.iter_mut().for_each(|v| *v = 0.0);
        }
        let block = TransformerBlock::from_parts(
            MultiHeadAttention::zeros(4, 2).unwrap(),
            FeedForward::from_weights(&ffn_weights).unwrap(),
        );

        let x = Array2::from_shape_fn((3, 4), |(i, j)| (i * 4 + j) as f32);
        assert_eq!(block.forward(&x, None), x);
    }

    #[test]
    fn test_weights_roundtrip() {
        let mut rng = StdRng::seed_from_u64(6);
        let block = TransformerBlock::new(8, 2, &mut rng).unwrap();
        assert_eq!(TransformerBlock::from_weights(&block.weights()).unwrap(), block);
    }
}
