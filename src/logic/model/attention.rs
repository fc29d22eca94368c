//! Multi-Head Attention
//!
//! Scaled dot-product self-attention over a `[seq_len, embed_dim]` sequence.
//! Weights start at N(0, 0.02²) so an untrained stack is near-linear.

use ndarray::{s, Array2, Zip};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::math::{from_rows, normal_matrix, softmax_rows, to_rows, INIT_STD};
use crate::logic::error::{EngineError, EngineResult};

/// Serialized attention parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttentionWeights {
    pub w_q: Vec<Vec<f32>>,
    pub w_k: Vec<Vec<f32>>,
    pub w_v: Vec<Vec<f32>>,
    pub w_o: Vec<Vec<f32>>,
    pub embed_dim: usize,
    pub num_heads: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MultiHeadAttention {
    embed_dim: usize,
    num_heads: usize,
    head_dim: usize,
    w_q: Array2<f32>,
    w_k: Array2<f32>,
    w_v: Array2<f32>,
    w_o: Array2<f32>,
}

fn check_dims(embed_dim: usize, num_heads: usize) -> EngineResult<usize> {
    if num_heads == 0 || embed_dim % num_heads != 0 {
        return Err(EngineError::Configuration(format!(
            "embed_dim {} must be divisible by num_heads {}",
            embed_dim, num_heads
        )));
    }
    Ok(embed_dim / num_heads)
}

impl MultiHeadAttention {
    /// Randomly initialised attention
    pub fn new<R: Rng + ?Sized>(embed_dim: usize, num_heads: usize, rng: &mut R) -> EngineResult<Self> {
        let head_dim = check_dims(embed_dim, num_heads)?;
        Ok(Self {
            embed_dim,
            num_heads,
            head_dim,
            w_q: normal_matrix(embed_dim, embed_dim, INIT_STD, rng),
            w_k: normal_matrix(embed_dim, embed_dim, INIT_STD, rng),
            w_v: normal_matrix(embed_dim, embed_dim, INIT_STD, rng),
            w_o: normal_matrix(embed_dim, embed_dim, INIT_STD, rng),
        })
    }

    /// Attention with all projections set to zero
    pub fn zeros(embed_dim: usize, num_heads: usize) -> EngineResult<Self> {
        let head_dim = check_dims(embed_dim, num_heads)?;
        let zero = Array2::zeros((embed_dim, embed_dim));
        Ok(Self {
            embed_dim,
            num_heads,
            head_dim,
            w_q: zero.clone(),
            w_k: zero.clone(),
            w_v: zero.clone(),
            w_o: zero,
        })
    }

    /// Exact reconstruction from a weight bundle
    pub fn from_weights(weights: &AttentionWeights) -> EngineResult<Self> {
        let d = weights.embed_dim;
        let head_dim = check_dims(d, weights.num_heads)?;
        Ok(Self {
            embed_dim: d,
            num_heads: weights.num_heads,
            head_dim,
            w_q: from_rows("attention.w_q", &weights.w_q, (d, d))?,
            w_k: from_rows("attention.w_k", &weights.w_k, (d, d))?,
            w_v: from_rows("attention.w_v", &weights.w_v, (d, d))?,
            w_o: from_rows("attention.w_o", &weights.w_o, (d, d))?,
        })
    }

    pub fn weights(&self) -> AttentionWeights {
        AttentionWeights {
            w_q: to_rows(&self.w_q),
            w_k: to_rows(&self.w_k),
            w_v: to_rows(&self.w_v),
            w_o: to_rows(&self.w_o),
            embed_dim: self.embed_dim,
            num_heads: self.num_heads,
        }
    }

    pub fn embed_dim(&self) -> usize {
        self.embed_dim
    }

    pub fn num_heads(&self) -> usize {
        self.num_heads
    }

    pub fn parameter_count(&self) -> usize {
        4 * self.embed_dim * self.embed_dim
    }

    /// `softmax(Q·Kᵗ / sqrt(head_dim)) · V` per head, heads concatenated,
    /// then projected through `w_o`.
    ///
    /// Mask is `[query_len, key_len]`; a 0 entry forces that score to -inf.
    /// A mask of the wrong shape is ignored.
    pub fn forward(
        &self,
        query: &Array2<f32>,
        key: &Array2<f32>,
        value: &Array2<f32>,
        mask: Option<&Array2<f32>>,
    ) -> Array2<f32> {
        let q = query.dot(&self.w_q);
        let k = key.dot(&self.w_k);
        let v = value.dot(&self.w_v);

        let scale = (self.head_dim as f32).sqrt();
        let mut context = Array2::<f32>::zeros((q.nrows(), self.embed_dim));

        let mask = mask.filter(|m| {
            let ok = m.dim() == (q.nrows(), k.nrows());
            if !ok {
                log::warn!("Attention mask shape {:?} does not match scores, ignoring", m.dim());
            }
            ok
        });

        for h in 0..self.num_heads {
            let (start, end) = (h * self.head_dim, (h + 1) * self.head_dim);
            let qh = q.slice(s![.., start..end]);
            let kh = k.slice(s![.., start..end]);
            let vh = v.slice(s![.., start..end]);

            let mut scores = qh.dot(&kh.t()) / scale;
            if let Some(mask) = mask {
                Zip::from(&mut scores).and(mask).for_each(|score, &m| {
                    if m == 0.0 {
                        *score = f32::NEG_INFINITY;
                    }
                });
            }

            let weights = softmax_rows(&scores);
            context.slice_mut(s![.., start..end]).assign(&weights.dot(&vh));
        }

        context.dot(&self.w_o)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_indivisible_heads_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            MultiHeadAttention::new(10, 3, &mut rng),
            Err(EngineError::Configuration(_))
        ));
        assert!(MultiHeadAttention::zeros(8, 0).is_err());
    }

    #[test]
    fn test_zero_weights_zero_input() {
        let attention = MultiHeadAttention::zeros(8, 2).unwrap();
        let x = Array2::<f32>::zeros((1, 8));
        let out = attention.forward(&x, &x, &x, None);
        assert_eq!(out.dim(), (1, 8));
        assert!(out.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_output_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let attention = MultiHeadAttention::new(16, 4, &mut rng).unwrap();
        let x = normal_matrix(5, 16, 1.0, &mut rng);
        let out = attention.forward(&x, &x, &x, None);
        assert_eq!(out.dim(), (5, 16));
        assert!(out.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_mask_suppresses_positions() {
        // identity projections, one head: output row = weighted mix of value rows
        let eye = to_rows(&Array2::eye(2));
        let attention = MultiHeadAttention::from_weights(&AttentionWeights {
            w_q: eye.clone(),
            w_k: eye.clone(),
            w_v: eye.clone(),
            w_o: eye,
            embed_dim: 2,
            num_heads: 1,
        })
        .unwrap();

        let x = array![[1.0, 0.0], [0.0, 5.0]];
        // each position may only attend to itself
        let mask = array![[1.0, 0.0], [0.0, 1.0]];
        let out = attention.forward(&x, &x, &x, Some(&mask));
        assert!((out[[0, 0]] - 1.0).abs() < 1e-6);
        assert!(out[[0, 1]].abs() < 1e-6);
        assert!((out[[1, 1]] - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_weights_roundtrip() {
        let mut rng = StdRng::seed_from_u64(3);
        let attention = MultiHeadAttention::new(8, 2, &mut rng).unwrap();
        let rebuilt = MultiHeadAttention::from_weights(&attention.weights()).unwrap();
        assert_eq!(attention, rebuilt);
    }
}
