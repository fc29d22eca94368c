//! Tensor helpers shared by the layers
//!
//! Softmax, layer norm, random init and row-list conversion for snapshots.

use ndarray::{Array1, Array2, Zip};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

use crate::logic::error::{EngineError, EngineResult};

/// Std-dev of the initial weight distribution
pub const INIT_STD: f32 = 0.02;

/// Epsilon inside the layer-norm square root
pub const LAYER_NORM_EPS: f32 = 1e-6;

/// Matrix drawn from N(0, std²)
pub fn normal_matrix<R: Rng + ?Sized>(rows: usize, cols: usize, std: f32, rng: &mut R) -> Array2<f32> {
    Array2::from_shape_fn((rows, cols), |_| {
        let z: f32 = StandardNormal.sample(rng);
        z * std
    })
}

/// Softmax over a vector with max-subtraction
pub fn softmax(logits: &Array1<f32>) -> Array1<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if max == f32::NEG_INFINITY {
        return Array1::zeros(logits.len());
    }
    let exp = logits.mapv(|v| (v - max).exp());
    let sum = exp.sum();
    exp / sum
}

/// Row-wise softmax. A row that is entirely -inf yields all zeros.
pub fn softmax_rows(scores: &Array2<f32>) -> Array2<f32> {
    let mut out = scores.clone();
    for mut row in out.rows_mut() {
        let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        if max == f32::NEG_INFINITY {
            row.fill(0.0);
            continue;
        }
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        row.mapv_inplace(|v| v / sum);
    }
    out
}

/// Layer norm over the last axis (population variance), then scale/bias
pub fn layer_norm(x: &Array2<f32>, scale: &Array1<f32>, bias: &Array1<f32>, eps: f32) -> Array2<f32> {
    let mut out = x.clone();
    for row in out.rows_mut() {
        let n = row.len() as f32;
        let mean = row.sum() / n;
        let var = row.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n;
        let denom = (var + eps).sqrt();

        Zip::from(row)
            .and(scale)
            .and(bias)
            .for_each(|v, &s, &b| *v = (*v - mean) / denom * s + b);
    }
    out
}

/// Index of the largest value; first one wins on ties
pub fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

// ============================================================================
// SNAPSHOT CONVERSION
// ============================================================================

pub fn to_rows(matrix: &Array2<f32>) -> Vec<Vec<f32>> {
    matrix.rows().into_iter().map(|row| row.to_vec()).collect()
}

/// Rebuild a matrix from nested rows, checking the expected shape
pub fn from_rows(name: &str, rows: &[Vec<f32>], shape: (usize, usize)) -> EngineResult<Array2<f32>> {
    if rows.len() != shape.0 {
        return Err(EngineError::Serialization(format!(
            "{}: expected {} rows, got {}",
            name,
            shape.0,
            rows.len()
        )));
    }
    let mut flat = Vec::with_capacity(shape.0 * shape.1);
    for (i, row) in rows.iter().enumerate() {
        if row.len() != shape.1 {
            return Err(EngineError::Serialization(format!(
                "{}: row {} has {} columns, expected {}",
                name,
                i,
                row.len(),
                shape.1
            )));
        }
        flat.extend_from_slice(row);
    }
    Array2::from_shape_vec(shape, flat)
        .map_err(|e| EngineError::Serialization(format!("{}: {}", name, e)))
}

pub fn from_vec(name: &str, values: &[f32], len: usize) -> EngineResult<Array1<f32>> {
    if values.len() != len {
        return Err(EngineError::Serialization(format!(
            "{}: expected {} values, got {}",
            name,
            len,
            values.len()
        )));
    }
    Ok(Array1::from(values.to_vec()))
}
