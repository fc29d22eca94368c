//! Sinusoidal positional encoding
//!
//! `pos[p, 2i] = sin(p / 10000^(2i/d))`, `pos[p, 2i+1] = cos(...)`.
//! Built once; never mutated afterwards.

use ndarray::{s, Array2, ArrayView2};

use crate::logic::error::{EngineError, EngineResult};

#[derive(Debug, Clone, PartialEq)]
pub struct PositionalEncoding {
    table: Array2<f32>,
}

impl PositionalEncoding {
    pub fn new(max_seq_len: usize, hidden_dim: usize) -> Self {
        let mut table = Array2::<f32>::zeros((max_seq_len, hidden_dim));
        let d = hidden_dim as f64;

        for p in 0..max_seq_len {
            for i in (0..hidden_dim).step_by(2) {
                let div = (i as f64 * -(10000.0f64.ln() / d)).exp();
                let angle = p as f64 * div;
                table[[p, i]] = angle.sin() as f32;
                if i + 1 < hidden_dim {
                    table[[p, i + 1]] = angle.cos() as f32;
                }
            }
        }

        Self { table }
    }

    /// Wrap a stored table (snapshot load)
    pub fn from_table(table: Array2<f32>, max_seq_len: usize, hidden_dim: usize) -> EngineResult<Self> {
        if table.dim() != (max_seq_len, hidden_dim) {
            return Err(EngineError::Serialization(format!(
                "pos_encoding: expected {:?}, got {:?}",
                (max_seq_len, hidden_dim),
                table.dim()
            )));
        }
        Ok(Self { table })
    }

    pub fn table(&self) -> &Array2<f32> {
        &self.table
    }

    /// First `seq_len` rows
    pub fn truncated(&self, seq_len: usize) -> ArrayView2<'_, f32> {
        let len = seq_len.min(self.table.nrows());
        self.table.slice(s![..len, ..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_zero() {
        let pe = PositionalEncoding::new(4, 6);
        for i in 0..6 {
            let expected = if i % 2 == 0 { 0.0 } else { 1.0 };
            assert!((pe.table()[[0, i]] - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn test_known_value() {
        let pe = PositionalEncoding::new(4, 4);
        // column 2: div = 10000^(-2/4) = 0.01
        assert!((pe.table()[[1, 2]] - 0.01f32.sin()).abs() < 1e-6);
        assert!((pe.table()[[1, 3]] - 0.01f32.cos()).abs() < 1e-6);
        assert!((pe.table()[[1, 0]] - 1.0f32.sin()).abs() < 1e-6);
    }

    #[test]
    fn test_odd_hidden_dim() {
        let pe = PositionalEncoding::new(3, 5);
        assert_eq!(pe.table().dim(), (3, 5));
        assert_eq!(pe.truncated(2).nrows(), 2);
        assert_eq!(pe.truncated(10).nrows(), 3);
    }

    #[test]
    fn test_from_table_shape_check() {
        let pe = PositionalEncoding::new(3, 4);
        assert!(PositionalEncoding::from_table(pe.table().clone(), 3, 4).is_ok());
        assert!(PositionalEncoding::from_table(pe.table().clone(), 4, 4).is_err());
    }
}
