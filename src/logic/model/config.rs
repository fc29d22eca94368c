//! Model Configuration
//!
//! Hyper-parameters of the secret classifier. Serialized verbatim as the
//! `config` section of a snapshot.

use serde::{Deserialize, Serialize};

use crate::logic::error::{EngineError, EngineResult};
use crate::logic::labels::NUM_CLASSES;

fn default_dropout() -> f32 {
    0.1
}

/// Model hyper-parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Token vocabulary size (char codes at or above map to 0)
    pub vocab_size: usize,
    pub hidden_dim: usize,
    pub num_layers: usize,
    pub num_heads: usize,
    /// Secrets are truncated to this many chars
    pub max_seq_len: usize,
    /// high, medium, low, false_positive
    pub num_classes: usize,
    /// Stored for compatibility; inference applies no dropout.
    #[serde(default = "default_dropout")]
    pub dropout: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            vocab_size: 1000,
            hidden_dim: 128,
            num_layers: 2,
            num_heads: 4,
            max_seq_len: 50,
            num_classes: NUM_CLASSES,
            dropout: 0.1,
        }
    }
}

impl ModelConfig {
    /// Small config for tests and quick experiments
    pub fn tiny() -> Self {
        Self {
            vocab_size: 256,
            hidden_dim: 16,
            num_layers: 1,
            num_heads: 2,
            max_seq_len: 24,
            ..Default::default()
        }
    }

    /// Reject dimension combinations the model cannot be built with
    pub fn validate(&self) -> EngineResult<()> {
        if self.num_heads == 0 || self.hidden_dim % self.num_heads != 0 {
            return Err(EngineError::Configuration(format!(
                "hidden_dim {} must be divisible by num_heads {}",
                self.hidden_dim, self.num_heads
            )));
        }
        if self.hidden_dim == 0 || self.vocab_size == 0 || self.max_seq_len == 0 {
            return Err(EngineError::Configuration(
                "hidden_dim, vocab_size and max_seq_len must be non-zero".to_string(),
            ));
        }
        if self.num_classes != NUM_CLASSES {
            return Err(EngineError::Configuration(format!(
                "num_classes must be {}, got {}",
                NUM_CLASSES, self.num_classes
            )));
        }
        Ok(())
    }

    pub fn head_dim(&self) -> usize {
        if self.num_heads == 0 { 0 } else { self.hidden_dim / self.num_heads }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ModelConfig::default();
        assert_eq!(config.vocab_size, 1000);
        assert_eq!(config.hidden_dim, 128);
        assert_eq!(config.head_dim(), 32);
        assert!(config.validate().is_ok());
        assert!(ModelConfig::tiny().validate().is_ok());
    }

    #[test]
    fn test_invalid_heads() {
        let config = ModelConfig { hidden_dim: 10, num_heads: 4, ..Default::default() };
        assert!(matches!(config.validate(), Err(EngineError::Configuration(_))));

        let config = ModelConfig { num_heads: 0, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_classes() {
        let config = ModelConfig { num_classes: 3, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_dropout_defaults_when_missing() {
        let json = r#"{"vocab_size":1000,"hidden_dim":128,"num_layers":2,"num_heads":4,"max_seq_len":50,"num_classes":4}"#;
        let config: ModelConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.dropout, 0.1);
    }
}
