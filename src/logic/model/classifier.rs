//! Secret Classifier - Transformer model for secret confidence
//!
//! Token embeddings + projected feature embedding + positional table,
//! a stack of transformer blocks, mean pooling and a 4-way softmax head.

use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::block::TransformerBlock;
use super::config::ModelConfig;
use super::math::{argmax, normal_matrix, softmax, INIT_STD};
use super::positional::PositionalEncoding;
use super::tokenizer::Tokenizer;
use crate::logic::error::EngineResult;
use crate::logic::features::{FeatureVector, FEATURE_COUNT};
use crate::logic::labels::ConfidenceLevel;

// ============================================================================
// PREDICTION RESULT
// ============================================================================

/// Model output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub prediction: ConfidenceLevel,
    pub confidence: f32,
    /// Absent only for the empty-secret fallback
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probabilities: Option<Vec<f32>>,
}

impl PredictionResult {
    /// Result for a secret that produced no tokens
    pub fn empty() -> Self {
        Self {
            prediction: ConfidenceLevel::Low,
            confidence: 0.0,
            probabilities: None,
        }
    }

    pub fn is_empty_fallback(&self) -> bool {
        self.probabilities.is_none()
    }
}

// ============================================================================
// MODEL
// ============================================================================

/// The classifier; every field is owned, so `clone()` is a deep copy
#[derive(Debug, Clone, PartialEq)]
pub struct SecretClassifier {
    pub(super) config: ModelConfig,
    pub(super) token_embedding: Array2<f32>,
    pub(super) feature_embedding: Array2<f32>,
    pub(super) positional: PositionalEncoding,
    pub(super) layers: Vec<TransformerBlock>,
    pub(super) classifier: Array2<f32>,
    pub(super) classifier_bias: Array1<f32>,
    pub(super) is_trained: bool,
}

impl SecretClassifier {
    /// Random init from the given RNG
    pub fn new<R: Rng + ?Sized>(config: ModelConfig, rng: &mut R) -> EngineResult<Self> {
        config.validate()?;

        let token_embedding = normal_matrix(config.vocab_size, config.hidden_dim, INIT_STD, rng);
        let feature_embedding = normal_matrix(FEATURE_COUNT, config.hidden_dim, INIT_STD, rng);
        let positional = PositionalEncoding::new(config.max_seq_len, config.hidden_dim);

        let layers = (0..config.num_layers)
            .map(|_| TransformerBlock::new(config.hidden_dim, config.num_heads, rng))
            .collect::<EngineResult<Vec<_>>>()?;

        let classifier = normal_matrix(config.hidden_dim, config.num_classes, INIT_STD, rng);
        let classifier_bias = Array1::zeros(config.num_classes);

        Ok(Self {
            config,
            token_embedding,
            feature_embedding,
            positional,
            layers,
            classifier,
            classifier_bias,
            is_trained: false,
        })
    }

    /// Random init, reproducible when a seed is given
    pub fn with_seed(config: ModelConfig, seed: Option<u64>) -> EngineResult<Self> {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::new(config, &mut rng)
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn tokenizer(&self) -> Tokenizer {
        Tokenizer::new(self.config.vocab_size, self.config.max_seq_len)
    }

    pub fn is_trained(&self) -> bool {
        self.is_trained
    }

    pub fn set_trained(&mut self, trained: bool) {
        self.is_trained = trained;
    }

    pub fn layers(&self) -> &[TransformerBlock] {
        &self.layers
    }

    pub fn token_embedding(&self) -> &Array2<f32> {
        &self.token_embedding
    }

    pub fn positional_encoding(&self) -> &PositionalEncoding {
        &self.positional
    }

    pub fn classifier_weights(&self) -> &Array2<f32> {
        &self.classifier
    }

    pub fn classifier_bias(&self) -> &Array1<f32> {
        &self.classifier_bias
    }

    /// Mutable classification head; the only part training touches
    pub fn head_mut(&mut self) -> (&mut Array2<f32>, &mut Array1<f32>) {
        (&mut self.classifier, &mut self.classifier_bias)
    }

    /// Learnable parameters (positional table excluded)
    pub fn parameter_count(&self) -> usize {
        self.token_embedding.len()
            + self.feature_embedding.len()
            + self.classifier.len()
            + self.classifier_bias.len()
            + self.layers.iter().map(TransformerBlock::parameter_count).sum::<usize>()
    }

    /// float32 size estimate in MB
    pub fn estimated_size_mb(&self) -> f32 {
        (self.parameter_count() * 4) as f32 / (1024.0 * 1024.0)
    }

    /// Forward pass. Deterministic; no dropout at inference.
    pub fn forward(&self, secret: &str, features: &FeatureVector) -> PredictionResult {
        let tokens = self.tokenizer().tokenize(secret);
        if tokens.is_empty() {
            return PredictionResult::empty();
        }

        let mut x = self.token_embedding.select(Axis(0), &tokens);

        // one feature embedding, broadcast over every position
        let feature_embed = Array1::from(features.to_vec()).dot(&self.feature_embedding);
        x += &feature_embed;
        x += &self.positional.truncated(tokens.len());

        for layer in &self.layers {
            x = layer.forward(&x, None);
        }

        let pooled = x
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(self.config.hidden_dim));

        let logits = pooled.dot(&self.classifier) + &self.classifier_bias;
        let probs = softmax(&logits).to_vec();

        let idx = argmax(&probs);
        PredictionResult {
            prediction: ConfidenceLevel::from_index(idx).unwrap_or(ConfidenceLevel::Low),
            confidence: probs[idx],
            probabilities: Some(probs),
        }
    }
}
