//! Model Snapshot - Serializer for classifier parameters
//!
//! Structured JSON document: `config`, top-level `weights`, ordered
//! per-layer bundles. Loading validates every shape against the config.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::block::{LayerWeights, TransformerBlock};
use super::classifier::SecretClassifier;
use super::config::ModelConfig;
use super::math::{from_rows, from_vec, to_rows};
use super::positional::PositionalEncoding;
use crate::logic::error::{EngineError, EngineResult};
use crate::logic::features::layout::{validate_layout, LayoutInfo};
use crate::logic::features::FEATURE_COUNT;

// ============================================================================
// DOCUMENT TYPES
// ============================================================================

/// Embeddings, positional table and classification head
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelWeights {
    pub token_embedding: Vec<Vec<f32>>,
    pub feature_embedding: Vec<Vec<f32>>,
    #[serde(rename = "pos_encoding")]
    pub positional_encoding: Vec<Vec<f32>>,
    pub classifier: Vec<Vec<f32>>,
    pub classifier_bias: Vec<f32>,
}

/// Full persisted model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSnapshot {
    pub config: ModelConfig,
    pub weights: ModelWeights,
    pub layers: Vec<LayerWeights>,
    #[serde(default)]
    pub is_trained: bool,
    /// Older documents carry no layout stamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_layout: Option<LayoutInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

// ============================================================================
// CONVERSION
// ============================================================================

impl SecretClassifier {
    pub fn to_snapshot(&self) -> ModelSnapshot {
        ModelSnapshot {
            config: self.config.clone(),
            weights: ModelWeights {
                token_embedding: to_rows(&self.token_embedding),
                feature_embedding: to_rows(&self.feature_embedding),
                positional_encoding: to_rows(self.positional.table()),
                classifier: to_rows(&self.classifier),
                classifier_bias: self.classifier_bias.to_vec(),
            },
            layers: self.layers.iter().map(TransformerBlock::weights).collect(),
            is_trained: self.is_trained,
            feature_layout: Some(LayoutInfo::current()),
            saved_at: Some(Utc::now()),
        }
    }

    pub fn from_snapshot(snapshot: &ModelSnapshot) -> EngineResult<Self> {
        if let Some(layout) = snapshot.feature_layout {
            validate_layout(layout.version, layout.hash)
                .map_err(|e| EngineError::Serialization(e.to_string()))?;
        }

        let config = snapshot.config.clone();
        config.validate()?;
        let (h, c) = (config.hidden_dim, config.num_classes);
        let w = &snapshot.weights;

        let token_embedding = from_rows("token_embedding", &w.token_embedding, (config.vocab_size, h))?;
        let feature_embedding = from_rows("feature_embedding", &w.feature_embedding, (FEATURE_COUNT, h))?;
        let positional = PositionalEncoding::from_table(
            from_rows("pos_encoding", &w.positional_encoding, (config.max_seq_len, h))?,
            config.max_seq_len,
            h,
        )?;
        let classifier = from_rows("classifier", &w.classifier, (h, c))?;
        let classifier_bias = from_vec("classifier_bias", &w.classifier_bias, c)?;

        if snapshot.layers.len() != config.num_layers {
            return Err(EngineError::Serialization(format!(
                "expected {} layers, got {}",
                config.num_layers,
                snapshot.layers.len()
            )));
        }

        let mut layers = Vec::with_capacity(snapshot.layers.len());
        for (i, bundle) in snapshot.layers.iter().enumerate() {
            if bundle.attention.embed_dim != h || bundle.feed_forward.hidden_dim != h {
                return Err(EngineError::Serialization(format!(
                    "layer {}: dims do not match hidden_dim {}",
                    i, h
                )));
            }
            layers.push(TransformerBlock::from_weights(bundle)?);
        }

        Ok(Self {
            config,
            token_embedding,
            feature_embedding,
            positional,
            layers,
            classifier,
            classifier_bias,
            is_trained: snapshot.is_trained,
        })
    }
}

// ============================================================================
// STORAGE
// ============================================================================

/// Save model to disk
pub fn save_model(model: &SecretClassifier, path: &Path) -> EngineResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_vec_pretty(&model.to_snapshot())?;
    fs::write(path, json)?;
    log::info!("Model saved to {}", path.display());
    Ok(())
}

/// Load model from disk, strict
pub fn load_model(path: &Path) -> EngineResult<SecretClassifier> {
    let data = fs::read(path)?;
    let snapshot: ModelSnapshot = serde_json::from_slice(&data)?;
    SecretClassifier::from_snapshot(&snapshot)
}

/// Load a snapshot, falling back to random init.
///
/// Missing or corrupt files are logged and never raised; only an invalid
/// `config` for the fresh model is an error.
pub fn load_or_init(path: &Path, config: &ModelConfig, seed: Option<u64>) -> EngineResult<SecretClassifier> {
    if !path.exists() {
        log::info!("Model file {} not found, using random initialization", path.display());
        return SecretClassifier::with_seed(config.clone(), seed);
    }

    match load_model(path) {
        Ok(model) => {
            log::info!("Model loaded successfully from {}", path.display());
            Ok(model)
        }
        Err(e) => {
            log::warn!("Error loading model from {}: {}, using random initialization", path.display(), e);
            SecretClassifier::with_seed(config.clone(), seed)
        }
    }
}
