//! Engine Configuration
//!
//! Runtime knobs for the analyzer, loaded from environment variables.
//! Model hyper-parameters live in `model::ModelConfig`.

use std::env;
use std::path::PathBuf;

use crate::constants::{
    APP_DIR, DEFAULT_CACHE_TTL_SECS, DEFAULT_CALIBRATION_WINDOW, DEFAULT_LEARNING_RATE,
    DEFAULT_SAMPLE_CAPACITY, ENV_CACHE_TTL_SECS, ENV_CALIBRATION_WINDOW, ENV_LEARNING_RATE,
    ENV_MODEL_PATH, ENV_ONLINE_TRAINING, ENV_SAMPLE_CAPACITY, ENV_SEED, MODEL_FILE_NAME,
};
use super::calibration::MIN_WINDOW;
use super::model::ModelConfig;

/// Analyzer configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Model hyper-parameters used for fresh initialisation
    pub model: ModelConfig,

    /// Where the active model snapshot is loaded from and saved to
    pub model_path: PathBuf,

    /// Learning rate for the classifier-head update
    pub learning_rate: f32,

    /// Max buffered training samples (oldest dropped first)
    pub sample_capacity: usize,

    /// Max calibration records kept per label
    pub calibration_window: usize,

    /// TTL for cached analysis results (seconds)
    pub cache_ttl_secs: u64,

    /// Run a train step on every accepted feedback
    pub online_training: bool,

    /// Seed for reproducible random init
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            model_path: default_model_path(),
            learning_rate: DEFAULT_LEARNING_RATE,
            sample_capacity: DEFAULT_SAMPLE_CAPACITY,
            calibration_window: DEFAULT_CALIBRATION_WINDOW,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            online_training: true,
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            model: ModelConfig::default(),

            model_path: env::var(ENV_MODEL_PATH)
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_model_path()),

            learning_rate: env::var(ENV_LEARNING_RATE)
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|lr: &f32| lr.is_finite() && *lr > 0.0)
                .unwrap_or(DEFAULT_LEARNING_RATE),

            sample_capacity: env::var(ENV_SAMPLE_CAPACITY)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_SAMPLE_CAPACITY),

            calibration_window: env::var(ENV_CALIBRATION_WINDOW)
                .ok()
                .and_then(|s| s.parse().ok())
                .map(|w: usize| w.max(MIN_WINDOW))
                .unwrap_or(DEFAULT_CALIBRATION_WINDOW),

            cache_ttl_secs: env::var(ENV_CACHE_TTL_SECS)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_CACHE_TTL_SECS),

            online_training: env::var(ENV_ONLINE_TRAINING)
                .map(|s| s.to_lowercase() != "false" && s != "0")
                .unwrap_or(true),

            seed: env::var(ENV_SEED).ok().and_then(|s| s.parse().ok()),
        }
    }

    /// Builder-style override of the model snapshot path
    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = path.into();
        self
    }

    pub fn with_model(mut self, model: ModelConfig) -> Self {
        self.model = model;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Default snapshot location: `<data_local_dir>/secret-scorer/llm_model.json`
pub fn default_model_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(MODEL_FILE_NAME)
}
