//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! Env readers live in `logic::config`; only edit defaults here.

/// Default learning rate for the classifier-head update
pub const DEFAULT_LEARNING_RATE: f32 = 0.001;

/// Default capacity of the in-memory training sample buffer
pub const DEFAULT_SAMPLE_CAPACITY: usize = 10_000;

/// Default per-label calibration history window
pub const DEFAULT_CALIBRATION_WINDOW: usize = 1_000;

/// Default TTL for cached analysis results (seconds)
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

/// Max entries held by the in-memory analysis cache
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// App directory name under the platform data dir
pub const APP_DIR: &str = "secret-scorer";

/// Model snapshot file name
pub const MODEL_FILE_NAME: &str = "llm_model.json";

/// Feedback log directory, next to the model snapshot
pub const FEEDBACK_DIR: &str = "feedback";

/// Name of the always-present base model version
pub const DEFAULT_VERSION: &str = "default";

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "Secret Scorer";

// ============================================
// Environment variable names
// ============================================

pub const ENV_MODEL_PATH: &str = "SECRET_SCORER_MODEL_PATH";
pub const ENV_LEARNING_RATE: &str = "SECRET_SCORER_LEARNING_RATE";
pub const ENV_SAMPLE_CAPACITY: &str = "SECRET_SCORER_SAMPLE_CAPACITY";
pub const ENV_CALIBRATION_WINDOW: &str = "SECRET_SCORER_CALIBRATION_WINDOW";
pub const ENV_CACHE_TTL_SECS: &str = "SECRET_SCORER_CACHE_TTL_SECS";
pub const ENV_ONLINE_TRAINING: &str = "SECRET_SCORER_ONLINE_TRAINING";
pub const ENV_SEED: &str = "SECRET_SCORER_SEED";
