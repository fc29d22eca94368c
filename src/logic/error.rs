//! Error handling
//!
//! One error type for the whole engine. Inference never surfaces these to
//! callers; training, persistence and version management do.

use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Invalid model dimensions, fatal at construction
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Malformed input rejected at the boundary
    #[error("Validation error: {0}")]
    Validation(String),

    /// Snapshot content does not describe a usable model
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Secret produced an empty token sequence
    #[error("Empty input: secret produced no tokens")]
    EmptyInput,

    #[error("No training samples provided")]
    NoTrainingSamples,

    #[error("Version '{0}' already exists")]
    VersionExists(String),

    #[error("Version '{0}' not found")]
    UnknownVersion(String),

    #[error("A/B testing is not enabled")]
    AbTestingDisabled,

    /// Failure reported by an external store
    #[error("Store error: {0}")]
    Store(String),
}
