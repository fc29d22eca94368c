//! Secret Scorer Core
//!
//! Scores candidate secrets found in source code with a small transformer
//! classifier over characters plus 19 engineered lexical features.

pub mod constants;
pub mod logic;

pub use logic::analyzer::{
    AnalysisResult, AnalyzeRequest, FeedbackOutcome, FeedbackRequest, RiskLevel, SecretAnalyzer,
};
pub use logic::config::EngineConfig;
pub use logic::error::{EngineError, EngineResult};
pub use logic::features::{extract_features, FeatureVector};
pub use logic::labels::ConfidenceLevel;
pub use logic::model::{ModelConfig, PredictionResult, SecretClassifier};
