//! Secret Analyzer - Engine facade
//!
//! One instance per process, passed by reference to every caller.
//! Readers (analysis) share the state lock; feedback, training and version
//! changes take it exclusively.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use super::calibration::{ConfidenceCalibrator, LabelStats};
use super::collab::{
    sha256_hex, CacheStore, FeedbackRecord, InMemoryCache, MemoryRecordStore, MetricsSink, NoopMetrics,
    RecordStore,
};
use super::config::EngineConfig;
use super::error::{EngineError, EngineResult};
use super::features::enhanced::context_keyword_score;
use super::features::patterns::{match_service_pattern, matches_known_pattern, PatternKind};
use super::features::{extract_features, FeatureVector};
use super::labels::ConfidenceLevel;
use super::model::{load_or_init, save_model, PredictionResult, SecretClassifier};
use super::training::{TrainingEngine, TrainingReport};
use super::versioning::{AbGroup, AbTestResults, ModelVersionManager, VersionInfo};

// ============================================================================
// METRIC NAMES
// ============================================================================

const METRIC_REQUESTS: &str = "analysis_requests_total";
const METRIC_CACHE_HITS: &str = "cache_hits_total";
const METRIC_CACHE_MISSES: &str = "cache_misses_total";
const METRIC_CONFIDENCE: &str = "prediction_confidence";
const METRIC_PREDICTIONS: &str = "model_predictions_total";
const METRIC_FEEDBACK: &str = "feedback_total";
const METRIC_BUFFER: &str = "training_buffer_size";
const METRIC_TRAINING_LOSS: &str = "training_loss";

// ============================================================================
// REQUEST / RESPONSE TYPES
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub secret_value: String,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub variable_name: Option<String>,
    /// Precomputed features; ignored unless exactly 19 values
    #[serde(default)]
    pub features: Option<Vec<f32>>,
}

impl AnalyzeRequest {
    pub fn new(secret_value: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            secret_value: secret_value.into(),
            context: context.into(),
            ..Default::default()
        }
    }

    pub fn with_variable_name(mut self, name: impl Into<String>) -> Self {
        self.variable_name = Some(name.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Critical,
    High,
    Medium,
    Low,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Critical => "critical",
            RiskLevel::High => "high",
            RiskLevel::Medium => "medium",
            RiskLevel::Low => "low",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub prediction: ConfidenceLevel,
    pub confidence: f32,
    pub probabilities: Option<Vec<f32>>,
    pub enhanced_confidence: String,
    pub category: String,
    pub risk_level: RiskLevel,
    pub is_likely_secret: bool,
    pub model_version: String,
    pub ab_group: Option<AbGroup>,
    pub cached: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub secret_value: String,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub variable_name: Option<String>,
    #[serde(default)]
    pub features: Option<Vec<f32>>,
    pub user_action: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackOutcome {
    /// "trained" or "sample_added"
    pub status: String,
    pub loss: Option<f32>,
    pub calibrated_confidence: f32,
    pub model_version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelStats {
    pub active_version: String,
    pub vocab_size: usize,
    pub hidden_dim: usize,
    pub num_layers: usize,
    pub num_heads: usize,
    pub max_seq_len: usize,
    pub is_trained: bool,
    pub parameter_count: usize,
    pub estimated_size_mb: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingStats {
    pub is_trained: bool,
    pub buffered_samples: usize,
    pub dropped_samples: u64,
    pub learning_rate: f32,
    pub calibration_samples: u64,
    pub online_training: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f32,
}

// ============================================================================
// PURE SCORING HELPERS
// ============================================================================

/// Human-readable credential category
pub fn categorize_secret(secret: &str) -> &'static str {
    match match_service_pattern(secret) {
        Some(PatternKind::ApiKey | PatternKind::StripeKey) => return "API Key",
        Some(PatternKind::AwsAccessKey) => return "AWS Access Key",
        Some(PatternKind::GithubToken) => return "GitHub Token",
        Some(PatternKind::SlackToken) => return "Slack Token",
        Some(kind) if kind.is_hash() => return "Hash",
        _ => {}
    }

    if ["sk-", "pk_", "rk_"].iter().any(|p| secret.starts_with(p)) {
        "API Key"
    } else if secret.starts_with("AKIA") {
        "AWS Access Key"
    } else if secret.starts_with("ghp_") {
        "GitHub Token"
    } else if secret.starts_with("xox") {
        "Slack Token"
    } else if secret.starts_with("Bearer ") {
        "Bearer Token"
    } else {
        "Potential Secret"
    }
}

/// Risk from context keywords, service-pattern match and deployment hints.
///
/// A literal in a production context scores higher; a `process.env`
/// reference means the value is not hard-coded and scores lower.
pub fn assess_risk_level(secret: &str, context: &str) -> RiskLevel {
    let lower = context.to_lowercase();
    let mut score = context_keyword_score(context);

    if matches_known_pattern(secret) {
        score += 0.4;
    }
    if lower.contains("prod") {
        score += 0.2;
    }
    if lower.contains("process.env") {
        score -= 0.2;
    }

    match score {
        s if s >= 0.8 => RiskLevel::Critical,
        s if s >= 0.5 => RiskLevel::High,
        s if s >= 0.3 => RiskLevel::Medium,
        _ => RiskLevel::Low,
    }
}

/// Blend the model's answer with a traditional level
pub fn enhanced_level(result: &PredictionResult, traditional: &str) -> String {
    if result.confidence > 0.8 || result.prediction == ConfidenceLevel::High {
        "high".to_string()
    } else if result.confidence > 0.6 || result.prediction == ConfidenceLevel::Medium {
        "medium".to_string()
    } else if result.prediction == ConfidenceLevel::FalsePositive {
        "low".to_string()
    } else {
        traditional.to_string()
    }
}

pub fn is_likely_secret(prediction: ConfidenceLevel, secret: &str) -> bool {
    prediction != ConfidenceLevel::FalsePositive
        && (matches!(prediction, ConfidenceLevel::High | ConfidenceLevel::Medium) || matches_known_pattern(secret))
}

fn traditional_from_risk(risk: RiskLevel) -> &'static str {
    match risk {
        RiskLevel::Critical | RiskLevel::High => "high",
        RiskLevel::Medium => "medium",
        RiskLevel::Low => "low",
    }
}

// ============================================================================
// ANALYZER
// ============================================================================

struct EngineState {
    versions: ModelVersionManager,
    trainer: TrainingEngine,
    /// Bumped on every parameter write; part of the cache key
    generation: u64,
}

pub struct SecretAnalyzer {
    config: EngineConfig,
    state: RwLock<EngineState>,
    calibrator: Mutex<ConfidenceCalibrator>,
    cache: Box<dyn CacheStore>,
    records: Box<dyn RecordStore>,
    metrics: Box<dyn MetricsSink>,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
}

impl SecretAnalyzer {
    /// Load the snapshot at `config.model_path` (or random init) with
    /// in-memory collaborators
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        let model = load_or_init(&config.model_path, &config.model, config.seed)?;
        Ok(Self::with_model(config, model))
    }

    pub fn with_model(config: EngineConfig, model: SecretClassifier) -> Self {
        Self::with_collaborators(
            config,
            model,
            Box::new(InMemoryCache::new()),
            Box::new(MemoryRecordStore::new()),
            Box::new(NoopMetrics),
        )
    }

    pub fn with_collaborators(
        config: EngineConfig,
        model: SecretClassifier,
        cache: Box<dyn CacheStore>,
        records: Box<dyn RecordStore>,
        metrics: Box<dyn MetricsSink>,
    ) -> Self {
        log::info!(
            "Secret analyzer ready ({} params, trained: {})",
            model.parameter_count(),
            model.is_trained()
        );

        Self {
            state: RwLock::new(EngineState {
                versions: ModelVersionManager::new(model),
                trainer: TrainingEngine::new(config.learning_rate, config.sample_capacity),
                generation: 0,
            }),
            calibrator: Mutex::new(ConfidenceCalibrator::new(config.calibration_window)),
            cache,
            records,
            metrics,
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn records(&self) -> &dyn RecordStore {
        self.records.as_ref()
    }

    fn resolve_features(secret: &str, context: &str, variable: Option<&str>, supplied: Option<&[f32]>) -> FeatureVector {
        if let Some(values) = supplied {
            match FeatureVector::try_from_slice(values) {
                Ok(fv) => return fv,
                Err(e) => log::warn!("Ignoring supplied features: {}", e),
            }
        }
        extract_features(secret, context, variable)
    }

    /// Raw model output from the active version
    pub fn forward(&self, secret: &str, context: &str, variable_name: Option<&str>) -> PredictionResult {
        let features = extract_features(secret, context, variable_name);
        self.state.read().versions.active().forward(secret, &features)
    }

    /// Score one candidate secret. Never fails; empty input yields the
    /// low-confidence default.
    pub fn analyze(&self, request: &AnalyzeRequest) -> AnalysisResult {
        self.metrics.counter_inc(METRIC_REQUESTS);

        let secret = request.secret_value.as_str();
        let context = request.context.as_str();
        let variable = request.variable_name.as_deref();
        let features = Self::resolve_features(secret, context, variable, request.features.as_deref());

        let state = self.state.read();
        let (ab_group, version) = match state.versions.route(secret) {
            Some((group, version)) => (Some(group), version.to_string()),
            None => (None, state.versions.active_name().to_string()),
        };

        let key = sha256_hex(&format!(
            "{}\u{1f}{}\u{1f}{}\u{1f}{}\u{1f}{}\u{1f}{}\u{1f}{:?}",
            version,
            ab_group.map_or("-", |g| g.as_str()),
            state.generation,
            secret,
            context,
            variable.unwrap_or(""),
            features.as_slice()
        ));

        if let Some(hit) = self.cache.get(&key).and_then(|raw| serde_json::from_str::<AnalysisResult>(&raw).ok()) {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
            self.metrics.counter_inc(METRIC_CACHE_HITS);
            return AnalysisResult { cached: true, ..hit };
        }
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
        self.metrics.counter_inc(METRIC_CACHE_MISSES);

        let model = state
            .versions
            .model(&version)
            .unwrap_or_else(|_| state.versions.active());
        let prediction = model.forward(secret, &features);
        drop(state);

        let risk_level = assess_risk_level(secret, context);
        let result = AnalysisResult {
            enhanced_confidence: enhanced_level(&prediction, traditional_from_risk(risk_level)),
            category: categorize_secret(secret).to_string(),
            is_likely_secret: is_likely_secret(prediction.prediction, secret),
            risk_level,
            prediction: prediction.prediction,
            confidence: prediction.confidence,
            probabilities: prediction.probabilities,
            model_version: version,
            ab_group,
            cached: false,
        };

        self.metrics.histogram_observe(METRIC_CONFIDENCE, result.confidence as f64);
        self.metrics.counter_inc(METRIC_PREDICTIONS);

        match serde_json::to_string(&result) {
            Ok(raw) => self
                .cache
                .set_with_ttl(&key, raw, Duration::from_secs(self.config.cache_ttl_secs)),
            Err(e) => log::warn!("Failed to cache analysis result: {}", e),
        }

        result
    }

    pub fn calculate_enhanced_confidence(
        &self,
        secret: &str,
        context: &str,
        traditional: &str,
        variable_name: Option<&str>,
    ) -> String {
        enhanced_level(&self.forward(secret, context, variable_name), traditional)
    }

    /// Store labeled feedback; trains the active model when online training is on
    pub fn record_feedback(&self, request: &FeedbackRequest) -> EngineResult<FeedbackOutcome> {
        let label: ConfidenceLevel = request.label.parse()?;
        let secret = request.secret_value.as_str();
        let context = request.context.as_str();

        let features = match request.features.as_deref() {
            Some(values) => FeatureVector::try_from_slice(values)?,
            None => extract_features(secret, context, request.variable_name.as_deref()),
        };

        let mut guard = self.state.write();
        let state = &mut *guard;
        let version = state.versions.active_name().to_string();
        let confidence = state.versions.active().forward(secret, &features).confidence;

        state.trainer.add_sample(secret, &features, label);
        self.metrics.gauge_set(METRIC_BUFFER, state.trainer.buffer().len() as f64);

        let loss = if self.config.online_training {
            match state.trainer.train_step(state.versions.active_mut(), secret, &features, label) {
                Ok(loss) => {
                    state.generation += 1;
                    Some(loss)
                }
                Err(EngineError::EmptyInput) => None,
                Err(e) => return Err(e),
            }
        } else {
            None
        };
        drop(guard);

        let record = FeedbackRecord::new(secret, context, &features, label, &request.user_action, confidence, &version);
        if let Err(e) = self.records.append(&record) {
            log::error!("Failed to store feedback record: {}", e);
        }

        let calibrated_confidence = self.calibrator.lock().calibrate(confidence, label);
        self.metrics.counter_inc(METRIC_FEEDBACK);
        if let Some(loss) = loss {
            self.metrics.histogram_observe(METRIC_TRAINING_LOSS, loss as f64);
        }

        log::debug!("Recorded feedback '{}' as {} on '{}'", request.user_action, label, version);

        Ok(FeedbackOutcome {
            status: if loss.is_some() { "trained" } else { "sample_added" }.to_string(),
            loss,
            calibrated_confidence,
            model_version: version,
        })
    }

    /// Train the active version on the buffered samples
    pub fn train_buffered(&self, epochs: usize) -> EngineResult<TrainingReport> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let report = state.trainer.train_buffered(state.versions.active_mut(), epochs)?;
        state.generation += 1;
        self.metrics.histogram_observe(METRIC_TRAINING_LOSS, report.average_loss as f64);
        Ok(report)
    }

    /// Persist the active version to `config.model_path`
    pub fn save_model(&self) -> EngineResult<()> {
        let state = self.state.read();
        save_model(state.versions.active(), &self.config.model_path)
    }

    // ------------------------------------------------------------------------
    // Stats
    // ------------------------------------------------------------------------

    pub fn model_stats(&self) -> ModelStats {
        let state = self.state.read();
        let model = state.versions.active();
        let config = model.config();

        ModelStats {
            active_version: state.versions.active_name().to_string(),
            vocab_size: config.vocab_size,
            hidden_dim: config.hidden_dim,
            num_layers: config.num_layers,
            num_heads: config.num_heads,
            max_seq_len: config.max_seq_len,
            is_trained: model.is_trained(),
            parameter_count: model.parameter_count(),
            estimated_size_mb: model.estimated_size_mb(),
        }
    }

    pub fn training_stats(&self) -> TrainingStats {
        let state = self.state.read();
        TrainingStats {
            is_trained: state.versions.active().is_trained(),
            buffered_samples: state.trainer.buffer().len(),
            dropped_samples: state.trainer.buffer().dropped(),
            learning_rate: state.trainer.learning_rate(),
            calibration_samples: self.calibrator.lock().total_samples(),
            online_training: self.config.online_training,
        }
    }

    pub fn calibration_stats(&self) -> HashMap<String, LabelStats> {
        self.calibrator.lock().stats()
    }

    pub fn cache_stats(&self) -> CacheStats {
        let hits = self.cache_hits.load(Ordering::Relaxed);
        let misses = self.cache_misses.load(Ordering::Relaxed);
        let total = hits + misses;

        CacheStats {
            hits,
            misses,
            hit_rate: if total > 0 { hits as f32 / total as f32 } else { 0.0 },
        }
    }

    // ------------------------------------------------------------------------
    // Versions
    // ------------------------------------------------------------------------

    pub fn active_version(&self) -> String {
        self.state.read().versions.active_name().to_string()
    }

    pub fn create_version(&self, name: &str) -> EngineResult<()> {
        self.state.write().versions.create_version(name)
    }

    /// Switch active version; resets cache hit/miss counters
    pub fn switch_version(&self, name: &str) -> EngineResult<()> {
        self.state.write().versions.switch_version(name)?;
        self.cache_hits.store(0, Ordering::Relaxed);
        self.cache_misses.store(0, Ordering::Relaxed);
        Ok(())
    }

    pub fn enable_ab_testing(&self, version_a: &str, version_b: &str) -> EngineResult<()> {
        self.state.write().versions.enable_ab_testing(version_a, version_b)
    }

    pub fn disable_ab_testing(&self) {
        self.state.write().versions.disable_ab_testing();
    }

    pub fn record_prediction_result(&self, version: &str, correct: bool) -> EngineResult<()> {
        self.state.write().versions.record_prediction_result(version, correct)
    }

    pub fn ab_test_results(&self) -> EngineResult<AbTestResults> {
        self.state.read().versions.ab_test_results()
    }

    pub fn list_versions(&self) -> Vec<VersionInfo> {
        self.state.read().versions.list_versions()
    }
}
