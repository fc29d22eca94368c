//! Training Engine - Classifier-head update
//!
//! Không phải backprop: only the classification head moves. A wrong
//! prediction shifts `learning_rate * 0.1` from the predicted class to the
//! target class in both the bias and the weight columns. Embeddings,
//! positional table and transformer layers stay frozen.

use serde::{Deserialize, Serialize};

use super::sample::{SampleBuffer, TrainingSample};
use crate::constants::DEFAULT_LEARNING_RATE;
use crate::logic::error::{EngineError, EngineResult};
use crate::logic::features::FeatureVector;
use crate::logic::labels::ConfidenceLevel;
use crate::logic::model::math::argmax;
use crate::logic::model::SecretClassifier;

/// Added inside the log so a zero probability stays finite
const LOSS_EPS: f32 = 1e-8;

/// Scale from learning rate to head step
const STEP_SCALE: f32 = 0.1;

/// Batch training summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub epochs_trained: usize,
    pub average_loss: f32,
    /// Full input length, skipped samples included
    pub samples_processed: usize,
    pub samples_skipped: usize,
    pub model_updated: bool,
}

#[derive(Debug, Clone)]
pub struct TrainingEngine {
    learning_rate: f32,
    buffer: SampleBuffer,
}

impl TrainingEngine {
    pub fn new(learning_rate: f32, capacity: usize) -> Self {
        Self {
            learning_rate,
            buffer: SampleBuffer::new(capacity),
        }
    }

    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }

    pub fn add_sample(&mut self, secret: &str, features: &FeatureVector, label: ConfidenceLevel) {
        self.buffer.push(TrainingSample::new(secret, features, label));
    }

    /// One update on `model`. Returns the cross-entropy loss before the update.
    pub fn train_step(
        &self,
        model: &mut SecretClassifier,
        secret: &str,
        features: &FeatureVector,
        target: ConfidenceLevel,
    ) -> EngineResult<f32> {
        let result = model.forward(secret, features);
        let probs = result.probabilities.ok_or(EngineError::EmptyInput)?;

        let target_idx = target.index();
        let loss = -(probs[target_idx] + LOSS_EPS).ln();

        let predicted_idx = argmax(&probs);
        if predicted_idx != target_idx {
            let step = self.learning_rate * STEP_SCALE;
            let (weights, bias) = model.head_mut();

            bias[target_idx] += step;
            bias[predicted_idx] -= step;

            weights.column_mut(target_idx).mapv_inplace(|w| w + step);
            weights.column_mut(predicted_idx).mapv_inplace(|w| w - step);

            log::debug!(
                "Head update: predicted {} -> target {} (step {:.6})",
                predicted_idx,
                target_idx,
                step
            );
        }

        Ok(loss)
    }

    /// Multi-epoch pass over `samples`.
    ///
    /// Samples with a wrong feature length or an empty secret are skipped.
    /// Each epoch's loss is averaged over the full input length.
    pub fn train(
        &self,
        model: &mut SecretClassifier,
        samples: &[TrainingSample],
        epochs: usize,
    ) -> EngineResult<TrainingReport> {
        if samples.is_empty() {
            return Err(EngineError::NoTrainingSamples);
        }

        let num_samples = samples.len();
        let mut total_loss = 0.0f32;
        let mut skipped = 0usize;

        for epoch in 0..epochs {
            let mut epoch_loss = 0.0f32;
            let mut epoch_skipped = 0usize;

            for sample in samples {
                let Some(features) = sample.feature_vector() else {
                    epoch_skipped += 1;
                    continue;
                };

                match self.train_step(model, &sample.secret, &features, sample.label) {
                    Ok(loss) => epoch_loss += loss,
                    Err(EngineError::EmptyInput) => epoch_skipped += 1,
                    Err(e) => return Err(e),
                }
            }

            let avg = epoch_loss / num_samples.max(1) as f32;
            log::debug!("Epoch {}/{}: avg loss {:.4}", epoch + 1, epochs, avg);
            total_loss += avg;
            skipped = epoch_skipped;
        }

        model.set_trained(true);

        let average_loss = if epochs > 0 { total_loss / epochs as f32 } else { 0.0 };
        log::info!(
            "Training complete: {} samples, {} epochs, avg loss {:.4}",
            num_samples,
            epochs,
            average_loss
        );

        Ok(TrainingReport {
            epochs_trained: epochs,
            average_loss,
            samples_processed: num_samples,
            samples_skipped: skipped,
            model_updated: true,
        })
    }

    /// Train on everything currently buffered. The buffer is kept.
    pub fn train_buffered(&self, model: &mut SecretClassifier, epochs: usize) -> EngineResult<TrainingReport> {
        let samples = self.buffer.to_vec();
        self.train(model, &samples, epochs)
    }
}

impl Default for TrainingEngine {
    fn default() -> Self {
        Self::new(DEFAULT_LEARNING_RATE, crate::constants::DEFAULT_SAMPLE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::features::extract_features;
    use crate::logic::model::ModelConfig;

    fn tiny() -> SecretClassifier {
        SecretClassifier::with_seed(ModelConfig::tiny(), Some(42)).unwrap()
    }

    /// Pick a target the model currently gets wrong
    fn wrong_target(model: &SecretClassifier, secret: &str, features: &FeatureVector) -> ConfidenceLevel {
        let predicted = model.forward(secret, features).prediction;
        ConfidenceLevel::ALL
            .into_iter()
            .find(|l| *l != predicted)
            .unwrap()
    }

    #[test]
    fn test_wrong_prediction_moves_head() {
        let engine = TrainingEngine::new(0.5, 16);
        let mut model = tiny();
        let secret = "ghp_abcdefghijklmnop";
        let features = extract_features(secret, "token = x", None);

        let before = model.clone();
        let predicted = before.forward(secret, &features).prediction.index();
        let target = wrong_target(&model, secret, &features);

        let loss = engine.train_step(&mut model, secret, &features, target).unwrap();
        assert!(loss > 0.0);

        let step = 0.5 * STEP_SCALE;
        let t = target.index();
        assert!((model.classifier_bias()[t] - before.classifier_bias()[t] - step).abs() < 1e-6);
        assert!((before.classifier_bias()[predicted] - model.classifier_bias()[predicted] - step).abs() < 1e-6);
        for row in 0..model.config().hidden_dim {
            let delta = model.classifier_weights()[[row, t]] - before.classifier_weights()[[row, t]];
            assert!((delta - step).abs() < 1e-6);
        }

        // frozen parts
        assert_eq!(model.token_embedding(), before.token_embedding());
        assert_eq!(model.layers(), before.layers());
    }

    #[test]
    fn test_correct_prediction_leaves_head() {
        let engine = TrainingEngine::default();
        let mut model = tiny();
        let secret = "abc123";
        let features = extract_features(secret, "", None);
        let predicted = model.forward(secret, &features).prediction;

        let before = model.clone();
        engine.train_step(&mut model, secret, &features, predicted).unwrap();
        assert_eq!(model, before);
    }

    #[test]
    fn test_train_step_empty_secret() {
        let engine = TrainingEngine::default();
        let mut model = tiny();
        let result = engine.train_step(&mut model, "", &FeatureVector::new(), ConfidenceLevel::High);
        assert!(matches!(result, Err(EngineError::EmptyInput)));
    }

    #[test]
    fn test_train_empty_batch() {
        let engine = TrainingEngine::default();
        let mut model = tiny();
        let result = engine.train(&mut model, &[], 3);
        assert!(matches!(result, Err(EngineError::NoTrainingSamples)));
        assert!(!model.is_trained());
    }

    #[test]
    fn test_train_skips_malformed() {
        let engine = TrainingEngine::default();
        let mut model = tiny();

        let good = TrainingSample::new("sk-aaaaaaaaaaaaaaaa", &extract_features("sk-aaaaaaaaaaaaaaaa", "", None), ConfidenceLevel::High);
        let mut short = good.clone();
        short.features.truncate(5);
        let empty = TrainingSample::new("", &FeatureVector::new(), ConfidenceLevel::Low);

        let report = engine.train(&mut model, &[good, short, empty], 2).unwrap();
        assert_eq!(report.epochs_trained, 2);
        assert_eq!(report.samples_processed, 3);
        assert_eq!(report.samples_skipped, 2);
        assert!(report.model_updated);
        assert!(report.average_loss > 0.0);
        assert!(model.is_trained());
    }

    #[test]
    fn test_zero_epochs() {
        let engine = TrainingEngine::default();
        let mut model = tiny();
        let sample = TrainingSample::new("abc", &FeatureVector::new(), ConfidenceLevel::Medium);
        let report = engine.train(&mut model, &[sample], 0).unwrap();
        assert_eq!(report.average_loss, 0.0);
        assert!(model.is_trained());
    }

    #[test]
    fn test_train_buffered_keeps_buffer() {
        let mut engine = TrainingEngine::new(0.01, 8);
        let mut model = tiny();
        engine.add_sample("token_value_1", &FeatureVector::new(), ConfidenceLevel::Low);
        engine.add_sample("token_value_2", &FeatureVector::new(), ConfidenceLevel::High);

        engine.train_buffered(&mut model, 1).unwrap();
        assert_eq!(engine.buffer().len(), 2);
    }
}
