//! Training Samples - Labeled feedback buffer
//!
//! Quản lý buffer chứa labeled samples cho training.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_SAMPLE_CAPACITY;
use crate::logic::features::{FeatureVector, FEATURE_COUNT};
use crate::logic::labels::ConfidenceLevel;

/// One labeled example.
///
/// `features` stays a plain list so that malformed lengths coming from
/// callers can be carried and skipped at train time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    #[serde(rename = "secret_value")]
    pub secret: String,
    pub features: Vec<f32>,
    pub label: ConfidenceLevel,
}

impl TrainingSample {
    pub fn new(secret: impl Into<String>, features: &FeatureVector, label: ConfidenceLevel) -> Self {
        Self {
            secret: secret.into(),
            features: features.to_vec(),
            label,
        }
    }

    /// Typed feature vector, None when the length is wrong
    pub fn feature_vector(&self) -> Option<FeatureVector> {
        if self.features.len() != FEATURE_COUNT {
            return None;
        }
        FeatureVector::try_from_slice(&self.features).ok()
    }
}

// ============================================================================
// BUFFER
// ============================================================================

/// Bounded FIFO of samples; oldest dropped first
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    samples: VecDeque<TrainingSample>,
    capacity: usize,
    dropped: u64,
}

impl SampleBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::new(),
            capacity: capacity.max(1),
            dropped: 0,
        }
    }

    pub fn push(&mut self, sample: TrainingSample) {
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
            self.dropped += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Samples evicted because the buffer was full
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrainingSample> {
        self.samples.iter()
    }

    /// Oldest-first copy
    pub fn to_vec(&self) -> Vec<TrainingSample> {
        self.samples.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(secret: &str) -> TrainingSample {
        TrainingSample::new(secret, &FeatureVector::new(), ConfidenceLevel::High)
    }

    #[test]
    fn test_buffer_drops_oldest() {
        let mut buffer = SampleBuffer::new(3);
        for s in ["a", "b", "c", "d", "e"] {
            buffer.push(sample(s));
        }

        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.dropped(), 2);
        let secrets: Vec<_> = buffer.iter().map(|s| s.secret.as_str()).collect();
        assert_eq!(secrets, vec!["c", "d", "e"]);
    }

    #[test]
    fn test_feature_vector_length_check() {
        let mut s = sample("x");
        assert!(s.feature_vector().is_some());

        s.features.pop();
        assert!(s.feature_vector().is_none());
    }

    #[test]
    fn test_sample_json_shape() {
        let json = serde_json::to_value(sample("tok")).unwrap();
        assert_eq!(json["secret_value"], "tok");
        assert_eq!(json["label"], "high");
        assert_eq!(json["features"].as_array().unwrap().len(), FEATURE_COUNT);
    }
}
