//! Confidence Calibration
//!
//! Smooths model confidence with per-label history.
//! Window per label is bounded; oldest scores fall off first.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_CALIBRATION_WINDOW;
use super::labels::ConfidenceLevel;

/// History needed before a label starts influencing the result
const MIN_HISTORY: usize = 5;

/// Smallest window that still lets history kick in
pub const MIN_WINDOW: usize = MIN_HISTORY + 1;

const PREDICTED_WEIGHT: f32 = 0.7;
const HISTORY_WEIGHT: f32 = 0.3;

/// Per-label confidence statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelStats {
    pub count: usize,
    pub mean: f32,
    pub std: f32,
    pub min: f32,
    pub max: f32,
}

#[derive(Debug, Clone)]
pub struct ConfidenceCalibrator {
    history: HashMap<ConfidenceLevel, VecDeque<f32>>,
    window: usize,
    total_samples: u64,
}

impl ConfidenceCalibrator {
    pub fn new(window: usize) -> Self {
        Self {
            history: HashMap::new(),
            window: window.max(MIN_WINDOW),
            total_samples: 0,
        }
    }

    /// Record `predicted` for `label` and return the calibrated value
    pub fn calibrate(&mut self, predicted: f32, label: ConfidenceLevel) -> f32 {
        let window = self.window;
        let scores = self.history.entry(label).or_default();
        scores.push_back(predicted);
        while scores.len() > window {
            scores.pop_front();
        }
        self.total_samples += 1;

        if scores.len() > MIN_HISTORY {
            let mean = scores.iter().sum::<f32>() / scores.len() as f32;
            (PREDICTED_WEIGHT * predicted + HISTORY_WEIGHT * mean).clamp(0.0, 1.0)
        } else {
            predicted
        }
    }

    /// Stats for one label, None before any record
    pub fn label_stats(&self, label: ConfidenceLevel) -> Option<LabelStats> {
        let scores = self.history.get(&label)?;
        if scores.is_empty() {
            return None;
        }

        let n = scores.len() as f32;
        let mean = scores.iter().sum::<f32>() / n;
        let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f32>() / n;

        Some(LabelStats {
            count: scores.len(),
            mean,
            std: variance.sqrt(),
            min: scores.iter().copied().fold(f32::INFINITY, f32::min),
            max: scores.iter().copied().fold(f32::NEG_INFINITY, f32::max),
        })
    }

    /// Stats keyed by label name, labels without history omitted
    pub fn stats(&self) -> HashMap<String, LabelStats> {
        ConfidenceLevel::ALL
            .iter()
            .filter_map(|label| self.label_stats(*label).map(|s| (label.as_str().to_string(), s)))
            .collect()
    }

    /// Every calibrate call, including records since evicted
    pub fn total_samples(&self) -> u64 {
        self.total_samples
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn reset(&mut self) {
        self.history.clear();
        self.total_samples = 0;
    }
}

impl Default for ConfidenceCalibrator {
    fn default() -> Self {
        Self::new(DEFAULT_CALIBRATION_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passthrough_until_history() {
        let mut cal = ConfidenceCalibrator::default();
        for _ in 0..5 {
            assert_eq!(cal.calibrate(0.9, ConfidenceLevel::High), 0.9);
        }

        // sixth record: mean of six 0.9s is 0.9
        let out = cal.calibrate(0.9, ConfidenceLevel::High);
        assert!((out - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_blend_with_history() {
        let mut cal = ConfidenceCalibrator::default();
        for _ in 0..5 {
            cal.calibrate(0.2, ConfidenceLevel::Low);
        }
        let out = cal.calibrate(0.8, ConfidenceLevel::Low);
        let mean = (0.2 * 5.0 + 0.8) / 6.0;
        assert!((out - (0.7 * 0.8 + 0.3 * mean)).abs() < 1e-6);
    }

    #[test]
    fn test_labels_are_independent() {
        let mut cal = ConfidenceCalibrator::default();
        for _ in 0..10 {
            cal.calibrate(0.1, ConfidenceLevel::FalsePositive);
        }
        assert_eq!(cal.calibrate(0.7, ConfidenceLevel::Medium), 0.7);
    }

    #[test]
    fn test_stats() {
        let mut cal = ConfidenceCalibrator::default();
        cal.calibrate(0.2, ConfidenceLevel::High);
        cal.calibrate(0.6, ConfidenceLevel::High);

        let stats = cal.label_stats(ConfidenceLevel::High).unwrap();
        assert_eq!(stats.count, 2);
        assert!((stats.mean - 0.4).abs() < 1e-6);
        assert!((stats.std - 0.2).abs() < 1e-6);
        assert_eq!(stats.min, 0.2);
        assert_eq!(stats.max, 0.6);

        assert!(cal.label_stats(ConfidenceLevel::Low).is_none());
        assert_eq!(cal.stats().len(), 1);
        assert!(cal.stats().contains_key("high"));
    }

    #[test]
    fn test_window_bounded() {
        let mut cal = ConfidenceCalibrator::new(8);
        for i in 0..10 {
            cal.calibrate(i as f32 / 10.0, ConfidenceLevel::Medium);
        }
        assert_eq!(cal.label_stats(ConfidenceLevel::Medium).unwrap().count, 8);
        assert_eq!(cal.total_samples(), 10);
    }

    #[test]
    fn test_small_window_still_calibrates() {
        let mut cal = ConfidenceCalibrator::new(3);
        assert_eq!(cal.window(), MIN_WINDOW);

        for _ in 0..10 {
            cal.calibrate(0.2, ConfidenceLevel::Low);
        }
        let out = cal.calibrate(0.8, ConfidenceLevel::Low);
        let mean = (0.2 * 5.0 + 0.8) / 6.0;
        assert!((out - (0.7 * 0.8 + 0.3 * mean)).abs() < 1e-6);
    }
}
