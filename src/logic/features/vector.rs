//! Feature Vector - Core data structure for model input
//!
//! **Versioned feature vector with layout validation**
//!
//! Uses centralized layout from `layout.rs` for consistent ordering and
//! a layout hash for compatibility checks.

use serde::{Deserialize, Serialize};

use super::layout::{
    layout_hash, validate_layout, LayoutMismatchError, FEATURE_COUNT, FEATURE_LAYOUT,
    FEATURE_VERSION,
};
use crate::logic::error::{EngineError, EngineResult};

// ============================================================================
// VERSIONED FEATURE VECTOR
// ============================================================================

/// Versioned Feature Vector with layout metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Feature layout version
    pub version: u8,
    /// CRC32 hash of the feature layout (for mismatch detection)
    pub layout_hash: u32,
    /// Feature values in order defined by FEATURE_LAYOUT
    pub values: [f32; FEATURE_COUNT],
}

impl FeatureVector {
    /// Create a new zeroed feature vector with current version
    pub fn new() -> Self {
        Self::from_values([0.0; FEATURE_COUNT])
    }

    /// Create from raw values with current version
    pub fn from_values(values: [f32; FEATURE_COUNT]) -> Self {
        Self {
            version: FEATURE_VERSION,
            layout_hash: layout_hash(),
            values,
        }
    }

    /// Create from a caller-supplied slice; anything but 19 values is rejected
    pub fn try_from_slice(values: &[f32]) -> EngineResult<Self> {
        if values.len() != FEATURE_COUNT {
            return Err(EngineError::Validation(format!(
                "feature vector must have {} values, got {}",
                FEATURE_COUNT,
                values.len()
            )));
        }
        let mut array = [0.0f32; FEATURE_COUNT];
        array.copy_from_slice(values);
        Ok(Self::from_values(array))
    }

    pub fn as_array(&self) -> &[f32; FEATURE_COUNT] {
        &self.values
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.values.to_vec()
    }

    pub fn len(&self) -> usize {
        FEATURE_COUNT
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Get feature by index
    pub fn get(&self, index: usize) -> Option<f32> {
        self.values.get(index).copied()
    }

    /// Get feature by name
    pub fn get_by_name(&self, name: &str) -> Option<f32> {
        super::layout::feature_index(name).and_then(|i| self.get(i))
    }

    /// Set feature by index
    pub fn set(&mut self, index: usize, value: f32) {
        if index < FEATURE_COUNT {
            self.values[index] = value;
        }
    }

    /// Set feature by name
    pub fn set_by_name(&mut self, name: &str, value: f32) -> bool {
        if let Some(index) = super::layout::feature_index(name) {
            self.set(index, value);
            true
        } else {
            log::debug!("Unknown feature name: {}", name);
            false
        }
    }

    /// Validate that this vector is compatible with current layout
    pub fn validate(&self) -> Result<(), LayoutMismatchError> {
        validate_layout(self.version, self.layout_hash)
    }

    pub fn is_compatible(&self) -> bool {
        self.validate().is_ok()
    }

    /// Convert to JSON-serializable format for logging
    pub fn to_log_entry(&self) -> serde_json::Value {
        serde_json::json!({
            "feature_version": self.version,
            "layout_hash": self.layout_hash,
            "named_values": FEATURE_LAYOUT.iter()
                .zip(self.values.iter())
                .map(|(name, value)| (name.to_string(), *value))
                .collect::<std::collections::HashMap<_, _>>(),
        })
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self::new()
    }
}

impl From<[f32; FEATURE_COUNT]> for FeatureVector {
    fn from(values: [f32; FEATURE_COUNT]) -> Self {
        Self::from_values(values)
    }
}

impl TryFrom<&[f32]> for FeatureVector {
    type Error = EngineError;

    fn try_from(values: &[f32]) -> Result<Self, Self::Error> {
        Self::try_from_slice(values)
    }
}

// ============================================================================
// FEATURE EXTRACTOR TRAIT
// ============================================================================

/// Trait for feature extractors
///
/// Each extractor owns a disjoint group of layout slots and fills them in.
pub trait FeatureExtractor {
    fn extract(&self, vector: &mut FeatureVector);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_from_slice_length() {
        assert!(FeatureVector::try_from_slice(&[0.5; FEATURE_COUNT]).is_ok());
        assert!(FeatureVector::try_from_slice(&[0.5; 14]).is_err());
        assert!(FeatureVector::try_from_slice(&[]).is_err());
    }

    #[test]
    fn test_set_by_name() {
        let mut vector = FeatureVector::new();
        assert!(vector.set_by_name("hex_shape", 1.0));
        assert_eq!(vector.get(9), Some(1.0));
        assert!(!vector.set_by_name("cpu_percent", 1.0));
    }

    #[test]
    fn test_new_vector_is_compatible() {
        assert!(FeatureVector::new().is_compatible());
        let mut stale = FeatureVector::new();
        stale.version = 1;
        assert!(!stale.is_compatible());
    }
}
