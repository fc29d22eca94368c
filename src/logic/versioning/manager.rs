//! Model Version Manager
//!
//! Named, independent model snapshots stored in an append-only arena.
//! "default" is slot 0 and always exists. Each version owns a deep copy
//! of every parameter, layers included.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ab_test::AbTest;
use crate::constants::DEFAULT_VERSION;
use crate::logic::error::{EngineError, EngineResult};
use crate::logic::model::SecretClassifier;

// ============================================================================
// TYPES
// ============================================================================

/// Prediction outcome counters for one version
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VersionPerformance {
    pub total: u64,
    pub correct: u64,
    pub accuracy: f32,
}

impl VersionPerformance {
    pub fn record(&mut self, correct: bool) {
        self.total += 1;
        if correct {
            self.correct += 1;
        }
        self.accuracy = self.correct as f32 / self.total as f32;
    }
}

#[derive(Debug, Clone)]
pub struct ModelVersion {
    pub name: String,
    pub model: SecretClassifier,
    pub performance: VersionPerformance,
    pub created_at: DateTime<Utc>,
}

/// Listing entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    pub name: String,
    pub active: bool,
    pub is_trained: bool,
    pub performance: VersionPerformance,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// MANAGER
// ============================================================================

#[derive(Debug, Clone)]
pub struct ModelVersionManager {
    pub(super) versions: Vec<ModelVersion>,
    pub(super) index: HashMap<String, usize>,
    pub(super) active: usize,
    pub(super) ab_test: Option<AbTest>,
}

impl ModelVersionManager {
    /// Manager seeded with `model` as "default"
    pub fn new(model: SecretClassifier) -> Self {
        let mut index = HashMap::new();
        index.insert(DEFAULT_VERSION.to_string(), 0);

        Self {
            versions: vec![ModelVersion {
                name: DEFAULT_VERSION.to_string(),
                model,
                performance: VersionPerformance::default(),
                created_at: Utc::now(),
            }],
            index,
            active: 0,
            ab_test: None,
        }
    }

    pub(super) fn slot(&self, name: &str) -> EngineResult<usize> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| EngineError::UnknownVersion(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Snapshot the active model under a new name
    pub fn create_version(&mut self, name: &str) -> EngineResult<()> {
        if self.contains(name) {
            return Err(EngineError::VersionExists(name.to_string()));
        }

        let model = self.versions[self.active].model.clone();
        self.index.insert(name.to_string(), self.versions.len());
        self.versions.push(ModelVersion {
            name: name.to_string(),
            model,
            performance: VersionPerformance::default(),
            created_at: Utc::now(),
        });

        log::info!("Created model version '{}' from '{}'", name, self.active_name());
        Ok(())
    }

    pub fn switch_version(&mut self, name: &str) -> EngineResult<()> {
        self.active = self.slot(name)?;
        log::info!("Switched active model version to '{}'", name);
        Ok(())
    }

    pub fn active_name(&self) -> &str {
        &self.versions[self.active].name
    }

    pub fn active(&self) -> &SecretClassifier {
        &self.versions[self.active].model
    }

    pub fn active_mut(&mut self) -> &mut SecretClassifier {
        &mut self.versions[self.active].model
    }

    pub fn model(&self, name: &str) -> EngineResult<&SecretClassifier> {
        let slot = self.slot(name)?;
        Ok(&self.versions[slot].model)
    }

    pub fn model_mut(&mut self, name: &str) -> EngineResult<&mut SecretClassifier> {
        let slot = self.slot(name)?;
        Ok(&mut self.versions[slot].model)
    }

    pub fn performance(&self, name: &str) -> EngineResult<VersionPerformance> {
        let slot = self.slot(name)?;
        Ok(self.versions[slot].performance)
    }

    pub fn record_prediction_result(&mut self, name: &str, correct: bool) -> EngineResult<()> {
        let slot = self.slot(name)?;
        self.versions[slot].performance.record(correct);
        Ok(())
    }

    /// All versions in creation order
    pub fn list_versions(&self) -> Vec<VersionInfo> {
        self.versions
            .iter()
            .enumerate()
            .map(|(i, v)| VersionInfo {
                name: v.name.clone(),
                active: i == self.active,
                is_trained: v.model.is_trained(),
                performance: v.performance,
                created_at: v.created_at,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}
