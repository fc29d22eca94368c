//! Versioning Module - Model versions and A/B routing

pub mod manager;

pub use manager::{ModelVersion, ModelVersionManager, VersionInfo, VersionPerformance};
pub use ab_test::{AbGroup, AbTest, AbTestResults, GroupResult};
