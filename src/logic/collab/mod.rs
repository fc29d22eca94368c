//! Collaborator Interfaces
//!
//! Narrow seams to the services around the engine: a TTL cache, a feedback
//! record store and a metrics sink. In-crate adapters cover tests and
//! single-process deployments.

pub mod cache;
pub mod store;
pub mod metrics;

use std::time::Duration;

use sha2::{Digest, Sha256};

use crate::logic::error::EngineResult;

pub use cache::InMemoryCache;
pub use store::{FeedbackRecord, JsonlRecordStore, MemoryRecordStore, RecordFilter};
pub use metrics::{InMemoryMetrics, MetricsSnapshot, NoopMetrics};

// ============================================================================
// TRAITS
// ============================================================================

/// Key/value cache with per-entry expiry
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set_with_ttl(&self, key: &str, value: String, ttl: Duration);
}

/// Append-only store for feedback records
pub trait RecordStore: Send + Sync {
    fn append(&self, record: &FeedbackRecord) -> EngineResult<()>;

    /// Matching records, newest first
    fn query(&self, filter: &RecordFilter) -> EngineResult<Vec<FeedbackRecord>>;
}

/// Counter/gauge/histogram sink
pub trait MetricsSink: Send + Sync {
    fn counter_inc(&self, name: &str);
    fn gauge_set(&self, name: &str, value: f64);
    fn histogram_observe(&self, name: &str, value: f64);
}

/// SHA-256 hex digest, used for privacy hashes and cache keys
pub fn sha256_hex(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}
