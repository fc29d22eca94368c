//! Metrics sinks

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::MetricsSink;

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn counter_inc(&self, _name: &str) {}
    fn gauge_set(&self, _name: &str, _value: f64) {}
    fn histogram_observe(&self, _name: &str, _value: f64) {}
}

/// Point-in-time copy of recorded metrics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub counters: HashMap<String, u64>,
    pub gauges: HashMap<String, f64>,
    pub histograms: HashMap<String, Vec<f64>>,
}

/// Keeps everything in memory for inspection
#[derive(Debug, Default)]
pub struct InMemoryMetrics {
    inner: Mutex<MetricsSnapshot>,
}

impl InMemoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.inner.lock().clone()
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.inner.lock().counters.get(name).copied().unwrap_or(0)
    }
}

impl MetricsSink for InMemoryMetrics {
    fn counter_inc(&self, name: &str) {
        *self.inner.lock().counters.entry(name.to_string()).or_insert(0) += 1;
    }

    fn gauge_set(&self, name: &str, value: f64) {
        self.inner.lock().gauges.insert(name.to_string(), value);
    }

    fn histogram_observe(&self, name: &str, value: f64) {
        self.inner
            .lock()
            .histograms
            .entry(name.to_string())
            .or_default()
            .push(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_metrics() {
        let metrics = InMemoryMetrics::new();
        metrics.counter_inc("requests");
        metrics.counter_inc("requests");
        metrics.gauge_set("buffer", 3.0);
        metrics.histogram_observe("confidence", 0.5);

        let snap = metrics.snapshot();
        assert_eq!(metrics.counter("requests"), 2);
        assert_eq!(metrics.counter("missing"), 0);
        assert_eq!(snap.gauges["buffer"], 3.0);
        assert_eq!(snap.histograms["confidence"], vec![0.5]);
    }
}
