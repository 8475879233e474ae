//! Metrics sink seam for the natal computation core.
//!
//! The core never talks to a metrics backend directly. Call sites build a
//! fully-labelled metric name with [`metric_name`] (`name|key=value|key=value`)
//! and hand it to a [`MetricsSink`]. Deployments plug in their own sink;
//! [`NoopMetrics`] drops everything and [`RecordingMetrics`] captures values
//! for assertions in tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

/// Counter increments and duration observations emitted by the core.
///
/// Metric names arrive pre-labelled (see [`metric_name`]); sinks are free to
/// split the label syntax back apart or treat the whole string as a key.
pub trait MetricsSink: Send + Sync {
    /// Increment a counter by one.
    fn incr(&self, metric: &str) {
        self.incr_by(metric, 1);
    }

    /// Increment a counter by `n`.
    fn incr_by(&self, metric: &str, n: u64);

    /// Observe a duration in milliseconds.
    fn observe_ms(&self, metric: &str, value_ms: f64);
}

/// Build a labelled metric name: `name|key=value|key=value`.
///
/// Labels are appended in the order given; callers keep that order stable so
/// identical series always produce identical strings.
pub fn metric_name(name: &str, labels: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(name.len() + labels.len() * 16);
    out.push_str(name);
    for (key, value) in labels {
        out.push('|');
        out.push_str(key);
        out.push('=');
        out.push_str(value);
    }
    out
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn incr_by(&self, _metric: &str, _n: u64) {}

    fn observe_ms(&self, _metric: &str, _value_ms: f64) {}
}

/// Sink that records every emission, for test assertions.
#[derive(Debug, Default)]
pub struct RecordingMetrics {
    counters: Mutex<BTreeMap<String, u64>>,
    observations: Mutex<BTreeMap<String, Vec<f64>>>,
}

impl RecordingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of a counter (0 when never incremented).
    pub fn counter(&self, metric: &str) -> u64 {
        self.counters
            .lock()
            .map(|map| map.get(metric).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// All counters with non-zero values.
    pub fn counters(&self) -> BTreeMap<String, u64> {
        self.counters.lock().map(|map| map.clone()).unwrap_or_default()
    }

    /// Observed durations for a metric, in emission order.
    pub fn observations(&self, metric: &str) -> Vec<f64> {
        self.observations
            .lock()
            .map(|map| map.get(metric).cloned().unwrap_or_default())
            .unwrap_or_default()
    }
}

impl MetricsSink for RecordingMetrics {
    fn incr_by(&self, metric: &str, n: u64) {
        if let Ok(mut map) = self.counters.lock() {
            *map.entry(metric.to_string()).or_insert(0) += n;
        }
    }

    fn observe_ms(&self, metric: &str, value_ms: f64) {
        if let Ok(mut map) = self.observations.lock() {
            map.entry(metric.to_string()).or_default().push(value_ms);
        }
    }
}
