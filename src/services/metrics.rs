//! Process-wide dispatch metrics.
//!
//! Counters are updated on every completed dispatch and feed the
//! historical-performance term of the router's confidence score, closing
//! the feedback loop: workers that succeed more often become more likely
//! to win ambiguous future requests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Lifetime success/total counts for one worker. Never deleted during the
/// process lifetime.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct WorkerPerformanceCounter {
    pub success_count: u64,
    pub total_count: u64,
}

impl WorkerPerformanceCounter {
    /// Success rate in [0, 1]; `None` until at least one dispatch landed.
    pub fn rate(&self) -> Option<f64> {
        if self.total_count == 0 {
            None
        } else {
            #[allow(clippy::cast_precision_loss)]
            Some(self.success_count as f64 / self.total_count as f64)
        }
    }
}

/// Pull-based aggregate snapshot for dashboards and the `metrics` CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub total_requests: u64,
    pub error_count: u64,
    pub avg_latency_ms: f64,
    pub cache_hit_rate: f64,
    pub workers: HashMap<String, WorkerPerformanceCounter>,
}

#[derive(Debug, Default)]
struct MetricsInner {
    total_requests: u64,
    error_count: u64,
    total_latency: Duration,
    cache_hits: u64,
    cache_misses: u64,
    workers: HashMap<String, WorkerPerformanceCounter>,
}

/// Thread-safe metrics collector.
///
/// A single mutex guards the whole table; every update is one short
/// read-modify-write.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    inner: Mutex<MetricsInner>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed dispatch against a worker.
    pub fn record_request(&self, worker_id: &str, success: bool, latency: Duration) {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.total_requests += 1;
        inner.total_latency += latency;
        if !success {
            inner.error_count += 1;
        }
        let counter = inner.workers.entry(worker_id.to_string()).or_default();
        counter.total_count += 1;
        if success {
            counter.success_count += 1;
        }
    }

    pub fn record_cache_hit(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.cache_hits += 1;
    }

    pub fn record_cache_miss(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.cache_misses += 1;
    }

    /// Historical success rate for one worker; `None` with no history.
    pub fn success_rate(&self, worker_id: &str) -> Option<f64> {
        let inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.workers.get(worker_id).and_then(WorkerPerformanceCounter::rate)
    }

    /// Snapshot of every worker's counters.
    pub fn worker_performance(&self) -> HashMap<String, WorkerPerformanceCounter> {
        let inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.workers.clone()
    }

    /// Aggregate counters for the metrics sink.
    pub fn summary(&self) -> MetricsSummary {
        let inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        #[allow(clippy::cast_precision_loss)]
        let avg_latency_ms = if inner.total_requests == 0 {
            0.0
        } else {
            inner.total_latency.as_secs_f64() * 1000.0 / inner.total_requests as f64
        };
        let lookups = inner.cache_hits + inner.cache_misses;
        #[allow(clippy::cast_precision_loss)]
        let cache_hit_rate = if lookups == 0 {
            0.0
        } else {
            inner.cache_hits as f64 / lookups as f64
        };
        MetricsSummary {
            total_requests: inner.total_requests,
            error_count: inner.error_count,
            avg_latency_ms,
            cache_hit_rate,
            workers: inner.workers.clone(),
        }
    }
}
