//! In-process metrics for the tracking and reporting paths.
//!
//! Counters and latency histograms are plain atomics behind a global
//! registry. They surface through `/health` and the shutdown log line.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Monotonic counter.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Upper bounds (ms) of the latency buckets; the last bucket also takes
/// everything slower.
const BUCKET_BOUNDS_MS: [u64; 9] = [5, 10, 25, 50, 100, 250, 500, 1000, 5000];

/// Latency histogram in milliseconds.
#[derive(Debug, Default)]
pub struct Histogram {
    buckets: [AtomicU64; BUCKET_BOUNDS_MS.len()],
    sum: AtomicU64,
    count: AtomicU64,
}

impl Histogram {
    pub fn observe(&self, ms: u64) {
        self.sum.fetch_add(ms, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        let i = BUCKET_BOUNDS_MS
            .iter()
            .position(|&bound| ms <= bound)
            .unwrap_or(BUCKET_BOUNDS_MS.len() - 1);
        self.buckets[i].fetch_add(1, Ordering::Relaxed);
    }

    /// Records the time elapsed since `start`.
    pub fn observe_since(&self, start: Instant) {
        let ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.observe(ms);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> f64 {
        match self.count() {
            0 => 0.0,
            n => self.sum.load(Ordering::Relaxed) as f64 / n as f64,
        }
    }

    /// `(upper bound ms, count)` per bucket.
    pub fn buckets(&self) -> Vec<(u64, u64)> {
        BUCKET_BOUNDS_MS
            .iter()
            .zip(&self.buckets)
            .map(|(&bound, count)| (bound, count.load(Ordering::Relaxed)))
            .collect()
    }
}

/// Collected metrics for the analytics pipeline.
#[derive(Debug, Default)]
pub struct Metrics {
    // Write path
    pub events_recorded: Counter,
    pub record_failures: Counter,
    pub bounce_updates: Counter,
    pub bounce_update_failures: Counter,

    // Read path
    pub read_queries: Counter,
    pub query_errors: Counter,
    pub exports: Counter,

    pub insert_latency_ms: Histogram,
    pub query_latency_ms: Histogram,
    pub report_latency_ms: Histogram,
}

/// Point-in-time copy of the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub events_recorded: u64,
    pub record_failures: u64,
    pub bounce_updates: u64,
    pub bounce_update_failures: u64,
    pub read_queries: u64,
    pub query_errors: u64,
    pub exports: u64,
    pub insert_latency_mean_ms: f64,
    pub query_latency_mean_ms: f64,
    pub report_latency_mean_ms: f64,
}

impl MetricsSnapshot {
    /// Share of tracking calls that fell back to a placeholder, 0-1.
    pub fn record_failure_ratio(&self) -> f64 {
        let attempts = self.events_recorded + self.record_failures;
        if attempts == 0 {
            0.0
        } else {
            self.record_failures as f64 / attempts as f64
        }
    }
}

impl Metrics {
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            events_recorded: self.events_recorded.get(),
            record_failures: self.record_failures.get(),
            bounce_updates: self.bounce_updates.get(),
            bounce_update_failures: self.bounce_update_failures.get(),
            read_queries: self.read_queries.get(),
            query_errors: self.query_errors.get(),
            exports: self.exports.get(),
            insert_latency_mean_ms: self.insert_latency_ms.mean(),
            query_latency_mean_ms: self.query_latency_ms.mean(),
            report_latency_mean_ms: self.report_latency_ms.mean(),
        }
    }
}

/// Global metrics registry.
pub static METRICS: std::sync::LazyLock<Metrics> = std::sync::LazyLock::new(Metrics::default);

/// Get the global metrics instance.
pub fn metrics() -> &'static Metrics {
    &METRICS
}
