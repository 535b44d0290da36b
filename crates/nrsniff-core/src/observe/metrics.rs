//! Acquisition metrics.
//!
//! Lock-free counters and a latency histogram owned per controller
//! instance. The pull loop times every `work` call into
//! [`SnifferMetrics::work_latency_us`]; the synchronizer counts PSS
//! candidates on the same handle. Timing never feeds back into control
//! flow — it exists for operators.

use std::sync::atomic::{AtomicU64, Ordering};

/// A monotonically increasing atomic counter.
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment by 1.
    #[inline]
    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment by `n`.
    #[inline]
    pub fn inc_by(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    /// Current value.
    #[inline]
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    /// Reset to zero.
    #[inline]
    pub fn reset(&self) {
        self.value.store(0, Ordering::Relaxed);
    }
}

/// Fixed-bucket histogram for latency observations.
#[derive(Debug)]
pub struct Histogram {
    /// Upper bucket boundaries; one overflow bucket follows the last.
    boundaries: Vec<f64>,
    buckets: Vec<AtomicU64>,
    /// Sum of observations, stored in thousandths for atomic addition.
    sum_milli: AtomicU64,
    count: AtomicU64,
}

impl Histogram {
    /// Create a histogram with custom boundaries.
    pub fn new(boundaries: Vec<f64>) -> Self {
        let buckets = (0..boundaries.len() + 1).map(|_| AtomicU64::new(0)).collect();
        Self {
            boundaries,
            buckets,
            sum_milli: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Buckets sized for microsecond pull latencies: a file pull is tens
    /// of microseconds, a radio pull is up to one chunk period (8 ms).
    pub fn pull_latency_us() -> Self {
        Self::new(vec![
            10.0, 50.0, 100.0, 500.0, 1_000.0, 2_000.0, 4_000.0, 8_000.0, 16_000.0, 50_000.0,
        ])
    }

    /// Record one observation.
    pub fn observe(&self, value: f64) {
        let idx = self
            .boundaries
            .iter()
            .position(|&b| value < b)
            .unwrap_or(self.boundaries.len());
        self.buckets[idx].fetch_add(1, Ordering::Relaxed);
        self.sum_milli
            .fetch_add((value * 1000.0) as u64, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of observations.
    #[inline]
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Sum of observations.
    #[inline]
    pub fn sum(&self) -> f64 {
        self.sum_milli.load(Ordering::Relaxed) as f64 / 1000.0
    }

    /// Per-bucket counts, overflow bucket last.
    pub fn bucket_counts(&self) -> Vec<u64> {
        self.buckets
            .iter()
            .map(|b| b.load(Ordering::Relaxed))
            .collect()
    }

    /// Bucket boundaries.
    pub fn boundaries(&self) -> &[f64] {
        &self.boundaries
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::pull_latency_us()
    }
}

/// Metrics for one acquisition controller instance.
#[derive(Debug, Default)]
pub struct SnifferMetrics {
    /// Chunks pulled from the source.
    pub chunks_pulled: Counter,
    /// Samples requested across all pulls.
    pub samples_requested: Counter,
    /// PSS candidates reported by the synchronizer.
    pub sync_detections: Counter,
    /// Pulls that failed with a source error.
    pub source_errors: Counter,
    /// End-of-stream signals observed.
    pub stream_ends: Counter,
    /// Per-pull duration in microseconds.
    pub work_latency_us: Histogram,
}

impl SnifferMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot every metric at once.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            chunks_pulled: self.chunks_pulled.get(),
            samples_requested: self.samples_requested.get(),
            sync_detections: self.sync_detections.get(),
            source_errors: self.source_errors.get(),
            stream_ends: self.stream_ends.get(),
            work_latency_count: self.work_latency_us.count(),
            work_latency_sum_us: self.work_latency_us.sum(),
        }
    }

    /// Reset all counters (histogram contents are kept).
    pub fn reset(&self) {
        self.chunks_pulled.reset();
        self.samples_requested.reset();
        self.sync_detections.reset();
        self.source_errors.reset();
        self.stream_ends.reset();
    }
}

/// Point-in-time copy of [`SnifferMetrics`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricsSnapshot {
    pub chunks_pulled: u64,
    pub samples_requested: u64,
    pub sync_detections: u64,
    pub source_errors: u64,
    pub stream_ends: u64,
    pub work_latency_count: u64,
    pub work_latency_sum_us: f64,
}

impl MetricsSnapshot {
    /// Mean pull duration in microseconds.
    pub fn avg_work_latency_us(&self) -> f64 {
        if self.work_latency_count == 0 {
            0.0
        } else {
            self.work_latency_sum_us / self.work_latency_count as f64
        }
    }
}
