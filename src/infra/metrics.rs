//! Lock-free counters and periodic reporting
//!
//! Uses atomics for hot-path operations. All counter updates are lock-free;
//! reporting swaps the periodic counters to get a consistent snapshot.
//!
//! NOTE: All atomics use Relaxed ordering intentionally. These are statistical
//! counters only. Do NOT use them for coordination or logic decisions.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Filter-run latency histogram bucket upper bounds (microseconds)
/// Buckets: ≤10, ≤20, ≤40, ≤80, ≤160, ≤320, ≤640, ≤1280, ≤2560, ≤5120, >5120
const BUCKET_BOUNDS: [u64; 10] = [10, 20, 40, 80, 160, 320, 640, 1280, 2560, 5120];
const NUM_BUCKETS: usize = 11;

/// Compute bucket index for a latency value using binary search
#[inline]
fn bucket_index(latency_us: u64) -> usize {
    BUCKET_BOUNDS.partition_point(|&bound| bound < latency_us)
}

/// Update an atomic max value using compare-and-swap loop
#[inline]
fn update_atomic_max(atomic_max: &AtomicU64, new_value: u64) {
    let mut current_max = atomic_max.load(Ordering::Relaxed);
    while new_value > current_max {
        match atomic_max.compare_exchange_weak(
            current_max,
            new_value,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => break,
            Err(actual) => current_max = actual,
        }
    }
}

/// Swap all buckets to zero and return their values
#[inline]
fn swap_buckets(buckets: &[AtomicU64; NUM_BUCKETS]) -> [u64; NUM_BUCKETS] {
    let mut result = [0u64; NUM_BUCKETS];
    for (i, bucket) in buckets.iter().enumerate() {
        result[i] = bucket.swap(0, Ordering::Relaxed);
    }
    result
}

/// Upper bound of the bucket containing `percentile` of the filter runs
///
/// The overflow bucket reports twice the last bound.
fn percentile_from_buckets(buckets: &[u64; NUM_BUCKETS], percentile: f64) -> u64 {
    let total: u64 = buckets.iter().sum();
    if total == 0 {
        return 0;
    }

    let target = (total as f64 * percentile) as u64;
    let overflow_bound = BUCKET_BOUNDS[BUCKET_BOUNDS.len() - 1] * 2;
    let mut cumulative = 0u64;
    for (i, &count) in buckets.iter().enumerate() {
        cumulative += count;
        if cumulative >= target {
            return BUCKET_BOUNDS.get(i).copied().unwrap_or(overflow_bound);
        }
    }
    overflow_bound
}

/// Lock-free metrics collector
pub struct Metrics {
    /// Total pipeline runs (monotonic)
    filter_runs_total: AtomicU64,
    /// Pipeline runs since last report (reset on report)
    filter_runs_since_report: AtomicU64,
    /// Sum of pipeline latencies in microseconds (reset on report)
    filter_latency_sum_us: AtomicU64,
    /// Max pipeline latency in microseconds (reset on report)
    filter_latency_max_us: AtomicU64,
    /// Pipeline latency histogram buckets (reset on report)
    filter_latency_buckets: [AtomicU64; NUM_BUCKETS],
    /// Raw positions received from the provider (monotonic)
    positions_received: AtomicU64,
    /// Positions emitted after throttling (monotonic)
    positions_emitted: AtomicU64,
    /// Reverse geocoding requests issued (monotonic)
    geocode_issued: AtomicU64,
    /// Geocoding responses discarded as superseded (monotonic)
    geocode_stale: AtomicU64,
    /// Geocoding failures (monotonic)
    geocode_failed: AtomicU64,
    /// Camera animations handed to the map surface (monotonic)
    camera_issued: AtomicU64,
    /// Camera requests dropped (map not ready or torn down) (monotonic)
    camera_dropped: AtomicU64,
    /// In-flight animations superseded by a newer request (monotonic)
    camera_superseded: AtomicU64,
    /// Selection changes reported upward (monotonic)
    selection_changes: AtomicU64,
    /// Last report time (only accessed from reporter)
    last_report_time: parking_lot::Mutex<Instant>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            filter_runs_total: AtomicU64::new(0),
            filter_runs_since_report: AtomicU64::new(0),
            filter_latency_sum_us: AtomicU64::new(0),
            filter_latency_max_us: AtomicU64::new(0),
            filter_latency_buckets: std::array::from_fn(|_| AtomicU64::new(0)),
            positions_received: AtomicU64::new(0),
            positions_emitted: AtomicU64::new(0),
            geocode_issued: AtomicU64::new(0),
            geocode_stale: AtomicU64::new(0),
            geocode_failed: AtomicU64::new(0),
            camera_issued: AtomicU64::new(0),
            camera_dropped: AtomicU64::new(0),
            camera_superseded: AtomicU64::new(0),
            selection_changes: AtomicU64::new(0),
            last_report_time: parking_lot::Mutex::new(Instant::now()),
        }
    }

    /// Record a pipeline run with given latency (lock-free)
    #[inline]
    pub fn record_filter_run(&self, latency_us: u64) {
        self.filter_runs_total.fetch_add(1, Ordering::Relaxed);
        self.filter_runs_since_report.fetch_add(1, Ordering::Relaxed);
        self.filter_latency_sum_us.fetch_add(latency_us, Ordering::Relaxed);
        self.filter_latency_buckets[bucket_index(latency_us)].fetch_add(1, Ordering::Relaxed);
        update_atomic_max(&self.filter_latency_max_us, latency_us);
    }

    #[inline]
    pub fn record_position_received(&self) {
        self.positions_received.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_position_emitted(&self) {
        self.positions_emitted.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_geocode_issued(&self) {
        self.geocode_issued.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_geocode_stale(&self) {
        self.geocode_stale.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_geocode_failed(&self) {
        self.geocode_failed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_camera_issued(&self) {
        self.camera_issued.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_camera_dropped(&self) {
        self.camera_dropped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_camera_superseded(&self) {
        self.camera_superseded.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_selection_change(&self) {
        self.selection_changes.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn filter_runs(&self) -> u64 {
        self.filter_runs_total.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn positions_emitted(&self) -> u64 {
        self.positions_emitted.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn geocode_issued(&self) -> u64 {
        self.geocode_issued.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn geocode_stale(&self) -> u64 {
        self.geocode_stale.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn camera_issued(&self) -> u64 {
        self.camera_issued.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn camera_dropped(&self) -> u64 {
        self.camera_dropped.load(Ordering::Relaxed)
    }

    /// Generate a summary, resetting the periodic counters
    pub fn report(&self) -> MetricsSummary {
        let now = Instant::now();
        let elapsed_secs = {
            let mut last = self.last_report_time.lock();
            let elapsed = now.duration_since(*last).as_secs_f64();
            *last = now;
            elapsed
        };

        let runs_since = self.filter_runs_since_report.swap(0, Ordering::Relaxed);
        let latency_sum = self.filter_latency_sum_us.swap(0, Ordering::Relaxed);
        let latency_max = self.filter_latency_max_us.swap(0, Ordering::Relaxed);
        let buckets = swap_buckets(&self.filter_latency_buckets);

        let filter_runs_per_sec =
            if elapsed_secs > 0.0 { runs_since as f64 / elapsed_secs } else { 0.0 };
        let filter_avg_latency_us = if runs_since > 0 { latency_sum / runs_since } else { 0 };

        MetricsSummary {
            filter_runs_total: self.filter_runs_total.load(Ordering::Relaxed),
            filter_runs_per_sec,
            filter_avg_latency_us,
            filter_max_latency_us: latency_max,
            filter_p99_latency_us: percentile_from_buckets(&buckets, 0.99),
            positions_received: self.positions_received.load(Ordering::Relaxed),
            positions_emitted: self.positions_emitted.load(Ordering::Relaxed),
            geocode_issued: self.geocode_issued.load(Ordering::Relaxed),
            geocode_stale: self.geocode_stale.load(Ordering::Relaxed),
            geocode_failed: self.geocode_failed.load(Ordering::Relaxed),
            camera_issued: self.camera_issued.load(Ordering::Relaxed),
            camera_dropped: self.camera_dropped.load(Ordering::Relaxed),
            camera_superseded: self.camera_superseded.load(Ordering::Relaxed),
            selection_changes: self.selection_changes.load(Ordering::Relaxed),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct MetricsSummary {
    pub filter_runs_total: u64,
    pub filter_runs_per_sec: f64,
    pub filter_avg_latency_us: u64,
    pub filter_max_latency_us: u64,
    /// 99th percentile pipeline latency (µs)
    pub filter_p99_latency_us: u64,
    pub positions_received: u64,
    pub positions_emitted: u64,
    pub geocode_issued: u64,
    pub geocode_stale: u64,
    pub geocode_failed: u64,
    pub camera_issued: u64,
    pub camera_dropped: u64,
    pub camera_superseded: u64,
    pub selection_changes: u64,
}

impl MetricsSummary {
    pub fn log(&self) {
        info!(
            filter_runs = %self.filter_runs_total,
            filter_runs_per_sec = format!("{:.1}", self.filter_runs_per_sec),
            filter_avg_us = %self.filter_avg_latency_us,
            filter_max_us = %self.filter_max_latency_us,
            filter_p99_us = %self.filter_p99_latency_us,
            positions_received = %self.positions_received,
            positions_emitted = %self.positions_emitted,
            geocode_issued = %self.geocode_issued,
            geocode_stale = %self.geocode_stale,
            geocode_failed = %self.geocode_failed,
            camera_issued = %self.camera_issued,
            camera_dropped = %self.camera_dropped,
            camera_superseded = %self.camera_superseded,
            selection_changes = %self.selection_changes,
            "metrics"
        );
    }
}
