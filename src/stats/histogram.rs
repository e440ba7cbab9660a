//! Latency histogram using HdrHistogram
//!
//! Each worker records into its own histogram; the orchestrator merges them once
//! after the pool drains, so recording never contends across threads.

use hdrhistogram::Histogram;
use std::time::Duration;

/// 1 hour in nanoseconds
const MAX_TRACKABLE_NANOS: u64 = 3_600_000_000_000;

/// Latency histogram wrapper
///
/// Tracks latencies from 1ns to 1 hour with 3 significant digits.
#[derive(Debug, Clone)]
pub struct LatencyHistogram {
    histogram: Histogram<u64>,
}

impl LatencyHistogram {
    pub fn new() -> Self {
        let histogram = Histogram::new_with_bounds(1, MAX_TRACKABLE_NANOS, 3)
            .expect("histogram bounds are valid constants");

        Self { histogram }
    }

    /// Record a latency sample, clamped to the trackable range
    #[inline]
    pub fn record(&mut self, latency: Duration) {
        let nanos = latency.as_nanos().min(MAX_TRACKABLE_NANOS as u128) as u64;
        let _ = self.histogram.record(nanos.max(1));
    }

    /// Latency at `percentile` (0.0 - 100.0), or `None` if empty
    pub fn percentile(&self, percentile: f64) -> Option<Duration> {
        if self.histogram.is_empty() {
            return None;
        }
        Some(Duration::from_nanos(
            self.histogram.value_at_percentile(percentile),
        ))
    }

    pub fn mean(&self) -> Duration {
        if self.histogram.is_empty() {
            return Duration::ZERO;
        }
        Duration::from_nanos(self.histogram.mean() as u64)
    }

    pub fn min(&self) -> Duration {
        if self.histogram.is_empty() {
            return Duration::ZERO;
        }
        Duration::from_nanos(self.histogram.min())
    }

    pub fn max(&self) -> Duration {
        if self.histogram.is_empty() {
            return Duration::ZERO;
        }
        Duration::from_nanos(self.histogram.max())
    }

    pub fn len(&self) -> u64 {
        self.histogram.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histogram.is_empty()
    }

    /// Fold another worker's samples into this histogram
    pub fn merge(&mut self, other: &LatencyHistogram) {
        // Both sides share the same bounds, so add cannot fail
        let _ = self.histogram.add(&other.histogram);
    }
}

impl Default for LatencyHistogram {
    fn default() -> Self {
        Self::new()
    }
}
