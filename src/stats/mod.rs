//! Replay statistics
//!
//! Workers accumulate counts and latencies locally in a [`WorkerReport`] and hand
//! it back when they exit. The orchestrator reduces all reports into a single
//! [`RunSummary`] once, after every worker has joined. Nothing here is shared
//! between threads while the replay is running.

pub mod histogram;

use crate::trace::OpKind;
use histogram::LatencyHistogram;
use serde::Serialize;
use std::time::Duration;

/// Per-worker counters, reduced at join time
#[derive(Debug, Clone, Default)]
pub struct WorkerReport {
    pub worker_id: usize,
    pub completed: u64,
    pub reads: u64,
    pub writes: u64,
    pub bytes: u64,
    /// Requests dispatched after their recorded arrival time
    pub late_count: u64,
    pub latency: LatencyHistogram,
}

impl WorkerReport {
    pub fn new(worker_id: usize) -> Self {
        Self {
            worker_id,
            ..Self::default()
        }
    }

    /// Record a completed transfer
    #[inline]
    pub fn record_io(&mut self, kind: OpKind, bytes: u64, latency: Duration) {
        self.completed += 1;
        self.bytes += bytes;
        match kind {
            OpKind::Read => self.reads += 1,
            OpKind::Write => self.writes += 1,
        }
        self.latency.record(latency);
    }

    #[inline]
    pub fn record_late(&mut self) {
        self.late_count += 1;
    }
}

/// Aggregate result of one replay run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub total_requests: usize,
    pub completed: u64,
    pub reads: u64,
    pub writes: u64,
    pub bytes: u64,
    pub late_count: u64,
    /// Wall-clock time from pool start to the last worker joining
    pub elapsed: Duration,
    pub respect_timing: bool,
    pub worker_count: usize,
    pub latency: LatencyHistogram,
}

impl RunSummary {
    /// Reduce per-worker reports into a summary
    pub fn from_reports(
        reports: &[WorkerReport],
        total_requests: usize,
        elapsed: Duration,
        respect_timing: bool,
    ) -> Self {
        let mut summary = Self {
            total_requests,
            completed: 0,
            reads: 0,
            writes: 0,
            bytes: 0,
            late_count: 0,
            elapsed,
            respect_timing,
            worker_count: reports.len(),
            latency: LatencyHistogram::new(),
        };

        for report in reports {
            summary.completed += report.completed;
            summary.reads += report.reads;
            summary.writes += report.writes;
            summary.bytes += report.bytes;
            summary.late_count += report.late_count;
            summary.latency.merge(&report.latency);
        }
        summary
    }

    /// Fraction of requests dispatched late, in percent
    pub fn late_percent(&self) -> f64 {
        if self.total_requests == 0 {
            return 0.0;
        }
        100.0 * self.late_count as f64 / self.total_requests as f64
    }

    pub fn elapsed_ms(&self) -> f64 {
        crate::util::time::duration_to_ms(self.elapsed)
    }

    /// Serializable snapshot of the summary
    pub fn to_record(&self) -> SummaryRecord {
        let ms = |d: Option<Duration>| d.map(crate::util::time::duration_to_ms).unwrap_or(0.0);
        SummaryRecord {
            total_requests: self.total_requests,
            completed: self.completed,
            reads: self.reads,
            writes: self.writes,
            bytes: self.bytes,
            elapsed_ms: self.elapsed_ms(),
            respect_timing: self.respect_timing,
            late_count: self.late_count,
            late_percent: self.late_percent(),
            worker_count: self.worker_count,
            latency_min_ms: ms(Some(self.latency.min())),
            latency_mean_ms: ms(Some(self.latency.mean())),
            latency_p50_ms: ms(self.latency.percentile(50.0)),
            latency_p95_ms: ms(self.latency.percentile(95.0)),
            latency_p99_ms: ms(self.latency.percentile(99.0)),
            latency_max_ms: ms(Some(self.latency.max())),
        }
    }
}

/// Flat, serializable view of a [`RunSummary`]
#[derive(Debug, Clone, Serialize)]
pub struct SummaryRecord {
    pub total_requests: usize,
    pub completed: u64,
    pub reads: u64,
    pub writes: u64,
    pub bytes: u64,
    pub elapsed_ms: f64,
    pub respect_timing: bool,
    pub late_count: u64,
    pub late_percent: f64,
    pub worker_count: usize,
    pub latency_min_ms: f64,
    pub latency_mean_ms: f64,
    pub latency_p50_ms: f64,
    pub latency_p95_ms: f64,
    pub latency_p99_ms: f64,
    pub latency_max_ms: f64,
}
