//! Replay worker loop
//!
//! ```text
//! claim -> (exhausted: stop) | (claimed -> wait -> execute -> record -> claim)
//! ```
//!
//! A worker keeps its counters in a local [`WorkerReport`] and hands it back
//! when the schedule is exhausted. Any failure ends the loop immediately; the
//! caller raises the pool's abort flag so the remaining workers stop claiming.

use super::executor::IoExecutor;
use super::timing::{Clock, TimingController};
use super::ReplayContext;
use crate::output::metrics::LatencyRecord;
use crate::stats::WorkerReport;
use crate::util::time::duration_to_ms;
use crate::Result;
use anyhow::Context;

/// Run one worker until the schedule is exhausted or the pool aborts
pub fn run_worker<C: Clock>(
    worker_id: usize,
    ctx: &ReplayContext,
    timing: &TimingController<C>,
    executor: &mut IoExecutor<'_>,
) -> Result<WorkerReport> {
    let mut report = WorkerReport::new(worker_id);
    let block_size = ctx.options.block_size;

    while let Some(index) = ctx.cursor.claim() {
        if ctx.is_aborted() {
            break;
        }
        let Some(request) = ctx.schedule.get(index) else {
            break;
        };

        if timing.wait_for(request.arrival_offset_ms) {
            report.record_late();
        }

        // The wait may have been long; don't start new IO into a failed run
        if ctx.is_aborted() {
            break;
        }

        let latency = executor
            .execute(request)
            .with_context(|| format!("Worker {} failed on request {}", worker_id, index))?;
        report.record_io(request.kind, request.byte_size, latency);

        if let Some(ref sink) = ctx.sink {
            sink.record(&LatencyRecord::new(request, block_size, duration_to_ms(latency)))?;
        }
    }

    log::debug!(
        "Worker {} done: {} requests, {} late",
        worker_id,
        report.completed,
        report.late_count
    );
    Ok(report)
}
