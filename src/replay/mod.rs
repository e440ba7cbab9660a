//! Trace replay
//!
//! The [`Orchestrator`] owns a run. It builds one [`ReplayContext`] holding the
//! immutable schedule, the shared [`JobCursor`], the metrics sink and the abort
//! flag, then starts a fixed pool of OS threads that each run
//! [`worker::run_worker`] against it.
//!
//! # Run sequence
//!
//! 1. Spawn `worker_count` threads. Each allocates its private aligned buffer
//!    and reports ready.
//! 2. Capture the [`ReplayClock`] and release every worker with a copy of it.
//! 3. Wait for every worker's report. The first failure raises the abort flag
//!    and is returned at once, without waiting for sleeping workers.
//! 4. Join the pool, measure elapsed time, finalize the metrics sink and reduce
//!    the per-worker reports into a [`RunSummary`].
//!
//! No replay work runs on the orchestrating thread.

pub mod cursor;
pub mod executor;
pub mod progress;
pub mod session;
pub mod timing;
pub mod worker;

pub use cursor::JobCursor;
pub use executor::IoExecutor;
pub use session::{prepare_schedule, run_from_config, run_with_engine};
pub use timing::{Clock, SystemClock, TimingController};

use crate::config::ReplayConfig;
use crate::engine::IOEngine;
use crate::output::metrics::MetricsSink;
use crate::stats::{RunSummary, WorkerReport};
use crate::trace::Schedule;
use crate::util::buffer::AlignedBuffer;
use crate::util::time::ReplayClock;
use crate::Result;
use anyhow::Context;
use crossbeam::channel::{bounded, unbounded, Receiver, Sender};
use progress::{ProgressReporter, PROGRESS_INTERVAL};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Pool parameters, taken from [`ReplayConfig`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayOptions {
    pub worker_count: usize,
    /// Bytes per trace block
    pub block_size: u64,
    /// Direct IO alignment for worker buffers
    pub alignment: usize,
    pub respect_timing: bool,
    pub prefill_random: bool,
    pub progress: bool,
}

impl ReplayOptions {
    pub fn from_config(config: &ReplayConfig) -> Self {
        Self {
            worker_count: config.worker_count,
            block_size: config.block_size_bytes,
            alignment: config.alignment_bytes,
            respect_timing: config.respect_timing,
            prefill_random: config.prefill_random,
            progress: config.progress,
        }
    }
}

/// State shared by every worker in one run
pub struct ReplayContext {
    pub schedule: Schedule,
    pub cursor: Arc<JobCursor>,
    pub options: ReplayOptions,
    pub sink: Option<MetricsSink>,
    pub abort: AtomicBool,
}

impl ReplayContext {
    pub fn new(schedule: Schedule, options: ReplayOptions, sink: Option<MetricsSink>) -> Self {
        Self {
            cursor: Arc::new(JobCursor::new(schedule.len())),
            schedule,
            options,
            sink,
            abort: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn is_aborted(&self) -> bool {
        self.abort.load(Ordering::Relaxed)
    }

    /// Per-worker buffer size: the largest request, rounded up to the alignment
    pub fn buffer_size(&self) -> usize {
        let alignment = self.options.alignment.max(1) as u64;
        let largest = self.schedule.max_request_bytes().max(1);
        let rounded = largest.div_ceil(alignment) * alignment;
        usize::try_from(rounded).unwrap_or(usize::MAX)
    }
}

/// Messages from worker threads to the orchestrator
enum WorkerEvent {
    Ready,
    Finished(WorkerReport),
    Failed(anyhow::Error),
}

/// Drives one replay run over a shared engine
pub struct Orchestrator {
    engine: Arc<dyn IOEngine>,
    options: ReplayOptions,
}

impl Orchestrator {
    pub fn new(engine: Arc<dyn IOEngine>, options: ReplayOptions) -> Self {
        Self { engine, options }
    }

    pub fn options(&self) -> &ReplayOptions {
        &self.options
    }

    /// Replay `schedule` to exhaustion and return the aggregated summary
    ///
    /// `sink` receives one row per completed request and is flushed after every
    /// worker has joined.
    pub fn run(&self, schedule: Schedule, sink: Option<MetricsSink>) -> Result<RunSummary> {
        let total_requests = schedule.len();
        let worker_count = self.options.worker_count;
        if worker_count == 0 {
            anyhow::bail!("worker pool needs at least one worker");
        }

        let ctx = Arc::new(ReplayContext::new(schedule, self.options, sink));
        let buffer_size = ctx.buffer_size();

        let (event_tx, event_rx) = unbounded();
        let (start_tx, start_rx) = bounded::<ReplayClock>(worker_count);

        log::debug!(
            "Starting {} workers on {} engine ({} byte buffers)",
            worker_count,
            self.engine.name(),
            buffer_size
        );

        let mut handles = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            let worker_ctx = Arc::clone(&ctx);
            let engine = Arc::clone(&self.engine);
            let start_rx = start_rx.clone();
            let events = event_tx.clone();

            let handle = std::thread::Builder::new()
                .name(format!("replay-worker-{}", worker_id))
                .spawn(move || {
                    worker_main(worker_id, worker_ctx, engine, buffer_size, start_rx, events)
                })
                .with_context(|| format!("Failed to spawn worker thread {}", worker_id));
            match handle {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    // Workers already spawned exit when the start channel closes
                    ctx.abort.store(true, Ordering::SeqCst);
                    return Err(e);
                }
            }
        }
        drop(event_tx);
        drop(start_rx);

        // Every worker has its buffer before the clock starts
        for _ in 0..worker_count {
            match event_rx.recv() {
                Ok(WorkerEvent::Ready) => {}
                Ok(WorkerEvent::Failed(e)) => {
                    ctx.abort.store(true, Ordering::SeqCst);
                    return Err(e.context("Worker setup failed"));
                }
                Ok(WorkerEvent::Finished(_)) | Err(_) => {
                    ctx.abort.store(true, Ordering::SeqCst);
                    drop(start_tx);
                    return Err(join_failure(handles, "Worker exited before the replay started"));
                }
            }
        }

        let clock = ReplayClock::start();
        for _ in 0..worker_count {
            start_tx
                .send(clock)
                .map_err(|_| anyhow::anyhow!("Worker pool exited before the replay started"))?;
        }
        drop(start_tx);

        let progress = if self.options.progress {
            Some(ProgressReporter::spawn(Arc::clone(&ctx.cursor), PROGRESS_INTERVAL)?)
        } else {
            None
        };

        let mut reports = Vec::with_capacity(worker_count);
        while reports.len() < worker_count {
            match event_rx.recv() {
                Ok(WorkerEvent::Finished(report)) => reports.push(report),
                Ok(WorkerEvent::Failed(e)) => {
                    ctx.abort.store(true, Ordering::SeqCst);
                    log::debug!("Aborting replay: {:#}", e);
                    return Err(e);
                }
                Ok(WorkerEvent::Ready) => {}
                Err(_) => {
                    ctx.abort.store(true, Ordering::SeqCst);
                    return Err(join_failure(handles, "Worker exited without reporting"));
                }
            }
        }

        for handle in handles {
            handle
                .join()
                .map_err(|_| anyhow::anyhow!("Worker thread panicked"))?;
        }
        let elapsed = clock.elapsed();

        if let Some(progress) = progress {
            progress.stop();
        }

        // Every worker has joined, so this is the last reference
        let ctx = Arc::into_inner(ctx)
            .ok_or_else(|| anyhow::anyhow!("replay context still shared after join"))?;
        if let Some(sink) = ctx.sink {
            let rows = sink.finalize()?;
            log::debug!("Wrote {} metrics rows", rows);
        }

        reports.sort_by_key(|r| r.worker_id);
        Ok(RunSummary::from_reports(
            &reports,
            total_requests,
            elapsed,
            self.options.respect_timing,
        ))
    }
}

fn worker_main(
    worker_id: usize,
    ctx: Arc<ReplayContext>,
    engine: Arc<dyn IOEngine>,
    buffer_size: usize,
    start: Receiver<ReplayClock>,
    events: Sender<WorkerEvent>,
) {
    let mut buffer = match AlignedBuffer::new(buffer_size, ctx.options.alignment) {
        Ok(buffer) => buffer,
        Err(e) => {
            let _ = events.send(WorkerEvent::Failed(
                e.context(format!("Worker {} could not allocate its buffer", worker_id)),
            ));
            return;
        }
    };
    if ctx.options.prefill_random {
        buffer.fill_random();
    }

    if events.send(WorkerEvent::Ready).is_err() {
        return;
    }
    let Ok(clock) = start.recv() else {
        return;
    };

    let timing = TimingController::new(SystemClock::new(clock), ctx.options.respect_timing);
    let mut executor = IoExecutor::new(engine.as_ref(), buffer, ctx.options.block_size);

    let event = match worker::run_worker(worker_id, &ctx, &timing, &mut executor) {
        Ok(report) => WorkerEvent::Finished(report),
        Err(e) => {
            ctx.abort.store(true, Ordering::SeqCst);
            WorkerEvent::Failed(e)
        }
    };
    let _ = events.send(event);
}

/// Join every handle and describe why the pool broke down
fn join_failure(handles: Vec<JoinHandle<()>>, what: &str) -> anyhow::Error {
    let panicked = handles
        .into_iter()
        .map(|h| h.join())
        .filter(|r| r.is_err())
        .count();
    if panicked > 0 {
        anyhow::anyhow!("{}: {} worker thread(s) panicked", what, panicked)
    } else {
        anyhow::anyhow!("{}", what)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::mock::MockEngine;
    use crate::error::ReplayError;
    use crate::trace::{OpKind, Request};
    use std::time::{Duration, Instant};

    fn request(ms: f64, offset_blocks: u64, size_blocks: u64, kind: OpKind) -> Request {
        Request {
            arrival_offset_ms: ms,
            block_offset: offset_blocks * 512,
            byte_size: size_blocks * 512,
            kind,
            op_flag: if kind == OpKind::Write { 0 } else { 1 },
        }
    }

    fn options(worker_count: usize, respect_timing: bool) -> ReplayOptions {
        ReplayOptions {
            worker_count,
            block_size: 512,
            alignment: 512,
            respect_timing,
            prefill_random: false,
            progress: false,
        }
    }

    fn uniform_schedule(count: u64) -> Schedule {
        Schedule::new(
            (0..count)
                .map(|i| request(0.0, i * 8, 8, if i % 2 == 0 { OpKind::Read } else { OpKind::Write }))
                .collect(),
        )
    }

    #[test]
    fn test_buffer_size_rounds_largest_request() {
        let schedule = Schedule::new(vec![
            request(0.0, 0, 8, OpKind::Read),
            Request {
                byte_size: 1000,
                ..request(0.0, 0, 0, OpKind::Read)
            },
        ]);
        let ctx = ReplayContext::new(schedule, options(1, false), None);
        assert_eq!(ctx.buffer_size(), 4096);

        let ctx = ReplayContext::new(
            Schedule::new(vec![Request {
                byte_size: 1000,
                ..request(0.0, 0, 0, OpKind::Read)
            }]),
            options(1, false),
            None,
        );
        assert_eq!(ctx.buffer_size(), 1024);

        let ctx = ReplayContext::new(Schedule::default(), options(1, false), None);
        assert_eq!(ctx.buffer_size(), 512);
    }

    #[test]
    fn test_every_request_executed_once() {
        let engine = Arc::new(MockEngine::new());
        let orchestrator = Orchestrator::new(engine.clone(), options(16, false));

        let summary = orchestrator.run(uniform_schedule(1000), None).unwrap();
        assert_eq!(summary.total_requests, 1000);
        assert_eq!(summary.completed, 1000);
        assert_eq!(summary.reads, 500);
        assert_eq!(summary.writes, 500);
        assert_eq!(summary.late_count, 0);
        assert_eq!(summary.worker_count, 16);

        let mut offsets: Vec<u64> = engine.submitted_operations().iter().map(|op| op.offset).collect();
        offsets.sort_unstable();
        let expected: Vec<u64> = (0..1000).map(|i| i * 8 * 512).collect();
        assert_eq!(offsets, expected);
    }

    #[test]
    fn test_workers_use_distinct_aligned_buffers() {
        let engine = Arc::new(MockEngine::with_latency(Duration::from_millis(20)));
        let orchestrator = Orchestrator::new(engine.clone(), options(4, false));
        orchestrator.run(uniform_schedule(8), None).unwrap();

        let ops = engine.submitted_operations();
        assert!(ops.iter().all(|op| op.buffer_addr % 512 == 0));
        let mut addrs: Vec<usize> = ops.iter().map(|op| op.buffer_addr).collect();
        addrs.sort_unstable();
        addrs.dedup();
        assert_eq!(addrs.len(), 4);
        assert!(engine.peak_in_flight() > 1);
    }

    #[test]
    fn test_more_workers_than_requests() {
        let engine = Arc::new(MockEngine::new());
        let orchestrator = Orchestrator::new(engine.clone(), options(32, true));
        let summary = orchestrator.run(uniform_schedule(3), None).unwrap();
        assert_eq!(summary.completed, 3);
        assert_eq!(engine.submitted_count(), 3);
    }

    #[test]
    fn test_empty_schedule() {
        let engine = Arc::new(MockEngine::new());
        let orchestrator = Orchestrator::new(engine.clone(), options(4, true));
        let summary = orchestrator.run(Schedule::default(), None).unwrap();
        assert_eq!(summary.completed, 0);
        assert_eq!(summary.late_percent(), 0.0);
    }

    #[test]
    fn test_timing_respected() {
        let engine = Arc::new(MockEngine::new());
        let orchestrator = Orchestrator::new(engine, options(2, true));
        let schedule = Schedule::new(vec![
            request(0.0, 0, 1, OpKind::Read),
            request(30.0, 8, 1, OpKind::Read),
            request(60.0, 16, 1, OpKind::Read),
        ]);

        let summary = orchestrator.run(schedule, None).unwrap();
        assert!(summary.elapsed >= Duration::from_millis(60));
        assert!(summary.respect_timing);
        // The 0ms request is always at least slightly late
        assert!(summary.late_count >= 1);
        assert!(summary.late_count <= 3);
    }

    #[test]
    fn test_throughput_mode_ignores_arrival_times() {
        let engine = Arc::new(MockEngine::new());
        let orchestrator = Orchestrator::new(engine, options(2, false));
        let schedule = Schedule::new(vec![
            request(0.0, 0, 1, OpKind::Read),
            request(5_000.0, 8, 1, OpKind::Read),
        ]);

        let summary = orchestrator.run(schedule, None).unwrap();
        assert!(summary.elapsed < Duration::from_secs(2));
        assert_eq!(summary.late_count, 0);
        assert!(!summary.respect_timing);
    }

    #[test]
    fn test_io_error_aborts_without_waiting_for_sleepers() {
        let engine = Arc::new(MockEngine::new());
        engine.fail_at_offset(8 * 512);
        let orchestrator = Orchestrator::new(engine.clone(), options(4, true));
        let schedule = Schedule::new(vec![
            request(0.0, 0, 1, OpKind::Read),
            request(0.0, 8, 1, OpKind::Write),
            request(10_000.0, 16, 1, OpKind::Read),
            request(10_000.0, 24, 1, OpKind::Read),
        ]);

        let start = Instant::now();
        let err = orchestrator.run(schedule, None).unwrap_err();
        assert!(start.elapsed() < Duration::from_secs(5));
        match err.downcast_ref::<ReplayError>() {
            Some(ReplayError::Io { offset, kind, .. }) => {
                assert_eq!(*offset, 4096);
                assert_eq!(*kind, OpKind::Write);
            }
            other => panic!("expected IO error, got {:?}", other),
        }
    }

    #[test]
    fn test_buffer_allocation_failure_is_resource_error() {
        let engine = Arc::new(MockEngine::new());
        let mut opts = options(2, false);
        opts.alignment = 3;
        let orchestrator = Orchestrator::new(engine.clone(), opts);

        let err = orchestrator.run(uniform_schedule(4), None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ReplayError>(),
            Some(ReplayError::Resource(_))
        ));
        assert_eq!(engine.submitted_count(), 0);
    }

    #[test]
    fn test_sink_finalized_after_join() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("metrics.txt");
        let sink = MetricsSink::create(&path).unwrap();

        let engine = Arc::new(MockEngine::new());
        let orchestrator = Orchestrator::new(engine, options(8, false));
        orchestrator.run(uniform_schedule(200), Some(sink)).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 200);
    }

    #[test]
    fn test_independent_runs_in_one_process() {
        let engine = Arc::new(MockEngine::new());
        let first = Orchestrator::new(engine.clone(), options(4, false));
        let second = Orchestrator::new(engine.clone(), options(4, false));

        let a = std::thread::spawn(move || first.run(uniform_schedule(100), None).unwrap());
        let b = std::thread::spawn(move || second.run(uniform_schedule(50), None).unwrap());
        assert_eq!(a.join().unwrap().completed, 100);
        assert_eq!(b.join().unwrap().completed, 50);
        assert_eq!(engine.submitted_count(), 150);
    }
}
