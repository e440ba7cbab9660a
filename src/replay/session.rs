//! Run a replay from a validated configuration
//!
//! The trace is parsed, checked and bounded before the device is touched, so a
//! malformed or oversized trace never causes any IO.

use super::{Orchestrator, ReplayOptions};
use crate::config::ReplayConfig;
use crate::engine::sync::SyncEngine;
use crate::engine::IOEngine;
use crate::output::json::write_summary;
use crate::output::metrics::MetricsSink;
use crate::stats::RunSummary;
use crate::target::open_device;
use crate::trace::{parse_trace_file, Schedule};
use crate::Result;
use std::sync::Arc;

/// Parse the trace and apply every pre-flight check
///
/// Alignment is only enforced when the device is opened with O_DIRECT.
pub fn prepare_schedule(config: &ReplayConfig) -> Result<Schedule> {
    let schedule = parse_trace_file(&config.trace_path, config.geometry())?;
    if config.direct {
        schedule.validate(config.alignment_bytes)?;
    }
    schedule.check_capacity(config.max_requests, config.record_latency)?;

    log::info!(
        "Loaded {} requests ({} reads, {} writes) from {}",
        schedule.len(),
        schedule.read_count(),
        schedule.write_count(),
        config.trace_path.display()
    );
    Ok(schedule)
}

/// Open the configured device and replay `schedule` against it
pub fn run_from_config(config: &ReplayConfig, schedule: Schedule) -> Result<RunSummary> {
    let device = open_device(&config.device_path, config.open_flags())?;

    let span = schedule.device_span();
    if span > device.size() {
        log::warn!(
            "Trace touches {} bytes but {} is only {} bytes",
            span,
            device.path().display(),
            device.size()
        );
    }

    let engine: Arc<dyn IOEngine> = Arc::new(SyncEngine::new(device));
    run_with_engine(config, schedule, engine)
}

/// Replay `schedule` on an already constructed engine
///
/// Creates the metrics file when latency recording is on and writes the JSON
/// summary if one was requested.
pub fn run_with_engine(
    config: &ReplayConfig,
    schedule: Schedule,
    engine: Arc<dyn IOEngine>,
) -> Result<RunSummary> {
    let sink = if config.record_latency {
        Some(MetricsSink::create(&config.metrics_path)?)
    } else {
        None
    };

    let orchestrator = Orchestrator::new(engine, ReplayOptions::from_config(config));
    let summary = orchestrator.run(schedule, sink)?;

    if let Some(ref path) = config.summary_json {
        write_summary(path, config, &summary)?;
        log::info!("Wrote JSON summary to {}", path.display());
    }

    Ok(summary)
}
