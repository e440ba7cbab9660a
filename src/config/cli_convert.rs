//! CLI to Config conversion utilities

use super::cli::Cli;
use super::ReplayConfig;
use anyhow::{Context, Result};

/// Parse a size string (e.g., "512", "4k", "1M") to bytes
pub fn parse_size(s: &str) -> Result<u64> {
    let s = s.trim().to_lowercase();

    let (num_str, multiplier) = if s.ends_with("k") || s.ends_with("kb") {
        (s.trim_end_matches("kb").trim_end_matches("k"), 1024u64)
    } else if s.ends_with("m") || s.ends_with("mb") {
        (s.trim_end_matches("mb").trim_end_matches("m"), 1024 * 1024)
    } else if s.ends_with("g") || s.ends_with("gb") {
        (s.trim_end_matches("gb").trim_end_matches("g"), 1024 * 1024 * 1024)
    } else {
        (s.as_str(), 1)
    };

    let num: u64 = num_str
        .parse()
        .with_context(|| format!("Invalid size format: {}", s))?;

    num.checked_mul(multiplier)
        .with_context(|| format!("Size out of range: {}", s))
}

/// Apply CLI arguments on top of `config` (CLI takes precedence)
pub fn apply_cli(cli: &Cli, mut config: ReplayConfig) -> Result<ReplayConfig> {
    if let Some(ref device) = cli.device {
        config.device_path = device.clone();
    }
    if let Some(ref trace) = cli.trace {
        config.trace_path = trace.clone();
    }
    if let Some(ref metrics) = cli.metrics {
        config.metrics_path = metrics.clone();
    }
    if let Some(ref block_size) = cli.block_size {
        config.block_size_bytes = parse_size(block_size).context("Invalid block size")?;
    }
    if let Some(blocks) = cli.max_transfer_blocks {
        config.max_transfer_size_blocks = blocks;
    }
    if let Some(ref alignment) = cli.alignment {
        config.alignment_bytes = parse_size(alignment).context("Invalid alignment")? as usize;
    }
    if let Some(workers) = cli.workers {
        config.worker_count = workers;
    }
    if let Some(max) = cli.max_requests {
        config.max_requests = max;
    }
    if let Some(ref summary) = cli.summary_json {
        config.summary_json = Some(summary.clone());
    }

    if cli.no_latency {
        config.record_latency = false;
    }
    if cli.no_timing {
        config.respect_timing = false;
    }
    if cli.no_direct {
        config.direct = false;
    }
    if cli.no_sync {
        config.sync = false;
    }
    if cli.no_prefill {
        config.prefill_random = false;
    }
    if cli.progress {
        config.progress = true;
    }

    Ok(config)
}
