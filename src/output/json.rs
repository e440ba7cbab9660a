//! JSON run summary
//!
//! Written once after a successful run when `summary_json` is configured. The
//! per-request metrics file stays the primary output; this is a machine-readable
//! companion for comparing runs across hosts.

use crate::config::ReplayConfig;
use crate::stats::{RunSummary, SummaryRecord};
use crate::Result;
use anyhow::Context;
use serde::Serialize;
use std::path::Path;

/// Top-level JSON document
#[derive(Debug, Serialize)]
pub struct JsonSummary {
    pub tool: &'static str,
    pub version: &'static str,
    /// RFC 3339 completion timestamp
    pub timestamp: String,
    pub hostname: String,
    pub trace_path: String,
    pub device_path: String,
    pub block_size_bytes: u64,
    pub worker_count: usize,
    pub results: SummaryRecord,
}

impl JsonSummary {
    pub fn new(config: &ReplayConfig, summary: &RunSummary) -> Self {
        let hostname = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "unknown".to_string());

        Self {
            tool: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            timestamp: chrono::Local::now().to_rfc3339(),
            hostname,
            trace_path: config.trace_path.display().to_string(),
            device_path: config.device_path.display().to_string(),
            block_size_bytes: config.block_size_bytes,
            worker_count: config.worker_count,
            results: summary.to_record(),
        }
    }
}

/// Write the JSON summary to `path`
pub fn write_summary(path: &Path, config: &ReplayConfig, summary: &RunSummary) -> Result<()> {
    let doc = JsonSummary::new(config, summary);
    let json = serde_json::to_string_pretty(&doc).context("Failed to serialize run summary")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write summary file: {}", path.display()))?;
    Ok(())
}
