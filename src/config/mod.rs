//! Configuration module
//!
//! A single [`ReplayConfig`] value is built at startup (TOML file, then CLI
//! overrides), validated once, and passed by reference into the replay. Nothing
//! is read from global state afterwards.

pub mod cli;
pub mod cli_convert;
pub mod toml;
pub mod validator;

use crate::target::OpenFlags;
use crate::trace::TraceGeometry;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete replay configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReplayConfig {
    /// Trace file to replay
    pub trace_path: PathBuf,
    /// Device (or file) the trace is replayed against
    pub device_path: PathBuf,
    /// Per-request latency output
    pub metrics_path: PathBuf,
    /// Bytes per trace block
    pub block_size_bytes: u64,
    /// Largest permitted request, in blocks
    pub max_transfer_size_blocks: u64,
    /// Direct IO alignment boundary for offsets, lengths and buffers
    pub alignment_bytes: usize,
    /// Number of replay worker threads
    pub worker_count: usize,
    /// Refuse traces larger than this while recording latency
    pub max_requests: usize,
    /// Write one metrics row per request
    pub record_latency: bool,
    /// Wait for each request's recorded arrival time before dispatching it
    pub respect_timing: bool,
    /// Open the device with O_DIRECT
    pub direct: bool,
    /// Open the device with O_SYNC
    pub sync: bool,
    /// Print a progress line while replaying
    pub progress: bool,
    /// Optional JSON run summary
    pub summary_json: Option<PathBuf>,
    /// Fill write buffers with random bytes before the run
    pub prefill_random: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            trace_path: PathBuf::new(),
            device_path: PathBuf::new(),
            metrics_path: PathBuf::from("replay_metrics.txt"),
            block_size_bytes: 512,
            max_transfer_size_blocks: 65536,
            alignment_bytes: 512,
            worker_count: 200,
            max_requests: 1_000_000,
            record_latency: true,
            respect_timing: true,
            direct: true,
            sync: true,
            progress: false,
            summary_json: None,
            prefill_random: true,
        }
    }
}

impl ReplayConfig {
    /// Geometry used to parse and bound trace requests
    pub fn geometry(&self) -> TraceGeometry {
        TraceGeometry {
            block_size: self.block_size_bytes,
            max_transfer_blocks: self.max_transfer_size_blocks,
        }
    }

    /// Flags the device is opened with
    pub fn open_flags(&self) -> OpenFlags {
        OpenFlags {
            direct: self.direct,
            sync: self.sync,
        }
    }

    /// Size of each worker's transfer buffer
    pub fn max_transfer_bytes(&self) -> u64 {
        self.block_size_bytes * self.max_transfer_size_blocks
    }
}
