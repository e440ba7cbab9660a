//! CLI argument parsing using clap

use clap::Parser;
use std::path::PathBuf;

/// blkreplay - replay a block IO trace against a device and record latencies
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "blkreplay")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Device (or file) to replay against
    #[arg(value_name = "DEVICE")]
    pub device: Option<PathBuf>,

    /// Trace file to replay
    #[arg(short = 'T', long, env = "BLKREPLAY_TRACE")]
    pub trace: Option<PathBuf>,

    /// TOML configuration file (CLI flags override its values)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Per-request latency output file
    #[arg(short = 'o', long)]
    pub metrics: Option<PathBuf>,

    /// Bytes per trace block (e.g., 512, 4k)
    #[arg(short = 'b', long)]
    pub block_size: Option<String>,

    /// Largest permitted request, in blocks
    #[arg(long)]
    pub max_transfer_blocks: Option<u64>,

    /// Direct IO alignment boundary (e.g., 512, 4k)
    #[arg(short = 'a', long)]
    pub alignment: Option<String>,

    /// Number of worker threads
    #[arg(short = 't', long)]
    pub workers: Option<usize>,

    /// Refuse traces with more requests than this while recording latency
    #[arg(long)]
    pub max_requests: Option<usize>,

    /// Do not write the per-request metrics file
    #[arg(long)]
    pub no_latency: bool,

    /// Ignore recorded arrival times and issue requests as fast as possible
    #[arg(long)]
    pub no_timing: bool,

    /// Open the device without O_DIRECT
    #[arg(long)]
    pub no_direct: bool,

    /// Open the device without O_SYNC
    #[arg(long)]
    pub no_sync: bool,

    /// Leave write buffers zero-filled instead of random
    #[arg(long)]
    pub no_prefill: bool,

    /// Show replay progress
    #[arg(short = 'p', long)]
    pub progress: bool,

    /// Write a JSON run summary to this path
    #[arg(long)]
    pub summary_json: Option<PathBuf>,

    /// Validate configuration and trace, then exit without touching the device
    #[arg(long)]
    pub dry_run: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
