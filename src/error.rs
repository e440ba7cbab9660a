//! Error taxonomy for replay runs
//!
//! Every fatal condition a replay can hit is one of the variants below. They are
//! raised as `anyhow::Error` (see [`crate::Result`]) so that call sites can attach
//! context, and can be recovered with `err.downcast_ref::<ReplayError>()` when a
//! caller needs to tell them apart.

use crate::trace::OpKind;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal replay errors
#[derive(Debug, Error)]
pub enum ReplayError {
    /// Invalid configuration or unusable path, raised before any IO
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed trace line
    #[error("trace parse error at line {line}: {failure} (line: {content:?})")]
    Parse {
        line: usize,
        content: String,
        #[source]
        failure: ParseFailure,
    },

    /// Request not aligned to the direct IO boundary
    #[error(
        "request {index} is misaligned: offset={offset} size={size} (alignment {alignment} bytes)"
    )]
    Misaligned {
        index: usize,
        offset: u64,
        size: u64,
        alignment: usize,
    },

    /// Allocation or alignment setup failure
    #[error("resource error: {0}")]
    Resource(String),

    /// Trace exceeds the request cap while latency recording is on
    #[error("trace has {count} requests, more than the configured maximum of {max}")]
    TraceTooLarge { count: usize, max: usize },

    /// Device transfer failure
    #[error("cannot {kind} size {size_blocks} blocks at offset {offset_blocks} blocks ({size} bytes at byte offset {offset}): {source}")]
    Io {
        kind: OpKind,
        offset: u64,
        size: u64,
        offset_blocks: u64,
        size_blocks: u64,
        #[source]
        source: std::io::Error,
    },

    /// Device could not be opened
    #[error("cannot open device {}: {source}", path.display())]
    DeviceOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Reason a single trace line was rejected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseFailure {
    #[error("expected 5 fields, found {found}")]
    FieldCount { found: usize },

    #[error("field `{field}` is not a valid number: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("field `{field}` must not be negative: {value}")]
    Negative { field: &'static str, value: i64 },

    #[error("arrival time must be a finite, non-negative number of seconds: {value}")]
    NonFiniteTime { value: f64 },

    #[error("field `{field}` overflows when converted to bytes")]
    Overflow { field: &'static str },

    #[error("request of {blocks} blocks exceeds the maximum transfer size of {max} blocks")]
    TransferTooLarge { blocks: u64, max: u64 },

    #[error("parsed {parsed} requests but found {expected} non-empty lines")]
    CountMismatch { parsed: usize, expected: usize },
}

impl ReplayError {
    /// Short category name used in log lines
    pub fn category(&self) -> &'static str {
        match self {
            ReplayError::Config(_) | ReplayError::DeviceOpen { .. } => "config",
            ReplayError::Parse { .. } | ReplayError::Misaligned { .. } => "parse",
            ReplayError::Resource(_) => "resource",
            ReplayError::TraceTooLarge { .. } => "trace-too-large",
            ReplayError::Io { .. } => "io",
        }
    }
}
