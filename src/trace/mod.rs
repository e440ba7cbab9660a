//! Trace model
//!
//! A trace is a recorded sequence of block IO requests. This module defines the
//! typed [`Request`] produced by the [`parser`] and the immutable [`Schedule`]
//! the replay workers draw from.
//!
//! # Trace format
//!
//! One request per line, five whitespace-separated fields:
//!
//! ```text
//! <arrival_time_seconds> <device_id> <block_number> <block_count> <op_flag>
//! ```
//!
//! `op_flag == 0` is a write, any other value is a read. `device_id` is parsed
//! and discarded.

pub mod parser;
pub mod schedule;

pub use parser::{parse_trace, parse_trace_file};
pub use schedule::Schedule;

use std::fmt;

/// Kind of a replayed transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Read,
    Write,
}

impl OpKind {
    /// Map a recorded op flag to a transfer kind (0 = write, anything else = read)
    #[inline]
    pub fn from_flag(flag: i32) -> Self {
        if flag == 0 {
            OpKind::Write
        } else {
            OpKind::Read
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpKind::Read => write!(f, "read"),
            OpKind::Write => write!(f, "write"),
        }
    }
}

/// A single parsed trace request
///
/// Offsets and sizes are in bytes, already scaled by the block size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Request {
    /// Arrival time relative to the start of the trace, in milliseconds
    pub arrival_offset_ms: f64,
    /// Device-relative byte offset
    pub block_offset: u64,
    /// Transfer length in bytes
    pub byte_size: u64,
    pub kind: OpKind,
    /// Op flag exactly as it appeared in the trace
    pub op_flag: i32,
}

impl Request {
    /// Offset expressed in device blocks
    #[inline]
    pub fn offset_blocks(&self, block_size: u64) -> u64 {
        self.block_offset / block_size
    }

    /// Size expressed in device blocks
    #[inline]
    pub fn size_blocks(&self, block_size: u64) -> u64 {
        self.byte_size / block_size
    }

    /// One past the last byte this request touches
    #[inline]
    pub fn end_offset(&self) -> u64 {
        self.block_offset + self.byte_size
    }
}

/// Device geometry used to scale and bound trace requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceGeometry {
    /// Bytes per trace block
    pub block_size: u64,
    /// Largest permitted transfer, in blocks
    pub max_transfer_blocks: u64,
}

impl TraceGeometry {
    /// Largest permitted transfer in bytes
    #[inline]
    pub fn max_transfer_bytes(&self) -> u64 {
        self.block_size * self.max_transfer_blocks
    }
}

impl Default for TraceGeometry {
    fn default() -> Self {
        Self {
            block_size: 512,
            max_transfer_blocks: 65536,
        }
    }
}
