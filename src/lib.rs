//! blkreplay - block IO trace replayer
//!
//! Replays a captured block-device IO trace against a live device, preserving
//! each request's recorded arrival time, offset, size and direction, and records
//! the completion latency of every request.
//!
//! # Architecture
//!
//! - **Trace**: the trace file is parsed once into an immutable [`trace::Schedule`]
//! - **Replay**: a fixed pool of OS threads claims requests through an atomic
//!   cursor, waits for each request's arrival time and issues it
//! - **Engines**: positioned direct IO through [`engine::IOEngine`]
//! - **Output**: per-request latency rows, plus a text or JSON run summary

pub mod config;
pub mod engine;
pub mod error;
pub mod output;
pub mod replay;
pub mod stats;
pub mod target;
pub mod trace;
pub mod util;

// Re-export commonly used types
pub use config::ReplayConfig;
pub use engine::IOEngine;
pub use error::ReplayError;

/// Result type used throughout blkreplay
pub type Result<T> = anyhow::Result<T>;
