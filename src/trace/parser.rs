//! Trace text parser
//!
//! Turns raw trace text into a [`Schedule`]. Every non-empty line is parsed into a
//! typed [`Request`]; the first malformed line aborts parsing with a
//! [`ReplayError::Parse`] naming the 1-based line number and the raw line.
//!
//! Record count is taken from `str::lines`, which yields the final line whether or
//! not it ends in a newline, and the parsed count is checked against it before the
//! schedule is returned.

use super::{OpKind, Request, Schedule, TraceGeometry};
use crate::error::{ParseFailure, ReplayError};
use crate::Result;
use anyhow::Context;
use std::path::Path;
use std::str::FromStr;

const FIELD_COUNT: usize = 5;

/// Read and parse a trace file
pub fn parse_trace_file(path: &Path, geometry: TraceGeometry) -> Result<Schedule> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read trace file: {}", path.display()))?;

    parse_trace(&contents, geometry)
        .with_context(|| format!("Failed to parse trace file: {}", path.display()))
}

/// Parse trace text into a schedule
///
/// Blank (whitespace-only) lines are skipped but still advance the line number
/// reported in errors.
pub fn parse_trace(contents: &str, geometry: TraceGeometry) -> Result<Schedule> {
    let expected = contents.lines().filter(|l| !l.trim().is_empty()).count();
    let mut requests = Vec::with_capacity(expected);

    for (index, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let request = parse_line(line, geometry).map_err(|failure| ReplayError::Parse {
            line: index + 1,
            content: line.to_string(),
            failure,
        })?;
        requests.push(request);
    }

    if requests.len() != expected {
        return Err(ReplayError::Parse {
            line: contents.lines().count(),
            content: String::new(),
            failure: ParseFailure::CountMismatch {
                parsed: requests.len(),
                expected,
            },
        }
        .into());
    }

    Ok(Schedule::new(requests))
}

/// Parse a single non-empty trace line
pub fn parse_line(line: &str, geometry: TraceGeometry) -> std::result::Result<Request, ParseFailure> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != FIELD_COUNT {
        return Err(ParseFailure::FieldCount { found: fields.len() });
    }

    let arrival_secs: f64 = parse_field(fields[0], "arrival_time")?;
    if !arrival_secs.is_finite() || arrival_secs < 0.0 {
        return Err(ParseFailure::NonFiniteTime { value: arrival_secs });
    }

    // Device id is part of the format but not used for replay
    let _device_id: i64 = parse_field(fields[1], "device_id")?;

    let block_number = parse_non_negative(fields[2], "block_number")?;
    let block_count = parse_non_negative(fields[3], "block_count")?;
    let op_flag: i32 = parse_field(fields[4], "op_flag")?;

    if block_count > geometry.max_transfer_blocks {
        return Err(ParseFailure::TransferTooLarge {
            blocks: block_count,
            max: geometry.max_transfer_blocks,
        });
    }

    let block_offset = block_number
        .checked_mul(geometry.block_size)
        .ok_or(ParseFailure::Overflow { field: "block_number" })?;
    let byte_size = block_count
        .checked_mul(geometry.block_size)
        .ok_or(ParseFailure::Overflow { field: "block_count" })?;
    block_offset
        .checked_add(byte_size)
        .ok_or(ParseFailure::Overflow { field: "block_number" })?;

    Ok(Request {
        arrival_offset_ms: arrival_secs * 1000.0,
        block_offset,
        byte_size,
        kind: OpKind::from_flag(op_flag),
        op_flag,
    })
}

fn parse_field<T: FromStr>(raw: &str, field: &'static str) -> std::result::Result<T, ParseFailure> {
    raw.parse::<T>().map_err(|_| ParseFailure::InvalidNumber {
        field,
        value: raw.to_string(),
    })
}

fn parse_non_negative(raw: &str, field: &'static str) -> std::result::Result<u64, ParseFailure> {
    let value: i64 = parse_field(raw, field)?;
    if value < 0 {
        return Err(ParseFailure::Negative { field, value });
    }
    Ok(value as u64)
}
