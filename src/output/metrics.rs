//! Per-request latency metrics file
//!
//! One CSV row per completed request, no header:
//!
//! ```text
//! <arrival_timestamp_ms:3dp>,<block_offset_in_blocks>,<size_in_blocks>,<op_flag>,<latency_ms:3dp>
//! ```
//!
//! Rows are appended by many workers concurrently. A mutex around the writer keeps
//! each row contiguous; the order of rows across workers follows completion, not
//! the trace. The sink is consumed by [`MetricsSink::finalize`], which the
//! orchestrator can only call once every worker has released its reference.

use crate::trace::{OpKind, Request};
use crate::Result;
use anyhow::Context;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Latency of a single completed request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencyRecord {
    pub arrival_offset_ms: f64,
    pub block_offset_blocks: u64,
    pub size_blocks: u64,
    pub kind: OpKind,
    /// Op flag as recorded in the trace
    pub op_flag: i32,
    pub latency_ms: f64,
}

impl LatencyRecord {
    /// Build the record for `request` completed in `latency_ms`
    pub fn new(request: &Request, block_size: u64, latency_ms: f64) -> Self {
        Self {
            arrival_offset_ms: request.arrival_offset_ms,
            block_offset_blocks: request.offset_blocks(block_size),
            size_blocks: request.size_blocks(block_size),
            kind: request.kind,
            op_flag: request.op_flag,
            latency_ms,
        }
    }

    /// Render the CSV row (without trailing newline)
    pub fn to_row(&self) -> String {
        format!(
            "{:.3},{},{},{},{:.3}",
            self.arrival_offset_ms,
            self.block_offset_blocks,
            self.size_blocks,
            self.op_flag,
            self.latency_ms
        )
    }
}

struct SinkInner {
    writer: Box<dyn Write + Send>,
    rows: u64,
}

/// Thread-safe, append-only metrics writer
pub struct MetricsSink {
    inner: Mutex<SinkInner>,
    path: Option<PathBuf>,
}

impl MetricsSink {
    /// Create (truncating) the metrics file at `path`
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create metrics file: {}", path.display()))?;

        Ok(Self {
            inner: Mutex::new(SinkInner {
                writer: Box::new(BufWriter::new(file)),
                rows: 0,
            }),
            path: Some(path.to_path_buf()),
        })
    }

    /// Wrap an arbitrary writer
    pub fn from_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            inner: Mutex::new(SinkInner {
                writer: Box::new(writer),
                rows: 0,
            }),
            path: None,
        }
    }

    /// Append one row
    pub fn record(&self, record: &LatencyRecord) -> Result<()> {
        let row = record.to_row();
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| anyhow::anyhow!("metrics sink lock poisoned"))?;
        writeln!(inner.writer, "{}", row).with_context(|| self.describe("write to"))?;
        inner.rows += 1;
        Ok(())
    }

    /// Rows written so far
    pub fn rows(&self) -> u64 {
        self.inner.lock().map(|inner| inner.rows).unwrap_or(0)
    }

    /// Flush and close the sink, returning the number of rows written
    pub fn finalize(self) -> Result<u64> {
        let description = self.describe("flush");
        let mut inner = self
            .inner
            .into_inner()
            .map_err(|_| anyhow::anyhow!("metrics sink lock poisoned"))?;
        inner.writer.flush().context(description)?;
        Ok(inner.rows)
    }

    fn describe(&self, action: &str) -> String {
        match &self.path {
            Some(path) => format!("Failed to {} metrics file: {}", action, path.display()),
            None => format!("Failed to {} metrics writer", action),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn record(ms: f64, offset: u64, size: u64, flag: i32, latency: f64) -> LatencyRecord {
        LatencyRecord {
            arrival_offset_ms: ms,
            block_offset_blocks: offset,
            size_blocks: size,
            kind: OpKind::from_flag(flag),
            op_flag: flag,
            latency_ms: latency,
        }
    }

    #[test]
    fn test_row_layout() {
        assert_eq!(record(10.0, 200, 4, 1, 0.12345).to_row(), "10.000,200,4,1,0.123");
        assert_eq!(record(0.0, 100, 8, 0, 3.0).to_row(), "0.000,100,8,0,3.000");
    }

    #[test]
    fn test_record_from_request() {
        let request = Request {
            arrival_offset_ms: 50.0,
            block_offset: 153600,
            byte_size: 1024,
            kind: OpKind::Write,
            op_flag: 0,
        };
        let rec = LatencyRecord::new(&request, 512, 1.5);
        assert_eq!(rec.block_offset_blocks, 300);
        assert_eq!(rec.size_blocks, 2);
        assert_eq!(rec.to_row(), "50.000,300,2,0,1.500");
    }

    #[test]
    fn test_sink_writes_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("metrics.txt");

        let sink = MetricsSink::create(&path).unwrap();
        sink.record(&record(0.0, 100, 8, 0, 1.0)).unwrap();
        sink.record(&record(10.0, 200, 4, 1, 2.0)).unwrap();
        assert_eq!(sink.rows(), 2);
        assert_eq!(sink.finalize().unwrap(), 2);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "0.000,100,8,0,1.000\n10.000,200,4,1,2.000\n");
    }

    #[test]
    fn test_concurrent_records_never_interleave() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("metrics.txt");
        let sink = Arc::new(MetricsSink::create(&path).unwrap());

        let handles: Vec<_> = (0..8u64)
            .map(|t| {
                let sink = Arc::clone(&sink);
                std::thread::spawn(move || {
                    for i in 0..500u64 {
                        sink.record(&record(i as f64, t * 1000 + i, t + 1, 1, 0.5))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let sink = Arc::try_unwrap(sink).ok().unwrap();
        assert_eq!(sink.finalize().unwrap(), 4000);

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 4000);
        for line in lines {
            let fields: Vec<&str> = line.split(',').collect();
            assert_eq!(fields.len(), 5, "malformed row: {}", line);
            let offset: u64 = fields[1].parse().unwrap();
            let size: u64 = fields[2].parse().unwrap();
            assert_eq!(offset / 1000 + 1, size);
        }
    }

    #[test]
    fn test_create_in_missing_dir_fails() {
        let err = MetricsSink::create(Path::new("/nonexistent/dir/metrics.txt"))
            .err()
            .unwrap();
        assert!(err.to_string().contains("Failed to create metrics file"));
    }
}
