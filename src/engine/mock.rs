//! Mock IO engine for testing
//!
//! Simulates a device without issuing syscalls. Every transfer takes a fixed,
//! configurable duration, can be made to fail, and is recorded for later
//! verification.
//!
//! # Example
//!
//! ```
//! use blkreplay::engine::{IOEngine, IOOperation, OperationType};
//! use blkreplay::engine::mock::MockEngine;
//! use std::time::Duration;
//!
//! let engine = MockEngine::with_latency(Duration::from_millis(1));
//! let mut buffer = vec![0u8; 4096];
//! let n = engine.submit(IOOperation {
//!     op_type: OperationType::Read,
//!     offset: 0,
//!     buffer: &mut buffer,
//! }).unwrap();
//!
//! assert_eq!(n, 4096);
//! assert_eq!(engine.submitted_count(), 1);
//! ```

use super::{IOEngine, IOOperation, OperationType};
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Mock IO engine for testing
#[derive(Debug, Default)]
pub struct MockEngine {
    /// Simulated transfer duration
    latency: Duration,

    /// Fail every transfer once set
    should_fail: AtomicBool,

    /// Fail the transfer touching this byte offset
    fail_at_offset: Mutex<Option<u64>>,

    /// Transfers currently inside `submit`
    in_flight: AtomicUsize,

    /// Highest simultaneous `in_flight` observed
    peak_in_flight: AtomicUsize,

    submitted_ops: Mutex<Vec<OperationRecord>>,
}

/// Record of a submitted operation for testing verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRecord {
    pub op_type: OperationType,
    pub offset: u64,
    pub length: usize,
    /// Address of the buffer used for the transfer
    pub buffer_addr: usize,
}

impl MockEngine {
    /// Create a mock engine whose transfers complete immediately
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock engine whose transfers each take `latency`
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    /// Configure the engine to fail all operations
    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    /// Fail any transfer issued at exactly `offset`
    pub fn fail_at_offset(&self, offset: u64) {
        *self.fail_at_offset.lock().unwrap() = Some(offset);
    }

    /// Copy of all submitted operations, in submission order
    pub fn submitted_operations(&self) -> Vec<OperationRecord> {
        self.submitted_ops.lock().unwrap().clone()
    }

    pub fn submitted_count(&self) -> usize {
        self.submitted_ops.lock().unwrap().len()
    }

    /// Highest number of transfers observed in flight at once
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

impl IOEngine for MockEngine {
    fn submit(&self, op: IOOperation<'_>) -> io::Result<usize> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        self.submitted_ops.lock().unwrap().push(OperationRecord {
            op_type: op.op_type,
            offset: op.offset,
            length: op.buffer.len(),
            buffer_addr: op.buffer.as_ptr() as usize,
        });

        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let fail_here = *self.fail_at_offset.lock().unwrap() == Some(op.offset);
        if self.should_fail.load(Ordering::SeqCst) || fail_here {
            return Err(io::Error::from_raw_os_error(libc::EIO));
        }

        Ok(op.buffer.len())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
