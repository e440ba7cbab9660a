//! IO engine abstraction
//!
//! An IO engine issues one positioned transfer against the replay target and
//! blocks until it completes. A single engine instance is shared by every worker
//! thread, so concurrent transfers against the device are the normal case; each
//! caller supplies its own buffer.
//!
//! # Engine Types
//!
//! - **Synchronous** ([`sync::SyncEngine`]): blocking `pread`/`pwrite` on the
//!   device descriptor
//! - **Mock** ([`mock::MockEngine`]): simulated device with a fixed transfer
//!   duration, used by tests

use std::io;

/// IO engine trait for all backends
///
/// Engines must be `Send + Sync`: one instance is shared by reference across the
/// whole worker pool.
pub trait IOEngine: Send + Sync {
    /// Perform a single positioned transfer
    ///
    /// Reads fill `op.buffer` from the device at `op.offset`; writes send
    /// `op.buffer` to the device at `op.offset`. The whole buffer is transferred.
    ///
    /// # Returns
    ///
    /// The number of bytes transferred.
    fn submit(&self, op: IOOperation<'_>) -> io::Result<usize>;

    /// Short engine name for logs and summaries
    fn name(&self) -> &'static str;
}

/// IO operation descriptor
///
/// For O_DIRECT targets `buffer` must be aligned to the device boundary and its
/// length must be a multiple of it.
#[derive(Debug)]
pub struct IOOperation<'a> {
    pub op_type: OperationType,
    /// Byte offset within the device
    pub offset: u64,
    /// Transfer buffer; its length is the transfer length
    pub buffer: &'a mut [u8],
}

/// Operation type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationType {
    Read,
    Write,
}

impl From<crate::trace::OpKind> for OperationType {
    fn from(kind: crate::trace::OpKind) -> Self {
        match kind {
            crate::trace::OpKind::Read => OperationType::Read,
            crate::trace::OpKind::Write => OperationType::Write,
        }
    }
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationType::Read => write!(f, "read"),
            OperationType::Write => write!(f, "write"),
        }
    }
}

pub mod mock;
pub mod sync;
