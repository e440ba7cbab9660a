//! Request execution
//!
//! An [`IoExecutor`] belongs to exactly one worker and owns that worker's aligned
//! transfer buffer, so no two in-flight transfers ever share memory. Only the
//! engine call is timed; pacing waits happen before [`IoExecutor::execute`].

use crate::engine::{IOEngine, IOOperation};
use crate::error::ReplayError;
use crate::trace::Request;
use crate::util::buffer::AlignedBuffer;
use crate::Result;
use std::io;
use std::time::{Duration, Instant};

/// Issues requests against the shared engine using a private buffer
pub struct IoExecutor<'a> {
    engine: &'a dyn IOEngine,
    buffer: AlignedBuffer,
    block_size: u64,
}

impl<'a> IoExecutor<'a> {
    /// `block_size` is only used to express failures in trace units
    pub fn new(engine: &'a dyn IOEngine, buffer: AlignedBuffer, block_size: u64) -> Self {
        Self {
            engine,
            buffer,
            block_size,
        }
    }

    pub fn buffer(&self) -> &AlignedBuffer {
        &self.buffer
    }

    /// Perform one transfer and return how long the engine call took
    ///
    /// A short transfer is treated the same as a failed one.
    pub fn execute(&mut self, request: &Request) -> Result<Duration> {
        let capacity = self.buffer.size();
        let buffer = usize::try_from(request.byte_size)
            .ok()
            .and_then(|len| self.buffer.prefix_mut(len))
            .ok_or_else(|| {
                ReplayError::Resource(format!(
                    "request of {} bytes does not fit the {} byte worker buffer",
                    request.byte_size, capacity
                ))
            })?;

        let op = IOOperation {
            op_type: request.kind.into(),
            offset: request.block_offset,
            buffer,
        };

        let start = Instant::now();
        let result = self.engine.submit(op);
        let latency = start.elapsed();

        match result {
            Ok(n) if n as u64 == request.byte_size => Ok(latency),
            Ok(n) => Err(self.io_error(
                request,
                io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("short transfer: {} of {} bytes", n, request.byte_size),
                ),
            )),
            Err(e) => Err(self.io_error(request, e)),
        }
    }

    fn io_error(&self, request: &Request, source: io::Error) -> anyhow::Error {
        ReplayError::Io {
            kind: request.kind,
            offset: request.block_offset,
            size: request.byte_size,
            offset_blocks: request.offset_blocks(self.block_size),
            size_blocks: request.size_blocks(self.block_size),
            source,
        }
        .into()
    }
}
