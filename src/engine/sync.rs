//! Synchronous IO engine
//!
//! Blocking `pread`/`pwrite` against a shared device descriptor. Positioned
//! transfers never touch the file offset, so any number of worker threads can
//! issue them on the same descriptor at once.
//!
//! Partial transfers are retried until the full length has moved. A read that
//! hits end-of-device early returns the short count.

use super::{IOEngine, IOOperation, OperationType};
use crate::target::DeviceHandle;
use std::io;
use std::os::unix::io::RawFd;

/// Synchronous IO engine using pread/pwrite
pub struct SyncEngine {
    device: DeviceHandle,
}

impl SyncEngine {
    /// Create an engine issuing transfers against `device`
    pub fn new(device: DeviceHandle) -> Self {
        Self { device }
    }

    pub fn device(&self) -> &DeviceHandle {
        &self.device
    }

    #[inline(always)]
    fn do_read(fd: RawFd, buffer: &mut [u8], offset: u64) -> io::Result<usize> {
        let length = buffer.len();
        let mut total_read = 0;

        while total_read < length {
            let remaining = &mut buffer[total_read..];

            // SAFETY: remaining is a valid, exclusively borrowed region of remaining.len() bytes
            let result = unsafe {
                libc::pread(
                    fd,
                    remaining.as_mut_ptr() as *mut libc::c_void,
                    remaining.len(),
                    (offset + total_read as u64) as libc::off_t,
                )
            };

            if result < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(err);
            }

            if result == 0 {
                // End of device
                break;
            }

            total_read += result as usize;
        }

        Ok(total_read)
    }

    #[inline(always)]
    fn do_write(fd: RawFd, buffer: &[u8], offset: u64) -> io::Result<usize> {
        let length = buffer.len();
        let mut total_written = 0;

        while total_written < length {
            let remaining = &buffer[total_written..];

            // SAFETY: remaining is a valid region of remaining.len() bytes
            let result = unsafe {
                libc::pwrite(
                    fd,
                    remaining.as_ptr() as *const libc::c_void,
                    remaining.len(),
                    (offset + total_written as u64) as libc::off_t,
                )
            };

            if result < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(err);
            }

            if result == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    format!("pwrite wrote 0 bytes at offset {}", offset + total_written as u64),
                ));
            }

            total_written += result as usize;
        }

        Ok(total_written)
    }
}

impl IOEngine for SyncEngine {
    fn submit(&self, op: IOOperation<'_>) -> io::Result<usize> {
        let fd = self.device.fd();
        match op.op_type {
            OperationType::Read => Self::do_read(fd, op.buffer, op.offset),
            OperationType::Write => Self::do_write(fd, op.buffer, op.offset),
        }
    }

    fn name(&self) -> &'static str {
        "sync"
    }
}
