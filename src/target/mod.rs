//! Replay target device
//!
//! The target is opened once, before the worker pool starts, and its descriptor is
//! shared by every worker through the IO engine. Block devices are sized with
//! `ioctl(BLKGETSIZE64)`; regular files (useful for dry runs and tests) use their
//! file length.

pub mod block;

pub use block::open_device;

use std::fs::File;
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::{Path, PathBuf};

/// Flags controlling how the target is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenFlags {
    /// Bypass the page cache (O_DIRECT)
    pub direct: bool,
    /// Synchronous writes (O_SYNC)
    pub sync: bool,
}

impl Default for OpenFlags {
    fn default() -> Self {
        Self {
            direct: true,
            sync: true,
        }
    }
}

/// Open replay target
///
/// Closing happens when the handle is dropped.
#[derive(Debug)]
pub struct DeviceHandle {
    file: File,
    path: PathBuf,
    size: u64,
    block_device: bool,
    flags: OpenFlags,
}

impl DeviceHandle {
    #[inline]
    pub fn fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Device size in bytes
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn is_block_device(&self) -> bool {
        self.block_device
    }

    pub fn flags(&self) -> OpenFlags {
        self.flags
    }
}
