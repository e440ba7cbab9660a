//! Device open and size detection
//!
//! Opens the replay target read/write with O_DIRECT and O_SYNC (both
//! configurable). Block devices cannot be created, so a missing path is an
//! error rather than a new file.

use super::{DeviceHandle, OpenFlags};
use crate::error::ReplayError;
use crate::Result;
use anyhow::Context;
use std::fs::OpenOptions;
use std::os::unix::fs::{FileTypeExt, OpenOptionsExt};
use std::os::unix::io::AsRawFd;
use std::path::Path;

// ioctl request code for getting block device size
const BLKGETSIZE64: libc::c_ulong = 0x80081272;

/// Open the replay target
///
/// # Errors
///
/// Returns [`ReplayError::DeviceOpen`] if the path cannot be opened with the
/// requested flags, or an ioctl error if a block device's size cannot be read.
pub fn open_device(path: &Path, flags: OpenFlags) -> Result<DeviceHandle> {
    let mut options = OpenOptions::new();
    options.read(true).write(true);

    let mut custom_flags = 0;
    if flags.direct {
        custom_flags |= libc::O_DIRECT;
    }
    if flags.sync {
        custom_flags |= libc::O_SYNC;
    }
    if custom_flags != 0 {
        options.custom_flags(custom_flags);
    }

    let file = options.open(path).map_err(|source| ReplayError::DeviceOpen {
        path: path.to_path_buf(),
        source,
    })?;

    let metadata = file
        .metadata()
        .with_context(|| format!("Failed to stat device: {}", path.display()))?;
    let block_device = metadata.file_type().is_block_device();

    let size = if block_device {
        detect_block_size(&file, path)?
    } else {
        metadata.len()
    };

    log::debug!(
        "opened {} ({}, {} bytes, direct={}, sync={})",
        path.display(),
        if block_device { "block device" } else { "file" },
        size,
        flags.direct,
        flags.sync
    );

    Ok(DeviceHandle {
        file,
        path: path.to_path_buf(),
        size,
        block_device,
        flags,
    })
}

fn detect_block_size(file: &std::fs::File, path: &Path) -> Result<u64> {
    let mut size: u64 = 0;
    // SAFETY: BLKGETSIZE64 writes a single u64 through the pointer
    let result = unsafe { libc::ioctl(file.as_raw_fd(), BLKGETSIZE64, &mut size) };

    if result < 0 {
        let err = std::io::Error::last_os_error();
        return Err(err).context(format!(
            "ioctl(BLKGETSIZE64) failed: path={}",
            path.display()
        ));
    }

    Ok(size)
}
