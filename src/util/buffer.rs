//! Aligned transfer buffers
//!
//! Direct IO requires the buffer address, transfer length and device offset to be
//! multiples of the device's alignment boundary. Each replay worker owns one
//! [`AlignedBuffer`] sized to the largest permitted transfer, so no two in-flight
//! transfers ever share memory.

use crate::error::ReplayError;
use crate::Result;
use std::alloc::{alloc_zeroed, dealloc, Layout};

/// Memory-aligned buffer suitable for O_DIRECT transfers
pub struct AlignedBuffer {
    ptr: *mut u8,
    size: usize,
    alignment: usize,
    layout: Layout,
}

impl AlignedBuffer {
    /// Allocate a zeroed buffer of `size` bytes aligned to `alignment`
    ///
    /// Fails with [`ReplayError::Resource`] if the alignment is not a power of two,
    /// the size is zero, or the allocator returns null.
    pub fn new(size: usize, alignment: usize) -> Result<Self> {
        if !alignment.is_power_of_two() {
            return Err(ReplayError::Resource(format!(
                "buffer alignment {} is not a power of 2",
                alignment
            ))
            .into());
        }
        if size == 0 {
            return Err(ReplayError::Resource("buffer size must be greater than 0".into()).into());
        }

        let layout = Layout::from_size_align(size, alignment).map_err(|e| {
            ReplayError::Resource(format!(
                "invalid buffer layout (size={}, alignment={}): {}",
                size, alignment, e
            ))
        })?;

        // SAFETY: layout has a non-zero size
        let ptr = unsafe { alloc_zeroed(layout) };
        if ptr.is_null() {
            return Err(ReplayError::Resource(format!(
                "failed to allocate {} byte buffer aligned to {}",
                size, alignment
            ))
            .into());
        }

        Ok(Self {
            ptr,
            size,
            alignment,
            layout,
        })
    }

    /// Get the buffer as a slice
    #[inline(always)]
    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: ptr is valid for `size` initialised bytes for the life of self
        unsafe { std::slice::from_raw_parts(self.ptr, self.size) }
    }

    /// Get the buffer as a mutable slice
    #[inline(always)]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: ptr is valid for `size` bytes and uniquely borrowed through &mut self
        unsafe { std::slice::from_raw_parts_mut(self.ptr, self.size) }
    }

    /// Mutable view of the first `len` bytes
    ///
    /// Returns `None` if `len` exceeds the buffer size.
    #[inline]
    pub fn prefix_mut(&mut self, len: usize) -> Option<&mut [u8]> {
        if len > self.size {
            return None;
        }
        Some(&mut self.as_mut_slice()[..len])
    }

    #[inline(always)]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline(always)]
    pub fn alignment(&self) -> usize {
        self.alignment
    }

    /// Verify that the buffer address is properly aligned
    #[inline(always)]
    pub fn is_aligned(&self) -> bool {
        (self.ptr as usize) % self.alignment == 0
    }

    /// Fill the buffer with random bytes
    ///
    /// Done once per worker before the replay starts so writes carry
    /// non-compressible data without paying for generation on the hot path.
    pub fn fill_random(&mut self) {
        use rand::RngCore;
        rand::thread_rng().fill_bytes(self.as_mut_slice());
    }
}

impl Drop for AlignedBuffer {
    fn drop(&mut self) {
        // SAFETY: ptr was allocated with exactly this layout
        unsafe {
            dealloc(self.ptr, self.layout);
        }
    }
}

// AlignedBuffer is Send because it owns its memory
unsafe impl Send for AlignedBuffer {}
