// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Owned, aligned, zero-initialized storage.
//!
//! # Block Lifecycle
//!
//! 1. `Block::new()` allocates zeroed memory of the requested size/alignment
//! 2. `Block::region()` hands out the address for typed access (`unsafe`:
//!    the region does not keep the block alive)
//! 3. Memory is released on drop (regions derived from it become dangling)
//!
//! Owned record instances share their block through `Arc<Block>`, so views
//! cloned from them keep the memory alive.

use super::Region;
use crate::error::{Error, Result};
use std::alloc::{self, Layout};
use std::ptr::NonNull;

/// Heap allocation backing owned record instances.
pub struct Block {
    ptr: NonNull<u8>,
    layout: Layout,
    size: usize,
}

// SAFETY: Block exclusively owns its allocation; the bytes carry no
// thread-affine state.
unsafe impl Send for Block {}
unsafe impl Sync for Block {}

impl Block {
    /// Allocate `size` zeroed bytes aligned to `align` (a power of two).
    ///
    /// # Errors
    ///
    /// Returns `InvalidLayout` if `align` is not a power of two or the size
    /// overflows when rounded to `align`.
    pub fn new(size: usize, align: usize) -> Result<Self> {
        // Zero-sized allocations are undefined; keep one byte for the address.
        let layout = Layout::from_size_align(size.max(1), align)
            .map_err(|_| Error::InvalidLayout { size, align })?;

        // SAFETY: layout has non-zero size (see `max(1)` above).
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let Some(ptr) = NonNull::new(raw) else {
            alloc::handle_alloc_error(layout);
        };

        Ok(Self { ptr, layout, size })
    }

    /// Address of the first byte.
    ///
    /// # Safety
    ///
    /// The returned region is a plain address: it must not be used after
    /// the block is dropped, nor at offsets past `size()`.
    pub unsafe fn region(&self) -> Region {
        // SAFETY: the allocation covers `size` bytes and lives until drop;
        // the caller upholds the lifetime and bounds.
        unsafe { Region::from_ptr(self.ptr.as_ptr()) }
            .unwrap_or_else(|| unreachable!("allocation is non-null"))
    }

    /// Numeric address of the first byte.
    pub fn address(&self) -> usize {
        self.ptr.as_ptr() as usize
    }

    /// Byte offset of `address` from the start of the block, when it falls
    /// inside the allocation.
    pub fn offset_of(&self, address: usize) -> Option<usize> {
        let offset = address.checked_sub(self.address())?;
        (offset < self.size).then_some(offset)
    }

    /// Requested size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Alignment of the allocation.
    pub fn align(&self) -> usize {
        self.layout.align()
    }
}

impl Drop for Block {
    fn drop(&mut self) {
        // SAFETY: ptr was allocated with exactly this layout in `new`.
        unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) }
    }
}

impl std::fmt::Debug for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Block")
            .field("address", &format_args!("{:#x}", self.ptr.as_ptr() as usize))
            .field("size", &self.size)
            .field("align", &self.layout.align())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_is_zeroed_and_aligned() {
        let block = Block::new(64, 16).expect("alloc");
        // SAFETY: block outlives region; reads stay within 64 bytes.
        let region = unsafe { block.region() };
        assert_eq!(region.address() % 16, 0);
        assert_eq!(region.read_bytes(64, 0), vec![0u8; 64]);
    }

    #[test]
    fn test_zero_sized_block_has_address() {
        let block = Block::new(0, 1).expect("alloc");
        assert_eq!(block.size(), 0);
        // SAFETY: only the address is inspected.
        assert_ne!(unsafe { block.region() }.address(), 0);
    }

    #[test]
    fn test_offset_of_address() {
        let block = Block::new(16, 8).expect("alloc");
        let base = block.address();
        assert_eq!(block.offset_of(base), Some(0));
        assert_eq!(block.offset_of(base + 15), Some(15));
        assert_eq!(block.offset_of(base + 16), None);
        assert_eq!(block.offset_of(base - 1), None);
    }

    #[test]
    fn test_bad_alignment_is_rejected() {
        assert_eq!(
            Block::new(8, 3).map(|_| ()),
            Err(Error::InvalidLayout { size: 8, align: 3 })
        );
    }
}
