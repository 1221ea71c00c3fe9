// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Addressable memory regions.
//!
//! A [`Region`] is a non-null byte address into memory owned by someone else:
//! a foreign process image, a native allocation handed over by FFI, or a
//! [`Block`] owned by this crate. Every typed read/write in the engine goes
//! through the primitives defined here.
//!
//! # Safety Model
//!
//! Creating a region is `unsafe`: the caller guarantees the address stays
//! valid for every offset it will later access. Once created, accessors are
//! safe to call. This mirrors how the foreign layouts are trusted: a layout
//! that disagrees with real memory produces wrong values, never a caught
//! error.
//!
//! Every way of obtaining a region over memory this crate owns is `unsafe`
//! as well ([`Block::region`], `Instance::region`, `ArrayView::region`).
//! Safe code works with instances and views instead, which keep an owning
//! block alive and refuse to step outside it.
//!
//! # Example
//!
//! ```rust
//! use structmem::region::{Block, Encoding};
//!
//! let block = Block::new(32, 8).expect("alloc");
//! // SAFETY: `block` outlives `region`; offsets stay below 32.
//! let region = unsafe { block.region() };
//!
//! region.write_u32(0xDEAD_BEEF, 4);
//! assert_eq!(region.read_u32(4), 0xDEAD_BEEF);
//!
//! let written = region.write_string("hi", Encoding::Utf8, 8).expect("write");
//! assert_eq!(written, 2);
//! assert_eq!(region.read_string(Encoding::Utf8, None, 8).expect("read"), "hi");
//! ```

mod atomic;
mod block;
mod text;

pub use block::Block;
pub use text::Encoding;

use crate::error::{Error, Result};
use std::fmt;
use std::ptr::{self, NonNull};

/// Whether pointer arithmetic may produce a null view.
///
/// Replaces the old trick of carrying nullability in the sign bit of an
/// offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nullability {
    /// A null result is an error.
    NonNull,
    /// A null result yields `None`.
    Nullable,
}

/// Generate unaligned little/native-endian read methods.
macro_rules! impl_read {
    ($name:ident, $type:ty) => {
        #[inline]
        pub fn $name(&self, offset: usize) -> $type {
            // SAFETY: `from_ptr` contract: `offset..offset+size` is readable.
            unsafe { ptr::read_unaligned(self.at(offset).cast::<$type>()) }
        }
    };
}

/// Generate unaligned write methods.
macro_rules! impl_write {
    ($name:ident, $type:ty) => {
        #[inline]
        pub fn $name(&self, value: $type, offset: usize) {
            // SAFETY: `from_ptr` contract: `offset..offset+size` is writable.
            unsafe { ptr::write_unaligned(self.at(offset).cast::<$type>(), value) }
        }
    };
}

/// Non-null address of a byte-addressable span.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region {
    ptr: NonNull<u8>,
}

// SAFETY: Region is a plain address. Synchronization of the memory behind it
// is the caller's concern (atomics are provided for shared counters).
unsafe impl Send for Region {}
unsafe impl Sync for Region {}

impl fmt::Debug for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Region({:#x})", self.address())
    }
}

impl Region {
    /// Wrap a raw address. Returns `None` for null.
    ///
    /// # Safety
    ///
    /// `ptr` must stay valid for reads and writes at every offset later
    /// accessed through the region (and through regions derived from it).
    pub unsafe fn from_ptr(ptr: *mut u8) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| Self { ptr })
    }

    /// Wrap an integer address. Returns `None` for 0.
    ///
    /// # Safety
    ///
    /// Same contract as [`Region::from_ptr`].
    pub unsafe fn from_address(address: usize) -> Option<Self> {
        Self::from_ptr(address as *mut u8)
    }

    /// Raw pointer to the first byte.
    #[inline]
    pub fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    /// Numeric address.
    #[inline]
    pub fn address(&self) -> usize {
        self.ptr.as_ptr() as usize
    }

    #[inline]
    fn at(&self, offset: usize) -> *mut u8 {
        self.ptr.as_ptr().wrapping_add(offset)
    }

    /// Region starting `offset` bytes further.
    #[inline]
    #[must_use]
    pub fn add(self, offset: usize) -> Region {
        // SAFETY: offsets stay inside the span granted by `from_ptr`, which
        // never contains address 0, so the sum is non-null.
        Region {
            ptr: unsafe { NonNull::new_unchecked(self.at(offset)) },
        }
    }

    /// Signed pointer arithmetic with explicit nullability.
    ///
    /// A computed address of 0 yields `Ok(None)` for
    /// [`Nullability::Nullable`] and `Err(NullPointer)` otherwise.
    pub fn address_of(self, offset: isize, nullability: Nullability) -> Result<Option<Region>> {
        let address = self.address().wrapping_add_signed(offset);
        match NonNull::new(address as *mut u8) {
            Some(ptr) => Ok(Some(Region { ptr })),
            None => match nullability {
                Nullability::Nullable => Ok(None),
                Nullability::NonNull => Err(Error::NullPointer {
                    offset: offset.unsigned_abs(),
                }),
            },
        }
    }

    // Generate scalar accessors via macro
    impl_read!(read_u8, u8);
    impl_read!(read_u16, u16);
    impl_read!(read_u32, u32);
    impl_read!(read_u64, u64);
    impl_read!(read_i8, i8);
    impl_read!(read_i16, i16);
    impl_read!(read_i32, i32);
    impl_read!(read_i64, i64);
    impl_read!(read_f32, f32);
    impl_read!(read_f64, f64);

    impl_write!(write_u8, u8);
    impl_write!(write_u16, u16);
    impl_write!(write_u32, u32);
    impl_write!(write_u64, u64);
    impl_write!(write_i8, i8);
    impl_write!(write_i16, i16);
    impl_write!(write_i32, i32);
    impl_write!(write_i64, i64);
    impl_write!(write_f32, f32);
    impl_write!(write_f64, f64);

    pub fn read_bool(&self, offset: usize) -> bool {
        self.read_u8(offset) != 0
    }

    pub fn write_bool(&self, value: bool, offset: usize) {
        self.write_u8(u8::from(value), offset);
    }

    /// Raw pointer-sized value at `offset`.
    pub fn read_address(&self, offset: usize) -> usize {
        // SAFETY: `from_ptr` contract covers POINTER_WIDTH bytes at offset.
        unsafe { ptr::read_unaligned(self.at(offset).cast::<usize>()) }
    }

    /// Pointer at `offset`; `None` when null.
    pub fn read_nullable_pointer(&self, offset: usize) -> Option<Region> {
        let address = self.read_address(offset);
        NonNull::new(address as *mut u8).map(|ptr| Region { ptr })
    }

    /// Pointer at `offset`; a null value is an error.
    pub fn read_pointer(&self, offset: usize) -> Result<Region> {
        self.read_nullable_pointer(offset)
            .ok_or(Error::NullPointer { offset })
    }

    /// Store a pointer (or null) at `offset`.
    pub fn write_pointer(&self, value: Option<Region>, offset: usize) {
        let address = value.map_or(0, |r| r.address());
        // SAFETY: `from_ptr` contract covers POINTER_WIDTH bytes at offset.
        unsafe { ptr::write_unaligned(self.at(offset).cast::<usize>(), address) }
    }

    /// Copy `bytes` bytes from `src + src_offset` to `self + dst_offset`.
    ///
    /// Ranges may overlap.
    pub fn copy_from(&self, src: Region, bytes: usize, dst_offset: usize, src_offset: usize) {
        if bytes == 0 {
            return;
        }
        // SAFETY: both spans are covered by their regions' contracts;
        // `ptr::copy` tolerates overlap.
        unsafe { ptr::copy(src.at(src_offset), self.at(dst_offset), bytes) }
    }

    /// Set `bytes` bytes at `offset` to `value`.
    pub fn fill(&self, value: u8, bytes: usize, offset: usize) {
        // SAFETY: span covered by the `from_ptr` contract.
        unsafe { ptr::write_bytes(self.at(offset), value, bytes) }
    }

    pub fn read_bytes(&self, len: usize, offset: usize) -> Vec<u8> {
        let mut out = vec![0u8; len];
        // SAFETY: span covered by the `from_ptr` contract; `out` is a fresh
        // allocation that cannot overlap it.
        unsafe { ptr::copy_nonoverlapping(self.at(offset), out.as_mut_ptr(), len) }
        out
    }

    pub fn write_bytes(&self, data: &[u8], offset: usize) {
        // SAFETY: span covered by the `from_ptr` contract.
        unsafe { ptr::copy(data.as_ptr(), self.at(offset), data.len()) }
    }

    /// Read a string.
    ///
    /// With `max_bytes == None` the string runs to the first null code unit.
    /// Otherwise at most `max_bytes` bytes are read, stopping early at a null.
    pub fn read_string(
        &self,
        encoding: Encoding,
        max_bytes: Option<usize>,
        offset: usize,
    ) -> Result<String> {
        let unit = encoding.unit_size();
        let mut raw = Vec::new();
        let mut cursor = offset;
        loop {
            if let Some(max) = max_bytes {
                if raw.len() + unit > max {
                    break;
                }
            }
            let bytes = self.read_bytes(unit, cursor);
            if bytes.iter().all(|b| *b == 0) {
                break;
            }
            raw.extend_from_slice(&bytes);
            cursor += unit;
        }
        encoding.decode(&raw)
    }

    /// Write `text` followed by a null terminator.
    ///
    /// Returns the number of bytes written, terminator excluded.
    pub fn write_string(&self, text: &str, encoding: Encoding, offset: usize) -> Result<usize> {
        let encoded = encoding.encode(text)?;
        self.write_bytes(&encoded, offset);
        self.fill(0, encoding.unit_size(), offset + encoded.len());
        Ok(encoded.len())
    }

    /// Check natural alignment for an atomic access of `align` bytes.
    fn check_atomic(&self, offset: usize, align: usize) -> Result<*mut u8> {
        let target = self.at(offset);
        if (target as usize) % align != 0 {
            return Err(Error::Misaligned { offset, align });
        }
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_U16: u16 = 0xCDEF;
    const TEST_U32: u32 = 0x1234_5678;
    const TEST_U64: u64 = 0x1122_3344_5566_7788;

    #[test]
    fn test_scalar_read_write() {
        let block = Block::new(32, 8).expect("alloc");
        // SAFETY: block outlives region; accesses stay in bounds.
        let region = unsafe { block.region() };

        region.write_u16(TEST_U16, 0);
        region.write_u32(TEST_U32, 4);
        region.write_u64(TEST_U64, 8);
        region.write_i8(-5, 16);
        region.write_f32(1.5, 20);

        assert_eq!(region.read_u16(0), TEST_U16);
        assert_eq!(region.read_u32(4), TEST_U32);
        assert_eq!(region.read_u64(8), TEST_U64);
        assert_eq!(region.read_i8(16), -5);
        assert_eq!(region.read_f32(20), 1.5);
    }

    #[test]
    fn test_unaligned_access() {
        let block = Block::new(16, 8).expect("alloc");
        // SAFETY: block outlives region; accesses stay in bounds.
        let region = unsafe { block.region() };
        region.write_u32(TEST_U32, 3);
        assert_eq!(region.read_u32(3), TEST_U32);
    }

    #[test]
    fn test_bool_is_nonzero_byte() {
        let block = Block::new(2, 1).expect("alloc");
        // SAFETY: block outlives region; accesses stay in bounds.
        let region = unsafe { block.region() };
        region.write_u8(7, 0);
        assert!(region.read_bool(0));
        region.write_bool(false, 1);
        assert!(!region.read_bool(1));
    }

    #[test]
    fn test_pointer_round_trip_and_null() {
        let target = Block::new(8, 8).expect("alloc");
        let block = Block::new(16, 8).expect("alloc");
        // SAFETY: block outlives region; accesses stay in bounds.
        let region = unsafe { block.region() };

        assert!(region.read_nullable_pointer(0).is_none());
        assert_eq!(region.read_pointer(0), Err(Error::NullPointer { offset: 0 }));

        // SAFETY: target outlives every use of its region.
        let target = unsafe { target.region() };
        region.write_pointer(Some(target), 8);
        assert_eq!(region.read_nullable_pointer(8), Some(target));

        region.write_pointer(None, 8);
        assert!(region.read_nullable_pointer(8).is_none());
    }

    #[test]
    fn test_address_of_honors_nullability() {
        let block = Block::new(8, 8).expect("alloc");
        // SAFETY: block outlives region; accesses stay in bounds.
        let region = unsafe { block.region() };
        let back = -(region.address() as isize);

        assert_eq!(region.address_of(back, Nullability::Nullable), Ok(None));
        assert!(region.address_of(back, Nullability::NonNull).is_err());

        let inner = region
            .address_of(4, Nullability::NonNull)
            .expect("in range")
            .expect("non-null");
        assert_eq!(inner.address(), region.address() + 4);
    }

    #[test]
    fn test_copy_and_fill() {
        let block = Block::new(16, 1).expect("alloc");
        // SAFETY: block outlives region; accesses stay in bounds.
        let region = unsafe { block.region() };
        region.fill(0xAB, 4, 0);
        region.copy_from(region, 4, 8, 0);
        assert_eq!(region.read_bytes(4, 8), vec![0xAB; 4]);
        assert_eq!(region.read_u8(4), 0);
    }

    #[test]
    fn test_bounded_string_stops_at_capacity() {
        let block = Block::new(16, 1).expect("alloc");
        // SAFETY: block outlives region; accesses stay in bounds.
        let region = unsafe { block.region() };
        region.write_bytes(b"abcdefgh", 0);
        let s = region
            .read_string(Encoding::Utf8, Some(4), 0)
            .expect("read");
        assert_eq!(s, "abcd");
    }

    #[test]
    fn test_utf16_string() {
        let block = Block::new(32, 2).expect("alloc");
        // SAFETY: block outlives region; accesses stay in bounds.
        let region = unsafe { block.region() };
        let written = region
            .write_string("héllo", Encoding::Utf16, 0)
            .expect("write");
        assert_eq!(written, 10);
        assert_eq!(
            region.read_string(Encoding::Utf16, None, 0).expect("read"),
            "héllo"
        );
    }
}
