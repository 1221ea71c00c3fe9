// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Interlocked read-modify-write primitives on region memory.
//!
//! Foreign code may mutate the same bytes concurrently (reference counts in
//! native objects), so these go through real atomics with `SeqCst` ordering.
//! Increment/decrement return the new value; compare-exchange returns the
//! previous value, matching the native interlocked API.

use super::Region;
use crate::error::Result;
use std::sync::atomic::{AtomicU16, AtomicU32, AtomicU64, AtomicU8, Ordering};

/// Generate increment/decrement pairs for one width.
macro_rules! impl_interlocked_step {
    ($inc:ident, $dec:ident, $atomic:ty, $int:ty) => {
        pub fn $inc(&self, offset: usize) -> Result<$int> {
            let target = self.check_atomic(offset, std::mem::size_of::<$int>())?;
            // SAFETY: address checked for natural alignment; `from_ptr`
            // contract covers the bytes.
            let cell = unsafe { &*target.cast::<$atomic>() };
            Ok(cell.fetch_add(1, Ordering::SeqCst).wrapping_add(1))
        }

        pub fn $dec(&self, offset: usize) -> Result<$int> {
            let target = self.check_atomic(offset, std::mem::size_of::<$int>())?;
            // SAFETY: as above.
            let cell = unsafe { &*target.cast::<$atomic>() };
            Ok(cell.fetch_sub(1, Ordering::SeqCst).wrapping_sub(1))
        }
    };
}

/// Generate compare-exchange for one width.
macro_rules! impl_interlocked_cas {
    ($name:ident, $atomic:ty, $int:ty) => {
        pub fn $name(&self, exchange: $int, compare: $int, offset: usize) -> Result<$int> {
            let target = self.check_atomic(offset, std::mem::size_of::<$int>())?;
            // SAFETY: address checked for natural alignment; `from_ptr`
            // contract covers the bytes.
            let cell = unsafe { &*target.cast::<$atomic>() };
            Ok(
                match cell.compare_exchange(compare, exchange, Ordering::SeqCst, Ordering::SeqCst) {
                    Ok(previous) | Err(previous) => previous,
                },
            )
        }
    };
}

impl Region {
    impl_interlocked_step!(
        interlocked_increment_16,
        interlocked_decrement_16,
        AtomicU16,
        u16
    );
    impl_interlocked_step!(
        interlocked_increment_32,
        interlocked_decrement_32,
        AtomicU32,
        u32
    );
    impl_interlocked_step!(
        interlocked_increment_64,
        interlocked_decrement_64,
        AtomicU64,
        u64
    );

    impl_interlocked_cas!(interlocked_compare_exchange_8, AtomicU8, u8);
    impl_interlocked_cas!(interlocked_compare_exchange_16, AtomicU16, u16);
    impl_interlocked_cas!(interlocked_compare_exchange_32, AtomicU32, u32);
    impl_interlocked_cas!(interlocked_compare_exchange_64, AtomicU64, u64);
}
