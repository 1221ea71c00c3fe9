// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Process-wide cache of derived types.
//!
//! Reference wrappers are keyed by the stable [`RecordId`] of their target;
//! array types by `(element identity, length)`. Entries are built on first
//! request, outside any shard lock, and are never evicted: the cache keeps
//! the element type alive, so its address cannot be reused by another type.

use super::{ArrayType, RecordId, RecordType, RefType, TypeRef};
use crate::error::Result;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

/// Cache hit/miss statistics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LookupStats {
    pub hits: u64,
    pub misses: u64,
    pub last_miss_ns: u64,
}

/// Identity of a type handle: the address of its shared allocation.
fn identity(ty: &TypeRef) -> usize {
    Arc::as_ptr(ty).cast::<()>() as usize
}

/// Memoizing registry for reference wrappers and arrays.
#[derive(Default)]
pub struct TypeRegistry {
    references: DashMap<RecordId, Arc<RefType>>,
    arrays: DashMap<(usize, usize), Arc<ArrayType>>,
    stats: RwLock<LookupStats>,
}

impl TypeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reference wrapper for `target`, created on first request.
    pub fn reference(&self, target: &Arc<RecordType>) -> Arc<RefType> {
        if let Some(hit) = self.references.get(&target.id()) {
            self.record_hit();
            log::trace!("[registry] reference hit for {}", target.name());
            return Arc::clone(&hit);
        }

        let start = Instant::now();
        let built = Arc::new(RefType::new(Arc::clone(target)));
        let cached = Arc::clone(&self.references.entry(target.id()).or_insert(built));
        self.record_miss(start);
        log::debug!("[registry] created reference wrapper {}*", target.name());
        cached
    }

    /// Array of `length` elements of `element`, created on first request.
    ///
    /// # Errors
    ///
    /// `UnsizedArrayElement` if `element` has no known size.
    pub fn array(&self, element: &TypeRef, length: usize) -> Result<Arc<ArrayType>> {
        let key = (identity(element), length);
        if let Some(hit) = self.arrays.get(&key) {
            self.record_hit();
            log::trace!("[registry] array hit for {}", hit.name());
            return Ok(Arc::clone(&hit));
        }

        let start = Instant::now();
        let built = ArrayType::build(Arc::clone(element), length)?;
        let cached = Arc::clone(&self.arrays.entry(key).or_insert(built));
        self.record_miss(start);
        log::debug!("[registry] created array type {}", cached.name());
        Ok(cached)
    }

    /// Number of cached reference wrappers and array types.
    pub fn len(&self) -> usize {
        self.references.len() + self.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn stats(&self) -> LookupStats {
        *self.stats.read()
    }

    fn record_hit(&self) {
        let mut stats = self.stats.write();
        stats.hits = stats.hits.saturating_add(1);
    }

    fn record_miss(&self, start: Instant) {
        let mut stats = self.stats.write();
        stats.misses = stats.misses.saturating_add(1);
        stats.last_miss_ns = start.elapsed().as_nanos() as u64;
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("references", &self.references.len())
            .field("arrays", &self.arrays.len())
            .field("stats", &self.stats())
            .finish()
    }
}

/// Registry used by [`RecordType::reference`] and [`ArrayType::make`].
pub fn global() -> &'static TypeRegistry {
    static GLOBAL: OnceLock<TypeRegistry> = OnceLock::new();
    GLOBAL.get_or_init(TypeRegistry::new)
}
