// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Engine constants and runtime configuration.
//!
//! - **Level 1 (Static)**: ABI constants of the host target (pointer width,
//!   minimum alignment).
//! - **Level 2 (Dynamic)**: `EngineConfig`, swapped atomically through
//!   `ArcSwap` and read once at the start of every layout definition.
//!
//! # Example
//!
//! ```rust
//! use structmem::config::{self, EngineConfig, OverlapPolicy};
//!
//! assert_eq!(config::POINTER_WIDTH, std::mem::size_of::<usize>());
//!
//! let strict = EngineConfig::new().with_overlap_policy(OverlapPolicy::Reject);
//! assert_eq!(strict.overlap_policy, OverlapPolicy::Reject);
//! ```

use arc_swap::ArcSwap;
use std::sync::{Arc, OnceLock};

/// Width of a native pointer in bytes (8 on 64-bit targets).
///
/// Size and alignment of every reference wrapper.
pub const POINTER_WIDTH: usize = std::mem::size_of::<usize>();

/// Alignment of a record with no fields.
pub const MIN_ALIGN: usize = 1;

/// How `define` treats forced-offset fields of a non-union record that share
/// bytes with another field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapPolicy {
    /// Accept silently. Foreign layouts alias storage on purpose.
    #[default]
    Allow,
    /// Accept, but log a warning naming both fields.
    Warn,
    /// Fail with `Error::OverlappingFields`.
    Reject,
}

/// Runtime engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EngineConfig {
    /// Overlap validation for forced offsets (union layouts are never checked).
    pub overlap_policy: OverlapPolicy,
}

impl EngineConfig {
    /// Default configuration (overlaps allowed).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the overlap policy.
    #[must_use]
    pub fn with_overlap_policy(mut self, policy: OverlapPolicy) -> Self {
        self.overlap_policy = policy;
        self
    }
}

fn global() -> &'static ArcSwap<EngineConfig> {
    static GLOBAL: OnceLock<ArcSwap<EngineConfig>> = OnceLock::new();
    GLOBAL.get_or_init(|| ArcSwap::from_pointee(EngineConfig::default()))
}

/// Snapshot of the process-wide configuration.
pub fn current() -> Arc<EngineConfig> {
    global().load_full()
}

/// Replace the process-wide configuration.
///
/// Records already defined keep the layout they were built with.
pub fn install(config: EngineConfig) {
    global().store(Arc::new(config));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_width_matches_target() {
        assert_eq!(POINTER_WIDTH, std::mem::size_of::<*const u8>());
    }

    #[test]
    fn test_default_policy_allows_overlap() {
        assert_eq!(EngineConfig::new().overlap_policy, OverlapPolicy::Allow);
    }

    #[test]
    fn test_builder_sets_policy() {
        let cfg = EngineConfig::new().with_overlap_policy(OverlapPolicy::Warn);
        assert_eq!(cfg.overlap_policy, OverlapPolicy::Warn);
    }
}
