// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # structmem - C-ABI structured memory for foreign regions
//!
//! Describe native structures at runtime (fields, inheritance, unions,
//! fixed arrays, non-owning references) and read, write, construct, copy and
//! destruct them in place over raw memory shared with foreign code.
//!
//! ## Quick Start
//!
//! ```rust
//! use structmem::{types, ArrayType, FieldDef, RecordType, Result, Value};
//!
//! fn main() -> Result<()> {
//!     let point = RecordType::new("Point");
//!     point.define(vec![
//!         FieldDef::new("x", types::int32()),
//!         FieldDef::new("y", types::int32()),
//!     ])?;
//!
//!     let point3 = RecordType::extends("Point3D", &point);
//!     point3.define(vec![FieldDef::new("z", types::float64())])?;
//!     assert_eq!(point3.offset_of("z")?, 8);
//!     assert_eq!(point3.size(), Some(16));
//!
//!     let p = point3.alloc()?;
//!     p.set("x", 1i32)?;
//!     p.set("z", 2.5f64)?;
//!     assert_eq!(p.get("z")?, Value::F64(2.5));
//!
//!     let samples = ArrayType::make(types::int32(), 5)?;
//!     assert_eq!(samples.offset_of(2)?, 8);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |                          Type Layer                                 |
//! |   RecordType | ArrayType | RefType | primitives | user NativeType  |
//! +---------------------------------------------------------------------+
//! |                        Descriptor Layer                             |
//! |   DescriptorBuilder -> accessors + ctor/dtor/copy procedures       |
//! +---------------------------------------------------------------------+
//! |                          Region Layer                               |
//! |   typed reads/writes | strings | copy/fill | interlocked atomics   |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`NativeType`] | Capability contract of anything placeable in memory |
//! | [`RecordType`] | C-ABI structure with inheritance and unions |
//! | [`ArrayType`] | Fixed-length array with constant stride |
//! | [`RefType`] | Nullable, non-owning pointer to a record |
//! | [`Region`] | Address of foreign memory with typed accessors |
//!
//! ## Modules Overview
//!
//! - [`types`] - Type descriptors and layout engine (start here)
//! - [`region`] - Addressable memory access
//! - [`config`] - ABI constants and runtime configuration
//! - [`error`] - Error type

/// Engine constants (pointer width) and runtime configuration.
pub mod config;
/// Error type for definition and access failures.
pub mod error;
/// Addressable memory regions: typed access, strings, atomics, owned blocks.
pub mod region;
/// Native type descriptors and the record layout engine.
pub mod types;

pub use config::{EngineConfig, OverlapPolicy, POINTER_WIDTH};
pub use error::{Error, Result};
pub use region::{Block, Encoding, Nullability, Region};
pub use types::{
    ArrayType, ArrayView, Definition, DescriptorBuilder, FieldDef, FieldKey, FromValue,
    HostBridge, Instance, IntoValue, NativeType, OwnedInstance, RecordType, RefType, TypeRef,
    Value,
};

/// structmem version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
