// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Native type descriptors.
//!
//! Every type that can live in foreign memory (primitives, records, fixed
//! arrays, reference wrappers, and user-defined types) implements
//! [`NativeType`]. The trait is the whole contract the layout engine relies
//! on, so the set of types is open: a type written after the fact composes
//! with everything else.
//!
//! # Features
//!
//! - **RecordType**: C-ABI structures with inheritance, unions, abstract bases
//! - **ArrayType**: fixed-length homogeneous arrays with a constant stride
//! - **RefType**: non-owning, nullable pointer to a record (cached per record)
//! - **DescriptorBuilder**: composes per-field accessors and lifecycle steps
//!
//! # Example
//!
//! ```rust
//! use structmem::types::{self, FieldDef, RecordType};
//! use structmem::Value;
//!
//! let point = RecordType::new("Point");
//! point
//!     .define(vec![
//!         FieldDef::new("x", types::int32()),
//!         FieldDef::new("y", types::int32()),
//!     ])
//!     .expect("define Point");
//!
//! assert_eq!(point.offset_of("y").expect("y"), 4);
//! assert_eq!(point.size(), Some(8));
//!
//! let p = point.alloc().expect("alloc");
//! p.set("y", 7i32).expect("set");
//! assert_eq!(p.get("y").expect("get"), Value::I32(7));
//! ```

mod array;
mod builder;
mod primitive;
mod record;
mod reference;
pub mod registry;
mod value;

pub use array::{ArrayType, ArrayView};
pub use builder::{
    Accessor, BuiltDescriptor, CopyFragment, CopyProcedure, DescriptorBuilder, Fragment, Getter,
    Procedure, Setter,
};
pub use primitive::{
    boolean, buffer, float32, float64, int16, int32, int64, int8, pointer, string, uint16,
    uint32, uint64, uint8, Primitive, PrimitiveKind,
};
pub use record::{
    Definition, FieldDef, Instance, OwnedInstance, RecordId, RecordLayout, RecordType,
    RecordTypeBuilder, ResolvedField,
};
pub use reference::{HostBridge, RefType};
pub use value::{FromValue, IntoValue, Value};

use crate::error::Result;
use crate::region::{Block, Region};
use std::fmt;
use std::sync::Arc;

/// Shared handle to any native type.
pub type TypeRef = Arc<dyn NativeType>;

/// Name or position of a field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldKey {
    Name(String),
    Index(usize),
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Index(index) => write!(f, "[{}]", index),
        }
    }
}

impl From<&str> for FieldKey {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for FieldKey {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<usize> for FieldKey {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<&FieldKey> for FieldKey {
    fn from(key: &FieldKey) -> Self {
        key.clone()
    }
}

/// Capability contract of a type that can be placed in foreign memory.
///
/// `size() == None` marks an abstract/unsized type: it can be the last field
/// of a record, an inheritance base or a pointer target, never an array
/// element or a by-value instance.
///
/// Lifecycle operations default to the trivial behavior of plain data: no
/// constructor, no destructor, and a raw byte copy of `size()` bytes.
pub trait NativeType: Send + Sync + fmt::Debug {
    /// Human-readable type name (diagnostics, error messages).
    fn name(&self) -> &str;

    /// Size in bytes, `None` when unknown.
    fn size(&self) -> Option<usize>;

    /// Alignment in bytes (power of two).
    fn align(&self) -> usize;

    /// `false` while the layout is still pending (a record nothing in its
    /// lineage has defined yet). Incomplete types cannot be embedded by
    /// value or used as array elements.
    fn is_complete(&self) -> bool {
        true
    }

    /// `true` when `construct` does something; owners skip trivial steps.
    fn has_constructor(&self) -> bool {
        false
    }

    /// `true` when `destruct` does something.
    fn has_destructor(&self) -> bool {
        false
    }

    fn construct(&self, _at: Region) {}

    fn destruct(&self, _at: Region) {}

    fn copy_construct(&self, dst: Region, src: Region) {
        if let Some(size) = self.size() {
            dst.copy_from(src, size, 0, 0);
        }
    }

    fn move_construct(&self, dst: Region, src: Region) {
        self.copy_construct(dst, src);
    }

    /// Read a value stored at `region + offset`.
    fn read(&self, region: Region, offset: usize) -> Result<crate::Value>;

    /// Store `value` at `region + offset`.
    fn write(&self, region: Region, value: &crate::Value, offset: usize) -> Result<()>;

    /// Expose this type as field `key` at `offset` of the record under
    /// construction, and contribute its lifecycle steps.
    ///
    /// Most types delegate to [`DescriptorBuilder::install_default`].
    fn install_as_field(
        self: Arc<Self>,
        builder: &mut DescriptorBuilder,
        key: FieldKey,
        offset: usize,
    ) -> Result<()>;
}

/// Round `offset` up to a multiple of `align` (a power of two).
#[inline]
pub const fn align_up(offset: usize, align: usize) -> usize {
    if align <= 1 {
        return offset;
    }
    let mask = align - 1;
    (offset + mask) & !mask
}

/// Tie record/array views read out of an owned block to that block.
pub(crate) fn adopt(owner: Option<&Arc<Block>>, value: Value) -> Value {
    match (owner, value) {
        (Some(block), Value::Record(instance)) => Value::Record(instance.adopt(block)),
        (Some(block), Value::Array(view)) => Value::Array(view.adopt(block)),
        (_, value) => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(0, 8), 0);
        assert_eq!(align_up(1, 8), 8);
        assert_eq!(align_up(8, 8), 8);
        assert_eq!(align_up(9, 4), 12);
        assert_eq!(align_up(5, 1), 5);
    }

    #[test]
    fn test_field_key_display() {
        assert_eq!(FieldKey::from("pos").to_string(), "pos");
        assert_eq!(FieldKey::from(3usize).to_string(), "[3]");
    }
}
