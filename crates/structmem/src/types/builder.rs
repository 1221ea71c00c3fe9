// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Descriptor builder: per-field accessors and composed lifecycle steps.
//!
//! One builder lives for one layout computation. Each field installs an
//! accessor under its key and appends its constructor, destructor and copy
//! steps in declaration order. `finish()` freezes the result into plain
//! procedures that iterate their steps; no code is generated at runtime.

use super::{FieldKey, NativeType, TypeRef};
use crate::error::{Error, Result};
use crate::region::Region;
use crate::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Reads a field given the owning instance's base address.
pub type Getter = Box<dyn Fn(Region) -> Result<Value> + Send + Sync>;
/// Writes a field given the owning instance's base address.
pub type Setter = Box<dyn Fn(Region, &Value) -> Result<()> + Send + Sync>;
/// Constructor/destructor step on the owning instance's base address.
pub type Fragment = Box<dyn Fn(Region) + Send + Sync>;
/// Copy step: `(dst base, src base)`.
pub type CopyFragment = Box<dyn Fn(Region, Region) + Send + Sync>;

/// Named, offset-bound field access.
pub struct Accessor {
    ty: TypeRef,
    offset: usize,
    get: Getter,
    set: Setter,
}

impl Accessor {
    pub fn new(ty: TypeRef, offset: usize, get: Getter, set: Setter) -> Self {
        Self {
            ty,
            offset,
            get,
            set,
        }
    }

    /// Declared field type.
    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Read the field of the instance at `base`.
    pub fn get(&self, base: Region) -> Result<Value> {
        (self.get)(base)
    }

    /// Write the field of the instance at `base`.
    pub fn set(&self, base: Region, value: &Value) -> Result<()> {
        (self.set)(base, value)
    }
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor")
            .field("ty", &self.ty.name())
            .field("offset", &self.offset)
            .finish_non_exhaustive()
    }
}

/// Ordered constructor or destructor steps.
#[derive(Default)]
pub struct Procedure {
    steps: Vec<Fragment>,
}

impl Procedure {
    /// Run every step in declaration order.
    pub fn run(&self, at: Region) {
        for step in &self.steps {
            step(at);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }
}

impl fmt::Debug for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Procedure({} steps)", self.steps.len())
    }
}

/// Ordered copy steps.
#[derive(Default)]
pub struct CopyProcedure {
    steps: Vec<CopyFragment>,
}

impl CopyProcedure {
    pub fn run(&self, dst: Region, src: Region) {
        for step in &self.steps {
            step(dst, src);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }
}

impl fmt::Debug for CopyProcedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CopyProcedure({} steps)", self.steps.len())
    }
}

/// Output of a finished builder.
#[derive(Debug)]
pub struct BuiltDescriptor {
    pub accessors: HashMap<FieldKey, Accessor>,
    pub constructor: Procedure,
    pub destructor: Procedure,
    pub copier: CopyProcedure,
}

/// Accumulator for one layout computation.
pub struct DescriptorBuilder {
    owner: String,
    accessors: HashMap<FieldKey, Accessor>,
    constructor: Vec<Fragment>,
    destructor: Vec<Fragment>,
    copier: Vec<CopyFragment>,
}

impl DescriptorBuilder {
    /// Create a builder for the type named `owner` (used in errors).
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            accessors: HashMap::new(),
            constructor: Vec::new(),
            destructor: Vec::new(),
            copier: Vec::new(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Register the accessor for `key`.
    ///
    /// # Errors
    ///
    /// `DuplicateField` if `key` already has an accessor.
    pub fn add_accessor(&mut self, key: FieldKey, accessor: Accessor) -> Result<()> {
        if self.accessors.contains_key(&key) {
            return Err(Error::DuplicateField {
                record: self.owner.clone(),
                field: key.to_string(),
            });
        }
        self.accessors.insert(key, accessor);
        Ok(())
    }

    pub fn push_constructor(&mut self, step: Fragment) {
        self.constructor.push(step);
    }

    pub fn push_destructor(&mut self, step: Fragment) {
        self.destructor.push(step);
    }

    pub fn push_copy(&mut self, step: CopyFragment) {
        self.copier.push(step);
    }

    /// Standard field installation.
    ///
    /// The accessor reads and writes through `ty` at `offset`. Constructor
    /// and destructor steps are added only when `ty` reports them as
    /// non-trivial; a copy step is always added.
    pub fn install_default(&mut self, ty: TypeRef, key: FieldKey, offset: usize) -> Result<()> {
        let get_ty = Arc::clone(&ty);
        let set_ty = Arc::clone(&ty);
        let accessor = Accessor::new(
            Arc::clone(&ty),
            offset,
            Box::new(move |base| get_ty.read(base, offset)),
            Box::new(move |base, value| set_ty.write(base, value, offset)),
        );
        self.add_accessor(key, accessor)?;
        self.push_lifecycle(ty, offset);
        Ok(())
    }

    /// Add the lifecycle steps of a field of type `ty` at `offset`.
    pub fn push_lifecycle(&mut self, ty: TypeRef, offset: usize) {
        if ty.has_constructor() {
            let ty = Arc::clone(&ty);
            self.push_constructor(Box::new(move |base| ty.construct(base.add(offset))));
        }
        if ty.has_destructor() {
            let ty = Arc::clone(&ty);
            self.push_destructor(Box::new(move |base| ty.destruct(base.add(offset))));
        }
        self.push_copy(Box::new(move |dst, src| {
            ty.copy_construct(dst.add(offset), src.add(offset));
        }));
    }

    /// Freeze into accessors and procedures.
    pub fn finish(self) -> BuiltDescriptor {
        BuiltDescriptor {
            accessors: self.accessors,
            constructor: Procedure {
                steps: self.constructor,
            },
            destructor: Procedure {
                steps: self.destructor,
            },
            copier: CopyProcedure { steps: self.copier },
        }
    }
}

impl fmt::Debug for DescriptorBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DescriptorBuilder")
            .field("owner", &self.owner)
            .field("accessors", &self.accessors.len())
            .field("constructor", &self.constructor.len())
            .field("destructor", &self.destructor.len())
            .field("copier", &self.copier.len())
            .finish()
    }
}

/// Convenience: install `ty` the standard way.
pub(crate) fn install<T: NativeType + 'static>(
    ty: Arc<T>,
    builder: &mut DescriptorBuilder,
    key: FieldKey,
    offset: usize,
) -> Result<()> {
    builder.install_default(ty, key, offset)
}
