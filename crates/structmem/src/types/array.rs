// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fixed-length arrays of one element type.
//!
//! Element `i` lives at `i * stride`, where `stride` is the element size.
//! Every element is installed through the element type's own
//! `install_as_field`, so element lifecycle composes the same way record
//! fields do. Whole-array assignment is refused; assign elements instead.

use super::builder::install;
use super::registry;
use super::{
    adopt, Accessor, CopyProcedure, DescriptorBuilder, FieldKey, FromValue, IntoValue, NativeType,
    Procedure, TypeRef,
};
use crate::error::{Error, Result};
use crate::region::{Block, Region};
use crate::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

/// Array type `T[n]`.
pub struct ArrayType {
    element: TypeRef,
    length: usize,
    stride: usize,
    size: usize,
    name: String,
    accessors: HashMap<FieldKey, Accessor>,
    constructor: Procedure,
    destructor: Procedure,
    copier: CopyProcedure,
    this: Weak<ArrayType>,
}

impl ArrayType {
    /// Cached array type of `length` elements of `element`.
    ///
    /// # Errors
    ///
    /// - `NotDefined` if `element` is a record nothing has defined yet
    /// - `UnsizedArrayElement` if `element` has no known size
    /// - `SizeOverflow` if `length * stride` does not fit in the address
    ///   space
    pub fn make(element: TypeRef, length: usize) -> Result<Arc<Self>> {
        registry::global().array(&element, length)
    }

    /// Build a new, uncached array type.
    pub(crate) fn build(element: TypeRef, length: usize) -> Result<Arc<Self>> {
        if !element.is_complete() {
            return Err(Error::NotDefined {
                record: element.name().to_string(),
            });
        }
        let stride = element.size().ok_or_else(|| Error::UnsizedArrayElement {
            element: element.name().to_string(),
        })?;
        let name = format!("{}[{}]", element.name(), length);
        // Allocations are capped at isize::MAX bytes.
        let size = length
            .checked_mul(stride)
            .filter(|&size| isize::try_from(size).is_ok())
            .ok_or_else(|| Error::SizeOverflow { name: name.clone() })?;

        let mut builder = DescriptorBuilder::new(name.clone());
        for index in 0..length {
            Arc::clone(&element).install_as_field(
                &mut builder,
                FieldKey::Index(index),
                index * stride,
            )?;
        }
        let built = builder.finish();

        Ok(Arc::new_cyclic(|this| Self {
            element,
            length,
            stride,
            size,
            name,
            accessors: built.accessors,
            constructor: built.constructor,
            destructor: built.destructor,
            copier: built.copier,
            this: this.clone(),
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn element(&self) -> &TypeRef {
        &self.element
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Element size.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Offset of element `index`.
    pub fn offset_of(&self, index: usize) -> Result<usize> {
        self.check_index(index)?;
        Ok(index * self.stride)
    }

    /// View the memory at `region` as this array.
    pub fn at(&self, region: Region) -> ArrayView {
        ArrayView {
            ty: self.handle(),
            region,
            owner: None,
        }
    }

    fn handle(&self) -> Arc<ArrayType> {
        self.this
            .upgrade()
            .unwrap_or_else(|| unreachable!("array type used after its last handle was dropped"))
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.length {
            Ok(())
        } else {
            Err(Error::IndexOutOfBounds {
                index,
                length: self.length,
            })
        }
    }

    fn accessor(&self, index: usize) -> Result<&Accessor> {
        self.check_index(index)?;
        let key = FieldKey::Index(index);
        self.accessors
            .get(&key)
            .ok_or_else(|| Error::FieldNotFound {
                record: self.name.clone(),
                field: key.to_string(),
            })
    }
}

impl fmt::Debug for ArrayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayType")
            .field("element", &self.element.name())
            .field("length", &self.length)
            .field("stride", &self.stride)
            .finish()
    }
}

impl NativeType for ArrayType {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> Option<usize> {
        Some(self.size)
    }

    fn align(&self) -> usize {
        self.element.align()
    }

    fn has_constructor(&self) -> bool {
        !self.constructor.is_empty()
    }

    fn has_destructor(&self) -> bool {
        !self.destructor.is_empty()
    }

    fn construct(&self, at: Region) {
        self.constructor.run(at);
    }

    fn destruct(&self, at: Region) {
        self.destructor.run(at);
    }

    fn copy_construct(&self, dst: Region, src: Region) {
        self.copier.run(dst, src);
    }

    fn read(&self, region: Region, offset: usize) -> Result<Value> {
        Ok(Value::Array(self.at(region.add(offset))))
    }

    fn write(&self, _region: Region, _value: &Value, _offset: usize) -> Result<()> {
        Err(Error::ArrayNotAssignable)
    }

    fn install_as_field(
        self: Arc<Self>,
        builder: &mut DescriptorBuilder,
        key: FieldKey,
        offset: usize,
    ) -> Result<()> {
        install(self, builder, key, offset)
    }
}

/// Typed view of an array at an address.
///
/// An array read out of an owned record instance shares that instance's
/// block, like [`Instance`](super::Instance) does.
#[derive(Clone)]
pub struct ArrayView {
    ty: Arc<ArrayType>,
    region: Region,
    owner: Option<Arc<Block>>,
}

impl ArrayView {
    pub(crate) fn adopt(mut self, block: &Arc<Block>) -> Self {
        if self.owner.is_none() && block.offset_of(self.region.address()).is_some() {
            self.owner = Some(Arc::clone(block));
        }
        self
    }

    pub fn ty(&self) -> &Arc<ArrayType> {
        &self.ty
    }

    /// Address of element 0.
    ///
    /// # Safety
    ///
    /// The region does not keep an owning block alive: use it only while
    /// this view (or a clone) exists, and only within `ty().size()`.
    pub unsafe fn region(&self) -> Region {
        self.region
    }

    /// `true` when the view keeps its backing allocation alive.
    pub fn is_owned(&self) -> bool {
        self.owner.is_some()
    }

    pub fn len(&self) -> usize {
        self.ty.length
    }

    pub fn is_empty(&self) -> bool {
        self.ty.length == 0
    }

    /// Read element `index`.
    pub fn get(&self, index: usize) -> Result<Value> {
        let value = self.ty.accessor(index)?.get(self.region)?;
        Ok(adopt(self.owner.as_ref(), value))
    }

    pub fn get_as<T: FromValue>(&self, index: usize) -> Result<T> {
        T::from_value(self.get(index)?)
    }

    /// Assign element `index`.
    pub fn set(&self, index: usize, value: impl IntoValue) -> Result<()> {
        self.ty
            .accessor(index)?
            .set(self.region, &value.into_value())
    }

    /// Address of element `index`.
    ///
    /// # Safety
    ///
    /// Same contract as [`ArrayView::region`].
    pub unsafe fn element_region(&self, index: usize) -> Result<Region> {
        Ok(self.region.add(self.ty.offset_of(index)?))
    }

    /// Read every element in order.
    pub fn to_vec(&self) -> Result<Vec<Value>> {
        (0..self.len()).map(|index| self.get(index)).collect()
    }
}

impl fmt::Debug for ArrayView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:#x}", self.ty.name, self.region.address())
    }
}

impl PartialEq for ArrayView {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.ty, &other.ty) && self.region == other.region
    }
}

impl Eq for ArrayView {}
