// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Structured records: C-ABI layout, inheritance, unions, lifecycle.
//!
//! A `RecordType` is created empty, optionally with a parent, and finalized
//! exactly once by one of the `define*` calls. Finalization resolves every
//! field offset, collects accessors and lifecycle steps through a
//! [`DescriptorBuilder`], and seals the whole ancestor chain.
//!
//! # Layout
//!
//! ```text
//! cursor = parent size (0 at the root)
//! for each field:
//!     offset = forced offset, or align_up(cursor, field align)
//!     cursor = offset + field size      (unresolved if size unknown)
//! size  = explicit | None if abstract | max(parent size, field bounds)
//! align = explicit | max(parent align, field aligns)
//! ```
//!
//! No tail padding is added: `size` is the largest field bound.

use super::builder::install;
use super::registry;
use super::{
    adopt, align_up, Accessor, CopyProcedure, DescriptorBuilder, FieldKey, FromValue, HostBridge,
    IntoValue, NativeType, Procedure, RefType, TypeRef,
};
use crate::config::{self, EngineConfig, OverlapPolicy, MIN_ALIGN};
use crate::error::{Error, Result};
use crate::region::{Block, Nullability, Region};
use crate::Value;
use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, Weak};

/// Stable identity of a record type (registry key).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(u64);

impl RecordId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// Declared field: key, type, optional forced offset.
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub key: FieldKey,
    pub ty: TypeRef,
    pub offset: Option<usize>,
}

impl FieldDef {
    /// Field placed at the next aligned offset.
    pub fn new(key: impl Into<FieldKey>, ty: TypeRef) -> Self {
        Self {
            key: key.into(),
            ty,
            offset: None,
        }
    }

    /// Field placed verbatim at `offset`. Alignment is the caller's business.
    pub fn at(key: impl Into<FieldKey>, ty: TypeRef, offset: usize) -> Self {
        Self {
            key: key.into(),
            ty,
            offset: Some(offset),
        }
    }
}

/// Everything `define` accepts.
#[derive(Debug, Clone, Default)]
pub struct Definition {
    pub fields: Vec<FieldDef>,
    /// Explicit size, overrides the computed one.
    pub size: Option<usize>,
    /// Explicit alignment, overrides the computed one.
    pub align: Option<usize>,
    pub is_abstract: bool,
    /// Union layout: overlap checks are skipped.
    pub union: bool,
}

impl Definition {
    pub fn new(fields: Vec<FieldDef>) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }

    #[must_use]
    pub fn with_align(mut self, align: usize) -> Self {
        self.align = Some(align);
        self
    }

    #[must_use]
    pub fn mark_abstract(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Force every field without an explicit offset to offset 0.
    #[must_use]
    pub fn as_union(mut self) -> Self {
        for field in &mut self.fields {
            field.offset.get_or_insert(0);
        }
        self.union = true;
        self
    }
}

/// Field after layout resolution.
#[derive(Debug, Clone)]
pub struct ResolvedField {
    pub key: FieldKey,
    pub ty: TypeRef,
    pub offset: usize,
    pub size: Option<usize>,
    pub align: usize,
    /// Offset was given, not computed.
    pub forced: bool,
}

impl ResolvedField {
    /// End of the field, when its size is known.
    pub fn end(&self) -> Option<usize> {
        self.size.map(|size| self.offset + size)
    }
}

/// Finalized layout of one record (own fields only).
#[derive(Debug)]
pub struct RecordLayout {
    pub size: Option<usize>,
    pub align: usize,
    pub fields: Vec<ResolvedField>,
    /// Offset map: field key to resolved offset.
    pub offsets: HashMap<FieldKey, usize>,
    accessors: HashMap<FieldKey, Accessor>,
    constructor: Procedure,
    destructor: Procedure,
    copier: CopyProcedure,
}

impl RecordLayout {
    pub fn accessor(&self, key: &FieldKey) -> Option<&Accessor> {
        self.accessors.get(key)
    }
}

/// Composite native type with C-ABI layout.
///
/// Always handled through `Arc<RecordType>`; views into memory are
/// [`Instance`]s.
pub struct RecordType {
    id: RecordId,
    name: String,
    parent: Option<Arc<RecordType>>,
    inherited: AtomicBool,
    layout: OnceLock<RecordLayout>,
    bridge: Option<Arc<dyn HostBridge>>,
    this: Weak<RecordType>,
}

/// Builder for records that need a parent or a host bridge.
#[derive(Debug)]
pub struct RecordTypeBuilder {
    name: String,
    parent: Option<Arc<RecordType>>,
    bridge: Option<Arc<dyn HostBridge>>,
}

impl RecordTypeBuilder {
    /// Inherit the layout and lifecycle of `parent`.
    #[must_use]
    pub fn extends(mut self, parent: &Arc<RecordType>) -> Self {
        self.parent = Some(Arc::clone(parent));
        self
    }

    /// Convert reads/writes through `bridge`.
    #[must_use]
    pub fn bridge(mut self, bridge: Arc<dyn HostBridge>) -> Self {
        self.bridge = Some(bridge);
        self
    }

    pub fn build(self) -> Arc<RecordType> {
        Arc::new_cyclic(|this| RecordType {
            id: RecordId::next(),
            name: self.name,
            parent: self.parent,
            inherited: AtomicBool::new(false),
            layout: OnceLock::new(),
            bridge: self.bridge,
            this: this.clone(),
        })
    }
}

impl RecordType {
    /// Root record with no fields yet.
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Self::builder(name).build()
    }

    /// Record derived from `parent`.
    pub fn extends(name: impl Into<String>, parent: &Arc<RecordType>) -> Arc<Self> {
        Self::builder(name).extends(parent).build()
    }

    /// Root record bridged to a host representation.
    pub fn with_bridge(name: impl Into<String>, bridge: Arc<dyn HostBridge>) -> Arc<Self> {
        Self::builder(name).bridge(bridge).build()
    }

    pub fn builder(name: impl Into<String>) -> RecordTypeBuilder {
        RecordTypeBuilder {
            name: name.into(),
            parent: None,
            bridge: None,
        }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&Arc<RecordType>> {
        self.parent.as_ref()
    }

    pub fn bridge(&self) -> Option<&Arc<dyn HostBridge>> {
        self.bridge.as_ref()
    }

    /// Own layout, once defined.
    pub fn layout(&self) -> Option<&RecordLayout> {
        self.layout.get()
    }

    pub fn is_defined(&self) -> bool {
        self.layout.get().is_some()
    }

    /// `true` once a derived record has been defined on top of this one.
    pub fn is_inherited(&self) -> bool {
        self.inherited.load(Ordering::Acquire)
    }

    /// Size in bytes; `None` for abstract/unsized records.
    ///
    /// An undefined record reports the size of its nearest defined ancestor
    /// (0 at the root).
    pub fn size(&self) -> Option<usize> {
        self.effective_layout().map_or(Some(0), |layout| layout.size)
    }

    pub fn align(&self) -> usize {
        self.effective_layout()
            .map_or(MIN_ALIGN, |layout| layout.align)
    }

    /// This record, then its ancestors, nearest first.
    fn lineage(&self) -> impl Iterator<Item = &RecordType> {
        std::iter::successors(Some(self), |node| node.parent.as_deref())
    }

    fn effective_layout(&self) -> Option<&RecordLayout> {
        self.lineage().find_map(|node| node.layout.get())
    }

    fn handle(&self) -> Arc<RecordType> {
        self.this
            .upgrade()
            .unwrap_or_else(|| unreachable!("record used after its last handle was dropped"))
    }

    // ========================================================================
    // Definition
    // ========================================================================

    /// Finalize with the given fields.
    pub fn define(&self, fields: Vec<FieldDef>) -> Result<()> {
        self.define_with(Definition::new(fields))
    }

    /// Finalize as an abstract record (`size() == None`).
    pub fn define_abstract(&self, fields: Vec<FieldDef>) -> Result<()> {
        self.define_with(Definition::new(fields).mark_abstract())
    }

    /// Finalize as a union: every field without an explicit offset sits at 0.
    pub fn define_as_union(&self, fields: Vec<FieldDef>) -> Result<()> {
        self.define_with(Definition::new(fields).as_union())
    }

    /// Finalize using the process-wide configuration.
    pub fn define_with(&self, definition: Definition) -> Result<()> {
        self.define_with_config(definition, &config::current())
    }

    /// Finalize using an explicit configuration.
    ///
    /// # Errors
    ///
    /// - `AlreadyDefined` / `AlreadyInherited` when the record is sealed
    /// - `UnresolvableLayout` when an implicit-offset field follows an
    ///   unsized one
    /// - `NotDefined` when a field's record type has no layout yet
    /// - `DuplicateField` when two fields share a key
    /// - `OverlappingFields` under `OverlapPolicy::Reject`
    pub fn define_with_config(&self, definition: Definition, config: &EngineConfig) -> Result<()> {
        if self.is_defined() {
            return Err(Error::AlreadyDefined {
                record: self.name.clone(),
            });
        }
        if self.is_inherited() {
            return Err(Error::AlreadyInherited {
                record: self.name.clone(),
            });
        }

        let (base_size, base_align) = match self
            .parent
            .as_deref()
            .and_then(RecordType::effective_layout)
        {
            Some(base) => (base.size, base.align),
            None => (Some(0), MIN_ALIGN),
        };

        let mut align = definition.align.unwrap_or(base_align);
        let mut cursor = base_size;
        let mut bound = base_size;
        let mut builder = DescriptorBuilder::new(self.name.clone());
        let mut fields = Vec::with_capacity(definition.fields.len());
        let mut offsets = HashMap::with_capacity(definition.fields.len());

        for FieldDef { key, ty, offset } in definition.fields {
            if !ty.is_complete() {
                return Err(Error::NotDefined {
                    record: ty.name().to_string(),
                });
            }
            let field_align = ty.align();
            let resolved = match offset {
                Some(forced) => forced,
                None => {
                    let at = cursor.ok_or_else(|| Error::UnresolvableLayout {
                        record: self.name.clone(),
                        field: key.to_string(),
                    })?;
                    align_up(at, field_align)
                }
            };

            Arc::clone(&ty).install_as_field(&mut builder, key.clone(), resolved)?;

            if definition.align.is_none() {
                align = align.max(field_align);
            }
            let size = ty.size();
            cursor = size.map(|size| resolved + size);
            bound = match (bound, cursor) {
                (Some(bound), Some(end)) => Some(bound.max(end)),
                _ => None,
            };

            offsets.insert(key.clone(), resolved);
            fields.push(ResolvedField {
                key,
                ty,
                offset: resolved,
                size,
                align: field_align,
                forced: offset.is_some(),
            });
        }

        if !definition.union {
            self.check_overlaps(&fields, config.overlap_policy)?;
        }

        let size = match definition.size {
            Some(explicit) => Some(explicit),
            None if definition.is_abstract => None,
            None => bound,
        };

        let built = builder.finish();
        let layout = RecordLayout {
            size,
            align,
            fields,
            offsets,
            accessors: built.accessors,
            constructor: built.constructor,
            destructor: built.destructor,
            copier: built.copier,
        };
        let field_count = layout.fields.len();
        self.layout.set(layout).map_err(|_| Error::AlreadyDefined {
            record: self.name.clone(),
        })?;

        // Seal the ancestor chain. Anything above a sealed node is sealed.
        let mut ancestor = self.parent.as_deref();
        while let Some(node) = ancestor {
            if node.inherited.swap(true, Ordering::AcqRel) {
                break;
            }
            ancestor = node.parent.as_deref();
        }

        log::debug!(
            "[record] defined {} (size={:?}, align={}, fields={})",
            self.name,
            size,
            align,
            field_count
        );
        Ok(())
    }

    fn check_overlaps(&self, fields: &[ResolvedField], policy: OverlapPolicy) -> Result<()> {
        if policy == OverlapPolicy::Allow {
            return Ok(());
        }
        for (i, first) in fields.iter().enumerate() {
            for second in &fields[i + 1..] {
                if !(first.forced || second.forced) {
                    continue;
                }
                let (Some(first_end), Some(second_end)) = (first.end(), second.end()) else {
                    continue;
                };
                if first_end == first.offset || second_end == second.offset {
                    continue;
                }
                if first.offset < second_end && second.offset < first_end {
                    if policy == OverlapPolicy::Reject {
                        return Err(Error::OverlappingFields {
                            record: self.name.clone(),
                            first: first.key.to_string(),
                            second: second.key.to_string(),
                        });
                    }
                    log::warn!(
                        "[record] {}: fields '{}' and '{}' overlap",
                        self.name,
                        first.key,
                        second.key
                    );
                }
            }
        }
        Ok(())
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Resolved offset of `field`, searching ancestors too.
    pub fn offset_of(&self, field: impl Into<FieldKey>) -> Result<usize> {
        let key = field.into();
        let mut defined = false;
        for layout in self.lineage().filter_map(|node| node.layout.get()) {
            defined = true;
            if let Some(offset) = layout.offsets.get(&key) {
                return Ok(*offset);
            }
        }
        Err(self.lookup_error(defined, &key))
    }

    /// Accessor of `field`, searching ancestors too.
    pub fn find_accessor(&self, field: &FieldKey) -> Result<&Accessor> {
        let mut defined = false;
        for layout in self.lineage().filter_map(|node| node.layout.get()) {
            defined = true;
            if let Some(accessor) = layout.accessors.get(field) {
                return Ok(accessor);
            }
        }
        Err(self.lookup_error(defined, field))
    }

    fn lookup_error(&self, defined: bool, key: &FieldKey) -> Error {
        if defined {
            Error::FieldNotFound {
                record: self.name.clone(),
                field: key.to_string(),
            }
        } else {
            Error::NotDefined {
                record: self.name.clone(),
            }
        }
    }

    /// Own resolved fields (empty until defined).
    pub fn fields(&self) -> &[ResolvedField] {
        self.layout
            .get()
            .map_or(&[][..], |layout| layout.fields.as_slice())
    }

    /// Inherited and own fields, root first.
    pub fn all_fields(&self) -> Vec<ResolvedField> {
        let mut chain: Vec<&RecordType> = self.lineage().collect();
        chain.reverse();
        chain
            .into_iter()
            .flat_map(|node| node.fields().iter().cloned())
            .collect()
    }

    /// `true` if `self` is `other` or derives from it.
    pub fn is_a(&self, other: &RecordType) -> bool {
        self.lineage().any(|node| node.id == other.id)
    }

    // ========================================================================
    // Addressing
    // ========================================================================

    /// Byte distance between consecutive instances.
    pub fn stride(&self) -> Result<usize> {
        self.size().ok_or_else(|| Error::UnsizedStride {
            record: self.name.clone(),
        })
    }

    /// Instance `count` strides past `instance`.
    ///
    /// # Errors
    ///
    /// - `UnsizedStride` for abstract/unsized records
    /// - `SizeOverflow` when the byte distance does not fit in `isize`
    /// - `OutsideAllocation` when `instance` lives in an owned block and the
    ///   result would not fit inside it
    pub fn next(&self, instance: &Instance, count: isize) -> Result<Instance> {
        let stride = self.stride()?;
        let overflow = || Error::SizeOverflow {
            name: self.name.clone(),
        };
        let step = isize::try_from(stride).map_err(|_| overflow())?;
        let delta = count.checked_mul(step).ok_or_else(overflow)?;

        if let Some(block) = &instance.owner {
            let offset = (instance.address().wrapping_sub(block.address()) as isize)
                .checked_add(delta)
                .ok_or_else(overflow)?;
            let fits = offset >= 0
                && offset
                    .checked_add(step)
                    .is_some_and(|end| end as usize <= block.size());
            if !fits {
                return Err(Error::OutsideAllocation {
                    offset,
                    size: block.size(),
                });
            }
        }

        let region = instance
            .region
            .address_of(delta, Nullability::NonNull)?
            .ok_or(Error::NullPointer {
                offset: delta.unsigned_abs(),
            })?;
        Ok(Instance {
            ty: self.handle(),
            region,
            owner: instance.owner.clone(),
        })
    }

    /// View the memory at `region` as an instance of this record.
    ///
    /// The view borrows nothing: `region`'s own safety contract covers it.
    pub fn at(&self, region: Region) -> Instance {
        Instance::new(self.handle(), region)
    }

    /// Allocate zeroed storage and run the composed constructor.
    ///
    /// # Errors
    ///
    /// `NotDefined` before definition, `NotInstantiable` for abstract or
    /// unsized records.
    pub fn alloc(&self) -> Result<OwnedInstance> {
        if self.effective_layout().is_none() {
            return Err(Error::NotDefined {
                record: self.name.clone(),
            });
        }
        let size = self.size().ok_or_else(|| Error::NotInstantiable {
            record: self.name.clone(),
        })?;
        let block = Arc::new(Block::new(size, self.align())?);
        // SAFETY: the instance and every view derived from it hold the block.
        let region = unsafe { block.region() };
        let instance = Instance {
            ty: self.handle(),
            region,
            owner: Some(Arc::clone(&block)),
        };
        instance.construct();
        Ok(OwnedInstance { instance, block })
    }

    /// Cached non-owning reference wrapper for this record.
    pub fn reference(&self) -> Arc<RefType> {
        registry::global().reference(&self.handle())
    }
}

impl fmt::Debug for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordType")
            .field("id", &self.id.0)
            .field("name", &self.name)
            .field("parent", &self.parent.as_ref().map(|p| p.name.as_str()))
            .field("size", &self.size())
            .field("align", &self.align())
            .field("defined", &self.is_defined())
            .finish()
    }
}

impl NativeType for RecordType {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> Option<usize> {
        RecordType::size(self)
    }

    fn align(&self) -> usize {
        RecordType::align(self)
    }

    fn is_complete(&self) -> bool {
        self.effective_layout().is_some()
    }

    fn has_constructor(&self) -> bool {
        self.lineage()
            .filter_map(|node| node.layout.get())
            .any(|layout| !layout.constructor.is_empty())
    }

    fn has_destructor(&self) -> bool {
        self.lineage()
            .filter_map(|node| node.layout.get())
            .any(|layout| !layout.destructor.is_empty())
    }

    fn construct(&self, at: Region) {
        for layout in self.lineage().filter_map(|node| node.layout.get()) {
            layout.constructor.run(at);
        }
    }

    fn destruct(&self, at: Region) {
        for layout in self.lineage().filter_map(|node| node.layout.get()) {
            layout.destructor.run(at);
        }
    }

    fn copy_construct(&self, dst: Region, src: Region) {
        let mut root = self;
        for node in self.lineage() {
            if let Some(layout) = node.layout.get() {
                layout.copier.run(dst, src);
            }
            root = node;
        }
        // A root without copy steps still owns bytes (explicit size).
        if root.layout.get().map_or(true, |layout| layout.copier.is_empty()) {
            if let Some(size) = root.size() {
                dst.copy_from(src, size, 0, 0);
            }
        }
    }

    fn read(&self, region: Region, offset: usize) -> Result<Value> {
        let instance = Instance::new(self.handle(), region.add(offset));
        match &self.bridge {
            Some(bridge) => bridge.to_host(instance),
            None => Ok(Value::Record(instance)),
        }
    }

    fn write(&self, region: Region, value: &Value, offset: usize) -> Result<()> {
        let src = match (value, &self.bridge) {
            (Value::Record(src), _) if src.ty.is_a(self) => src.region,
            (Value::Record(_), None) => return Err(Value::mismatch(self.name.clone(), value)),
            (_, Some(bridge)) => bridge
                .to_native(value)?
                .ok_or_else(|| Value::mismatch(self.name.clone(), value))?,
            (_, None) => return Err(Value::mismatch(self.name.clone(), value)),
        };
        let dst = region.add(offset);
        self.destruct(dst);
        self.copy_construct(dst, src);
        Ok(())
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

// ============================================================================
// Instances
// ============================================================================

/// Typed view of a record at an address.
///
/// Views over foreign memory own nothing. Views into a block allocated by
/// [`RecordType::alloc`] share that block, so a clone stays valid after the
/// [`OwnedInstance`] is dropped.
#[derive(Clone)]
pub struct Instance {
    ty: Arc<RecordType>,
    region: Region,
    owner: Option<Arc<Block>>,
}

impl Instance {
    pub(crate) fn new(ty: Arc<RecordType>, region: Region) -> Self {
        Self {
            ty,
            region,
            owner: None,
        }
    }

    /// Share `block` when this view points inside it and owns nothing yet.
    pub(crate) fn adopt(mut self, block: &Arc<Block>) -> Self {
        if self.owner.is_none() && block.offset_of(self.address()).is_some() {
            self.owner = Some(Arc::clone(block));
        }
        self
    }

    pub(crate) fn raw_region(&self) -> Region {
        self.region
    }

    pub fn ty(&self) -> &Arc<RecordType> {
        &self.ty
    }

    /// Address of the first byte.
    ///
    /// # Safety
    ///
    /// The region does not keep an owning block alive: use it only while
    /// this instance (or a clone) exists, and only within `ty().size()`.
    pub unsafe fn region(&self) -> Region {
        self.region
    }

    pub fn address(&self) -> usize {
        self.region.address()
    }

    /// `true` when the view keeps its backing allocation alive.
    pub fn is_owned(&self) -> bool {
        self.owner.is_some()
    }

    /// Read a field. Every call reads memory again.
    pub fn get(&self, field: impl Into<FieldKey>) -> Result<Value> {
        let value = self.ty.find_accessor(&field.into())?.get(self.region)?;
        Ok(adopt(self.owner.as_ref(), value))
    }

    /// Read a field and convert it.
    pub fn get_as<T: FromValue>(&self, field: impl Into<FieldKey>) -> Result<T> {
        T::from_value(self.get(field)?)
    }

    /// Write a field.
    pub fn set(&self, field: impl Into<FieldKey>, value: impl IntoValue) -> Result<()> {
        self.ty
            .find_accessor(&field.into())?
            .set(self.region, &value.into_value())
    }

    /// Address of a field.
    ///
    /// # Safety
    ///
    /// Same contract as [`Instance::region`].
    pub unsafe fn field_region(&self, field: impl Into<FieldKey>) -> Result<Region> {
        Ok(self.region.add(self.ty.offset_of(field)?))
    }

    pub fn construct(&self) {
        self.ty.construct(self.region);
    }

    pub fn destruct(&self) {
        self.ty.destruct(self.region);
    }

    /// Copy-construct from `src`, which must be this record or a subtype.
    pub fn copy_construct_from(&self, src: &Instance) -> Result<()> {
        self.check_source(src)?;
        self.ty.copy_construct(self.region, src.region);
        Ok(())
    }

    pub fn move_construct_from(&self, src: &Instance) -> Result<()> {
        self.check_source(src)?;
        self.ty.move_construct(self.region, src.region);
        Ok(())
    }

    /// Destruct, then copy-construct from `src`.
    pub fn assign(&self, src: &Instance) -> Result<()> {
        self.check_source(src)?;
        self.ty.destruct(self.region);
        self.ty.copy_construct(self.region, src.region);
        Ok(())
    }

    /// Instance `count` strides further.
    pub fn next(&self, count: isize) -> Result<Instance> {
        self.ty.next(self, count)
    }

    fn check_source(&self, src: &Instance) -> Result<()> {
        if src.ty.is_a(&self.ty) {
            Ok(())
        } else {
            Err(Error::TypeMismatch {
                expected: self.ty.name.clone(),
                got: src.ty.name.clone(),
            })
        }
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:#x}", self.ty.name, self.region.address())
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.ty.id == other.ty.id && self.region == other.region
    }
}

impl Eq for Instance {}

/// Record instance backed by its own allocation.
///
/// Dropping it runs the composed destructor. The memory is freed once the
/// last view sharing the block is gone too.
pub struct OwnedInstance {
    instance: Instance,
    block: Arc<Block>,
}

impl OwnedInstance {
    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    pub fn block(&self) -> &Block {
        &self.block
    }
}

impl Deref for OwnedInstance {
    type Target = Instance;

    fn deref(&self) -> &Instance {
        &self.instance
    }
}

impl Drop for OwnedInstance {
    fn drop(&mut self) {
        self.instance.destruct();
    }
}

impl fmt::Debug for OwnedInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnedInstance")
            .field("instance", &self.instance)
            .field("block", &self.block)
            .finish()
    }
}
