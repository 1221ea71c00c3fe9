// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Non-owning record references and host bridges.

use super::builder::install;
use super::{DescriptorBuilder, FieldKey, Instance, NativeType, RecordType};
use crate::config::POINTER_WIDTH;
use crate::error::{Error, Result};
use crate::region::Region;
use crate::Value;
use std::fmt;
use std::sync::Arc;

/// Conversion between a record's native bytes and a richer host value.
///
/// Attached to a record at construction ([`RecordType::with_bridge`]); every
/// by-value read of the record, and every dereference of its reference
/// wrapper, goes through `to_host`.
pub trait HostBridge: Send + Sync + fmt::Debug {
    /// Host value for the record at `instance`.
    fn to_host(&self, instance: Instance) -> Result<Value>;

    /// Native address backing `value`, `None` for null.
    fn to_native(&self, value: &Value) -> Result<Option<Region>>;
}

/// Pointer-sized, nullable, non-owning reference to a record.
///
/// Obtain through [`RecordType::reference`]; one wrapper exists per record.
pub struct RefType {
    target: Arc<RecordType>,
    name: String,
}

impl RefType {
    pub(crate) fn new(target: Arc<RecordType>) -> Self {
        let name = format!("{}*", target.name());
        Self { target, name }
    }

    /// Record this wrapper points to.
    pub fn target(&self) -> &Arc<RecordType> {
        &self.target
    }

    /// Reference wrappers have a fixed layout.
    ///
    /// # Errors
    ///
    /// Always `ReferenceRedefinition`.
    pub fn define(&self, _fields: Vec<super::FieldDef>) -> Result<()> {
        Err(Error::ReferenceRedefinition {
            target: self.target.name().to_string(),
        })
    }

    /// Follow the pointer stored at `region + offset`.
    pub fn deref(&self, region: Region, offset: usize) -> Option<Instance> {
        region
            .read_nullable_pointer(offset)
            .map(|pointee| self.target.at(pointee))
    }
}

impl fmt::Debug for RefType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefType")
            .field("target", &self.target.name())
            .finish()
    }
}

impl NativeType for RefType {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> Option<usize> {
        Some(POINTER_WIDTH)
    }

    fn align(&self) -> usize {
        POINTER_WIDTH
    }

    // The pointee is not owned: lifecycle is trivial, copy copies the address.
    fn copy_construct(&self, dst: Region, src: Region) {
        dst.copy_from(src, POINTER_WIDTH, 0, 0);
    }

    fn read(&self, region: Region, offset: usize) -> Result<Value> {
        let Some(instance) = self.deref(region, offset) else {
            return Ok(Value::Null);
        };
        match self.target.bridge() {
            Some(bridge) => bridge.to_host(instance),
            None => Ok(Value::Record(instance)),
        }
    }

    fn write(&self, region: Region, value: &Value, offset: usize) -> Result<()> {
        let address = match (value, self.target.bridge()) {
            (Value::Null, _) => None,
            (Value::Record(instance), _) if instance.ty().is_a(&self.target) => {
                Some(instance.raw_region())
            }
            (Value::Pointer(pointer), None) => *pointer,
            (_, Some(bridge)) => bridge.to_native(value)?,
            (_, None) => return Err(Value::mismatch(self.name.clone(), value)),
        };
        region.write_pointer(address, offset);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::Block;
    use crate::types::{self, FieldDef};

    fn node() -> Arc<RecordType> {
        let node = RecordType::new("Node");
        node.define(vec![FieldDef::new("value", types::int32())])
            .expect("define Node");
        node
    }

    #[test]
    fn test_reference_shape() {
        let node = node();
        let wrapper = node.reference();
        assert_eq!(wrapper.size(), Some(POINTER_WIDTH));
        assert_eq!(wrapper.align(), POINTER_WIDTH);
        assert_eq!(wrapper.name(), "Node*");
        assert!(!wrapper.has_constructor());
        assert!(!wrapper.has_destructor());
    }

    #[test]
    fn test_reference_redefinition_is_rejected() {
        let node = node();
        assert_eq!(
            node.reference().define(vec![]),
            Err(Error::ReferenceRedefinition {
                target: "Node".into()
            })
        );
    }

    #[test]
    fn test_null_and_non_null_reads() {
        let node = node();
        let wrapper = node.reference();
        let slot = Block::new(POINTER_WIDTH, POINTER_WIDTH).expect("alloc");
        // SAFETY: slot outlives every use of slot_region.
        let slot_region = unsafe { slot.region() };
        assert_eq!(wrapper.read(slot_region, 0).expect("read"), Value::Null);

        let pointee = node.alloc().expect("alloc Node");
        pointee.set("value", 42i32).expect("set");
        wrapper
            .write(slot_region, &Value::Record(pointee.instance().clone()), 0)
            .expect("write");

        let read = wrapper.read(slot_region, 0).expect("read");
        let instance = read.as_record().expect("record");
        assert_eq!(instance.address(), pointee.address());
        assert_eq!(instance.get("value").expect("value"), Value::I32(42));
    }

    #[test]
    fn test_write_rejects_unrelated_record() {
        let node = node();
        let other = RecordType::new("Other");
        other.define(vec![]).expect("define Other");
        let unrelated = other.alloc().expect("alloc Other");

        let slot = Block::new(POINTER_WIDTH, POINTER_WIDTH).expect("alloc");
        // SAFETY: slot outlives every use of slot_region.
        let slot_region = unsafe { slot.region() };
        let err = node
            .reference()
            .write(slot_region, &Value::Record(unrelated.instance().clone()), 0)
            .expect_err("mismatch");
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }
}
