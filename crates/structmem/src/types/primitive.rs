// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Primitive native types.

use super::builder::install;
use super::{DescriptorBuilder, FieldKey, NativeType, TypeRef};
use crate::config::POINTER_WIDTH;
use crate::error::{Error, Result};
use crate::region::{Encoding, Region};
use crate::Value;
use std::sync::{Arc, OnceLock};

/// Primitive type kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    /// Untyped nullable pointer.
    Pointer,
    /// Inline, null-terminated string buffer of `capacity` bytes.
    String { capacity: usize, encoding: Encoding },
    /// Raw byte buffer of `len` bytes.
    Buffer { len: usize },
}

impl PrimitiveKind {
    /// Size in bytes.
    pub fn size(&self) -> usize {
        match self {
            Self::Bool | Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::U64 | Self::I64 | Self::F64 => 8,
            Self::Pointer => POINTER_WIDTH,
            Self::String { capacity, .. } => *capacity,
            Self::Buffer { len } => *len,
        }
    }

    /// C ABI alignment on the host target.
    pub fn alignment(&self) -> usize {
        match self {
            Self::Bool | Self::U8 | Self::I8 | Self::Buffer { .. } => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::U64 | Self::I64 | Self::F64 => 8,
            Self::Pointer => POINTER_WIDTH,
            Self::String { encoding, .. } => encoding.unit_size(),
        }
    }

    fn default_name(&self) -> String {
        match self {
            Self::Bool => "bool".into(),
            Self::U8 => "uint8_t".into(),
            Self::U16 => "uint16_t".into(),
            Self::U32 => "uint32_t".into(),
            Self::U64 => "uint64_t".into(),
            Self::I8 => "int8_t".into(),
            Self::I16 => "int16_t".into(),
            Self::I32 => "int32_t".into(),
            Self::I64 => "int64_t".into(),
            Self::F32 => "float32_t".into(),
            Self::F64 => "float64_t".into(),
            Self::Pointer => "void*".into(),
            Self::String { capacity, encoding } => match encoding {
                Encoding::Utf16 => format!("char16_t[{}]", capacity / 2),
                Encoding::Utf8 | Encoding::Latin1 => format!("char[{}]", capacity),
            },
            Self::Buffer { len } => format!("uint8_t[{}]", len),
        }
    }
}

/// Plain-data native type: trivial lifecycle, byte copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Primitive {
    name: String,
    kind: PrimitiveKind,
}

impl Primitive {
    pub fn new(kind: PrimitiveKind) -> Self {
        Self {
            name: kind.default_name(),
            kind,
        }
    }

    /// Same layout under another name (e.g. a C typedef).
    pub fn named(name: impl Into<String>, kind: PrimitiveKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn kind(&self) -> PrimitiveKind {
        self.kind
    }

    fn mismatch(&self, got: &Value) -> Error {
        Value::mismatch(self.name.clone(), got)
    }
}

impl NativeType for Primitive {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> Option<usize> {
        Some(self.kind.size())
    }

    fn align(&self) -> usize {
        self.kind.alignment()
    }

    // @audit-ok: Simple pattern matching - read dispatch table
    fn read(&self, region: Region, offset: usize) -> Result<Value> {
        Ok(match self.kind {
            PrimitiveKind::Bool => Value::Bool(region.read_bool(offset)),
            PrimitiveKind::U8 => Value::U8(region.read_u8(offset)),
            PrimitiveKind::U16 => Value::U16(region.read_u16(offset)),
            PrimitiveKind::U32 => Value::U32(region.read_u32(offset)),
            PrimitiveKind::U64 => Value::U64(region.read_u64(offset)),
            PrimitiveKind::I8 => Value::I8(region.read_i8(offset)),
            PrimitiveKind::I16 => Value::I16(region.read_i16(offset)),
            PrimitiveKind::I32 => Value::I32(region.read_i32(offset)),
            PrimitiveKind::I64 => Value::I64(region.read_i64(offset)),
            PrimitiveKind::F32 => Value::F32(region.read_f32(offset)),
            PrimitiveKind::F64 => Value::F64(region.read_f64(offset)),
            PrimitiveKind::Pointer => Value::Pointer(region.read_nullable_pointer(offset)),
            PrimitiveKind::String { capacity, encoding } => {
                Value::String(region.read_string(encoding, Some(capacity), offset)?)
            }
            PrimitiveKind::Buffer { len } => Value::Bytes(region.read_bytes(len, offset)),
        })
    }

    fn write(&self, region: Region, value: &Value, offset: usize) -> Result<()> {
        match (self.kind, value) {
            (PrimitiveKind::Bool, Value::Bool(v)) => region.write_bool(*v, offset),
            (PrimitiveKind::U8, Value::U8(v)) => region.write_u8(*v, offset),
            (PrimitiveKind::U16, Value::U16(v)) => region.write_u16(*v, offset),
            (PrimitiveKind::U32, Value::U32(v)) => region.write_u32(*v, offset),
            (PrimitiveKind::U64, Value::U64(v)) => region.write_u64(*v, offset),
            (PrimitiveKind::I8, Value::I8(v)) => region.write_i8(*v, offset),
            (PrimitiveKind::I16, Value::I16(v)) => region.write_i16(*v, offset),
            (PrimitiveKind::I32, Value::I32(v)) => region.write_i32(*v, offset),
            (PrimitiveKind::I64, Value::I64(v)) => region.write_i64(*v, offset),
            (PrimitiveKind::F32, Value::F32(v)) => region.write_f32(*v, offset),
            (PrimitiveKind::F64, Value::F64(v)) => region.write_f64(*v, offset),
            (PrimitiveKind::Pointer, Value::Pointer(p)) => region.write_pointer(*p, offset),
            (PrimitiveKind::Pointer, Value::Null) => region.write_pointer(None, offset),
            (PrimitiveKind::String { capacity, encoding }, Value::String(text)) => {
                let encoded = encoding.encode(text)?;
                let needed = encoded.len() + encoding.unit_size();
                if needed > capacity {
                    return Err(Error::Encoding(format!(
                        "string of {} bytes exceeds capacity {}",
                        needed, capacity
                    )));
                }
                region.write_bytes(&encoded, offset);
                region.fill(0, capacity - encoded.len(), offset + encoded.len());
            }
            (PrimitiveKind::Buffer { len }, Value::Bytes(bytes)) => {
                if bytes.len() > len {
                    return Err(Error::TypeMismatch {
                        expected: self.name.clone(),
                        got: format!("{} bytes", bytes.len()),
                    });
                }
                region.write_bytes(bytes, offset);
                region.fill(0, len - bytes.len(), offset + bytes.len());
            }
            (_, other) => return Err(self.mismatch(other)),
        }
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

/// Generate shared handles for fixed-layout primitives.
///
/// One instance per kind keeps type identity stable (array cache keys).
macro_rules! shared_primitive {
    ($fn_name:ident, $kind:expr) => {
        #[doc = concat!("Shared `", stringify!($fn_name), "` type.")]
        pub fn $fn_name() -> TypeRef {
            static SHARED: OnceLock<TypeRef> = OnceLock::new();
            Arc::clone(SHARED.get_or_init(|| Arc::new(Primitive::new($kind))))
        }
    };
}

shared_primitive!(boolean, PrimitiveKind::Bool);
shared_primitive!(uint8, PrimitiveKind::U8);
shared_primitive!(uint16, PrimitiveKind::U16);
shared_primitive!(uint32, PrimitiveKind::U32);
shared_primitive!(uint64, PrimitiveKind::U64);
shared_primitive!(int8, PrimitiveKind::I8);
shared_primitive!(int16, PrimitiveKind::I16);
shared_primitive!(int32, PrimitiveKind::I32);
shared_primitive!(int64, PrimitiveKind::I64);
shared_primitive!(float32, PrimitiveKind::F32);
shared_primitive!(float64, PrimitiveKind::F64);
shared_primitive!(pointer, PrimitiveKind::Pointer);

/// Inline string of `capacity` bytes (terminator included).
pub fn string(capacity: usize, encoding: Encoding) -> TypeRef {
    Arc::new(Primitive::new(PrimitiveKind::String { capacity, encoding }))
}

/// Raw byte buffer of `len` bytes.
pub fn buffer(len: usize) -> TypeRef {
    Arc::new(Primitive::new(PrimitiveKind::Buffer { len }))
}
