// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Host-side values exchanged with native memory.

use super::{ArrayView, Instance};
use crate::error::{Error, Result};
use crate::region::Region;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A value read from, or to be written to, native memory.
#[derive(Clone)]
pub enum Value {
    // Primitives
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Pointer(Option<Region>),
    String(String),
    Bytes(Vec<u8>),

    // Views into native memory
    Record(Instance),
    Array(ArrayView),

    /// Richer host representation produced by a `HostBridge`.
    Host(Arc<dyn Any + Send + Sync>),

    Null,
}

impl Value {
    /// Variant name, used in type mismatch errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::U8(_) => "u8",
            Self::U16(_) => "u16",
            Self::U32(_) => "u32",
            Self::U64(_) => "u64",
            Self::I8(_) => "i8",
            Self::I16(_) => "i16",
            Self::I32(_) => "i32",
            Self::I64(_) => "i64",
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
            Self::Pointer(_) => "pointer",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Record(_) => "record",
            Self::Array(_) => "array",
            Self::Host(_) => "host",
            Self::Null => "null",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Record view, if this is one.
    pub fn as_record(&self) -> Option<&Instance> {
        match self {
            Self::Record(instance) => Some(instance),
            _ => None,
        }
    }

    /// Array view, if this is one.
    pub fn as_array(&self) -> Option<&ArrayView> {
        match self {
            Self::Array(view) => Some(view),
            _ => None,
        }
    }

    /// Downcast a host value.
    pub fn as_host<T: Any + Send + Sync>(&self) -> Option<&T> {
        match self {
            Self::Host(host) => host.downcast_ref::<T>(),
            _ => None,
        }
    }

    pub(crate) fn mismatch(expected: impl Into<String>, got: &Value) -> Error {
        Error::TypeMismatch {
            expected: expected.into(),
            got: got.kind_name().to_string(),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "Bool({})", v),
            Self::U8(v) => write!(f, "U8({})", v),
            Self::U16(v) => write!(f, "U16({})", v),
            Self::U32(v) => write!(f, "U32({})", v),
            Self::U64(v) => write!(f, "U64({})", v),
            Self::I8(v) => write!(f, "I8({})", v),
            Self::I16(v) => write!(f, "I16({})", v),
            Self::I32(v) => write!(f, "I32({})", v),
            Self::I64(v) => write!(f, "I64({})", v),
            Self::F32(v) => write!(f, "F32({})", v),
            Self::F64(v) => write!(f, "F64({})", v),
            Self::Pointer(v) => write!(f, "Pointer({:?})", v),
            Self::String(v) => write!(f, "String({:?})", v),
            Self::Bytes(v) => write!(f, "Bytes({:?})", v),
            Self::Record(v) => write!(f, "Record({:?})", v),
            Self::Array(v) => write!(f, "Array({:?})", v),
            Self::Host(_) => write!(f, "Host(..)"),
            Self::Null => write!(f, "Null"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::U8(a), Self::U8(b)) => a == b,
            (Self::U16(a), Self::U16(b)) => a == b,
            (Self::U32(a), Self::U32(b)) => a == b,
            (Self::U64(a), Self::U64(b)) => a == b,
            (Self::I8(a), Self::I8(b)) => a == b,
            (Self::I16(a), Self::I16(b)) => a == b,
            (Self::I32(a), Self::I32(b)) => a == b,
            (Self::I64(a), Self::I64(b)) => a == b,
            (Self::F32(a), Self::F32(b)) => a == b,
            (Self::F64(a), Self::F64(b)) => a == b,
            (Self::Pointer(a), Self::Pointer(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            (Self::Record(a), Self::Record(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Host(a), Self::Host(b)) => Arc::ptr_eq(a, b),
            (Self::Null, Self::Null) => true,
            _ => false,
        }
    }
}

/// Conversion out of a `Value`.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self>;
}

/// Conversion into a `Value`.
pub trait IntoValue {
    fn into_value(self) -> Value;
}

macro_rules! impl_value_conversions {
    ($ty:ty, $variant:ident, $name:expr) => {
        impl FromValue for $ty {
            fn from_value(value: Value) -> Result<Self> {
                match value {
                    Value::$variant(v) => Ok(v),
                    other => Err(Value::mismatch($name, &other)),
                }
            }
        }

        impl IntoValue for $ty {
            fn into_value(self) -> Value {
                Value::$variant(self)
            }
        }

        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$variant(v)
            }
        }
    };
}

impl_value_conversions!(bool, Bool, "bool");
impl_value_conversions!(u8, U8, "u8");
impl_value_conversions!(u16, U16, "u16");
impl_value_conversions!(u32, U32, "u32");
impl_value_conversions!(u64, U64, "u64");
impl_value_conversions!(i8, I8, "i8");
impl_value_conversions!(i16, I16, "i16");
impl_value_conversions!(i32, I32, "i32");
impl_value_conversions!(i64, I64, "i64");
impl_value_conversions!(f32, F32, "f32");
impl_value_conversions!(f64, F64, "f64");
impl_value_conversions!(String, String, "string");
impl_value_conversions!(Vec<u8>, Bytes, "bytes");
impl_value_conversions!(Instance, Record, "record");
impl_value_conversions!(ArrayView, Array, "array");

impl FromValue for Option<Region> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Pointer(p) => Ok(p),
            Value::Null => Ok(None),
            other => Err(Value::mismatch("pointer", &other)),
        }
    }
}

impl IntoValue for Option<Region> {
    fn into_value(self) -> Value {
        Value::Pointer(self)
    }
}

/// Nullable record reference (`Null` maps to `None`).
impl FromValue for Option<Instance> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Record(instance) => Ok(Some(instance)),
            Value::Null => Ok(None),
            other => Err(Value::mismatch("record or null", &other)),
        }
    }
}

impl IntoValue for Option<Instance> {
    fn into_value(self) -> Value {
        self.map_or(Value::Null, Value::Record)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::String(self.to_string())
    }
}

impl IntoValue for &Instance {
    fn into_value(self) -> Value {
        Value::Record(self.clone())
    }
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}
