// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error type shared by layout definition and memory access.

use std::fmt;

/// Errors returned by structmem operations.
///
/// Definition errors indicate an incorrect record/type declaration and are
/// never recovered internally. Access errors come from field lookups and
/// value conversions on already-defined types.
///
/// # Example
///
/// ```rust
/// use structmem::{types, Error, FieldDef, RecordType};
///
/// let tagged = RecordType::new("Tagged");
/// tagged
///     .define_abstract(vec![FieldDef::new("tag", types::int8())])
///     .expect("define");
///
/// match tagged.stride() {
///     Err(Error::UnsizedStride { record }) => assert_eq!(record, "Tagged"),
///     other => panic!("unexpected: {:?}", other),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ========================================================================
    // Definition Errors
    // ========================================================================
    /// An implicit-offset field follows a field of unknown size.
    UnresolvableLayout { record: String, field: String },
    /// `define` was called twice for the same record.
    AlreadyDefined { record: String },
    /// `define` was called on a record that is already an inheritance base.
    AlreadyInherited { record: String },
    /// Two fields were installed under the same key.
    DuplicateField { record: String, field: String },
    /// Two forced-offset fields share bytes (only under `OverlapPolicy::Reject`).
    OverlappingFields {
        record: String,
        first: String,
        second: String,
    },
    /// Stride arithmetic requested on a record of unknown size.
    UnsizedStride { record: String },
    /// Array element type has no known size.
    UnsizedArrayElement { element: String },
    /// Whole-array value assignment; assign elements individually.
    ArrayNotAssignable,
    /// Layout definition attempted on a reference wrapper.
    ReferenceRedefinition { target: String },
    /// Abstract or unsized record cannot be instantiated by value.
    NotInstantiable { record: String },
    /// Size or address arithmetic does not fit in the address space.
    SizeOverflow { name: String },

    // ========================================================================
    // Access Errors
    // ========================================================================
    /// The record has no layout yet.
    NotDefined { record: String },
    /// No field with this name on the record or its ancestors.
    FieldNotFound { record: String, field: String },
    /// Element index past the end of an array.
    IndexOutOfBounds { index: usize, length: usize },
    /// Value kind does not match the field type.
    TypeMismatch { expected: String, got: String },
    /// Non-nullable pointer read produced a null address.
    NullPointer { offset: usize },
    /// Text cannot be represented in the requested encoding.
    Encoding(String),
    /// Atomic access at an offset that is not naturally aligned.
    Misaligned { offset: usize, align: usize },
    /// Size/alignment pair rejected by the allocator.
    InvalidLayout { size: usize, align: usize },
    /// A view stepped outside the allocation that owns it.
    OutsideAllocation { offset: isize, size: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Definition
            Error::UnresolvableLayout { record, field } => write!(
                f,
                "Cannot place field '{}' of '{}': preceding field has unknown size",
                field, record
            ),
            Error::AlreadyDefined { record } => {
                write!(f, "Structure of '{}' is already defined", record)
            }
            Error::AlreadyInherited { record } => write!(
                f,
                "Cannot define structure of already inherited record '{}'",
                record
            ),
            Error::DuplicateField { record, field } => {
                write!(f, "Duplicate field '{}' in '{}'", field, record)
            }
            Error::OverlappingFields {
                record,
                first,
                second,
            } => write!(
                f,
                "Fields '{}' and '{}' of '{}' overlap",
                first, second, record
            ),
            Error::UnsizedStride { record } => write!(
                f,
                "Cannot step over unknown sized structure '{}'",
                record
            ),
            Error::UnsizedArrayElement { element } => write!(
                f,
                "Unknown size of item '{}'; arrays need item size",
                element
            ),
            Error::ArrayNotAssignable => write!(f, "Array is not assignable"),
            Error::ReferenceRedefinition { target } => write!(
                f,
                "Reference to '{}' does not take a structure definition",
                target
            ),
            Error::NotInstantiable { record } => {
                write!(f, "Cannot instantiate unsized record '{}'", record)
            }
            Error::SizeOverflow { name } => {
                write!(f, "Size of '{}' overflows the address space", name)
            }
            // Access
            Error::NotDefined { record } => write!(f, "Record '{}' is not defined", record),
            Error::FieldNotFound { record, field } => {
                write!(f, "Field not found: {}.{}", record, field)
            }
            Error::IndexOutOfBounds { index, length } => {
                write!(f, "Index out of bounds: {} >= {}", index, length)
            }
            Error::TypeMismatch { expected, got } => {
                write!(f, "Type mismatch: expected {}, got {}", expected, got)
            }
            Error::NullPointer { offset } => {
                write!(f, "Null pointer read at offset {}", offset)
            }
            Error::Encoding(msg) => write!(f, "Encoding error: {}", msg),
            Error::Misaligned { offset, align } => write!(
                f,
                "Offset {} is not aligned to {} bytes for atomic access",
                offset, align
            ),
            Error::InvalidLayout { size, align } => {
                write!(f, "Invalid allocation layout: size {}, align {}", size, align)
            }
            Error::OutsideAllocation { offset, size } => write!(
                f,
                "View at byte {} falls outside its {}-byte allocation",
                offset, size
            ),
        }
    }
}

impl std::error::Error for Error {}

/// Convenient alias for results using the crate `Error` type.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_record_and_field() {
        let err = Error::UnresolvableLayout {
            record: "Actor".into(),
            field: "pos".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Actor"));
        assert!(msg.contains("pos"));
    }

    #[test]
    fn test_error_is_std_error() {
        fn takes_error(_: &dyn std::error::Error) {}
        takes_error(&Error::ArrayNotAssignable);
    }
}
