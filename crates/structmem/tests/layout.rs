// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test/bench code readability over pedantic
#![allow(clippy::float_cmp)] // Test assertions with constants
#![allow(clippy::missing_panics_doc)] // Tests/examples panic on failure
#![allow(clippy::cast_possible_wrap)] // Test conversions
#![allow(clippy::too_many_lines)] // Example/test code

//! Layout computation: offsets, sizes, alignment, unions, arrays, references.

use std::sync::Arc;
use structmem::config::{EngineConfig, OverlapPolicy};
use structmem::types::{self, Definition, FieldDef, RecordType, TypeRef};
use structmem::{ArrayType, Block, Encoding, Error, NativeType, Value, POINTER_WIDTH};

fn point() -> Arc<RecordType> {
    let point = RecordType::new("Point");
    point
        .define(vec![
            FieldDef::new("x", types::int32()),
            FieldDef::new("y", types::int32()),
        ])
        .expect("define Point");
    point
}

#[test]
fn test_point_layout() {
    let point = point();
    assert_eq!(point.offset_of("x").expect("x"), 0);
    assert_eq!(point.offset_of("y").expect("y"), 4);
    assert_eq!(point.size(), Some(8));
    assert_eq!(point.align(), 4);
}

#[test]
fn test_derived_field_rounds_up_to_its_alignment() {
    let point = point();
    let point3 = RecordType::extends("Point3D", &point);
    point3
        .define(vec![FieldDef::new("z", types::float64())])
        .expect("define Point3D");

    assert_eq!(point3.offset_of("z").expect("z"), 8);
    assert_eq!(point3.size(), Some(16));
    assert_eq!(point3.align(), 8);
    // inherited offsets resolve from the derived record
    assert_eq!(point3.offset_of("y").expect("y"), 4);
}

#[test]
fn test_inheritance_starts_after_base_size() {
    let base = RecordType::new("Base");
    base.define(vec![
        FieldDef::new("id", types::uint32()),
        FieldDef::new("flag", types::uint8()),
    ])
    .expect("define Base");
    assert_eq!(base.size(), Some(5));

    let derived = RecordType::extends("Derived", &base);
    derived
        .define(vec![FieldDef::new("port", types::uint16())])
        .expect("define Derived");
    assert_eq!(derived.offset_of("port").expect("port"), 6);
    assert_eq!(derived.size(), Some(8));
    assert_eq!(derived.align(), 4);
}

#[test]
fn test_array_layout() {
    let array = ArrayType::make(types::int32(), 5).expect("int32[5]");
    assert_eq!(array.size(), Some(20));
    assert_eq!(array.align(), 4);
    assert_eq!(array.offset_of(2).expect("offset"), 8);
    assert_eq!(
        array.offset_of(5),
        Err(Error::IndexOutOfBounds {
            index: 5,
            length: 5
        })
    );
}

#[test]
fn test_array_of_unsized_element_is_rejected() {
    let open = RecordType::new("OpenEnded");
    open.define_abstract(vec![FieldDef::new("tag", types::int8())])
        .expect("define OpenEnded");
    let err = ArrayType::make(open, 4).expect_err("unsized element");
    assert_eq!(
        err,
        Error::UnsizedArrayElement {
            element: "OpenEnded".into()
        }
    );
}

#[test]
fn test_union_fields_alias() {
    let bits = RecordType::new("Bits");
    bits.define_as_union(vec![
        FieldDef::new("as_int", types::int32()),
        FieldDef::new("as_float", types::float32()),
    ])
    .expect("define Bits");

    assert_eq!(bits.offset_of("as_int").expect("as_int"), 0);
    assert_eq!(bits.offset_of("as_float").expect("as_float"), 0);
    assert_eq!(bits.size(), Some(4));

    let value = bits.alloc().expect("alloc Bits");
    value.set("as_float", 1.0f32).expect("set");
    assert_eq!(
        value.get_as::<i32>("as_int").expect("get"),
        1.0f32.to_bits() as i32
    );
}

#[test]
fn test_union_size_is_largest_member() {
    let wide = RecordType::new("Wide");
    wide.define_as_union(vec![
        FieldDef::new("byte", types::uint8()),
        FieldDef::new("quad", types::uint64()),
        FieldDef::new("pair", types::uint16()),
    ])
    .expect("define Wide");
    assert_eq!(wide.size(), Some(8));
    assert_eq!(wide.align(), 8);
}

#[test]
fn test_abstract_record_has_no_stride() {
    let tagged = RecordType::new("Tagged");
    tagged
        .define_abstract(vec![FieldDef::new("tag", types::int8())])
        .expect("define Tagged");
    assert_eq!(tagged.size(), None);

    let block = Block::new(16, 8).expect("alloc");
    // SAFETY: block outlives region and instance.
    let region = unsafe { block.region() };
    let instance = tagged.at(region);
    assert_eq!(
        instance.next(1).map(|_| ()),
        Err(Error::UnsizedStride {
            record: "Tagged".into()
        })
    );
    assert!(matches!(
        tagged.alloc(),
        Err(Error::NotInstantiable { .. })
    ));

    // still usable through a view
    instance.set("tag", -3i8).expect("set tag");
    assert_eq!(region.read_i8(0), -3);
}

#[test]
fn test_abstract_base_blocks_implicit_fields() {
    let tagged = RecordType::new("Tagged");
    tagged
        .define_abstract(vec![FieldDef::new("tag", types::int8())])
        .expect("define Tagged");

    let child = RecordType::extends("Child", &tagged);
    assert!(matches!(
        child.define(vec![FieldDef::new("value", types::int32())]),
        Err(Error::UnresolvableLayout { .. })
    ));

    // forced offsets remain placeable
    let placed = RecordType::extends("Placed", &tagged);
    placed
        .define(vec![FieldDef::at("value", types::int32(), 4)])
        .expect("define Placed");
    assert_eq!(placed.offset_of("value").expect("value"), 4);
    assert_eq!(placed.size(), None);
}

#[test]
fn test_next_steps_by_stride() {
    let point = point();
    let block = Block::new(24, 4).expect("alloc");
    // SAFETY: block outlives region; three Points fit in 24 bytes.
    let region = unsafe { block.region() };
    let first = point.at(region);
    let third = first.next(2).expect("next");
    assert_eq!(third.address(), first.address() + 16);
    assert_eq!(third.next(-2).expect("back"), first);

    third.set("y", 9i32).expect("set");
    assert_eq!(region.read_i32(20), 9);

    assert!(matches!(
        first.next(isize::MAX),
        Err(Error::SizeOverflow { .. })
    ));
}

#[test]
fn test_next_stays_inside_owned_block() {
    let point = point();
    let owned = point.alloc().expect("alloc Point");
    assert_eq!(owned.next(0).expect("same"), *owned.instance());
    assert_eq!(
        owned.next(1).map(|_| ()),
        Err(Error::OutsideAllocation { offset: 8, size: 8 })
    );
    assert_eq!(
        owned.next(-1).map(|_| ()),
        Err(Error::OutsideAllocation { offset: -8, size: 8 })
    );
}

#[test]
fn test_pending_record_cannot_be_embedded() {
    let late = RecordType::new("Late");
    let holder = RecordType::new("Holder");
    assert_eq!(
        holder.define(vec![FieldDef::new("late", Arc::clone(&late) as TypeRef)]),
        Err(Error::NotDefined {
            record: "Late".into()
        })
    );
    assert!(!holder.is_defined());
    assert!(matches!(
        ArrayType::make(Arc::clone(&late) as TypeRef, 3),
        Err(Error::NotDefined { .. })
    ));

    // a reference to a pending record is fine, and the array is built
    // with the real stride once the record is defined
    let linked = RecordType::new("Linked");
    linked
        .define(vec![FieldDef::new("late", late.reference())])
        .expect("define Linked");

    late.define(vec![FieldDef::new("a", types::int64())])
        .expect("define Late");
    let array = ArrayType::make(Arc::clone(&late) as TypeRef, 3).expect("Late[3]");
    assert_eq!(array.size(), Some(24));
    assert_eq!(array.offset_of(2).expect("offset"), 16);

    holder
        .define(vec![FieldDef::new("late", late)])
        .expect("define Holder after Late");
    assert_eq!(holder.size(), Some(8));
}

#[test]
fn test_reference_wrapper_is_cached() {
    let point = point();
    let first = point.reference();
    let second = point.reference();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.size(), Some(POINTER_WIDTH));
    assert_eq!(first.align(), POINTER_WIDTH);
    assert_eq!(first.size(), Some(8));
}

#[test]
fn test_forced_offset_is_verbatim() {
    let packed = RecordType::new("Packed");
    packed
        .define(vec![
            FieldDef::new("kind", types::uint8()),
            FieldDef::at("len", types::uint32(), 1),
            FieldDef::new("crc", types::uint16()),
        ])
        .expect("define Packed");

    assert_eq!(packed.offset_of("len").expect("len"), 1);
    // cursor continues after the forced field
    assert_eq!(packed.offset_of("crc").expect("crc"), 6);
    assert_eq!(packed.size(), Some(8));

    let value = packed.alloc().expect("alloc Packed");
    value.set("len", 0x0102_0304u32).expect("set");
    assert_eq!(value.get_as::<u32>("len").expect("get"), 0x0102_0304);
}

#[test]
fn test_explicit_size_overrides_bound() {
    let header = RecordType::new("Header");
    header
        .define_with(Definition::new(vec![FieldDef::new("magic", types::uint32())]).with_size(32))
        .expect("define Header");
    assert_eq!(header.size(), Some(32));

    let body = RecordType::extends("Body", &header);
    body.define(vec![FieldDef::new("first", types::uint8())])
        .expect("define Body");
    assert_eq!(body.offset_of("first").expect("first"), 32);
}

#[test]
fn test_empty_record() {
    let empty = RecordType::new("Empty");
    empty.define(vec![]).expect("define Empty");
    assert_eq!(empty.size(), Some(0));
    assert_eq!(empty.align(), 1);
    assert!(empty.alloc().is_ok());
}

#[test]
fn test_duplicate_field_is_rejected() {
    let twice = RecordType::new("Twice");
    assert_eq!(
        twice.define(vec![
            FieldDef::new("a", types::int32()),
            FieldDef::new("a", types::int16()),
        ]),
        Err(Error::DuplicateField {
            record: "Twice".into(),
            field: "a".into()
        })
    );
    assert!(!twice.is_defined());
}

#[test]
fn test_overlap_policy() {
    let strict = EngineConfig::new().with_overlap_policy(OverlapPolicy::Reject);
    let fields = || {
        vec![
            FieldDef::new("a", types::uint32()),
            FieldDef::at("b", types::uint16(), 2),
        ]
    };

    let rejected = RecordType::new("Rejected");
    assert_eq!(
        rejected.define_with_config(Definition::new(fields()), &strict),
        Err(Error::OverlappingFields {
            record: "Rejected".into(),
            first: "a".into(),
            second: "b".into()
        })
    );

    let warned = RecordType::new("Warned");
    warned
        .define_with_config(
            Definition::new(fields()),
            &EngineConfig::new().with_overlap_policy(OverlapPolicy::Warn),
        )
        .expect("warn accepts");

    let allowed = RecordType::new("Allowed");
    allowed
        .define_with_config(Definition::new(fields()), &EngineConfig::new())
        .expect("allow accepts");

    // unions alias by construction
    let union = RecordType::new("Union");
    union
        .define_with_config(Definition::new(fields()).as_union(), &strict)
        .expect("union accepts");
}

#[test]
fn test_nested_record_field() {
    let point = point();
    let line = RecordType::new("Line");
    line.define(vec![
        FieldDef::new("from", Arc::clone(&point) as TypeRef),
        FieldDef::new("to", Arc::clone(&point) as TypeRef),
        FieldDef::new("width", types::uint8()),
    ])
    .expect("define Line");

    assert_eq!(line.offset_of("to").expect("to"), 8);
    assert_eq!(line.size(), Some(17));
    assert_eq!(line.align(), 4);

    let value = line.alloc().expect("alloc Line");
    let to = value.get_as::<structmem::Instance>("to").expect("to view");
    assert_eq!(to.address(), value.address() + 8);
    assert!(to.is_owned());
    to.set("x", 3i32).expect("set");
    // SAFETY: value is alive; offset 8 lies within its 17 bytes.
    let region = unsafe { value.region() };
    assert_eq!(region.read_i32(8), 3);

    // by-value assignment copies the embedded record
    let source = point.alloc().expect("alloc Point");
    source.set("y", 11i32).expect("set");
    value.set("from", source.instance()).expect("assign");
    assert_eq!(region.read_i32(4), 11);
}

#[test]
fn test_inline_string_and_buffer_fields() {
    let named = RecordType::new("Named");
    named
        .define(vec![
            FieldDef::new("id", types::uint16()),
            FieldDef::new("name", types::string(8, Encoding::Utf16)),
            FieldDef::new("raw", types::buffer(3)),
        ])
        .expect("define Named");

    assert_eq!(named.offset_of("name").expect("name"), 2);
    assert_eq!(named.offset_of("raw").expect("raw"), 10);

    let value = named.alloc().expect("alloc Named");
    value.set("name", "abc").expect("set name");
    assert_eq!(value.get("name").expect("name"), Value::String("abc".into()));
    assert!(value.set("name", "abcd").is_err());

    value.set("raw", vec![7u8, 8]).expect("set raw");
    assert_eq!(value.get_as::<Vec<u8>>("raw").expect("raw"), vec![7, 8, 0]);
}

#[test]
fn test_self_referencing_record() {
    let node = RecordType::new("ListNode");
    let next: TypeRef = node.reference();
    node.define(vec![
        FieldDef::new("value", types::int32()),
        FieldDef::new("next", next),
    ])
    .expect("define ListNode");
    assert_eq!(node.offset_of("next").expect("next"), POINTER_WIDTH);

    let head = node.alloc().expect("alloc head");
    let tail = node.alloc().expect("alloc tail");
    tail.set("value", 2i32).expect("set");
    head.set("next", tail.instance()).expect("link");

    let followed = head
        .get_as::<Option<structmem::Instance>>("next")
        .expect("next")
        .expect("non-null");
    assert_eq!(followed.get_as::<i32>("value").expect("value"), 2);
    assert_eq!(
        tail.get_as::<Option<structmem::Instance>>("next")
            .expect("next"),
        None
    );
}

#[test]
fn test_random_layouts_hold_invariants() {
    let pool: Vec<TypeRef> = vec![
        types::boolean(),
        types::uint8(),
        types::int16(),
        types::uint32(),
        types::float32(),
        types::int64(),
        types::float64(),
        types::pointer(),
    ];

    for round in 0..200 {
        let count = fastrand::usize(1..12);
        let fields: Vec<FieldDef> = (0..count)
            .map(|i| FieldDef::new(format!("f{}", i), pool[fastrand::usize(..pool.len())].clone()))
            .collect();
        let record = RecordType::new(format!("Random{}", round));
        record.define(fields.clone()).expect("define random");

        let resolved = record.fields();
        let mut end = 0;
        let mut max_align = 1;
        for (field, declared) in resolved.iter().zip(&fields) {
            let size = declared.ty.size().expect("sized");
            let align = declared.ty.align();
            assert!(field.offset >= end, "offsets are monotonic");
            assert_eq!(field.offset % align, 0, "offsets are aligned");
            assert_eq!(
                record.offset_of(&field.key).expect("lookup"),
                field.offset
            );
            end = field.offset + size;
            max_align = max_align.max(align);
        }
        assert_eq!(record.size(), Some(end), "size is the largest bound");
        assert_eq!(record.align(), max_align);
    }
}
