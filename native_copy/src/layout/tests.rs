use super::*;

use std::mem;

use crate::primitives::PlatformInfo;

/// A 64-bit table with the usual LP64 layout, independent of the host.
fn lp64() -> PrimitiveTypeTable {
    let mut table = PrimitiveTypeTable::new(PlatformInfo {
        pointer_size: 8,
        little_endian: true,
    });
    table
        .insert("uint8", 1, 1)
        .insert("uint8_t", 1, 1)
        .insert("char", 1, 1)
        .insert("uint16_t", 2, 2)
        .insert("uint32", 4, 4)
        .insert("uint32_t", 4, 4)
        .insert("int", 4, 4)
        .insert("uint64_t", 8, 8)
        .insert("float", 4, 4)
        .insert("double", 8, 8)
        .insert("size_t", 8, 8)
        .insert("pointer", 8, 8);
    table
}

/// A 32-bit table where `double` and `uint64_t` are only 4-aligned, like i386.
fn ilp32() -> PrimitiveTypeTable {
    let mut table = PrimitiveTypeTable::new(PlatformInfo {
        pointer_size: 4,
        little_endian: true,
    });
    table
        .insert("uint8_t", 1, 1)
        .insert("uint32_t", 4, 4)
        .insert("uint64_t", 8, 4)
        .insert("double", 8, 4)
        .insert("size_t", 4, 4)
        .insert("pointer", 4, 4);
    table
}

fn offsets(desc: &StructDescriptor) -> Vec<usize> {
    desc.fields.iter().map(|f| f.offset).collect()
}

#[test]
fn mixed_fields_with_both_paddings() {
    let table = lp64();
    let types = ["uint8", "uint32", "char*", "float"];

    let native = LayoutCalculator::new(&table).compute_layout(&types).unwrap();
    assert_eq!(offsets(&native), [0, 4, 8, 16]);
    assert_eq!(native.size, 24);
    assert_eq!(native.alignment, 8);

    let packed = LayoutCalculator::new(&table)
        .with_trailing_padding(TrailingPadding::FieldPacked)
        .compute_layout(&types)
        .unwrap();
    assert_eq!(offsets(&packed), [0, 4, 8, 16]);
    assert_eq!(packed.size, 20);

    let kinds = native.fields.iter().map(|f| f.kind).collect::<Vec<_>>();
    assert_eq!(
        kinds,
        [
            FieldKind::Primitive,
            FieldKind::Primitive,
            FieldKind::String,
            FieldKind::Primitive,
        ]
    );
}

#[test]
fn deterministic() {
    let table = lp64();
    let calc = LayoutCalculator::new(&table);
    let types = ["uint16_t", "double", "uint8_t", "pointer"];
    assert_eq!(
        calc.compute_layout(&types).unwrap(),
        calc.compute_layout(&types).unwrap()
    );
}

#[test]
fn fields_never_overlap() {
    let table = lp64();
    let calc = LayoutCalculator::new(&table);
    let types = [
        "uint8_t", "uint64_t", "char", "uint16_t", "float", "char*", "uint8_t", "double", "int",
    ];
    let desc = calc.compute_layout(&types).unwrap();

    for pair in desc.fields.windows(2) {
        assert!(pair[0].end().unwrap() <= pair[1].offset, "{}", desc);
    }
    for field in &desc.fields {
        let alignment = table.get(&field.type_name).unwrap().alignment;
        assert_eq!(field.offset % alignment, 0, "{}", desc);
    }
    assert_eq!(desc.size % desc.alignment, 0);
    assert!(desc.size >= desc.fields.last().unwrap().end().unwrap());
}

#[test]
fn empty_struct() {
    let table = lp64();
    let desc = LayoutCalculator::new(&table).compute_layout(&[]).unwrap();
    assert_eq!(desc.size, 0);
    assert_eq!(desc.alignment, 1);
    assert!(desc.fields.is_empty());
}

#[test]
fn unknown_type() {
    let table = lp64();
    let err = LayoutCalculator::new(&table)
        .compute_layout(&["uint8_t", "quux"])
        .unwrap_err();
    assert_eq!(
        err,
        LayoutError::UnknownType {
            index: 1,
            type_name: "quux".into()
        }
    );
}

#[test]
fn thirty_two_bit_table() {
    let table = ilp32();
    let desc = LayoutCalculator::new(&table)
        .compute_layout(&["uint8_t", "double", "char*", "uint64_t"])
        .unwrap();

    assert_eq!(offsets(&desc), [0, 4, 12, 16]);
    assert_eq!(desc.size, 24);
    assert_eq!(desc.alignment, 4);
}

#[test]
fn fixed_arrays() {
    let table = lp64();
    let desc = LayoutCalculator::new(&table)
        .compute_layout(&["uint8_t", "uint32_t[3]", "char*[2]", "uint8_t"])
        .unwrap();

    assert_eq!(offsets(&desc), [0, 4, 16, 32]);
    assert_eq!(desc.size, 40);

    let ints = &desc.fields[1];
    assert_eq!(ints.kind, FieldKind::FixedArray);
    assert_eq!(ints.size, 12);
    assert_eq!(ints.type_name, "uint32_t[3]");
    let elem = ints.elem.as_ref().unwrap();
    assert_eq!((elem.kind, elem.size, elem.count), (FieldKind::Primitive, 4, 3));

    let strings = desc.fields[2].elem.as_ref().unwrap();
    assert_eq!((strings.kind, strings.size, strings.count), (FieldKind::String, 8, 2));
}

#[test]
fn invalid_array_lengths() {
    let table = lp64();
    let calc = LayoutCalculator::new(&table);
    for type_name in ["uint8_t[0]", "uint8_t[x]", "uint8_t[-1]"] {
        let err = calc.compute_layout(&[type_name]).unwrap_err();
        assert!(
            matches!(err, LayoutError::InvalidArrayLength { index: 0, .. }),
            "{}: {:?}",
            type_name,
            err
        );
    }
    let err = calc.compute_layout(&["quux[2]"]).unwrap_err();
    assert!(matches!(err, LayoutError::UnknownType { .. }), "{:?}", err);
}

#[test]
fn oversized_arrays() {
    let table = lp64();
    let calc = LayoutCalculator::new(&table);

    let wrapping = format!("uint64_t[{}]", usize::MAX / 8 + 1);
    let past_isize = format!("uint64_t[{}]", usize::MAX / 8);
    for type_name in [wrapping.as_str(), past_isize.as_str()] {
        let err = calc.compute_layout(&["uint8_t", type_name]).unwrap_err();
        assert!(
            matches!(err, LayoutError::InvalidArrayLength { index: 1, .. }),
            "{}: {:?}",
            type_name,
            err
        );
    }

    let point = calc.compute_layout(&["double", "double"]).unwrap();
    let err = calc
        .compute_struct("bad", [LayoutEntry::StructArray(&point, usize::MAX)])
        .unwrap_err();
    assert!(matches!(err, LayoutError::InvalidArrayLength { index: 0, .. }), "{:?}", err);
}

#[test]
fn fields_past_the_largest_size() {
    let table = lp64();
    let calc = LayoutCalculator::new(&table);

    let largest = format!("uint8_t[{}]", isize::MAX);
    let largest = largest.as_str();
    let desc = calc.compute_layout(&[largest]).unwrap();
    assert_eq!(desc.size, isize::MAX as usize);

    let err = calc.compute_layout(&[largest, "uint8_t"]).unwrap_err();
    assert_eq!(err, LayoutError::Overflow { index: 1 });

    let err = calc.compute_layout(&[largest, "uint32_t"]).unwrap_err();
    assert_eq!(err, LayoutError::Overflow { index: 1 });
}

#[test]
fn dynamic_arrays() {
    let table = lp64();
    let desc = LayoutCalculator::new(&table)
        .compute_layout(&["uint8_t", "double[]"])
        .unwrap();

    assert_eq!(offsets(&desc), [0, 8]);
    assert_eq!(desc.size, 24);

    let field = &desc.fields[1];
    assert_eq!(field.kind, FieldKind::DynamicArray);
    assert_eq!(field.size, 16);
    assert_eq!(field.type_name, "double[]");
    let elem = field.elem.as_ref().unwrap();
    assert_eq!((elem.kind, elem.size, elem.count), (FieldKind::Primitive, 8, 0));
}

#[test]
fn nested_structs() {
    let table = lp64();
    let calc = LayoutCalculator::new(&table);

    let point = calc
        .compute_layout(&["double", "double"])
        .unwrap()
        .with_name("point_t");
    assert_eq!((point.size, point.alignment), (16, 8));

    let shape = calc
        .compute_struct(
            "shape_t",
            [
                LayoutEntry::Type("uint8_t"),
                LayoutEntry::Struct(&point),
                LayoutEntry::StructArray(&point, 3),
                LayoutEntry::DynamicStructArray(&point),
            ],
        )
        .unwrap();

    assert_eq!(offsets(&shape), [0, 8, 24, 72]);
    assert_eq!(shape.size, 88);
    assert_eq!(shape.alignment, 8);

    assert_eq!(shape.fields[1].kind, FieldKind::NestedStruct);
    assert_eq!(shape.fields[1].type_name, "point_t");

    let array = shape.fields[2].elem.as_ref().unwrap();
    assert_eq!((array.kind, array.size, array.count), (FieldKind::NestedStruct, 16, 3));

    let dynamic = shape.fields[3].elem.as_ref().unwrap();
    assert_eq!((dynamic.kind, dynamic.size), (FieldKind::NestedStruct, 16));

    let err = calc
        .compute_struct("bad", [LayoutEntry::StructArray(&point, 0)])
        .unwrap_err();
    assert!(matches!(err, LayoutError::InvalidArrayLength { index: 0, .. }));
}

#[test]
fn named_structs() {
    let table = lp64();
    let desc = LayoutCalculator::new(&table)
        .compute_named_struct("device_t", [("id", "uint32_t"), ("name", "char*")])
        .unwrap();

    assert_eq!(desc.name, "device_t");
    assert_eq!(desc.field_named("name").unwrap().offset, 8);
    assert!(desc.field_named("value").is_none());
}

#[test]
fn host_layout_matches_repr_c() {
    #[repr(C)]
    #[allow(dead_code)]
    struct Sample {
        a: u8,
        b: u32,
        c: *const u8,
        d: f32,
        e: u16,
        f: f64,
    }

    let desc = compute_layout(&["uint8_t", "uint32_t", "char*", "float", "uint16_t", "double"])
        .unwrap();

    assert_eq!(
        offsets(&desc),
        [
            mem::offset_of!(Sample, a),
            mem::offset_of!(Sample, b),
            mem::offset_of!(Sample, c),
            mem::offset_of!(Sample, d),
            mem::offset_of!(Sample, e),
            mem::offset_of!(Sample, f),
        ]
    );
    assert_eq!(desc.size, mem::size_of::<Sample>());
    assert_eq!(desc.alignment, mem::align_of::<Sample>());
    desc.verify_size(mem::size_of::<Sample>()).unwrap();
}

#[test]
fn verify_size_detects_packing() {
    #[repr(C, packed)]
    #[allow(dead_code)]
    struct Packed {
        a: u8,
        b: u32,
    }

    let desc = compute_layout(&["uint8_t", "uint32_t"])
        .unwrap()
        .with_name("packed_t");

    let err = desc.verify_size(mem::size_of::<Packed>()).unwrap_err();
    assert_eq!(
        err,
        LayoutError::SizeDisagreement {
            struct_name: "packed_t".into(),
            sizes: crate::errors::ExpectedFound::new(8, 5),
        }
    );
}
