//! Checks that bulk copies and field-by-field copies produce the same values.

use std::ffi::c_void;

use rand::{rngs::StdRng, Rng, SeedableRng};

use native_copy::{layout::compute_layout, ManagedStruct, NativeRef, Registry, StructDescriptor};

#[repr(C)]
#[derive(Debug, Copy, Clone)]
struct NativeMixed {
    flag: u8,
    small: i16,
    id: u32,
    big: i64,
    ratio: f32,
    value: f64,
    history: [u16; 5],
    handle: *const c_void,
}

#[repr(C)]
#[derive(ManagedStruct, Debug, Copy, Clone, PartialEq)]
struct Bulk {
    flag: u8,
    small: i16,
    id: u32,
    big: i64,
    ratio: f32,
    value: f64,
    history: [u16; 5],
    handle: usize,
}

#[repr(C)]
#[derive(ManagedStruct, Debug, Copy, Clone, PartialEq)]
struct PerField {
    flag: u8,
    small: i16,
    id: u32,
    big: i64,
    ratio: f32,
    value: f64,
    history: [u16; 5],
    handle: *const c_void,
}

impl Default for Bulk {
    fn default() -> Self {
        Self {
            flag: 0,
            small: 0,
            id: 0,
            big: 0,
            ratio: 0.0,
            value: 0.0,
            history: [0; 5],
            handle: 0,
        }
    }
}

impl Default for PerField {
    fn default() -> Self {
        Self {
            flag: 0,
            small: 0,
            id: 0,
            big: 0,
            ratio: 0.0,
            value: 0.0,
            history: [0; 5],
            handle: std::ptr::null(),
        }
    }
}

/// The handle is described as an integer for `Bulk`, and as a pointer for `PerField`.
fn mixed_desc(handle: &str) -> StructDescriptor {
    compute_layout(&[
        "uint8_t",
        "int16_t",
        "uint32_t",
        "int64_t",
        "float",
        "double",
        "uint16_t[5]",
        handle,
    ])
    .unwrap()
    .with_name("mixed_t")
}

fn random_native(rng: &mut StdRng) -> NativeMixed {
    NativeMixed {
        flag: rng.gen(),
        small: rng.gen(),
        id: rng.gen(),
        big: rng.gen(),
        ratio: rng.gen(),
        value: rng.gen(),
        history: rng.gen(),
        handle: rng.gen::<usize>() as *const c_void,
    }
}

fn registry() -> Registry {
    let mut builder = Registry::builder();
    builder
        .register::<Bulk>(&mixed_desc("uintptr_t"))
        .unwrap()
        .register::<PerField>(&mixed_desc("void*"))
        .unwrap();
    builder.finalize()
}

#[test]
fn paths_are_chosen_per_struct() {
    let registry = registry();

    assert!(registry.get_mapping::<Bulk>().unwrap().can_fast_path());

    let per_field = registry.get_mapping::<PerField>().unwrap();
    assert!(!per_field.can_fast_path());
    assert!(!per_field.fields()[7].allows_fast_path());
    assert!(per_field.fields()[..7].iter().all(|f| f.allows_fast_path()));
}

#[test]
fn bulk_and_per_field_copies_agree() {
    let registry = registry();
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for _ in 0..500 {
        let native = random_native(&mut rng);
        let src = unsafe { NativeRef::from_ref(&native) };

        let bulk: Bulk = registry.copy_new(src).unwrap();
        let per_field: PerField = registry.copy_new(src).unwrap();

        assert_eq!(bulk.flag, native.flag);
        assert_eq!(bulk.small, native.small);
        assert_eq!(bulk.id, native.id);
        assert_eq!(bulk.big, native.big);
        assert_eq!(bulk.ratio.to_bits(), native.ratio.to_bits());
        assert_eq!(bulk.value.to_bits(), native.value.to_bits());
        assert_eq!(bulk.history, native.history);
        assert_eq!(bulk.handle, native.handle as usize);

        assert_eq!(per_field.flag, bulk.flag);
        assert_eq!(per_field.small, bulk.small);
        assert_eq!(per_field.id, bulk.id);
        assert_eq!(per_field.big, bulk.big);
        assert_eq!(per_field.ratio.to_bits(), bulk.ratio.to_bits());
        assert_eq!(per_field.value.to_bits(), bulk.value.to_bits());
        assert_eq!(per_field.history, bulk.history);
        assert_eq!(per_field.handle as usize, bulk.handle);
    }
}

#[test]
fn bulk_copies_of_slices() {
    let registry = registry();
    let mut rng = StdRng::seed_from_u64(17);

    let natives = (0..64).map(|_| random_native(&mut rng)).collect::<Vec<_>>();
    let src = unsafe { NativeRef::from_ptr(natives.as_ptr()) }.unwrap();

    let mut bulk = vec![Bulk::default(); natives.len()];
    registry.copy_slice(&mut bulk, src).unwrap();

    let mut per_field = vec![PerField::default(); natives.len()];
    registry.copy_slice(&mut per_field, src).unwrap();

    for ((native, bulk), per_field) in natives.iter().zip(&bulk).zip(&per_field) {
        assert_eq!(bulk.id, native.id);
        assert_eq!(bulk.history, native.history);
        assert_eq!(per_field.big, native.big);
        assert_eq!(per_field.handle, native.handle);
    }
}
