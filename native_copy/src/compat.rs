//! Which managed value kinds may be bound to which native type names.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::{
    managed::ManagedKind,
    primitives::{is_pointer_name, is_string_name, normalize_type_name},
};

use self::ManagedKind as MK;

const SIGNED_OR_UNSIGNED_8: &[ManagedKind] = &[MK::I8, MK::U8];
const SIGNED_LONG: &[ManagedKind] = &[MK::I64, MK::I32, MK::Isize];
const UNSIGNED_LONG: &[ManagedKind] = &[MK::U64, MK::U32, MK::Usize];
const STRING: &[ManagedKind] = &[MK::LazyString, MK::Pointer];
const POINTER: &[ManagedKind] = &[MK::Pointer];

/// Native type names and the managed kinds they bind to.
///
/// Types whose size depends on the target (`long`, `size_t`...)
/// list every candidate, the size check in registration picks among them.
const COMPATIBILITY_TABLE: &[(&[&str], &[ManagedKind])] = &[
    (
        &[
            "int8_t",
            "uint8_t",
            "int8",
            "uint8",
            "char",
            "signed char",
            "unsigned char",
        ],
        SIGNED_OR_UNSIGNED_8,
    ),
    (&["bool", "_Bool"], &[MK::Bool]),
    (&["int16_t", "int16", "short"], &[MK::I16]),
    (&["uint16_t", "uint16", "unsigned short"], &[MK::U16]),
    (&["int32_t", "int32", "int"], &[MK::I32]),
    (&["uint32_t", "uint32", "unsigned int", "unsigned"], &[MK::U32]),
    (&["int64_t", "int64"], &[MK::I64]),
    (&["uint64_t", "uint64"], &[MK::U64]),
    (&["long", "long long"], SIGNED_LONG),
    (&["unsigned long", "unsigned long long"], UNSIGNED_LONG),
    (&["float", "float32"], &[MK::F32]),
    (&["double", "float64"], &[MK::F64]),
    (&["size_t", "uintptr_t"], &[MK::Usize, MK::U64, MK::U32]),
    (&["ssize_t", "intptr_t", "ptrdiff_t"], &[MK::Isize, MK::I64, MK::I32]),
];

static COMPATIBILITY: Lazy<HashMap<&'static str, &'static [ManagedKind]>> = Lazy::new(|| {
    COMPATIBILITY_TABLE
        .iter()
        .flat_map(|&(names, kinds)| names.iter().map(move |&name| (name, kinds)))
        .collect()
});

/// The managed kinds that `native_type` may be bound to,
/// or `None` if the native type isn't a known primitive or pointer.
pub fn compatible_kinds(native_type: &str) -> Option<&'static [ManagedKind]> {
    let name = normalize_type_name(native_type);
    if is_string_name(&name) {
        Some(STRING)
    } else if is_pointer_name(&name) {
        Some(POINTER)
    } else {
        COMPATIBILITY.get(&*name).copied()
    }
}

/// Whether a managed value of kind `managed` may hold a native `native_type`.
///
/// Sizes are not checked here.
///
/// # Example
///
/// ```
/// use native_copy::{compat::is_compatible, ManagedKind};
///
/// assert!(is_compatible(ManagedKind::U8, "int8_t"));
/// assert!(is_compatible(ManagedKind::I8, "int8_t"));
/// assert!(is_compatible(ManagedKind::Pointer, "struct Node*"));
///
/// assert!(!is_compatible(ManagedKind::F32, "double"));
/// assert!(!is_compatible(ManagedKind::Pointer, "uint64_t"));
/// ```
pub fn is_compatible(managed: ManagedKind, native_type: &str) -> bool {
    compatible_kinds(native_type).map_or(false, |kinds| kinds.contains(&managed))
}
