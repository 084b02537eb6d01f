/*!
Validated copying of native (C ABI) structs into Rust structs.

A native struct is described by a [`StructDescriptor`],
either computed from its field types by the [layout calculator](crate::layout),
or loaded from an external source.
Rust structs that derive [`ManagedStruct`] are registered against those descriptors,
which checks that every field is compatible with its native counterpart,
and then native values can be copied into them.

These are the steps to copy native values:

1. Describe the native struct, usually with [`layout::compute_layout`].

2. Register each managed struct in a [`RegistryBuilder`],
nested structs before the structs that contain them.

3. Finalize the builder into a [`Registry`], which is read-only and can be shared between threads.

4. Copy with [`Registry::copy`], from a [`NativeRef`] to the native value.

Structs whose native and managed layouts are identical are copied in bulk,
other structs are copied field by field,
converting native strings into `String`s with a [`StringConverter`],
and native `{T* data; size_t count;}` arrays into `Vec`s.

# Example

```
use native_copy::{
    layout::compute_layout, LazyNativeString, ManagedStruct, NativeRef, RegistryBuilder,
    Utf8Converter,
};

use std::ffi::c_char;

// The native struct, as a C library would declare it.
#[repr(C)]
struct NativeDevice {
    id: u32,
    name: *const c_char,
    value: f32,
}

#[repr(C)]
#[derive(ManagedStruct, Debug, Default)]
struct Device {
    id: u32,
    name: String,
    value: f32,
}

#[repr(C)]
#[derive(ManagedStruct, Debug, Default)]
struct DeviceView<'n> {
    id: u32,
    name: LazyNativeString<'n>,
    value: f32,
}

let desc = compute_layout(&["uint32_t", "char*", "float"]).unwrap();

let mut builder = RegistryBuilder::new();
builder.register_with_converter::<Device, _>(&desc, Utf8Converter).unwrap();
builder.register::<DeviceView<'_>>(&desc).unwrap();
let registry = builder.finalize();

let native = NativeDevice {
    id: 42,
    name: c"Test Device".as_ptr(),
    value: 3.14,
};
let native_ref = unsafe { NativeRef::from_ref(&native) };

let device: Device = registry.copy_new(native_ref).unwrap();
assert_eq!(device.id, 42);
assert_eq!(device.name, "Test Device");
assert_eq!(device.value, 3.14);

// The string is only read when resolved.
let view: DeviceView<'_> = registry.copy_new(native_ref).unwrap();
assert_eq!(view.name.resolve(), "Test Device");
```

*/

#![warn(rust_2018_idioms)]

extern crate self as native_copy;

pub use native_copy_derive::ManagedStruct;

pub mod compat;
pub mod converter;
mod copy;
pub mod descriptor;
pub mod direct;
pub mod errors;
pub mod global;
pub mod layout;
pub mod lazy_string;
pub mod managed;
pub mod native_ref;
pub mod primitives;
pub mod registry;

#[doc(hidden)]
pub mod test_utils;

pub use crate::{
    converter::{SharedConverter, StringConverter, Utf8Converter},
    descriptor::{ArrayElement, FieldDescriptor, FieldKind, StructDescriptor},
    errors::{
        CopyError, ExpectedFound, FieldError, FieldId, LayoutError, RegisterError,
        RegisterErrorKind,
    },
    layout::{LayoutCalculator, LayoutEntry, LayoutOptions, TrailingPadding},
    lazy_string::LazyNativeString,
    managed::{FieldShape, ManagedField, ManagedKind, ManagedLayout},
    native_ref::NativeRef,
    primitives::{probe, PlatformInfo, PrimitiveTypeInfo, PrimitiveTypeTable},
    registry::{FieldMapping, Registry, RegistryBuilder, StructMapping},
};

/// The trait implemented by [`ManagedStruct`](derive@ManagedStruct).
pub use crate::managed::ManagedStruct;
