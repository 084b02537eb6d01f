/*!
A process-wide registry, for programs that register every struct at startup.

Registration goes through a builder behind a mutex,
and [`finalize`] moves it into a [`Registry`] that lives for the rest of the process,
after which [`copy`] can be called from any thread without locking.

```
use native_copy::{global, layout::compute_layout, ManagedStruct, NativeRef};

#[repr(C)]
#[derive(ManagedStruct, Debug, Default, PartialEq)]
struct Reading {
    sensor: u16,
    celsius: f32,
}

let desc = compute_layout(&["uint16_t", "float"]).unwrap();
global::register::<Reading>(&desc).unwrap();

let registry = global::finalize();
assert!(global::is_finalized());
assert_eq!(registry.len(), 1);

#[repr(C)]
struct NativeReading {
    sensor: u16,
    celsius: f32,
}
let native = NativeReading { sensor: 3, celsius: 21.5 };

let mut reading = Reading::default();
global::copy(&mut reading, unsafe { NativeRef::from_ref(&native) }).unwrap();
assert_eq!(reading, Reading { sensor: 3, celsius: 21.5 });

// registering after finalizing is an error
assert!(global::register::<Reading>(&desc).is_err());
```
*/

use once_cell::sync::{Lazy, OnceCell};
use parking_lot::Mutex;

use crate::{
    converter::StringConverter,
    descriptor::StructDescriptor,
    errors::{CopyError, RegisterError, RegisterErrorKind},
    managed::ManagedStruct,
    native_ref::NativeRef,
    registry::{Registry, RegistryBuilder},
};

/// `None` once the registry is finalized.
static BUILDER: Lazy<Mutex<Option<RegistryBuilder>>> =
    Lazy::new(|| Mutex::new(Some(RegistryBuilder::new())));

static FINALIZED: OnceCell<Registry> = OnceCell::new();

fn with_builder<'n, T, F>(f: F) -> Result<(), RegisterError>
where
    T: ManagedStruct<'n>,
    F: FnOnce(&mut RegistryBuilder) -> Result<&mut RegistryBuilder, RegisterError>,
{
    let mut guard = BUILDER.lock();
    match guard.as_mut() {
        Some(builder) => f(builder).map(drop),
        None => Err(RegisterError::new(
            T::LAYOUT.name,
            RegisterErrorKind::RegistryFinalized,
        )),
    }
}

/// Registers `T` in the global registry.
///
/// # Errors
///
/// This returns the same errors as [`RegistryBuilder::register`],
/// as well as [`RegisterErrorKind::RegistryFinalized`] after [`finalize`] is called.
pub fn register<'n, T>(native: &StructDescriptor) -> Result<(), RegisterError>
where
    T: ManagedStruct<'n>,
{
    with_builder::<T, _>(|b| b.register::<T>(native))
}

/// Registers `T` in the global registry, converting native strings with `converter`.
pub fn register_with_converter<'n, T, C>(
    native: &StructDescriptor,
    converter: C,
) -> Result<(), RegisterError>
where
    T: ManagedStruct<'n>,
    C: StringConverter + 'static,
{
    with_builder::<T, _>(|b| b.register_with_converter::<T, C>(native, converter))
}

/// Registers `T` in the global registry, panicking on error.
///
/// # Panics
///
/// If [`register`] returns an error.
#[track_caller]
pub fn must_register<'n, T>(native: &StructDescriptor)
where
    T: ManagedStruct<'n>,
{
    if let Err(e) = register::<T>(native) {
        panic!("{}", e);
    }
}

/// Finalizes the global registry, after which no more types can be registered.
///
/// Calling this more than once returns the same registry.
pub fn finalize() -> &'static Registry {
    FINALIZED.get_or_init(|| {
        let builder = BUILDER.lock().take().unwrap_or_default();
        builder.finalize()
    })
}

/// The global registry, if it was finalized.
pub fn registry() -> Option<&'static Registry> {
    FINALIZED.get()
}

pub fn is_finalized() -> bool {
    FINALIZED.get().is_some()
}

/// Copies with the global registry.
///
/// # Errors
///
/// This returns [`CopyError::NotFinalized`] before [`finalize`] is called,
/// and otherwise the same errors as [`Registry::copy`].
pub fn copy<'n, T>(dst: &mut T, src: NativeRef<'n>) -> Result<(), CopyError>
where
    T: ManagedStruct<'n>,
{
    FINALIZED
        .get()
        .ok_or(CopyError::NotFinalized)?
        .copy(dst, src)
}
