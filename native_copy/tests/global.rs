//! The process-wide registry, in its own test binary since finalizing can't be undone.

use std::ffi::{c_char, CString};

use native_copy::{
    file_span, global,
    layout::compute_layout,
    test_utils::{must_panic, panic_message},
    CopyError, ManagedStruct, NativeRef, RegisterErrorKind, Utf8Converter,
};

#[repr(C)]
struct NativeUser {
    id: u64,
    name: *const c_char,
}

#[repr(C)]
#[derive(ManagedStruct, Debug, Default, PartialEq)]
struct User {
    id: u64,
    name: String,
}

#[repr(C)]
#[derive(ManagedStruct, Debug, Default, PartialEq)]
struct Late {
    id: u64,
}

#[test]
fn global_registry_lifecycle() {
    let desc = compute_layout(&["uint64_t", "char*"]).unwrap();
    let native = NativeUser { id: 0, name: std::ptr::null() };
    let mut user = User::default();

    assert!(!global::is_finalized());
    assert!(global::registry().is_none());
    assert_eq!(
        global::copy(&mut user, unsafe { NativeRef::from_ref(&native) }),
        Err(CopyError::NotFinalized)
    );

    global::register_with_converter::<User, _>(&desc, Utf8Converter).unwrap();

    let registry = global::finalize();
    assert!(global::is_finalized());
    assert!(std::ptr::eq(registry, global::finalize()));
    assert_eq!(registry.len(), 1);

    let name = CString::new("admin").unwrap();
    let native = NativeUser {
        id: 1,
        name: name.as_ptr(),
    };
    global::copy(&mut user, unsafe { NativeRef::from_ref(&native) }).unwrap();
    assert_eq!(
        user,
        User {
            id: 1,
            name: "admin".into(),
        }
    );

    let late_desc = compute_layout(&["uint64_t"]).unwrap();
    let err = global::register::<Late>(&late_desc).unwrap_err();
    assert_eq!(err.kind(), &RegisterErrorKind::RegistryFinalized);
    assert_eq!(err.type_name(), "Late");

    let payload = must_panic(file_span!(), || global::must_register::<Late>(&late_desc)).unwrap();
    let message = panic_message(&payload).unwrap();
    assert!(message.contains("Late"), "{}", message);

    assert_eq!(
        global::copy(&mut Late::default(), unsafe { NativeRef::from_ref(&native) }),
        Err(CopyError::NotRegistered { type_name: "Late" })
    );
}
