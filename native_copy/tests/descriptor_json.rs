//! Native layouts that are loaded from JSON, as produced by an external layout tool.

#![cfg(feature = "serde_json")]

use std::ffi::{c_char, CString};

use native_copy::{
    ManagedStruct, NativeRef, RegistryBuilder, StructDescriptor, Utf8Converter,
};

#[repr(C)]
struct NativeAccount {
    balance: i64,
    owner: *const c_char,
    flags: u8,
}

#[repr(C)]
#[derive(ManagedStruct, Debug, Default, PartialEq)]
#[ncopy(bind_by_name)]
struct Account {
    #[ncopy(rename = "account_owner")]
    owner: String,
    flags: u8,
    balance: i64,
}

const ACCOUNT_JSON: &str = r#"
{
    "name": "account_t",
    "size": 24,
    "alignment": 8,
    "fields": [
        { "name": "balance", "offset": 0, "size": 8, "kind": "Primitive", "type_name": "int64_t" },
        { "name": "account_owner", "offset": 8, "size": 8, "kind": "String", "type_name": "char*" },
        { "name": "flags", "offset": 16, "size": 1, "kind": "Primitive", "type_name": "uint8_t" }
    ]
}
"#;

#[test]
#[cfg(target_pointer_width = "64")]
fn copy_with_json_layout() {
    let desc = StructDescriptor::from_json(ACCOUNT_JSON).unwrap();
    desc.verify_size(std::mem::size_of::<NativeAccount>()).unwrap();

    let mut builder = RegistryBuilder::new();
    builder
        .register_with_converter::<Account, _>(&desc, Utf8Converter)
        .unwrap();
    let registry = builder.finalize();

    let mapping = registry.get_mapping::<Account>().unwrap();
    assert_eq!(mapping.native_name(), "account_t");
    assert_eq!(mapping.fields()[0].native_name(), Some("account_owner"));
    assert_eq!(mapping.fields()[0].native_offset(), 8);

    let owner = CString::new("ada").unwrap();
    let native = NativeAccount {
        balance: -250,
        owner: owner.as_ptr(),
        flags: 0b101,
    };
    let account: Account = registry
        .copy_new(unsafe { NativeRef::from_ref(&native) })
        .unwrap();

    assert_eq!(
        account,
        Account {
            owner: "ada".into(),
            flags: 0b101,
            balance: -250,
        }
    );
}

#[test]
fn descriptors_survive_json() {
    let desc = native_copy::layout::LayoutCalculator::host()
        .compute_named_struct(
            "sample_t",
            [("id", "uint32_t"), ("tags", "char*[3]"), ("values", "double[]")],
        )
        .unwrap();

    let json = desc.to_json().unwrap();
    assert_eq!(StructDescriptor::from_json(&json).unwrap(), desc);
}

#[test]
fn malformed_json_is_an_error() {
    assert!(StructDescriptor::from_json("{\"name\": \"x\"}").is_err());
}
