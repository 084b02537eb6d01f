use crate::derive_managed_struct_from_str as derive_ms;

fn derive_ok(input: &str) -> String {
    let output = derive_ms(input)
        .unwrap_or_else(|e| panic!("derive failed:\n{}\ninput:\n{}", e, input))
        .to_string();

    println!("Output:\n{}\n", output);

    output.chars().filter(|c| !c.is_whitespace()).collect()
}

fn derive_err(input: &str) -> String {
    match derive_ms(input) {
        Ok(output) => panic!("expected an error, got:\n{}", output),
        Err(e) => e.to_string(),
    }
}

const DEVICE_DEF: &str = r##"
    #[repr(C)]
    pub struct Device {
        id: u32,
        name: String,
        value: f32,
    }
"##;

#[test]
fn positional_struct() {
    let output = derive_ok(DEVICE_DEF);

    assert!(output.contains("unsafeimpl<'__n>__ncopy::ManagedStruct<'__n>forDevice"));
    assert!(output.contains("typeStaticEquivalent=Device;"));
    assert!(output.contains("binding:__ncopy::FieldBinding::Positional"));
    assert_eq!(output.matches("__ncopy::ManagedFieldLayout{").count(), 3);

    for field in ["id", "name", "value"] {
        assert!(output.contains(&format!("name:\"{}\"", field)));
        assert!(output.contains(&format!("offset_of!(Device,{})", field)));
    }
    assert!(output.contains("<Stringas__ncopy::ManagedField<'__n>>::SHAPE"));
    assert!(output.contains("TypeIdent::of::<Device>(\"Device\")"));
}

#[test]
fn lifetime_becomes_native_lifetime() {
    let output = derive_ok(
        r##"
        #[repr(C)]
        struct View<'a> {
            id: u32,
            name: LazyNativeString<'a>,
        }
        "##,
    );

    assert!(output.contains("unsafeimpl<'a>__ncopy::ManagedStruct<'a>forView<'a>"));
    assert!(output.contains("typeStaticEquivalent=View<'static>;"));
    assert!(output.contains("offset_of!(View<'a>,name)"));
    assert!(output.contains("<LazyNativeString<'a>as__ncopy::ManagedField<'a>>::SHAPE"));
    assert!(output.contains("TypeIdent::of::<View<'static>>(\"View\")"));
}

#[test]
fn tuple_struct_fields() {
    let output = derive_ok("#[repr(transparent)] struct Meters(f64);");

    assert!(output.contains("name:\"0\""));
    assert!(output.contains("offset_of!(Meters,0)"));
}

#[test]
fn raw_identifiers() {
    let output = derive_ok("#[repr(C)] struct Token { r#type: u8 }");

    assert!(output.contains("name:\"type\""));
    assert!(output.contains("offset_of!(Token,r#type)"));
}

#[test]
fn renamed_fields_bind_by_name() {
    let output = derive_ok(
        r##"
        #[repr(C)]
        struct Renamed {
            #[ncopy(rename = "device_id")]
            id: u32,
            #[ncopy(rename = "device_name")]
            name: String,
        }
        "##,
    );

    assert!(output.contains("binding:__ncopy::FieldBinding::ByName"));
    assert!(output.contains("native_name:Some(\"device_id\")"));
    assert!(output.contains("native_name:Some(\"device_name\")"));
}

#[test]
fn bind_by_name_with_partial_renames() {
    let output = derive_ok(
        r##"
        #[repr(C)]
        #[ncopy(bind_by_name)]
        struct Partial {
            #[ncopy(rename = "device_id")]
            id: u32,
            value: f32,
        }
        "##,
    );

    assert!(output.contains("binding:__ncopy::FieldBinding::ByName"));
    assert!(output.contains("native_name:Some(\"device_id\")"));
    assert!(output.contains("native_name:None"));
}

#[test]
fn partial_renames_without_bind_by_name() {
    let err = derive_err(
        r##"
        #[repr(C)]
        struct Partial {
            #[ncopy(rename = "device_id")]
            id: u32,
            value: f32,
        }
        "##,
    );
    assert!(err.contains("either every field or no field"), "{}", err);
}

#[test]
fn check_struct_repr_attrs() {
    let missing = derive_err("struct Rectangle { x: u32, y: u32 }");
    assert!(missing.contains("missing #[repr(..)]"), "{}", missing);

    let invalid_reprs = vec!["Rust", "u8", "packed", "packed(2)", "C, packed"];
    for invalid_repr in invalid_reprs {
        let input = format!(
            "#[repr({})] struct Rectangle {{ x: u32, y: u32 }}",
            invalid_repr
        );
        let err = derive_err(&input);
        assert!(err.contains("the #[repr(..)] attribute must be"), "{}", err);
    }

    let valid_reprs = vec!["C", "transparent", "C, align(16)"];
    for valid_repr in valid_reprs {
        let input = format!("#[repr({})] struct Rectangle {{ x: u32 }}", valid_repr);
        derive_ok(&input);
    }
}

#[test]
fn rejected_type_definitions() {
    let enum_err = derive_err("#[repr(C)] enum Kind { A, B }");
    assert!(enum_err.contains("only be derived for structs"));

    let union_err = derive_err("#[repr(C)] union Bits { a: u32, b: f32 }");
    assert!(union_err.contains("only be derived for structs"));

    let type_param = derive_err("#[repr(C)] struct Wrapper<T> { x: T }");
    assert!(type_param.contains("type or const parameters"));

    let const_param = derive_err("#[repr(C)] struct Buffer<const N: usize> { x: [u8; N] }");
    assert!(const_param.contains("type or const parameters"));

    let lifetimes = derive_err("#[repr(C)] struct Two<'a, 'b> { x: &'a u8, y: &'b u8 }");
    assert!(lifetimes.contains("at most one lifetime"));
}

#[test]
fn unrecognized_attributes() {
    let err = derive_err("#[repr(C)] #[ncopy(fast)] struct A { x: u32 }");
    assert!(err.contains("unrecognized struct attribute"));

    let err = derive_err("#[repr(C)] struct A { #[ncopy(skip)] x: u32 }");
    assert!(err.contains("unrecognized field attribute"));

    let err = derive_err("#[repr(C)] struct A { #[ncopy(rename = 3)] x: u32 }");
    assert!(err.contains("expected a string literal"));
}
