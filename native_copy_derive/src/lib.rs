/*!
An implementation detail of native_copy.
*/

extern crate proc_macro;

mod managed_struct;
mod utils;

use proc_macro::TokenStream as TokenStream1;
use proc_macro2::TokenStream as TokenStream2;

use syn::DeriveInput;

/**
Implements `ManagedStruct` and `ManagedField` for a struct,
so that native values can be copied into it.

The struct must be `#[repr(C)]` or `#[repr(transparent)]`,
can't have type parameters, and can have up to one lifetime parameter,
the lifetime of the native memory that `LazyNativeString` fields borrow.

By default the fields are bound to the native fields by position.

# Attributes

- `#[ncopy(rename = "native_name")]` (field):
binds the field to the native field with that name.
Either all fields are renamed or none are,
unless `#[ncopy(bind_by_name)]` is used.

- `#[ncopy(bind_by_name)]` (struct):
binds every field to the native field with the same name,
or the name given with `rename`.

This macro is documented in native_copy::managed.
*/
#[proc_macro_derive(ManagedStruct, attributes(ncopy))]
pub fn derive_managed_struct(input: TokenStream1) -> TokenStream1 {
    syn::parse::<DeriveInput>(input)
        .and_then(managed_struct::derive)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

#[cfg(test)]
fn derive_managed_struct_from_str(s: &str) -> Result<TokenStream2, syn::Error> {
    syn::parse_str::<DeriveInput>(s).and_then(managed_struct::derive)
}
