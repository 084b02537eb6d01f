use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{ext::IdentExt, Data, DeriveInput, GenericParam, Index, Member};

use crate::utils::spanned_err;

mod attribute_parsing;

#[cfg(test)]
mod tests;

use self::attribute_parsing::parse_attrs_for_managed_struct;

pub(crate) fn derive(input: DeriveInput) -> Result<TokenStream2, syn::Error> {
    let data = match &input.data {
        Data::Struct(data) => data,
        Data::Enum(data) => {
            return Err(spanned_err(
                &data.enum_token,
                &"ManagedStruct can only be derived for structs",
            ))
        }
        Data::Union(data) => {
            return Err(spanned_err(
                &data.union_token,
                &"ManagedStruct can only be derived for structs",
            ))
        }
    };

    let mut lifetime = None;
    for param in &input.generics.params {
        match param {
            GenericParam::Lifetime(def) if lifetime.is_none() => lifetime = Some(&def.lifetime),
            GenericParam::Lifetime(def) => {
                return Err(spanned_err(
                    def,
                    &"ManagedStruct types can have at most one lifetime parameter",
                ))
            }
            GenericParam::Type(_) | GenericParam::Const(_) => {
                return Err(spanned_err(
                    param,
                    &"ManagedStruct types can't have type or const parameters",
                ))
            }
        }
    }

    let options = parse_attrs_for_managed_struct(&input, &data.fields)?;

    let name = &input.ident;
    let name_str = name.to_string();
    let where_clause = &input.generics.where_clause;

    let (impl_generics, self_ty, static_ty, native_lt) = match lifetime {
        Some(lt) => (
            quote!(<#lt>),
            quote!(#name<#lt>),
            quote!(#name<'static>),
            quote!(#lt),
        ),
        None => (
            quote!(<'__n>),
            quote!(#name),
            quote!(#name),
            quote!('__n),
        ),
    };

    let binding = if options.bind_by_name {
        quote!(ByName)
    } else {
        quote!(Positional)
    };

    let field_layouts = data
        .fields
        .iter()
        .zip(&options.renamed)
        .enumerate()
        .map(|(i, (field, rename))| {
            let (member, field_name) = match &field.ident {
                Some(ident) => (Member::Named(ident.clone()), ident.unraw().to_string()),
                None => (Member::Unnamed(Index::from(i)), i.to_string()),
            };
            let native_name = match rename {
                Some(rename) => quote!(Some(#rename)),
                None => quote!(None),
            };
            let ty = &field.ty;

            quote!(
                __ncopy::ManagedFieldLayout {
                    name: #field_name,
                    native_name: #native_name,
                    offset: ::core::mem::offset_of!(#self_ty, #member),
                    size: ::core::mem::size_of::<#ty>(),
                    shape: <#ty as __ncopy::ManagedField<#native_lt>>::SHAPE,
                }
            )
        });

    Ok(quote!(
        const _: () = {
            use ::native_copy::managed as __ncopy;

            unsafe impl #impl_generics __ncopy::ManagedStruct<#native_lt> for #self_ty
            #where_clause
            {
                type StaticEquivalent = #static_ty;

                const LAYOUT: &'static __ncopy::ManagedLayout = &__ncopy::ManagedLayout {
                    name: #name_str,
                    size: ::core::mem::size_of::<#self_ty>(),
                    alignment: ::core::mem::align_of::<#self_ty>(),
                    binding: __ncopy::FieldBinding::#binding,
                    fields: &[ #( #field_layouts, )* ],
                };
            }

            unsafe impl #impl_generics __ncopy::ManagedField<#native_lt> for #self_ty
            #where_clause
            {
                const SHAPE: &'static __ncopy::FieldShape = &__ncopy::FieldShape::Nested(
                    __ncopy::TypeIdent::of::<#static_ty>(#name_str)
                );
            }
        };
    ))
}
