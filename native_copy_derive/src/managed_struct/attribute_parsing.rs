use syn::{Attribute, DeriveInput, Field, Lit, Meta, MetaList, NestedMeta};

use crate::utils::{spanned_err, SynResultExt};

/// The representation attribute of the struct.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Repr {
    C,
    Transparent,
}

pub(crate) static REPR_ERROR_MSG: &str = "\n\
    the #[repr(..)] attribute must be one of the supported attributes:\n\
    \t- #[repr(C)]\n\
    \t- #[repr(transparent)]\n\
    \t- #[repr(align(<some_integer>))], along with one of the above\n\
";

pub(crate) struct ManagedStructOptions {
    pub(crate) bind_by_name: bool,
    /// The native name of each field, when it was renamed.
    pub(crate) renamed: Vec<Option<String>>,
}

pub(crate) fn parse_attrs_for_managed_struct<'a, I>(
    input: &DeriveInput,
    fields: I,
) -> Result<ManagedStructOptions, syn::Error>
where
    I: IntoIterator<Item = &'a Field>,
{
    let mut errors: Result<(), syn::Error> = Ok(());
    let mut repr = None::<Repr>;
    let mut bind_by_name = false;

    for attr in &input.attrs {
        if attr.path.is_ident("repr") {
            errors.combine_err(parse_repr(attr, &mut repr));
        } else if attr.path.is_ident("ncopy") {
            let res = ncopy_list(attr).and_then(|list| {
                let mut res: Result<(), syn::Error> = Ok(());
                for nested in &list.nested {
                    match nested {
                        NestedMeta::Meta(Meta::Path(path)) if path.is_ident("bind_by_name") => {
                            bind_by_name = true;
                        }
                        _ => res.push_err(spanned_err(nested, &"unrecognized struct attribute")),
                    }
                }
                res
            });
            errors.combine_err(res);
        }
    }

    let mut renamed = Vec::new();
    for field in fields {
        let mut rename = None::<String>;
        for attr in field.attrs.iter().filter(|a| a.path.is_ident("ncopy")) {
            let res = ncopy_list(attr).and_then(|list| {
                let mut res: Result<(), syn::Error> = Ok(());
                for nested in &list.nested {
                    match nested {
                        NestedMeta::Meta(Meta::NameValue(nv)) if nv.path.is_ident("rename") => {
                            match &nv.lit {
                                Lit::Str(name) => rename = Some(name.value()),
                                lit => res.push_err(spanned_err(
                                    lit,
                                    &"expected a string literal, ie: `rename = \"native_name\"`",
                                )),
                            }
                        }
                        _ => res.push_err(spanned_err(nested, &"unrecognized field attribute")),
                    }
                }
                res
            });
            errors.combine_err(res);
        }
        renamed.push(rename);
    }

    if repr.is_none() {
        errors.push_err(spanned_err(
            &input.ident,
            &format_args!("missing #[repr(..)] attribute{}", REPR_ERROR_MSG),
        ));
    }

    let renamed_count = renamed.iter().filter(|r| r.is_some()).count();
    if !bind_by_name && renamed_count != 0 && renamed_count != renamed.len() {
        errors.push_err(spanned_err(
            &input.ident,
            &"either every field or no field must have a `#[ncopy(rename = \"...\")]` attribute,\n\
              use `#[ncopy(bind_by_name)]` to bind the other fields by their own name",
        ));
    }

    errors?;

    Ok(ManagedStructOptions {
        bind_by_name: bind_by_name || renamed_count != 0,
        renamed,
    })
}

fn ncopy_list(attr: &Attribute) -> Result<MetaList, syn::Error> {
    match attr.parse_meta()? {
        Meta::List(list) => Ok(list),
        other => Err(spanned_err(&other, &"expected `#[ncopy(..)]`")),
    }
}

fn parse_repr(attr: &Attribute, repr: &mut Option<Repr>) -> Result<(), syn::Error> {
    let list = match attr.parse_meta()? {
        Meta::List(list) => list,
        other => return Err(spanned_err(&other, &REPR_ERROR_MSG)),
    };

    let mut res: Result<(), syn::Error> = Ok(());
    for nested in &list.nested {
        let kind = match nested {
            NestedMeta::Meta(Meta::Path(path)) if path.is_ident("C") => Repr::C,
            NestedMeta::Meta(Meta::Path(path)) if path.is_ident("transparent") => Repr::Transparent,
            NestedMeta::Meta(Meta::List(list)) if list.path.is_ident("align") => continue,
            _ => {
                res.push_err(spanned_err(nested, &REPR_ERROR_MSG));
                continue;
            }
        };
        match *repr {
            Some(prev) if prev != kind => res.push_err(spanned_err(
                nested,
                &format_args!("Attempting to override {:?} representation with {:?}.", prev, kind),
            )),
            _ => *repr = Some(kind),
        }
    }
    res
}
