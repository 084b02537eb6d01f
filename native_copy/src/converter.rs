//! Conversion of native strings into owned `String`s.

use std::{fmt::Debug, sync::Arc};

use crate::lazy_string::LazyNativeString;

/// Converts a native string into an owned `String`.
///
/// This is called by the copy engine for every `char*` field
/// that is copied into a `String` field, and is never given a null string
/// (null strings are copied as empty `String`s without calling the converter).
///
/// This is implemented for functions and closures:
///
/// ```
/// use native_copy::{LazyNativeString, StringConverter};
///
/// fn upper(s: LazyNativeString<'_>) -> String {
///     s.resolve().to_uppercase()
/// }
///
/// assert_eq!(upper.convert(LazyNativeString::from_cstr(c"abc")), "ABC");
/// ```
pub trait StringConverter: Send + Sync {
    fn convert(&self, s: LazyNativeString<'_>) -> String;
}

impl<F> StringConverter for F
where
    F: Fn(LazyNativeString<'_>) -> String + Send + Sync,
{
    fn convert(&self, s: LazyNativeString<'_>) -> String {
        self(s)
    }
}

/// Converts native strings as utf8, replacing invalid sequences with `U+FFFD`.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Utf8Converter;

impl StringConverter for Utf8Converter {
    fn convert(&self, s: LazyNativeString<'_>) -> String {
        s.resolve()
    }
}

/// A shared string converter, as stored in struct mappings.
pub type SharedConverter = Arc<dyn StringConverter>;

pub(crate) struct ConverterDebug<'a>(pub(crate) &'a Option<SharedConverter>);

impl Debug for ConverterDebug<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(_) => f.write_str("Some(<converter>)"),
            None => f.write_str("None"),
        }
    }
}
