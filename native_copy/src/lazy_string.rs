//! A nul-terminated native string, borrowed from native memory
//! and only converted when asked to.

use std::{
    cmp::{Eq, PartialEq},
    ffi::{c_char, CStr},
    fmt::{self, Debug, Display},
    marker::PhantomData,
    ptr,
    str::Utf8Error,
};


/// A possibly null `char*` into native memory,
/// valid for as long as the native memory it was copied out of.
///
/// This has the same ABI as a `*const c_char`,
/// so copying a native `char*` field into a `LazyNativeString` is a plain byte copy,
/// and doesn't stop a struct from being copied in bulk.
///
/// Nothing is read from the pointer until [`resolve`](Self::resolve),
/// [`to_str`](Self::to_str), or [`to_cstr`](Self::to_cstr) are called,
/// and every call to `resolve` allocates a new `String`.
///
/// # Safety
///
/// When not null, the pointer must:
/// - point to a nul-terminated string that is valid to read for the `'a` lifetime.
/// - not be mutated while this is alive
/// (the same semantics as `&` references)
///
/// When the string is copied from a [`NativeRef<'a>`](crate::NativeRef),
/// the `'a` lifetime ties it to the native value,
/// so that it can't be read after that value is gone.
#[repr(transparent)]
#[derive(Copy, Clone)]
pub struct LazyNativeString<'a> {
    ptr: *const c_char,
    _marker: PhantomData<&'a c_char>,
}

unsafe impl Sync for LazyNativeString<'_> {}
unsafe impl Send for LazyNativeString<'_> {}

impl LazyNativeString<'static> {
    /// The null string, which resolves to an empty `String`.
    pub const NULL: Self = Self {
        ptr: ptr::null(),
        _marker: PhantomData,
    };
}

impl<'a> LazyNativeString<'a> {
    /// Constructs a `LazyNativeString` from a possibly null pointer.
    ///
    /// # Safety
    ///
    /// [The same as the type-level safety docs](#safety)
    pub const unsafe fn from_ptr(ptr: *const c_char) -> Self {
        Self {
            ptr,
            _marker: PhantomData,
        }
    }

    /// Constructs a `LazyNativeString` borrowing `cstr`.
    pub const fn from_cstr(cstr: &'a CStr) -> Self {
        Self {
            ptr: cstr.as_ptr(),
            _marker: PhantomData,
        }
    }

    pub fn is_null(self) -> bool {
        self.ptr.is_null()
    }

    pub const fn as_ptr(self) -> *const c_char {
        self.ptr
    }

    /// Borrows the string, or returns `None` if the pointer is null.
    ///
    /// # Performance
    ///
    /// This traverses the string to find the nul byte.
    pub fn to_cstr(self) -> Option<&'a CStr> {
        if self.ptr.is_null() {
            None
        } else {
            unsafe { Some(CStr::from_ptr(self.ptr)) }
        }
    }

    /// Borrows the string as utf8, without copying it.
    ///
    /// The null string is returned as `""`.
    pub fn to_str(self) -> Result<&'a str, Utf8Error> {
        match self.to_cstr() {
            Some(cstr) => cstr.to_str(),
            None => Ok(""),
        }
    }

    /// Copies the string into a new `String`,
    /// replacing invalid utf8 with `U+FFFD`.
    ///
    /// The null string resolves to an empty `String`.
    ///
    /// # Example
    ///
    /// ```
    /// use native_copy::LazyNativeString;
    ///
    /// let name = LazyNativeString::from_cstr(c"Test Device");
    /// assert_eq!(name.resolve(), "Test Device");
    ///
    /// assert_eq!(LazyNativeString::NULL.resolve(), "");
    /// ```
    pub fn resolve(self) -> String {
        match self.to_cstr() {
            Some(cstr) => cstr.to_string_lossy().into_owned(),
            None => String::new(),
        }
    }
}

impl Default for LazyNativeString<'_> {
    fn default() -> Self {
        LazyNativeString::NULL
    }
}

impl<'a> PartialEq for LazyNativeString<'a> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr || self.to_cstr() == other.to_cstr()
    }
}

impl<'a> Eq for LazyNativeString<'a> {}

impl Display for LazyNativeString<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_cstr() {
            Some(cstr) => Display::fmt(&cstr.to_string_lossy(), f),
            None => Ok(()),
        }
    }
}

impl Debug for LazyNativeString<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_cstr() {
            Some(cstr) => Debug::fmt(cstr, f),
            None => f.write_str("NULL"),
        }
    }
}
