//! A borrowed pointer to a native value.

use std::{
    ffi::c_void,
    fmt::{self, Debug},
    marker::PhantomData,
    mem,
    ptr::NonNull,
};

/// A non-null pointer to a native struct, borrowed for the `'n` lifetime.
///
/// Everything copied out of it that still points into native memory,
/// like [`LazyNativeString<'n>`](crate::LazyNativeString), is bounded by `'n`.
///
/// The copy engine never frees or writes through this pointer.
#[derive(Copy, Clone)]
pub struct NativeRef<'n> {
    ptr: NonNull<u8>,
    /// How many bytes are known to be readable, `usize::MAX` when unknown.
    len: usize,
    _marker: PhantomData<&'n [u8]>,
}

unsafe impl Sync for NativeRef<'_> {}
unsafe impl Send for NativeRef<'_> {}

impl<'n> NativeRef<'n> {
    /// Constructs a `NativeRef` from a pointer to native memory,
    /// returning `None` if it's null.
    ///
    /// # Safety
    ///
    /// `ptr` must point to a native value with the layout of the
    /// [`StructDescriptor`](crate::StructDescriptor) it will be copied with,
    /// whose pointer fields are either null or valid to read,
    /// whose `bool` fields are 0 or 1,
    /// and which is not mutated or freed for the `'n` lifetime.
    pub unsafe fn from_ptr<T>(ptr: *const T) -> Option<Self> {
        NonNull::new(ptr as *mut u8).map(|ptr| Self {
            ptr,
            len: usize::MAX,
            _marker: PhantomData,
        })
    }

    /// Constructs a `NativeRef` from a reference to a `#[repr(C)]` value,
    /// which can only be read up to its size.
    ///
    /// # Safety
    ///
    /// The pointer fields of `value` must either be null or valid to read
    /// for the `'n` lifetime.
    pub unsafe fn from_ref<T>(value: &'n T) -> Self {
        Self {
            ptr: NonNull::from(value).cast::<u8>(),
            len: mem::size_of::<T>(),
            _marker: PhantomData,
        }
    }

    /// Constructs a `NativeRef` from a byte buffer holding a native value.
    ///
    /// # Safety
    ///
    /// The same as [`from_ref`](Self::from_ref).
    pub unsafe fn from_bytes(bytes: &'n [u8]) -> Self {
        Self {
            ptr: NonNull::from(bytes).cast::<u8>(),
            len: bytes.len(),
            _marker: PhantomData,
        }
    }

    pub fn as_ptr(self) -> *const c_void {
        self.ptr.as_ptr() as *const c_void
    }

    /// The number of readable bytes, if known.
    pub fn known_len(self) -> Option<usize> {
        if self.len == usize::MAX {
            None
        } else {
            Some(self.len)
        }
    }

    pub(crate) fn readable(self) -> usize {
        self.len
    }

    pub(crate) fn byte_ptr(self) -> *const u8 {
        self.ptr.as_ptr()
    }

    /// Advances the pointer by `offset` bytes.
    ///
    /// # Safety
    ///
    /// `offset` must be within the native value.
    pub(crate) unsafe fn add(self, offset: usize) -> Self {
        let len = if self.len == usize::MAX {
            usize::MAX
        } else {
            self.len.saturating_sub(offset)
        };
        Self {
            ptr: NonNull::new_unchecked(self.ptr.as_ptr().add(offset)),
            len,
            _marker: PhantomData,
        }
    }
}

impl Debug for NativeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeRef")
            .field("ptr", &self.ptr)
            .field("len", &self.known_len())
            .finish()
    }
}
