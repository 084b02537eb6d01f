/*!
The layout of managed (Rust) structs that native values are copied into.

The layouts are computed at compile time by the
[`ManagedStruct`](derive@crate::ManagedStruct) derive macro.
*/

use std::{
    any::TypeId,
    ffi::c_char,
    fmt::{self, Display},
    mem,
    ptr::NonNull,
};

use crate::lazy_string::LazyNativeString;

/// The kind of a managed field that holds a single value,
/// copied from native memory byte for byte.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ManagedKind {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    Isize,
    Usize,
    F32,
    F64,
    /// A `bool`, bound to native `bool`/`_Bool`.
    ///
    /// Native values must be 0 or 1, any other byte copied into a `bool` is undefined behavior.
    Bool,
    /// A raw pointer, copied without being dereferenced.
    Pointer,
    /// A [`LazyNativeString`].
    LazyString,
}

impl Display for ManagedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ManagedKind::I8 => "i8",
            ManagedKind::U8 => "u8",
            ManagedKind::I16 => "i16",
            ManagedKind::U16 => "u16",
            ManagedKind::I32 => "i32",
            ManagedKind::U32 => "u32",
            ManagedKind::I64 => "i64",
            ManagedKind::U64 => "u64",
            ManagedKind::Isize => "isize",
            ManagedKind::Usize => "usize",
            ManagedKind::F32 => "f32",
            ManagedKind::F64 => "f64",
            ManagedKind::Bool => "bool",
            ManagedKind::Pointer => "pointer",
            ManagedKind::LazyString => "LazyNativeString",
        };
        f.write_str(s)
    }
}

/// The identity of a managed struct, used to find its registered mapping.
#[derive(Debug, Copy, Clone)]
pub struct TypeIdent {
    type_id: fn() -> TypeId,
    name: &'static str,
}

fn type_id_of<T: 'static>() -> TypeId {
    TypeId::of::<T>()
}

impl TypeIdent {
    /// The identity of `T`, which should be the `'static` equivalent of the struct.
    pub const fn of<T: 'static>(name: &'static str) -> Self {
        Self {
            type_id: type_id_of::<T>,
            name,
        }
    }

    pub fn type_id(&self) -> TypeId {
        (self.type_id)()
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeIdent {
    fn eq(&self, other: &Self) -> bool {
        self.type_id() == other.type_id()
    }
}

impl Eq for TypeIdent {}

/// Replaces the contents of the `Vec<T>` at `field` with `len` default elements,
/// returning a pointer to the first one.
///
/// # Safety
///
/// `field` must point to a valid, mutably borrowed `Vec<T>`.
pub type ResizeFn = unsafe fn(field: *mut u8, len: usize) -> *mut u8;

unsafe fn resize_vec<T: Default>(field: *mut u8, len: usize) -> *mut u8 {
    let mut fresh = Vec::<T>::with_capacity(len);
    fresh.resize_with(len, T::default);
    let vec = &mut *(field as *mut Vec<T>);
    *vec = fresh;
    vec.as_mut_ptr() as *mut u8
}

/// The shape of a managed field.
#[derive(Debug, Copy, Clone)]
pub enum FieldShape {
    /// A single value that is copied as bytes.
    Value(ManagedKind),
    /// An owned `String`, converted from a native string.
    String,
    /// `[T; N]`
    FixedArray {
        elem: &'static FieldShape,
        elem_size: usize,
        len: usize,
    },
    /// `Vec<T>`
    DynamicArray {
        elem: &'static FieldShape,
        elem_size: usize,
        resize: ResizeFn,
    },
    /// A struct that implements [`ManagedStruct`].
    Nested(TypeIdent),
}

impl Display for FieldShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldShape::Value(kind) => Display::fmt(kind, f),
            FieldShape::String => f.write_str("String"),
            FieldShape::FixedArray { elem, len, .. } => write!(f, "[{}; {}]", elem, len),
            FieldShape::DynamicArray { elem, .. } => write!(f, "Vec<{}>", elem),
            FieldShape::Nested(ident) => f.write_str(ident.name()),
        }
    }
}

/// How a managed struct's fields are matched with the native fields.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FieldBinding {
    /// The nth managed field is bound to the nth native field.
    Positional,
    /// Each managed field is bound to the native field with its `native_name`.
    ByName,
}

/// The layout of one field of a managed struct.
#[derive(Debug, Copy, Clone)]
pub struct ManagedFieldLayout {
    pub name: &'static str,
    /// The native field this is bound to, with name-based binding.
    pub native_name: Option<&'static str>,
    pub offset: usize,
    pub size: usize,
    pub shape: &'static FieldShape,
}

/// The layout of a managed struct.
#[derive(Debug, Copy, Clone)]
pub struct ManagedLayout {
    pub name: &'static str,
    pub size: usize,
    pub alignment: usize,
    pub binding: FieldBinding,
    pub fields: &'static [ManagedFieldLayout],
}

/// A type that can be a field of a [`ManagedStruct`].
///
/// `'n` is the lifetime of the native memory being copied from,
/// which only matters for fields that borrow it, like [`LazyNativeString`].
///
/// # Safety
///
/// `SHAPE` must describe `Self` exactly:
/// - `Value` types must be valid for any bit pattern a native value of a compatible
///   type can have, except for `bool`,
///   which relies on the native memory only holding 0 or 1 in `bool` fields.
/// - `FixedArray`'s `elem_size` and `len` must be the size of the element type
///   and the length of the array.
/// - `DynamicArray` must only be used for `Vec<T>`, with `elem_size` and `resize`
///   for that same `T`.
/// - `Nested` must only be used by types that implement [`ManagedStruct`],
///   with the `TypeIdent` of its `StaticEquivalent`.
pub unsafe trait ManagedField<'n> {
    const SHAPE: &'static FieldShape;
}

/// A struct that native values can be copied into.
///
/// This is implemented with the [`ManagedStruct`](derive@crate::ManagedStruct)
/// derive macro, which also implements [`ManagedField`],
/// so that the struct can be nested in other managed structs.
///
/// # Safety
///
/// `LAYOUT` must describe the size, alignment, and every field of `Self`,
/// with each field's offset and [`FieldShape`].
pub unsafe trait ManagedStruct<'n>: Sized {
    /// `Self` with all lifetimes replaced with `'static`,
    /// used as the key of the registered mapping.
    type StaticEquivalent: 'static;

    const LAYOUT: &'static ManagedLayout;
}

pub(crate) fn type_id_of_struct<'n, T>() -> TypeId
where
    T: ManagedStruct<'n>,
{
    TypeId::of::<T::StaticEquivalent>()
}

macro_rules! impl_value_field {
    ( $( $ty:ty => $kind:ident ,)* ) => {
        $(
            unsafe impl<'n> ManagedField<'n> for $ty {
                const SHAPE: &'static FieldShape = &FieldShape::Value(ManagedKind::$kind);
            }
        )*
    };
}

impl_value_field! {
    i8 => I8,
    u8 => U8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
    isize => Isize,
    usize => Usize,
    f32 => F32,
    f64 => F64,
    bool => Bool,
}

unsafe impl<'n, T> ManagedField<'n> for *const T {
    const SHAPE: &'static FieldShape = &FieldShape::Value(ManagedKind::Pointer);
}

unsafe impl<'n, T> ManagedField<'n> for *mut T {
    const SHAPE: &'static FieldShape = &FieldShape::Value(ManagedKind::Pointer);
}

unsafe impl<'n, T> ManagedField<'n> for Option<NonNull<T>> {
    const SHAPE: &'static FieldShape = &FieldShape::Value(ManagedKind::Pointer);
}

unsafe impl<'n> ManagedField<'n> for LazyNativeString<'n> {
    const SHAPE: &'static FieldShape = &FieldShape::Value(ManagedKind::LazyString);
}

unsafe impl<'n> ManagedField<'n> for String {
    const SHAPE: &'static FieldShape = &FieldShape::String;
}

unsafe impl<'n, T, const N: usize> ManagedField<'n> for [T; N]
where
    T: ManagedField<'n>,
{
    const SHAPE: &'static FieldShape = &FieldShape::FixedArray {
        elem: T::SHAPE,
        elem_size: mem::size_of::<T>(),
        len: N,
    };
}

unsafe impl<'n, T> ManagedField<'n> for Vec<T>
where
    T: ManagedField<'n> + Default,
{
    const SHAPE: &'static FieldShape = &FieldShape::DynamicArray {
        elem: T::SHAPE,
        elem_size: mem::size_of::<T>(),
        resize: resize_vec::<T>,
    };
}

const _: () = {
    assert!(mem::size_of::<LazyNativeString<'static>>() == mem::size_of::<*const c_char>());
};
