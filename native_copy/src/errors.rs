//! The errors returned while computing layouts, registering types, and copying.

use std::{
    error::Error as StdError,
    fmt::{self, Display},
};

use core_extensions::StringExt;


/// A pair of values that were expected to be equal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ExpectedFound<T> {
    pub expected: T,
    pub found: T,
}

impl<T> ExpectedFound<T> {
    pub const fn new(expected: T, found: T) -> Self {
        Self { expected, found }
    }

    pub fn as_ref(&self) -> ExpectedFound<&T> {
        ExpectedFound {
            expected: &self.expected,
            found: &self.found,
        }
    }

    pub fn map<F, U>(self, mut f: F) -> ExpectedFound<U>
    where
        F: FnMut(T) -> U,
    {
        ExpectedFound {
            expected: f(self.expected),
            found: f(self.found),
        }
    }

    /// Returns `Some(self)` if the two values differ.
    pub fn into_mismatch(self) -> Option<Self>
    where
        T: PartialEq,
    {
        if self.expected == self.found {
            None
        } else {
            Some(self)
        }
    }
}

impl<T: Display> Display for ExpectedFound<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected {}, found {}", self.expected, self.found)
    }
}

////////////////////////////////////////////////////////////////////////////////

/// An error from the layout calculator, or from checking a computed layout
/// against a measured one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// A type name that the primitive table doesn't recognize.
    UnknownType {
        /// The position of the type in the computed field list.
        index: usize,
        type_name: String,
    },
    /// A `T[N]` type name whose length isn't a positive integer.
    InvalidArrayLength { index: usize, type_name: String },
    /// The field at `index` would end past the largest possible struct size
    /// (`isize::MAX` bytes).
    Overflow { index: usize },
    /// The computed size disagrees with the size the native compiler reports,
    /// usually because the native struct is packed or uses forced alignment.
    SizeDisagreement {
        struct_name: String,
        /// `expected` is the computed size, `found` the measured one.
        sizes: ExpectedFound<usize>,
    },
}

impl Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutError::UnknownType { index, type_name } => write!(
                f,
                "unknown native type {:?} at field {}",
                type_name, index,
            ),
            LayoutError::InvalidArrayLength { index, type_name } => write!(
                f,
                "invalid array length in {:?} at field {}",
                type_name, index,
            ),
            LayoutError::Overflow { index } => write!(
                f,
                "field {} ends past the largest possible struct size",
                index,
            ),
            LayoutError::SizeDisagreement { struct_name, sizes } => write!(
                f,
                "computed and measured sizes of `{}` disagree ({}), \
                 the native struct may be packed",
                struct_name, sizes,
            ),
        }
    }
}

impl StdError for LayoutError {}

////////////////////////////////////////////////////////////////////////////////

/// Identifies a field of a managed struct.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct FieldId {
    pub index: usize,
    pub name: &'static str,
}

impl Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field #{} `{}`", self.index, self.name)
    }
}

/// An error returned when registering a managed type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterError {
    type_name: &'static str,
    kind: RegisterErrorKind,
}

/// What went wrong while registering a managed type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterErrorKind {
    /// The registry no longer accepts registrations.
    RegistryFinalized,
    /// `expected` is the managed field count, `found` the native one.
    FieldCountMismatch(ExpectedFound<usize>),
    /// Some native fields are named and some are not,
    /// while the managed struct binds fields by name.
    MixedBinding,
    /// A field failed validation.
    Field { field: FieldId, error: FieldError },
}

/// A single field failed validation against its native descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    UnknownType(String),
    /// `expected` is the native size, `found` the managed one.
    SizeMismatch(ExpectedFound<usize>),
    TypeIncompatible {
        native: String,
        managed: String,
    },
    /// `expected` is the native length, `found` the managed one.
    LengthMismatch(ExpectedFound<usize>),
    /// The referenced managed struct wasn't registered before this one.
    NotRegistered(&'static str),
    /// The field is a native string, and no string converter was supplied.
    NoConverter,
    /// Name-based binding found no native field with this name.
    NoSuchNativeField(String),
    /// Name-based binding bound this native field to an earlier managed field.
    DuplicateBinding(String),
    /// The native field extends past the end of the native struct.
    OutOfBounds {
        offset: usize,
        size: usize,
        native_size: usize,
    },
}

impl RegisterError {
    pub(crate) fn new(type_name: &'static str, kind: RegisterErrorKind) -> Self {
        Self { type_name, kind }
    }

    pub(crate) fn field(
        type_name: &'static str,
        field: FieldId,
        error: FieldError,
    ) -> Self {
        Self::new(type_name, RegisterErrorKind::Field { field, error })
    }

    /// The name of the managed type that failed to register.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn kind(&self) -> &RegisterErrorKind {
        &self.kind
    }

    /// The field error, if a single field was at fault.
    pub fn field_error(&self) -> Option<&FieldError> {
        match &self.kind {
            RegisterErrorKind::Field { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldError::UnknownType(name) => write!(f, "unknown native type {:?}", name),
            FieldError::SizeMismatch(v) => write!(f, "mismatched size: {}", v),
            FieldError::TypeIncompatible { native, managed } => write!(
                f,
                "native type `{}` can't be copied into managed `{}`",
                native, managed,
            ),
            FieldError::LengthMismatch(v) => write!(f, "mismatched array length: {}", v),
            FieldError::NotRegistered(name) => write!(
                f,
                "`{}` is not registered, nested types must be registered first",
                name,
            ),
            FieldError::NoConverter => f.write_str("string field requires a string converter"),
            FieldError::NoSuchNativeField(name) => {
                write!(f, "the native struct has no field named {:?}", name)
            }
            FieldError::DuplicateBinding(name) => write!(
                f,
                "the native field {:?} is already bound to another field",
                name,
            ),
            FieldError::OutOfBounds {
                offset,
                size,
                native_size,
            } => write!(
                f,
                "field of size {} at offset {} extends past the native struct size of {}",
                size, offset, native_size,
            ),
        }
    }
}

impl Display for RegisterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "could not register `{}`: ", self.type_name)?;
        match &self.kind {
            RegisterErrorKind::RegistryFinalized => {
                f.write_str("the registry was already finalized")
            }
            RegisterErrorKind::FieldCountMismatch(v) => {
                write!(f, "mismatched field count: {}", v)
            }
            RegisterErrorKind::MixedBinding => {
                f.write_str("the native fields mix named and unnamed fields")
            }
            RegisterErrorKind::Field { field, error } => {
                write!(f, "\n{}", format!("{}: {}", field, error).left_padder(4))
            }
        }
    }
}

impl StdError for RegisterError {}

////////////////////////////////////////////////////////////////////////////////

/// An error returned while copying a native value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyError {
    /// The process-wide registry hasn't been finalized.
    NotFinalized,
    NilDestination,
    NilSource,
    /// The managed type was never registered.
    NotRegistered { type_name: &'static str },
    /// The native source is shorter than the registered native size.
    /// `expected` is the required length, `found` the readable one.
    SourceTooSmall(ExpectedFound<usize>),
    FieldIndexOutOfRange { index: usize, field_count: usize },
    /// A native dynamic array has a null data pointer and a nonzero count.
    NullArrayData { count: usize },
    /// A native dynamic array is too long to allocate.
    ArrayTooLarge { count: usize },
    /// A string field was reached without a converter.
    MissingConverter,
    /// Copying a field failed.
    Field {
        struct_name: &'static str,
        field: FieldId,
        error: Box<CopyError>,
    },
}

impl CopyError {
    /// Returns the innermost error, skipping every field that wraps it.
    pub fn root_cause(&self) -> &CopyError {
        let mut this = self;
        while let CopyError::Field { error, .. } = this {
            this = error;
        }
        this
    }

    /// The chain of fields leading to the innermost error, outermost first.
    pub fn field_path(&self) -> Vec<FieldId> {
        let mut path = Vec::new();
        let mut this = self;
        while let CopyError::Field { field, error, .. } = this {
            path.push(*field);
            this = error;
        }
        path
    }
}

impl Display for CopyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CopyError::NotFinalized => f.write_str("the registry was not finalized"),
            CopyError::NilDestination => f.write_str("the destination pointer is null"),
            CopyError::NilSource => f.write_str("the native source pointer is null"),
            CopyError::NotRegistered { type_name } => {
                write!(f, "`{}` is not registered", type_name)
            }
            CopyError::SourceTooSmall(v) => write!(f, "native source is too small: {}", v),
            CopyError::FieldIndexOutOfRange { index, field_count } => write!(
                f,
                "field index {} is out of range for a struct with {} fields",
                index, field_count,
            ),
            CopyError::NullArrayData { count } => write!(
                f,
                "native array has a null data pointer and {} elements",
                count,
            ),
            CopyError::ArrayTooLarge { count } => {
                write!(f, "native array of {} elements is too large", count)
            }
            CopyError::MissingConverter => f.write_str("no string converter available"),
            CopyError::Field {
                struct_name,
                field,
                error,
            } => {
                writeln!(f, "while copying {} of `{}`:", field, struct_name)?;
                write!(f, "{}", error.to_string().left_padder(4))
            }
        }
    }
}

impl StdError for CopyError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            CopyError::Field { error, .. } => Some(&**error),
            _ => None,
        }
    }
}
