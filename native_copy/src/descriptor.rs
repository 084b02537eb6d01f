/*!
Descriptions of native struct layouts, in native-memory terms.

These come either from the [layout calculator](crate::layout),
or from an external source that asked the native compiler directly
(for example as JSON, with the `serde_json` feature).
*/

use std::fmt::{self, Display};

use core_extensions::StringExt;

use serde::{Deserialize, Serialize};

use crate::{
    errors::{ExpectedFound, LayoutError},
    primitives::{is_pointer_name, is_string_name, normalize_type_name},
};

/// What a native field holds.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    /// A number or boolean.
    Primitive,
    /// Any pointer other than a string.
    Pointer,
    /// A nul-terminated `char*`.
    String,
    /// An inline array, `T[N]`.
    FixedArray,
    /// A `{T* data; size_t count;}` pair.
    DynamicArray,
    /// An inline struct.
    NestedStruct,
}

impl FieldKind {
    pub fn is_array(self) -> bool {
        match self {
            FieldKind::FixedArray | FieldKind::DynamicArray => true,
            FieldKind::Primitive
            | FieldKind::Pointer
            | FieldKind::String
            | FieldKind::NestedStruct => false,
        }
    }
}

impl Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FieldKind::Primitive => "primitive",
            FieldKind::Pointer => "pointer",
            FieldKind::String => "string",
            FieldKind::FixedArray => "fixed array",
            FieldKind::DynamicArray => "dynamic array",
            FieldKind::NestedStruct => "struct",
        };
        f.write_str(s)
    }
}

/// Infers the kind of a field from its native type name.
///
/// A positive `elem_count` makes it a fixed array,
/// otherwise `char*` is a string, `pointer` or any `T*` a pointer,
/// `struct X` a nested struct, and anything else a primitive.
pub fn resolve_field_kind(type_name: &str, elem_count: usize) -> FieldKind {
    let name = normalize_type_name(type_name);
    if elem_count > 0 {
        FieldKind::FixedArray
    } else if is_string_name(&name) {
        FieldKind::String
    } else if is_pointer_name(&name) {
        FieldKind::Pointer
    } else if name == "struct" || name.starts_with("struct ") {
        FieldKind::NestedStruct
    } else {
        FieldKind::Primitive
    }
}

/// The element type of an array field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArrayElement {
    pub kind: FieldKind,
    pub type_name: String,
    /// The size of one element in native memory, which is also the array stride.
    pub size: usize,
    /// The element count of a fixed array, 0 for dynamic arrays.
    pub count: usize,
}

/// The layout of one native field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// The native field name, required when binding fields by name.
    #[serde(default)]
    pub name: Option<String>,
    pub offset: usize,
    pub size: usize,
    pub kind: FieldKind,
    pub type_name: String,
    /// Only present for array kinds.
    #[serde(default)]
    pub elem: Option<ArrayElement>,
}

impl FieldDescriptor {
    /// A primitive, pointer, or string field, with the kind inferred from `type_name`.
    pub fn new(offset: usize, size: usize, type_name: &str) -> Self {
        Self {
            name: None,
            offset,
            size,
            kind: resolve_field_kind(type_name, 0),
            type_name: normalize_type_name(type_name).into_owned(),
            elem: None,
        }
    }

    /// An inline struct of type `type_name`.
    pub fn nested(offset: usize, size: usize, type_name: &str) -> Self {
        Self {
            name: None,
            offset,
            size,
            kind: FieldKind::NestedStruct,
            type_name: type_name.to_string(),
            elem: None,
        }
    }

    /// An inline array of `count` elements of `elem_kind`.
    ///
    /// The size saturates at `usize::MAX`, which registration rejects as out of bounds.
    pub fn fixed_array(
        offset: usize,
        elem_kind: FieldKind,
        elem_type: &str,
        elem_size: usize,
        count: usize,
    ) -> Self {
        Self {
            name: None,
            offset,
            size: elem_size.saturating_mul(count),
            kind: FieldKind::FixedArray,
            type_name: format!("{}[{}]", elem_type, count),
            elem: Some(ArrayElement {
                kind: elem_kind,
                type_name: elem_type.to_string(),
                size: elem_size,
                count,
            }),
        }
    }

    /// A `{T* data; size_t count;}` pair pointing to elements of `elem_kind`.
    ///
    /// `size` is the size of the pair.
    pub fn dynamic_array(
        offset: usize,
        size: usize,
        elem_kind: FieldKind,
        elem_type: &str,
        elem_size: usize,
    ) -> Self {
        Self {
            name: None,
            offset,
            size,
            kind: FieldKind::DynamicArray,
            type_name: format!("{}[]", elem_type),
            elem: Some(ArrayElement {
                kind: elem_kind,
                type_name: elem_type.to_string(),
                size: elem_size,
                count: 0,
            }),
        }
    }

    /// Sets the native field name.
    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// The offset one past the last byte of this field,
    /// or `None` if it doesn't fit in a `usize`.
    pub fn end(&self) -> Option<usize> {
        self.offset.checked_add(self.size)
    }
}

impl Display for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            write!(f, "{}: ", name)?;
        }
        write!(
            f,
            "{} ({}) offset: {} size: {}",
            self.type_name, self.kind, self.offset, self.size,
        )?;
        if let Some(elem) = &self.elem {
            write!(f, " element: {} ({}) size: {}", elem.type_name, elem.kind, elem.size)?;
        }
        Ok(())
    }
}

/// The full layout of one native struct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructDescriptor {
    pub name: String,
    pub size: usize,
    pub alignment: usize,
    pub fields: Vec<FieldDescriptor>,
}

impl StructDescriptor {
    pub fn new(name: &str, size: usize, alignment: usize, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            name: name.to_string(),
            size,
            alignment,
            fields,
        }
    }

    /// Renames the struct, returning it back.
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Checks this layout against the size that the native compiler reports.
    ///
    /// A disagreement means that the native struct is packed,
    /// or has forced alignment, which offsets computed from type names can't capture.
    pub fn verify_size(&self, measured: usize) -> Result<(), LayoutError> {
        match ExpectedFound::new(self.size, measured).into_mismatch() {
            None => Ok(()),
            Some(sizes) => Err(LayoutError::SizeDisagreement {
                struct_name: self.name.clone(),
                sizes,
            }),
        }
    }

    /// Finds a field by its native name.
    pub fn field_named(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields
            .iter()
            .find(|f| f.name.as_deref() == Some(name))
    }

    #[cfg(feature = "serde_json")]
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[cfg(feature = "serde_json")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Display for StructDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "struct {} size: {} alignment: {}",
            self.name, self.size, self.alignment,
        )?;
        for (i, field) in self.fields.iter().enumerate() {
            writeln!(f, "{}", format!("[{}] {}", i, field).left_padder(4))?;
        }
        Ok(())
    }
}
