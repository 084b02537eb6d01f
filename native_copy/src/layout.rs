/*!
Computes native struct layouts from a list of field types,
replaying the C placement rules over a [`PrimitiveTypeTable`].

For each field, the offset is rounded up to the field's alignment,
then advanced past the field.
The struct is aligned to its most aligned field.

Packed structs, forced alignment, and bit-fields can't be derived from type names,
[`StructDescriptor::verify_size`] detects the first two when
the native size is known.

Type names understood by the calculator:

- Any name in the primitive table: `uint32_t`, `unsigned long`, `double`, `bool`...
- `char*`: a native string.
- `pointer`, or any other `T*`: a pointer.
- `T[N]`: an inline array of `N` of the above.
- `T[]`: a `{T* data; size_t count;}` pair.

Nested structs are placed with [`LayoutEntry::Struct`] and its siblings.
*/

use crate::{
    descriptor::{resolve_field_kind, FieldDescriptor, FieldKind, StructDescriptor},
    errors::LayoutError,
    primitives::{checked_round_up, normalize_type_name, probe, PrimitiveTypeTable},
};

#[cfg(test)]
mod tests;

/// How the size of a struct is rounded after its last field.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum TrailingPadding {
    /// Round the size up to the struct's alignment, as C compilers do.
    #[default]
    NativeParity,
    /// Stop at the end of the last field.
    FieldPacked,
}

/// Options for [`LayoutCalculator`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct LayoutOptions {
    pub trailing_padding: TrailingPadding,
}

/// One field given to the layout calculator.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum LayoutEntry<'a> {
    /// A field described by its native type name.
    Type(&'a str),
    /// An inline struct.
    Struct(&'a StructDescriptor),
    /// An inline array of structs.
    StructArray(&'a StructDescriptor, usize),
    /// A `{S* data; size_t count;}` pair.
    DynamicStructArray(&'a StructDescriptor),
}

impl<'a> From<&'a str> for LayoutEntry<'a> {
    fn from(type_name: &'a str) -> Self {
        LayoutEntry::Type(type_name)
    }
}

impl<'a> From<&'a StructDescriptor> for LayoutEntry<'a> {
    fn from(desc: &'a StructDescriptor) -> Self {
        LayoutEntry::Struct(desc)
    }
}

/// Computes [`StructDescriptor`]s from field types.
#[derive(Debug, Copy, Clone)]
pub struct LayoutCalculator<'t> {
    table: &'t PrimitiveTypeTable,
    options: LayoutOptions,
}

impl LayoutCalculator<'static> {
    /// A calculator for the host's native layout.
    pub fn host() -> Self {
        Self::new(probe())
    }
}

/// A field that was placed, along with its alignment.
struct Placed {
    field: FieldDescriptor,
    alignment: usize,
}

/// The size and alignment of a non-struct element.
struct Element {
    kind: FieldKind,
    type_name: String,
    size: usize,
    alignment: usize,
}

impl<'t> LayoutCalculator<'t> {
    pub fn new(table: &'t PrimitiveTypeTable) -> Self {
        Self {
            table,
            options: LayoutOptions::default(),
        }
    }

    pub fn with_options(mut self, options: LayoutOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_trailing_padding(mut self, trailing_padding: TrailingPadding) -> Self {
        self.options.trailing_padding = trailing_padding;
        self
    }

    pub fn table(&self) -> &'t PrimitiveTypeTable {
        self.table
    }

    pub fn options(&self) -> LayoutOptions {
        self.options
    }

    /// Computes the layout of an unnamed struct with positional fields.
    pub fn compute_layout(&self, type_names: &[&str]) -> Result<StructDescriptor, LayoutError> {
        self.compute_struct("", type_names.iter().copied())
    }

    /// Computes the layout of a struct with positional fields.
    pub fn compute_struct<'a, I>(&self, name: &str, entries: I) -> Result<StructDescriptor, LayoutError>
    where
        I: IntoIterator,
        I::Item: Into<LayoutEntry<'a>>,
    {
        let entries = entries.into_iter().map(|e| (None, e.into()));
        self.compute_inner(name, entries)
    }

    /// Computes the layout of a struct whose fields are named,
    /// for binding managed fields by name.
    pub fn compute_named_struct<'a, I, E>(
        &self,
        name: &str,
        entries: I,
    ) -> Result<StructDescriptor, LayoutError>
    where
        I: IntoIterator<Item = (&'a str, E)>,
        E: Into<LayoutEntry<'a>>,
    {
        let entries = entries.into_iter().map(|(n, e)| (Some(n), e.into()));
        self.compute_inner(name, entries)
    }

    fn compute_inner<'a, I>(&self, name: &str, entries: I) -> Result<StructDescriptor, LayoutError>
    where
        I: Iterator<Item = (Option<&'a str>, LayoutEntry<'a>)>,
    {
        let mut cursor = 0usize;
        let mut alignment = 1usize;
        let mut fields = Vec::new();

        for (index, (field_name, entry)) in entries.enumerate() {
            let mut placed = self.place(index, cursor, entry)?;
            if let Some(field_name) = field_name {
                placed.field.name = Some(field_name.to_string());
            }
            alignment = alignment.max(placed.alignment);
            cursor = placed
                .field
                .end()
                .filter(|&end| end <= MAX_SIZE)
                .ok_or(LayoutError::Overflow { index })?;
            fields.push(placed.field);
        }

        let size = match self.options.trailing_padding {
            TrailingPadding::NativeParity => {
                let index = fields.len().saturating_sub(1);
                aligned(index, cursor, alignment)?
            }
            TrailingPadding::FieldPacked => cursor,
        };

        Ok(StructDescriptor::new(name, size, alignment, fields))
    }

    fn place(&self, index: usize, cursor: usize, entry: LayoutEntry<'_>) -> Result<Placed, LayoutError> {
        match entry {
            LayoutEntry::Type(type_name) => self.place_type(index, cursor, type_name),
            LayoutEntry::Struct(desc) => {
                let offset = aligned(index, cursor, desc.alignment)?;
                Ok(Placed {
                    field: FieldDescriptor::nested(offset, desc.size, &desc.name),
                    alignment: desc.alignment,
                })
            }
            LayoutEntry::StructArray(desc, 0) => Err(LayoutError::InvalidArrayLength {
                index,
                type_name: format!("{}[0]", desc.name),
            }),
            LayoutEntry::StructArray(desc, count) => {
                let offset = aligned(index, cursor, desc.alignment)?;
                check_array_size(index, desc.size, count, || format!("{}[{}]", desc.name, count))?;
                let field = FieldDescriptor::fixed_array(
                    offset,
                    FieldKind::NestedStruct,
                    &desc.name,
                    desc.size,
                    count,
                );
                Ok(Placed {
                    field,
                    alignment: desc.alignment,
                })
            }
            LayoutEntry::DynamicStructArray(desc) => {
                let (size, alignment) = self.dynamic_pair(index, &desc.name)?;
                let offset = aligned(index, cursor, alignment)?;
                let field = FieldDescriptor::dynamic_array(
                    offset,
                    size,
                    FieldKind::NestedStruct,
                    &desc.name,
                    desc.size,
                );
                Ok(Placed { field, alignment })
            }
        }
    }

    fn place_type(&self, index: usize, cursor: usize, type_name: &str) -> Result<Placed, LayoutError> {
        let type_name = normalize_type_name(type_name);

        let (elem_name, len) = match split_array_suffix(&type_name) {
            Some(x) => x,
            None => {
                let elem = self.element(index, &type_name)?;
                let offset = aligned(index, cursor, elem.alignment)?;
                let field = FieldDescriptor {
                    name: None,
                    offset,
                    size: elem.size,
                    kind: elem.kind,
                    type_name: elem.type_name,
                    elem: None,
                };
                return Ok(Placed {
                    field,
                    alignment: elem.alignment,
                });
            }
        };

        let elem = self.element(index, elem_name)?;

        if len.is_empty() {
            let (size, alignment) = self.dynamic_pair(index, &type_name)?;
            let offset = aligned(index, cursor, alignment)?;
            let field =
                FieldDescriptor::dynamic_array(offset, size, elem.kind, &elem.type_name, elem.size);
            return Ok(Placed { field, alignment });
        }

        let count = match len.trim().parse::<usize>() {
            Ok(count) if count > 0 => count,
            _ => {
                return Err(LayoutError::InvalidArrayLength {
                    index,
                    type_name: type_name.to_string(),
                })
            }
        };
        let offset = aligned(index, cursor, elem.alignment)?;
        check_array_size(index, elem.size, count, || type_name.to_string())?;
        let field = FieldDescriptor::fixed_array(offset, elem.kind, &elem.type_name, elem.size, count);
        Ok(Placed {
            field,
            alignment: elem.alignment,
        })
    }

    fn element(&self, index: usize, type_name: &str) -> Result<Element, LayoutError> {
        let info = self
            .table
            .get(type_name)
            .ok_or_else(|| LayoutError::UnknownType {
                index,
                type_name: type_name.to_string(),
            })?;
        Ok(Element {
            kind: resolve_field_kind(type_name, 0),
            type_name: type_name.to_string(),
            size: info.size,
            alignment: info.alignment,
        })
    }

    /// The size and alignment of a `{T* data; size_t count;}` pair.
    fn dynamic_pair(&self, index: usize, type_name: &str) -> Result<(usize, usize), LayoutError> {
        let unknown = || LayoutError::UnknownType {
            index,
            type_name: type_name.to_string(),
        };
        let data = self.table.get("pointer").ok_or_else(unknown)?;
        let count = self.table.get("size_t").ok_or_else(unknown)?;

        let count_offset = aligned(index, data.size, count.alignment)?;
        let alignment = data.alignment.max(count.alignment);
        let end = count_offset
            .checked_add(count.size)
            .ok_or(LayoutError::Overflow { index })?;
        Ok((aligned(index, end, alignment)?, alignment))
    }
}

/// The largest size of a native struct, the same as for Rust values.
const MAX_SIZE: usize = isize::MAX as usize;

/// Rounds `cursor` up to `alignment`, failing if it goes past [`MAX_SIZE`].
fn aligned(index: usize, cursor: usize, alignment: usize) -> Result<usize, LayoutError> {
    checked_round_up(cursor, alignment)
        .filter(|&offset| offset <= MAX_SIZE)
        .ok_or(LayoutError::Overflow { index })
}

fn check_array_size<F>(index: usize, elem_size: usize, count: usize, type_name: F) -> Result<(), LayoutError>
where
    F: FnOnce() -> String,
{
    match elem_size.checked_mul(count) {
        Some(size) if size <= MAX_SIZE => Ok(()),
        _ => Err(LayoutError::InvalidArrayLength {
            index,
            type_name: type_name(),
        }),
    }
}

/// Splits `T[N]` into `T` and `N`, and `T[]` into `T` and an empty string.
fn split_array_suffix(type_name: &str) -> Option<(&str, &str)> {
    let inner = type_name.strip_suffix(']')?;
    let open = inner.rfind('[')?;
    Some((inner[..open].trim_end(), &inner[open + 1..]))
}

/// Computes the host layout of an unnamed struct with positional fields.
///
/// # Example
///
/// ```
/// use native_copy::layout::compute_layout;
///
/// let desc = compute_layout(&["uint8_t", "uint32_t", "uint64_t"]).unwrap();
///
/// let offsets = desc.fields.iter().map(|f| f.offset).collect::<Vec<_>>();
/// assert_eq!(offsets, [0, 4, 8]);
/// assert_eq!(desc.size, 16);
/// ```
pub fn compute_layout(type_names: &[&str]) -> Result<StructDescriptor, LayoutError> {
    LayoutCalculator::host().compute_layout(type_names)
}
