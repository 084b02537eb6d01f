/*!
The struct registry, which validates managed structs against native layouts.

Registration happens in a [`RegistryBuilder`],
which is turned into a read-only [`Registry`] by [`RegistryBuilder::finalize`].
Only a finalized `Registry` can copy values,
and it can be shared between threads without locking.

Nested structs must be registered before the structs that contain them.
*/

use std::{
    any::TypeId,
    collections::HashMap,
    ffi::c_char,
    fmt::{self, Debug, Display},
    mem,
    sync::Arc,
};

use core_extensions::StringExt;

use crate::{
    compat::compatible_kinds,
    converter::{ConverterDebug, SharedConverter, StringConverter, Utf8Converter},
    descriptor::{ArrayElement, FieldDescriptor, FieldKind, StructDescriptor},
    errors::{ExpectedFound, FieldError, FieldId, RegisterError, RegisterErrorKind},
    managed::{
        type_id_of_struct, FieldBinding, FieldShape, ManagedFieldLayout, ManagedKind,
        ManagedLayout, ManagedStruct, ResizeFn, TypeIdent,
    },
};


/// A reference to the mapping of a nested struct,
/// which is only resolved when the registry is finalized.
#[derive(Clone)]
pub(crate) enum NestedRef {
    Pending(TypeIdent),
    Resolved(Arc<StructMapping>),
}

impl NestedRef {
    fn resolve(&mut self, done: &HashMap<TypeId, Arc<StructMapping>>) {
        if let NestedRef::Pending(ident) = self {
            if let Some(mapping) = done.get(&ident.type_id()) {
                *self = NestedRef::Resolved(mapping.clone());
            }
        }
    }

    pub(crate) fn mapping(&self) -> Option<&StructMapping> {
        match self {
            NestedRef::Pending(_) => None,
            NestedRef::Resolved(mapping) => Some(mapping),
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            NestedRef::Pending(ident) => ident.name(),
            NestedRef::Resolved(mapping) => mapping.name,
        }
    }
}

/// How one array element is copied.
#[derive(Clone)]
pub(crate) enum ElementCopy {
    /// Elements are copied as bytes, all at once.
    Bytes { size: usize },
    /// Each `char*` element is converted into a `String`.
    String,
    Nested {
        mapping: NestedRef,
        native_stride: usize,
        managed_stride: usize,
    },
}

impl ElementCopy {
    fn resolve(&mut self, done: &HashMap<TypeId, Arc<StructMapping>>) {
        if let ElementCopy::Nested { mapping, .. } = self {
            mapping.resolve(done);
        }
    }

    pub(crate) fn native_stride(&self) -> usize {
        match self {
            ElementCopy::Bytes { size } => *size,
            ElementCopy::String => mem::size_of::<*const c_char>(),
            ElementCopy::Nested { native_stride, .. } => *native_stride,
        }
    }

    pub(crate) fn managed_stride(&self) -> usize {
        match self {
            ElementCopy::Bytes { size } => *size,
            ElementCopy::String => mem::size_of::<String>(),
            ElementCopy::Nested { managed_stride, .. } => *managed_stride,
        }
    }
}

/// How one field is copied.
#[derive(Clone)]
pub(crate) enum FieldCopy {
    /// The field is copied as bytes.
    Bytes,
    /// The `char*` is converted into a `String`.
    String,
    Nested(NestedRef),
    FixedArray { len: usize, elem: ElementCopy },
    DynamicArray { elem: ElementCopy, resize: ResizeFn },
}

impl FieldCopy {
    fn resolve(&mut self, done: &HashMap<TypeId, Arc<StructMapping>>) {
        match self {
            FieldCopy::Bytes | FieldCopy::String => {}
            FieldCopy::Nested(nested) => nested.resolve(done),
            FieldCopy::FixedArray { elem, .. } | FieldCopy::DynamicArray { elem, .. } => {
                elem.resolve(done)
            }
        }
    }
}

/// A native field validated against the managed field it is copied into.
#[derive(Clone)]
pub struct FieldMapping {
    pub(crate) name: &'static str,
    pub(crate) native_name: Option<String>,
    pub(crate) native_offset: usize,
    pub(crate) managed_offset: usize,
    pub(crate) size: usize,
    pub(crate) kind: FieldKind,
    pub(crate) type_name: String,
    pub(crate) elem: Option<ArrayElement>,
    pub(crate) fast: bool,
    pub(crate) action: FieldCopy,
}

impl FieldMapping {
    /// The name of the managed field.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The name of the native field, if the descriptor had one.
    pub fn native_name(&self) -> Option<&str> {
        self.native_name.as_deref()
    }

    pub fn native_offset(&self) -> usize {
        self.native_offset
    }

    pub fn managed_offset(&self) -> usize {
        self.managed_offset
    }

    /// The size of the native field.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// The native type name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn is_nested(&self) -> bool {
        self.kind == FieldKind::NestedStruct
    }

    /// Whether this field is converted from a native string into a `String`.
    pub fn is_string(&self) -> bool {
        matches!(self.action, FieldCopy::String)
    }

    pub fn is_array(&self) -> bool {
        self.kind.is_array()
    }

    /// The length of a fixed array, 0 for any other field.
    pub fn array_len(&self) -> usize {
        match &self.action {
            FieldCopy::FixedArray { len, .. } => *len,
            _ => 0,
        }
    }

    pub fn array_elem_kind(&self) -> Option<FieldKind> {
        self.elem.as_ref().map(|e| e.kind)
    }

    /// The size of a native array element.
    pub fn array_elem_size(&self) -> usize {
        self.elem.as_ref().map_or(0, |e| e.size)
    }

    /// The mapping of a nested struct, or of the elements of an array of structs.
    ///
    /// This is `None` until the registry is finalized.
    pub fn nested_mapping(&self) -> Option<&StructMapping> {
        match &self.action {
            FieldCopy::Nested(nested) => nested.mapping(),
            FieldCopy::FixedArray { elem, .. } | FieldCopy::DynamicArray { elem, .. } => match elem {
                ElementCopy::Nested { mapping, .. } => mapping.mapping(),
                ElementCopy::Bytes { .. } | ElementCopy::String => None,
            },
            FieldCopy::Bytes | FieldCopy::String => None,
        }
    }

    /// Whether this field alone allows the whole struct to be copied in bulk.
    pub fn allows_fast_path(&self) -> bool {
        self.fast
    }

    fn resolve(&mut self, done: &HashMap<TypeId, Arc<StructMapping>>) {
        self.action.resolve(done)
    }
}

impl Display for FieldMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} ({}) native offset: {} managed offset: {} size: {}",
            self.name, self.type_name, self.kind, self.native_offset, self.managed_offset, self.size,
        )?;
        match &self.action {
            FieldCopy::Nested(nested) => write!(f, " nested: {}", nested.name()),
            FieldCopy::FixedArray {
                elem: ElementCopy::Nested { mapping, .. },
                ..
            }
            | FieldCopy::DynamicArray {
                elem: ElementCopy::Nested { mapping, .. },
                ..
            } => write!(f, " elements: {}", mapping.name()),
            _ => Ok(()),
        }
    }
}

impl Debug for FieldMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldMapping")
            .field("name", &self.name)
            .field("native_offset", &self.native_offset)
            .field("managed_offset", &self.managed_offset)
            .field("size", &self.size)
            .field("kind", &self.kind)
            .field("type_name", &self.type_name)
            .field("elem", &self.elem)
            .finish()
    }
}

/// A managed struct validated against a native struct layout.
#[derive(Clone)]
pub struct StructMapping {
    pub(crate) name: &'static str,
    pub(crate) native_name: String,
    pub(crate) native_size: usize,
    pub(crate) managed_size: usize,
    pub(crate) fields: Vec<FieldMapping>,
    pub(crate) converter: Option<SharedConverter>,
    pub(crate) can_fast_path: bool,
}

impl StructMapping {
    /// The name of the managed struct.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The name of the native struct.
    pub fn native_name(&self) -> &str {
        &self.native_name
    }

    pub fn native_size(&self) -> usize {
        self.native_size
    }

    pub fn managed_size(&self) -> usize {
        self.managed_size
    }

    pub fn fields(&self) -> &[FieldMapping] {
        &self.fields
    }

    pub fn has_converter(&self) -> bool {
        self.converter.is_some()
    }

    /// Whether the native and managed layouts are identical,
    /// so that values are copied with a single bulk copy.
    pub fn can_fast_path(&self) -> bool {
        self.can_fast_path
    }

    fn resolve(&mut self, done: &HashMap<TypeId, Arc<StructMapping>>) {
        for field in &mut self.fields {
            field.resolve(done);
        }
    }
}

impl Display for StructMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} <- {} native size: {} managed size: {} fast path: {}",
            self.name, self.native_name, self.native_size, self.managed_size, self.can_fast_path,
        )?;
        for (i, field) in self.fields.iter().enumerate() {
            writeln!(f, "{}", format!("[{}] {}", i, field).left_padder(4))?;
        }
        Ok(())
    }
}

impl Debug for StructMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructMapping")
            .field("name", &self.name)
            .field("native_name", &self.native_name)
            .field("native_size", &self.native_size)
            .field("managed_size", &self.managed_size)
            .field("fields", &self.fields)
            .field("converter", &ConverterDebug(&self.converter))
            .field("can_fast_path", &self.can_fast_path)
            .finish()
    }
}

////////////////////////////////////////////////////////////////////////////////

/// The registry while types are being registered.
///
/// # Example
///
/// ```
/// use native_copy::{
///     layout::{compute_layout, LayoutCalculator, LayoutEntry},
///     ManagedStruct, RegistryBuilder,
/// };
///
/// #[repr(C)]
/// #[derive(ManagedStruct, Default)]
/// struct Point {
///     x: f32,
///     y: f32,
/// }
///
/// #[repr(C)]
/// #[derive(ManagedStruct, Default)]
/// struct Segment {
///     id: u32,
///     start: Point,
///     end: Point,
/// }
///
/// let point = compute_layout(&["float", "float"]).unwrap().with_name("point_t");
///
/// let mut builder = RegistryBuilder::new();
/// builder.register::<Point>(&point).unwrap();
///
/// let segment = LayoutCalculator::host()
///     .compute_struct("segment_t", [
///         LayoutEntry::Type("uint32_t"),
///         LayoutEntry::Struct(&point),
///         LayoutEntry::Struct(&point),
///     ])
///     .unwrap();
/// builder.register::<Segment>(&segment).unwrap();
///
/// let registry = builder.finalize();
/// assert!(registry.get_mapping::<Point>().unwrap().can_fast_path());
/// assert!(!registry.get_mapping::<Segment>().unwrap().can_fast_path());
/// ```
#[derive(Default)]
pub struct RegistryBuilder {
    mappings: HashMap<TypeId, StructMapping>,
    order: Vec<TypeId>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T`, to be copied from native structs laid out as `native`.
    ///
    /// Re-registering a type does nothing.
    ///
    /// # Errors
    ///
    /// This returns an error if the number of fields differs,
    /// if any managed field is incompatible with its native field,
    /// if any nested struct wasn't registered yet,
    /// or if the struct has native string fields copied into `String`s,
    /// which require a converter (see [`register_with_converter`](Self::register_with_converter)).
    pub fn register<'n, T>(&mut self, native: &StructDescriptor) -> Result<&mut Self, RegisterError>
    where
        T: ManagedStruct<'n>,
    {
        self.register_inner(T::LAYOUT, type_id_of_struct::<T>(), native, None)
    }

    /// Registers `T`, converting native strings with `converter`.
    pub fn register_with_converter<'n, T, C>(
        &mut self,
        native: &StructDescriptor,
        converter: C,
    ) -> Result<&mut Self, RegisterError>
    where
        T: ManagedStruct<'n>,
        C: StringConverter + 'static,
    {
        let converter: SharedConverter = Arc::new(converter);
        self.register_inner(T::LAYOUT, type_id_of_struct::<T>(), native, Some(converter))
    }

    /// Registers `T`, converting native strings with a shared converter.
    pub fn register_shared<'n, T>(
        &mut self,
        native: &StructDescriptor,
        converter: Option<SharedConverter>,
    ) -> Result<&mut Self, RegisterError>
    where
        T: ManagedStruct<'n>,
    {
        self.register_inner(T::LAYOUT, type_id_of_struct::<T>(), native, converter)
    }

    /// Registers `T`, converting native strings as lossy utf8.
    pub fn register_default_strings<'n, T>(
        &mut self,
        native: &StructDescriptor,
    ) -> Result<&mut Self, RegisterError>
    where
        T: ManagedStruct<'n>,
    {
        self.register_with_converter::<T, _>(native, Utf8Converter)
    }

    pub fn is_registered<'n, T>(&self) -> bool
    where
        T: ManagedStruct<'n>,
    {
        self.mappings.contains_key(&type_id_of_struct::<T>())
    }

    /// The mapping of `T`, whose nested mappings are not resolved yet.
    pub fn get_mapping<'n, T>(&self) -> Option<&StructMapping>
    where
        T: ManagedStruct<'n>,
    {
        self.mappings.get(&type_id_of_struct::<T>())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Resolves every nested mapping, and makes the registry read-only.
    pub fn finalize(mut self) -> Registry {
        let mut done = HashMap::with_capacity(self.order.len());
        for type_id in &self.order {
            if let Some(mut mapping) = self.mappings.remove(type_id) {
                mapping.resolve(&done);
                done.insert(*type_id, Arc::new(mapping));
            }
        }

        tracing::info!(mappings = done.len(), "finalized struct registry");

        Registry {
            mappings: done,
            order: self.order,
        }
    }

    fn register_inner(
        &mut self,
        layout: &'static ManagedLayout,
        type_id: TypeId,
        native: &StructDescriptor,
        converter: Option<SharedConverter>,
    ) -> Result<&mut Self, RegisterError> {
        if self.mappings.contains_key(&type_id) {
            return Ok(self);
        }

        let mapping = Validator {
            registry: self,
            layout,
            converter: &converter,
        }
        .validate(native)?;

        let mapping = StructMapping {
            converter,
            ..mapping
        };

        tracing::debug!(
            managed = mapping.name,
            native = %mapping.native_name,
            fields = mapping.fields.len(),
            fast_path = mapping.can_fast_path,
            "registered struct mapping"
        );

        self.mappings.insert(type_id, mapping);
        self.order.push(type_id);
        Ok(self)
    }
}

impl Debug for RegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self.order.iter().filter_map(|id| self.mappings.get(id).map(|m| m.name));
        f.debug_struct("RegistryBuilder")
            .field("mappings", &names.collect::<Vec<_>>())
            .finish()
    }
}

/// Checks one managed struct against a native layout.
struct Validator<'a> {
    registry: &'a RegistryBuilder,
    layout: &'static ManagedLayout,
    converter: &'a Option<SharedConverter>,
}

impl<'a> Validator<'a> {
    fn validate(&self, native: &StructDescriptor) -> Result<StructMapping, RegisterError> {
        let layout = self.layout;
        let type_name = layout.name;

        let counts = ExpectedFound::new(layout.fields.len(), native.fields.len());
        if let Some(counts) = counts.into_mismatch() {
            return Err(RegisterError::new(
                type_name,
                RegisterErrorKind::FieldCountMismatch(counts),
            ));
        }

        if layout.binding == FieldBinding::ByName && native.fields.iter().any(|f| f.name.is_none()) {
            return Err(RegisterError::new(type_name, RegisterErrorKind::MixedBinding));
        }

        let mut fields = Vec::with_capacity(layout.fields.len());
        let mut bound = vec![false; native.fields.len()];
        for (index, managed) in layout.fields.iter().enumerate() {
            let field_id = FieldId {
                index,
                name: managed.name,
            };
            let field = self
                .bind(index, managed, native, &mut bound)
                .and_then(|nf| self.validate_field(managed, nf, native.size))
                .map_err(|e| RegisterError::field(type_name, field_id, e))?;
            fields.push(field);
        }

        let can_fast_path = native.size == layout.size
            && fields
                .iter()
                .all(|f| f.fast && f.native_offset == f.managed_offset);

        Ok(StructMapping {
            name: type_name,
            native_name: native.name.clone(),
            native_size: native.size,
            managed_size: layout.size,
            fields,
            converter: None,
            can_fast_path,
        })
    }

    /// Finds the native field that `managed` is bound to,
    /// marking it in `bound`, where each native field can only be marked once.
    fn bind<'d>(
        &self,
        index: usize,
        managed: &ManagedFieldLayout,
        native: &'d StructDescriptor,
        bound: &mut [bool],
    ) -> Result<&'d FieldDescriptor, FieldError> {
        let name = managed.native_name.unwrap_or(managed.name);
        let native_index = match self.layout.binding {
            FieldBinding::Positional => index,
            FieldBinding::ByName => native
                .fields
                .iter()
                .position(|f| f.name.as_deref() == Some(name))
                .ok_or_else(|| FieldError::NoSuchNativeField(name.to_string()))?,
        };

        if mem::replace(&mut bound[native_index], true) {
            return Err(FieldError::DuplicateBinding(name.to_string()));
        }
        Ok(&native.fields[native_index])
    }

    fn validate_field(
        &self,
        managed: &ManagedFieldLayout,
        native: &FieldDescriptor,
        native_size: usize,
    ) -> Result<FieldMapping, FieldError> {
        if native.end().map_or(true, |end| end > native_size) {
            return Err(FieldError::OutOfBounds {
                offset: native.offset,
                size: native.size,
                native_size,
            });
        }

        let shape = managed.shape;
        let incompatible = || FieldError::TypeIncompatible {
            native: native.type_name.clone(),
            managed: shape.to_string(),
        };

        let (action, fast) = match native.kind {
            FieldKind::Primitive | FieldKind::Pointer | FieldKind::String => match shape {
                FieldShape::Value(kind) => {
                    let type_name = match native.kind {
                        FieldKind::Pointer => "pointer",
                        FieldKind::String => "char*",
                        _ => native.type_name.as_str(),
                    };
                    check_value(*kind, type_name, native.size, managed.size)?;
                    (FieldCopy::Bytes, *kind != ManagedKind::Pointer)
                }
                FieldShape::String if native.kind == FieldKind::String => {
                    self.require_converter()?;
                    check_size(native.size, mem::size_of::<*const c_char>())?;
                    (FieldCopy::String, false)
                }
                _ => return Err(incompatible()),
            },
            FieldKind::NestedStruct => match shape {
                FieldShape::Nested(ident) => {
                    let nested = self.nested(*ident)?;
                    check_size(nested.native_size, native.size)?;
                    (FieldCopy::Nested(NestedRef::Pending(*ident)), false)
                }
                _ => return Err(incompatible()),
            },
            FieldKind::FixedArray => match (shape, &native.elem) {
                (
                    FieldShape::FixedArray {
                        elem,
                        elem_size,
                        len,
                    },
                    Some(native_elem),
                ) => {
                    let lengths = ExpectedFound::new(native_elem.count, *len);
                    if let Some(lengths) = lengths.into_mismatch() {
                        return Err(FieldError::LengthMismatch(lengths));
                    }
                    let elems_size = native_elem
                        .size
                        .checked_mul(native_elem.count)
                        .ok_or(FieldError::SizeMismatch(ExpectedFound::new(
                            native.size,
                            usize::MAX,
                        )))?;
                    check_size(native.size, elems_size)?;
                    let elem = self.validate_element(elem, *elem_size, native_elem)?;
                    let fast = matches!(elem, ElementCopy::Bytes { .. });
                    (FieldCopy::FixedArray { len: *len, elem }, fast)
                }
                _ => return Err(incompatible()),
            },
            FieldKind::DynamicArray => match (shape, &native.elem) {
                (
                    FieldShape::DynamicArray {
                        elem,
                        elem_size,
                        resize,
                    },
                    Some(native_elem),
                ) => {
                    check_size(native.size, 2 * mem::size_of::<usize>())?;
                    let elem = self.validate_element(elem, *elem_size, native_elem)?;
                    (
                        FieldCopy::DynamicArray {
                            elem,
                            resize: *resize,
                        },
                        false,
                    )
                }
                _ => return Err(incompatible()),
            },
        };

        Ok(FieldMapping {
            name: managed.name,
            native_name: native.name.clone(),
            native_offset: native.offset,
            managed_offset: managed.offset,
            size: native.size,
            kind: native.kind,
            type_name: native.type_name.clone(),
            elem: native.elem.clone(),
            fast,
            action,
        })
    }

    fn validate_element(
        &self,
        shape: &FieldShape,
        managed_size: usize,
        native: &ArrayElement,
    ) -> Result<ElementCopy, FieldError> {
        let incompatible = || FieldError::TypeIncompatible {
            native: native.type_name.clone(),
            managed: shape.to_string(),
        };

        match native.kind {
            FieldKind::Primitive | FieldKind::Pointer | FieldKind::String => match shape {
                FieldShape::Value(kind) => {
                    let type_name = match native.kind {
                        FieldKind::Pointer => "pointer",
                        FieldKind::String => "char*",
                        _ => native.type_name.as_str(),
                    };
                    check_value(*kind, type_name, native.size, managed_size)?;
                    Ok(ElementCopy::Bytes { size: native.size })
                }
                FieldShape::String if native.kind == FieldKind::String => {
                    self.require_converter()?;
                    check_size(native.size, mem::size_of::<*const c_char>())?;
                    Ok(ElementCopy::String)
                }
                _ => Err(incompatible()),
            },
            FieldKind::NestedStruct => match shape {
                FieldShape::Nested(ident) => {
                    let nested = self.nested(*ident)?;
                    check_size(nested.native_size, native.size)?;
                    Ok(ElementCopy::Nested {
                        mapping: NestedRef::Pending(*ident),
                        native_stride: native.size,
                        managed_stride: managed_size,
                    })
                }
                _ => Err(incompatible()),
            },
            FieldKind::FixedArray | FieldKind::DynamicArray => Err(incompatible()),
        }
    }

    fn nested(&self, ident: TypeIdent) -> Result<&StructMapping, FieldError> {
        self.registry
            .mappings
            .get(&ident.type_id())
            .ok_or(FieldError::NotRegistered(ident.name()))
    }

    fn require_converter(&self) -> Result<(), FieldError> {
        match self.converter {
            Some(_) => Ok(()),
            None => Err(FieldError::NoConverter),
        }
    }
}

fn check_value(
    kind: ManagedKind,
    type_name: &str,
    native_size: usize,
    managed_size: usize,
) -> Result<(), FieldError> {
    let kinds = compatible_kinds(type_name)
        .ok_or_else(|| FieldError::UnknownType(type_name.to_string()))?;
    if !kinds.contains(&kind) {
        return Err(FieldError::TypeIncompatible {
            native: type_name.to_string(),
            managed: kind.to_string(),
        });
    }
    check_size(native_size, managed_size)
}

fn check_size(native_size: usize, managed_size: usize) -> Result<(), FieldError> {
    match ExpectedFound::new(native_size, managed_size).into_mismatch() {
        None => Ok(()),
        Some(sizes) => Err(FieldError::SizeMismatch(sizes)),
    }
}

////////////////////////////////////////////////////////////////////////////////

/// A finalized, read-only registry of struct mappings.
///
/// This is created by [`RegistryBuilder::finalize`],
/// and can be used to copy from any number of threads at the same time.
#[derive(Clone)]
pub struct Registry {
    pub(crate) mappings: HashMap<TypeId, Arc<StructMapping>>,
    order: Vec<TypeId>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn get_mapping<'n, T>(&self) -> Option<&StructMapping>
    where
        T: ManagedStruct<'n>,
    {
        self.mappings
            .get(&type_id_of_struct::<T>())
            .map(|m| &**m)
    }

    /// Iterates over the mappings in registration order.
    pub fn mappings(&self) -> impl Iterator<Item = &StructMapping> + '_ {
        self.order
            .iter()
            .filter_map(move |id| self.mappings.get(id).map(|m| &**m))
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

impl Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.mappings()).finish()
    }
}

impl Display for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for mapping in self.mappings() {
            Display::fmt(mapping, f)?;
        }
        Ok(())
    }
}
