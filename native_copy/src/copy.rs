/*!
The copy engine, which copies native values into registered managed structs.

Structs whose layouts are identical are copied with a single bulk copy,
every other struct is copied field by field.
*/

use std::{
    ffi::{c_char, c_void},
    mem,
    ptr,
};

use crate::{
    errors::{CopyError, ExpectedFound, FieldId},
    lazy_string::LazyNativeString,
    managed::{type_id_of_struct, ManagedStruct},
    native_ref::NativeRef,
    registry::{ElementCopy, FieldCopy, FieldMapping, NestedRef, Registry, StructMapping},
};

impl Registry {
    /// Copies the native value at `src` into `dst`.
    ///
    /// # Errors
    ///
    /// This returns an error if `T` isn't registered,
    /// if `src` is known to be smaller than the native struct,
    /// or if any field can't be copied.
    /// When an error is returned, `dst` may have been partially written to.
    ///
    /// # Example
    ///
    /// ```
    /// use native_copy::{layout::compute_layout, ManagedStruct, NativeRef, Registry};
    ///
    /// #[repr(C)]
    /// struct NativeSample {
    ///     id: u32,
    ///     value: f64,
    /// }
    ///
    /// #[repr(C)]
    /// #[derive(ManagedStruct, Debug, Default, PartialEq)]
    /// struct Sample {
    ///     id: u32,
    ///     value: f64,
    /// }
    ///
    /// let desc = compute_layout(&["uint32_t", "double"]).unwrap();
    ///
    /// let mut builder = Registry::builder();
    /// builder.register::<Sample>(&desc).unwrap();
    /// let registry = builder.finalize();
    ///
    /// let native = NativeSample { id: 7, value: 0.5 };
    /// let mut sample = Sample::default();
    /// registry.copy(&mut sample, unsafe { NativeRef::from_ref(&native) }).unwrap();
    ///
    /// assert_eq!(sample, Sample { id: 7, value: 0.5 });
    /// ```
    pub fn copy<'n, T>(&self, dst: &mut T, src: NativeRef<'n>) -> Result<(), CopyError>
    where
        T: ManagedStruct<'n>,
    {
        let mapping = self.mapping_for::<T>()?;
        check_source(mapping, src, 1)?;
        unsafe { copy_struct(mapping, (dst as *mut T).cast::<u8>(), src.byte_ptr()) }
    }

    /// Copies the native value at `src` into a new `T`.
    pub fn copy_new<'n, T>(&self, src: NativeRef<'n>) -> Result<T, CopyError>
    where
        T: ManagedStruct<'n> + Default,
    {
        let mut value = T::default();
        self.copy(&mut value, src)?;
        Ok(value)
    }

    /// Copies a native array of `dst.len()` structs at `src` into `dst`.
    pub fn copy_slice<'n, T>(&self, dst: &mut [T], src: NativeRef<'n>) -> Result<(), CopyError>
    where
        T: ManagedStruct<'n>,
    {
        let mapping = self.mapping_for::<T>()?;
        check_source(mapping, src, dst.len())?;
        for (i, elem) in dst.iter_mut().enumerate() {
            unsafe {
                copy_struct(
                    mapping,
                    (elem as *mut T).cast::<u8>(),
                    src.byte_ptr().add(i * mapping.native_size),
                )?;
            }
        }
        Ok(())
    }

    /// Copies only the field at `index` (in declaration order) from `src` into `dst`.
    pub fn copy_field<'n, T>(
        &self,
        dst: &mut T,
        src: NativeRef<'n>,
        index: usize,
    ) -> Result<(), CopyError>
    where
        T: ManagedStruct<'n>,
    {
        let mapping = self.mapping_for::<T>()?;
        let field = mapping
            .fields
            .get(index)
            .ok_or(CopyError::FieldIndexOutOfRange {
                index,
                field_count: mapping.fields.len(),
            })?;
        check_source(mapping, src, 1)?;
        unsafe {
            copy_one_field(
                mapping,
                field,
                (dst as *mut T).cast::<u8>(),
                src.byte_ptr(),
            )
            .map_err(|e| wrap_field_error(mapping, index, field, e))
        }
    }

    /// Copies the native value at `src` into `*dst`, checking both pointers for null.
    ///
    /// # Safety
    ///
    /// `dst` must be null or point to a valid `T` that isn't aliased.
    ///
    /// `src` must be null, or fulfill the requirements of [`NativeRef::from_ptr`].
    pub unsafe fn copy_raw<'n, T>(&self, dst: *mut T, src: *const c_void) -> Result<(), CopyError>
    where
        T: ManagedStruct<'n>,
    {
        let dst = dst.as_mut().ok_or(CopyError::NilDestination)?;
        let src = NativeRef::<'n>::from_ptr(src).ok_or(CopyError::NilSource)?;
        self.copy(dst, src)
    }

    fn mapping_for<'n, T>(&self) -> Result<&StructMapping, CopyError>
    where
        T: ManagedStruct<'n>,
    {
        self.mappings
            .get(&type_id_of_struct::<T>())
            .map(|m| &**m)
            .ok_or(CopyError::NotRegistered {
                type_name: T::LAYOUT.name,
            })
    }
}

fn check_source(mapping: &StructMapping, src: NativeRef<'_>, count: usize) -> Result<(), CopyError> {
    let needed = mapping.native_size.saturating_mul(count);
    if src.readable() < needed {
        return Err(CopyError::SourceTooSmall(ExpectedFound::new(
            needed,
            src.readable(),
        )));
    }
    Ok(())
}

fn wrap_field_error(
    mapping: &StructMapping,
    index: usize,
    field: &FieldMapping,
    error: CopyError,
) -> CopyError {
    CopyError::Field {
        struct_name: mapping.name,
        field: FieldId {
            index,
            name: field.name,
        },
        error: Box::new(error),
    }
}

/// # Safety
///
/// `dst` must point to a valid value of the managed struct of `mapping`,
/// and `src` to a native value laid out as described by `mapping`.
pub(crate) unsafe fn copy_struct(
    mapping: &StructMapping,
    dst: *mut u8,
    src: *const u8,
) -> Result<(), CopyError> {
    if mapping.can_fast_path {
        ptr::copy_nonoverlapping(src, dst, mapping.managed_size);
        return Ok(());
    }

    for (index, field) in mapping.fields.iter().enumerate() {
        copy_one_field(mapping, field, dst, src)
            .map_err(|e| wrap_field_error(mapping, index, field, e))?;
    }
    Ok(())
}

/// Copies one field, `dst` and `src` point to the start of the structs.
unsafe fn copy_one_field(
    mapping: &StructMapping,
    field: &FieldMapping,
    dst: *mut u8,
    src: *const u8,
) -> Result<(), CopyError> {
    let dst = dst.add(field.managed_offset);
    let src = src.add(field.native_offset);

    match &field.action {
        FieldCopy::Bytes => {
            ptr::copy_nonoverlapping(src, dst, field.size);
            Ok(())
        }
        FieldCopy::String => write_string(mapping, dst, src),
        FieldCopy::Nested(nested) => copy_struct(resolved(nested)?, dst, src),
        FieldCopy::FixedArray { len, elem } => copy_elements(mapping, elem, dst, src, *len),
        FieldCopy::DynamicArray { elem, resize } => {
            let data = ptr::read_unaligned(src as *const *const u8);
            let count = ptr::read_unaligned(src.add(mem::size_of::<usize>()) as *const usize);

            if count == 0 {
                (*resize)(dst, 0);
                return Ok(());
            }
            if data.is_null() {
                return Err(CopyError::NullArrayData { count });
            }

            let too_large = |stride: usize| {
                count
                    .checked_mul(stride)
                    .map_or(true, |bytes| bytes > isize::MAX as usize)
            };
            if too_large(elem.native_stride()) || too_large(elem.managed_stride()) {
                return Err(CopyError::ArrayTooLarge { count });
            }

            let elems = (*resize)(dst, count);
            copy_elements(mapping, elem, elems, data, count)
        }
    }
}

unsafe fn copy_elements(
    mapping: &StructMapping,
    elem: &ElementCopy,
    dst: *mut u8,
    src: *const u8,
    count: usize,
) -> Result<(), CopyError> {
    match elem {
        ElementCopy::Bytes { size } => {
            ptr::copy_nonoverlapping(src, dst, size * count);
        }
        ElementCopy::String => {
            for i in 0..count {
                write_string(
                    mapping,
                    dst.add(i * mem::size_of::<String>()),
                    src.add(i * mem::size_of::<*const c_char>()),
                )?;
            }
        }
        ElementCopy::Nested {
            mapping: nested,
            native_stride,
            managed_stride,
        } => {
            let nested = resolved(nested)?;
            for i in 0..count {
                copy_struct(
                    nested,
                    dst.add(i * managed_stride),
                    src.add(i * native_stride),
                )?;
            }
        }
    }
    Ok(())
}

/// Converts the `char*` at `src` into the `String` at `dst`.
unsafe fn write_string(mapping: &StructMapping, dst: *mut u8, src: *const u8) -> Result<(), CopyError> {
    let native = ptr::read_unaligned(src as *const *const c_char);
    let value = if native.is_null() {
        String::new()
    } else {
        let converter = mapping
            .converter
            .as_deref()
            .ok_or(CopyError::MissingConverter)?;
        converter.convert(LazyNativeString::from_ptr(native))
    };
    *(dst as *mut String) = value;
    Ok(())
}

fn resolved(nested: &NestedRef) -> Result<&StructMapping, CopyError> {
    nested.mapping().ok_or(CopyError::NotRegistered {
        type_name: nested.name(),
    })
}
