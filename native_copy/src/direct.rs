//! Reads plain values out of native memory without a registered mapping.

/// Reads the native value at `src`, which doesn't need to be aligned.
///
/// # Safety
///
/// `src` must be valid to read `size_of::<T>()` bytes from,
/// and those bytes must be a valid `T`.
///
/// # Example
///
/// ```
/// use native_copy::direct::direct;
///
/// #[repr(C)]
/// #[derive(Debug, Copy, Clone, PartialEq)]
/// struct Vec2 {
///     x: f32,
///     y: f32,
/// }
///
/// let native = Vec2 { x: 1.0, y: 2.0 };
/// assert_eq!(unsafe { direct(&native as *const Vec2) }, native);
/// ```
pub unsafe fn direct<T: Copy>(src: *const T) -> T {
    src.read_unaligned()
}

/// Reads `count` native values starting at `src` into a `Vec`.
///
/// A null `src` is only allowed when `count` is 0.
///
/// # Safety
///
/// `src` must be valid to read `count` consecutive `T`s from,
/// each of which must be a valid `T`.
pub unsafe fn direct_slice<T: Copy>(src: *const T, count: usize) -> Vec<T> {
    if count == 0 {
        return Vec::new();
    }
    (0..count).map(|i| src.add(i).read_unaligned()).collect()
}
