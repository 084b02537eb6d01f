/*!
The sizes and alignments of native primitive types,
measured from a `#[repr(C)]` struct laid out by the compiler.
*/

use std::{
    borrow::Cow,
    collections::BTreeMap,
    ffi::{c_char, c_int, c_long, c_longlong, c_short, c_void},
    fmt::{self, Display},
    mem,
};

use core_extensions::StringExt;

use once_cell::sync::Lazy;

use serde::{Deserialize, Serialize};


/// The size and alignment of one native primitive type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrimitiveTypeInfo {
    pub name: String,
    pub size: usize,
    pub alignment: usize,
}

/// Target properties recorded alongside the primitive table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlatformInfo {
    pub pointer_size: usize,
    pub little_endian: bool,
}

impl PlatformInfo {
    /// The platform this crate was compiled for.
    pub const fn host() -> Self {
        Self {
            pointer_size: mem::size_of::<*const c_void>(),
            little_endian: cfg!(target_endian = "little"),
        }
    }

    pub const fn is_64bit(&self) -> bool {
        self.pointer_size == 8
    }
}

impl Display for PlatformInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-bit {}-endian",
            self.pointer_size * 8,
            if self.little_endian { "little" } else { "big" },
        )
    }
}

/// A table of native primitive types, keyed by normalized type name.
///
/// Every pointer-shaped name (`pointer`, or anything ending in `*`)
/// resolves to the `pointer` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimitiveTypeTable {
    platform: PlatformInfo,
    entries: BTreeMap<String, PrimitiveTypeInfo>,
}

impl PrimitiveTypeTable {
    /// An empty table for `platform`.
    pub fn new(platform: PlatformInfo) -> Self {
        Self {
            platform,
            entries: BTreeMap::new(),
        }
    }

    /// Adds or replaces the entry for `name`.
    pub fn insert(&mut self, name: &str, size: usize, alignment: usize) -> &mut Self {
        let name = normalize_type_name(name).into_owned();
        let info = PrimitiveTypeInfo {
            name: name.clone(),
            size,
            alignment,
        };
        self.entries.insert(name, info);
        self
    }

    /// Looks up a type by name, normalizing it first.
    pub fn get(&self, name: &str) -> Option<&PrimitiveTypeInfo> {
        let name = normalize_type_name(name);
        match self.entries.get(&*name) {
            Some(x) => Some(x),
            None if is_pointer_name(&name) => self.entries.get(POINTER),
            None => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn platform(&self) -> PlatformInfo {
        self.platform
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PrimitiveTypeInfo> + '_ {
        self.entries.values()
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

impl Display for PrimitiveTypeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "primitive types ({}):", self.platform)?;
        for info in self.entries.values() {
            let line = format!(
                "{:<20} size: {:<2} alignment: {}",
                info.name, info.size, info.alignment
            );
            writeln!(f, "{}", line.left_padder(4))?;
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////

const POINTER: &str = "pointer";

/// Normalizes the spelling of a native type name.
///
/// Trims and collapses whitespace, attaches `*` and `[` to the preceding word,
/// and drops a leading `const`.
pub fn normalize_type_name(name: &str) -> Cow<'_, str> {
    let trimmed = name.trim();
    let trimmed = match trimmed.strip_prefix("const ") {
        Some(rest) => rest.trim_start(),
        None => trimmed,
    };
    if !trimmed.contains(char::is_whitespace) {
        return Cow::Borrowed(trimmed);
    }

    let mut out = String::with_capacity(trimmed.len());
    for word in trimmed.split_whitespace() {
        if !out.is_empty() && !word.starts_with('*') && !word.starts_with('[') {
            out.push(' ');
        }
        out.push_str(word);
    }
    Cow::Owned(out)
}

/// Whether `name` is `pointer` or a `*`-suffixed type.
pub fn is_pointer_name(name: &str) -> bool {
    let name = normalize_type_name(name);
    name == POINTER || name.ends_with('*')
}

/// Whether `name` is a nul-terminated native string (`char*`).
pub fn is_string_name(name: &str) -> bool {
    normalize_type_name(name) == "char*"
}

/// Infers a type's alignment from where the compiler placed it.
///
/// `prev_end` is the end offset of the field before it.
/// A type placed right at `prev_end` is reported with alignment 1,
/// except for 2 and 8 byte types, which are assumed to be aligned to their size.
/// Otherwise the alignment is the largest power of two that is at most `size`
/// and divides `offset`.
pub fn infer_alignment(prev_end: usize, offset: usize, size: usize) -> usize {
    if offset == prev_end {
        return match size {
            1 | 2 | 8 => size,
            _ => 1,
        };
    }
    let mut align = if size.is_power_of_two() {
        size
    } else {
        size.next_power_of_two() / 2
    };
    while align > 1 && offset % align != 0 {
        align /= 2;
    }
    align.max(1)
}

/// Rounds `offset` up to a multiple of `align`.
pub const fn round_up(offset: usize, align: usize) -> usize {
    if align <= 1 {
        offset
    } else {
        (offset + align - 1) / align * align
    }
}

/// Rounds `offset` up to a multiple of `align`, returning `None` on overflow.
pub const fn checked_round_up(offset: usize, align: usize) -> Option<usize> {
    if align <= 1 {
        return Some(offset);
    }
    match offset.checked_add(align - 1) {
        Some(x) => Some(x / align * align),
        None => None,
    }
}

////////////////////////////////////////////////////////////////////////////////

/// Every type of interest is preceded by a byte, so that the compiler
/// inserts padding before it unless the type is 1-aligned.
#[repr(C)]
#[allow(dead_code)]
struct AlignmentProbe {
    lead_i16: u8,
    int16: i16,
    lead_i32: u8,
    int32: i32,
    lead_i64: u8,
    int64: i64,
    lead_f32: u8,
    float: f32,
    lead_f64: u8,
    double: f64,
    lead_ptr: u8,
    pointer: *const c_void,
    lead_size: u8,
    size: usize,
    lead_short: u8,
    short: c_short,
    lead_int: u8,
    int: c_int,
    lead_long: u8,
    long: c_long,
    lead_llong: u8,
    long_long: c_longlong,
    lead_i8: u8,
    int8: i8,
    char_: c_char,
    bool_: bool,
}

struct Measurement {
    names: &'static [&'static str],
    size: usize,
    prev_end: usize,
    offset: usize,
}

macro_rules! measure {
    (
        $( $lead:ident => $field:ident : $ty:ty = [ $($name:literal),* $(,)? ] ;)*
    ) => {
        [$(
            Measurement {
                names: &[$($name),*],
                size: mem::size_of::<$ty>(),
                prev_end: mem::offset_of!(AlignmentProbe, $lead) + 1,
                offset: mem::offset_of!(AlignmentProbe, $field),
            },
        )*]
    };
}

fn measurements() -> impl IntoIterator<Item = Measurement> {
    measure! {
        lead_i16 => int16: i16 = ["int16_t", "uint16_t", "int16", "uint16"];
        lead_i32 => int32: i32 = ["int32_t", "uint32_t", "int32", "uint32"];
        lead_i64 => int64: i64 = ["int64_t", "uint64_t", "int64", "uint64"];
        lead_f32 => float: f32 = ["float", "float32"];
        lead_f64 => double: f64 = ["double", "float64"];
        lead_ptr => pointer: *const c_void = ["pointer", "void*", "char*"];
        lead_size => size: usize = ["size_t", "uintptr_t", "ssize_t", "intptr_t", "ptrdiff_t"];
        lead_short => short: c_short = ["short", "unsigned short"];
        lead_int => int: c_int = ["int", "unsigned int", "unsigned"];
        lead_long => long: c_long = ["long", "unsigned long"];
        lead_llong => long_long: c_longlong = ["long long", "unsigned long long"];
        lead_i8 => int8: i8 = ["int8_t", "uint8_t", "int8", "uint8", "signed char", "unsigned char"];
        int8 => char_: c_char = ["char"];
        char_ => bool_: bool = ["bool", "_Bool"];
    }
}

/// Builds the primitive table from the compiler's layout of [`AlignmentProbe`].
fn probe_host() -> PrimitiveTypeTable {
    let mut table = PrimitiveTypeTable::new(PlatformInfo::host());

    for m in measurements() {
        let alignment = infer_alignment(m.prev_end, m.offset, m.size);
        if round_up(m.prev_end, alignment) != m.offset {
            tracing::warn!(
                types = ?m.names,
                size = m.size,
                offset = m.offset,
                "could not infer a consistent alignment, leaving these types out"
            );
            continue;
        }
        for name in m.names {
            table.insert(name, m.size, alignment);
        }
    }

    tracing::debug!(
        entries = table.len(),
        probe_size = mem::size_of::<AlignmentProbe>(),
        platform = %table.platform,
        "probed native primitive types"
    );
    table
}

static HOST_TABLE: Lazy<PrimitiveTypeTable> = Lazy::new(probe_host);

/// The primitive table of the host, measured on first use.
pub fn probe() -> &'static PrimitiveTypeTable {
    &HOST_TABLE
}
