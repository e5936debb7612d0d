use std::fmt;
use std::str::FromStr;

use crate::error::TableError;
use crate::storage::StorageData;

/// Element types a homogeneous table can store.
///
/// Fixed width; integers are signed, floats are IEEE 754.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    /// 32-bit signed integer
    Int32,
    /// 64-bit signed integer
    Int64,
    /// 32-bit IEEE 754 single-precision float
    Float32,
    /// 64-bit IEEE 754 double-precision float
    Float64,
}

impl ElementType {
    /// All supported element types, in declaration order.
    pub const ALL: [ElementType; 4] = [
        ElementType::Int32,
        ElementType::Int64,
        ElementType::Float32,
        ElementType::Float64,
    ];

    /// Size in bytes of a single element.
    pub fn element_size(&self) -> usize {
        match self {
            ElementType::Int32 | ElementType::Float32 => 4,
            ElementType::Int64 | ElementType::Float64 => 8,
        }
    }

    /// Number of bytes needed to store `n` elements of this type.
    pub fn storage_bytes(&self, n: usize) -> usize {
        self.element_size() * n
    }

    /// Whether this is an integer type.
    pub fn is_integer(&self) -> bool {
        matches!(self, ElementType::Int32 | ElementType::Int64)
    }

    /// Canonical lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            ElementType::Int32 => "int32",
            ElementType::Int64 => "int64",
            ElementType::Float32 => "float32",
            ElementType::Float64 => "float64",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ElementType {
    type Err = TableError;

    /// Any name outside the four supported types is an `UnsupportedType`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "int32" | "i32" | "int" => Ok(ElementType::Int32),
            "int64" | "i64" | "long" => Ok(ElementType::Int64),
            "float32" | "f32" | "float" => Ok(ElementType::Float32),
            "float64" | "f64" | "double" => Ok(ElementType::Float64),
            _ => Err(TableError::UnsupportedType(s.to_string())),
        }
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Rust scalar types that can live in a table: `i32`, `i64`, `f32`, `f64`.
///
/// The trait is sealed; the set is closed.
///
/// Conversions between element types follow Rust `as` semantics:
/// - int to float rounds to the nearest representable value,
/// - float to int truncates toward zero and saturates at the target's
///   bounds, with NaN mapping to 0,
/// - `i64` to `i32` keeps the low 32 bits (two's-complement wrap),
/// - `f64` to `f32` rounds to nearest, overflowing to infinity.
pub trait Element:
    bytemuck::Pod + PartialEq + fmt::Debug + Send + Sync + sealed::Sealed + 'static
{
    /// The `ElementType` tag for this Rust type.
    const TYPE: ElementType;

    fn from_i32(v: i32) -> Self;
    fn from_i64(v: i64) -> Self;
    fn from_f32(v: f32) -> Self;
    fn from_f64(v: f64) -> Self;

    /// Convert a single value to another element type.
    fn cast<D: Element>(self) -> D;

    /// Borrow the typed vector inside `data` if it holds `Self`.
    fn view(data: &StorageData) -> Option<&[Self]>;

    /// Wrap an owned vector into storage data.
    fn wrap(data: Vec<Self>) -> StorageData;

    /// Unwrap storage data holding `Self`, handing it back otherwise.
    fn take(data: StorageData) -> std::result::Result<Vec<Self>, StorageData>;
}

macro_rules! impl_element {
    ($t:ty, $variant:ident, $from:ident) => {
        impl sealed::Sealed for $t {}

        impl Element for $t {
            const TYPE: ElementType = ElementType::$variant;

            #[inline]
            fn from_i32(v: i32) -> Self {
                v as $t
            }
            #[inline]
            fn from_i64(v: i64) -> Self {
                v as $t
            }
            #[inline]
            fn from_f32(v: f32) -> Self {
                v as $t
            }
            #[inline]
            fn from_f64(v: f64) -> Self {
                v as $t
            }
            #[inline]
            fn cast<D: Element>(self) -> D {
                D::$from(self)
            }

            fn view(data: &StorageData) -> Option<&[Self]> {
                match data {
                    StorageData::$variant(v) => Some(v.as_slice()),
                    _ => None,
                }
            }

            fn wrap(data: Vec<Self>) -> StorageData {
                StorageData::$variant(data)
            }

            fn take(data: StorageData) -> std::result::Result<Vec<Self>, StorageData> {
                match data {
                    StorageData::$variant(v) => Ok(v),
                    other => Err(other),
                }
            }
        }
    };
}

impl_element!(i32, Int32, from_i32);
impl_element!(i64, Int64, from_i64);
impl_element!(f32, Float32, from_f32);
impl_element!(f64, Float64, from_f64);

/// Convert a slice element-by-element into a freshly allocated vector.
///
/// Same-type conversion is a plain copy.
pub fn convert_slice<S: Element, D: Element>(src: &[S]) -> Vec<D> {
    if S::TYPE == D::TYPE {
        return bytemuck::cast_slice::<S, D>(src).to_vec();
    }
    src.iter().map(|&v| v.cast::<D>()).collect()
}
