use crate::dtype::{Element, ElementType};
use crate::error::TableError;
use crate::Result;

/// Typed backing vector of a table.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageData {
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
}

/// Contiguous, exclusively owned element buffer.
///
/// The element type is fixed by the variant of the inner data, so the
/// buffer is always correctly aligned for its type. Byte views go through
/// `bytemuck`.
#[derive(Debug, Clone, PartialEq)]
pub struct Storage {
    data: StorageData,
}

impl Storage {
    /// Zero-length storage of the given type.
    pub fn empty(dtype: ElementType) -> Self {
        let data = match dtype {
            ElementType::Int32 => StorageData::Int32(Vec::new()),
            ElementType::Int64 => StorageData::Int64(Vec::new()),
            ElementType::Float32 => StorageData::Float32(Vec::new()),
            ElementType::Float64 => StorageData::Float64(Vec::new()),
        };
        Self { data }
    }

    /// Take ownership of a typed vector.
    pub fn from_vec<T: Element>(data: Vec<T>) -> Self {
        Self { data: T::wrap(data) }
    }

    /// Copy a typed slice.
    pub fn from_slice<T: Element>(data: &[T]) -> Self {
        Self::from_vec(data.to_vec())
    }

    /// Create storage from native-endian bytes.
    pub fn from_bytes(dtype: ElementType, numel: usize, bytes: &[u8]) -> Result<Self> {
        let expected = numel
            .checked_mul(dtype.element_size())
            .ok_or_else(|| TableError::shape(vec![numel], vec![bytes.len()]))?;
        if bytes.len() != expected {
            return Err(TableError::shape(vec![expected], vec![bytes.len()]));
        }
        // pod_collect_to_vec copies into a correctly aligned allocation.
        let data = match dtype {
            ElementType::Int32 => StorageData::Int32(bytemuck::pod_collect_to_vec(bytes)),
            ElementType::Int64 => StorageData::Int64(bytemuck::pod_collect_to_vec(bytes)),
            ElementType::Float32 => StorageData::Float32(bytemuck::pod_collect_to_vec(bytes)),
            ElementType::Float64 => StorageData::Float64(bytemuck::pod_collect_to_vec(bytes)),
        };
        Ok(Self { data })
    }

    /// Element type of this storage.
    pub fn dtype(&self) -> ElementType {
        match &self.data {
            StorageData::Int32(_) => ElementType::Int32,
            StorageData::Int64(_) => ElementType::Int64,
            StorageData::Float32(_) => ElementType::Float32,
            StorageData::Float64(_) => ElementType::Float64,
        }
    }

    /// Number of elements.
    pub fn numel(&self) -> usize {
        match &self.data {
            StorageData::Int32(v) => v.len(),
            StorageData::Int64(v) => v.len(),
            StorageData::Float32(v) => v.len(),
            StorageData::Float64(v) => v.len(),
        }
    }

    /// Size in bytes.
    pub fn nbytes(&self) -> usize {
        self.dtype().storage_bytes(self.numel())
    }

    /// Native-endian byte view of the whole buffer.
    pub fn as_bytes(&self) -> &[u8] {
        match &self.data {
            StorageData::Int32(v) => bytemuck::cast_slice(v),
            StorageData::Int64(v) => bytemuck::cast_slice(v),
            StorageData::Float32(v) => bytemuck::cast_slice(v),
            StorageData::Float64(v) => bytemuck::cast_slice(v),
        }
    }

    /// Typed view. Returns None if `T` is not the stored type.
    pub fn as_slice<T: Element>(&self) -> Option<&[T]> {
        T::view(&self.data)
    }

    /// Consume the storage into a typed vector.
    pub fn into_vec<T: Element>(self) -> Result<Vec<T>> {
        let got = self.dtype();
        T::take(self.data).map_err(|_| TableError::TypeMismatch {
            expected: got,
            got: T::TYPE,
        })
    }

    /// Raw data enum (for dispatch).
    pub fn data(&self) -> &StorageData {
        &self.data
    }

    /// Interleave fixed-size blocks of two buffers of the same type.
    ///
    /// Output is `self[0..a] ++ other[0..b] ++ self[a..2a] ++ other[b..2b] ...`
    /// for `blocks` rounds. With `blocks == 1` this is a plain append.
    pub fn interleave(&self, a_block: usize, other: &Storage, b_block: usize, blocks: usize) -> Result<Storage> {
        if a_block * blocks != self.numel() || b_block * blocks != other.numel() {
            return Err(TableError::shape(
                vec![a_block * blocks, b_block * blocks],
                vec![self.numel(), other.numel()],
            ));
        }
        let data = match (&self.data, &other.data) {
            (StorageData::Int32(a), StorageData::Int32(b)) => {
                StorageData::Int32(interleave_blocks(a, a_block, b, b_block, blocks))
            }
            (StorageData::Int64(a), StorageData::Int64(b)) => {
                StorageData::Int64(interleave_blocks(a, a_block, b, b_block, blocks))
            }
            (StorageData::Float32(a), StorageData::Float32(b)) => {
                StorageData::Float32(interleave_blocks(a, a_block, b, b_block, blocks))
            }
            (StorageData::Float64(a), StorageData::Float64(b)) => {
                StorageData::Float64(interleave_blocks(a, a_block, b, b_block, blocks))
            }
            _ => {
                return Err(TableError::ShapeMismatch {
                    expected: vec![self.numel()],
                    got: vec![other.numel()],
                    dtypes: Some((self.dtype(), other.dtype())),
                })
            }
        };
        Ok(Self { data })
    }
}

fn interleave_blocks<T: Copy>(a: &[T], a_block: usize, b: &[T], b_block: usize, blocks: usize) -> Vec<T> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    for i in 0..blocks {
        out.extend_from_slice(&a[i * a_block..(i + 1) * a_block]);
        out.extend_from_slice(&b[i * b_block..(i + 1) * b_block]);
    }
    out
}
