use std::fmt;

use crate::device::ComputeDevice;
use crate::dtype::{Element, ElementType};
use crate::error::TableError;
use crate::exec::{ExecutionContext, GatherPlan};
use crate::layout::Layout;
use crate::metadata::TableMetadata;
use crate::storage::Storage;
use crate::Result;

/// Concrete kind of a table, with the stable numeric id used by callers
/// that switch on table kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    /// The canonical 0 x 0 table.
    Empty,
    /// A table whose columns all share one element type.
    Homogen,
}

impl TableKind {
    pub fn id(&self) -> u32 {
        match self {
            TableKind::Empty => 1,
            TableKind::Homogen => 2,
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableKind::Empty => write!(f, "empty"),
            TableKind::Homogen => write!(f, "homogen"),
        }
    }
}

/// A dense two-dimensional table of one numeric element type.
///
/// The buffer holds exactly `row_count * column_count` elements ordered by
/// [`Layout`]. Shape and element type are fixed at construction; the only
/// mutation is [`add_homogen_table`](Self::add_homogen_table), which appends
/// rows.
///
/// Values are read through [`ColumnAccessor`](crate::ColumnAccessor) and
/// [`RowAccessor`](crate::RowAccessor), or exported raw with
/// [`as_slice`](Self::as_slice).
#[derive(Clone, PartialEq)]
pub struct HomogenTable {
    rows: usize,
    cols: usize,
    layout: Layout,
    metadata: TableMetadata,
    device: ComputeDevice,
    storage: Storage,
}

impl HomogenTable {
    // =========================================================================
    // Construction
    // =========================================================================

    /// The canonical empty table: 0 x 0, float64, no data.
    pub fn new() -> Self {
        Self {
            rows: 0,
            cols: 0,
            layout: Layout::RowMajor,
            metadata: TableMetadata::empty(),
            device: ComputeDevice::Host,
            storage: Storage::empty(ElementType::Float64),
        }
    }

    /// Wrap `data` as a `rows` x `cols` table. The buffer is taken as-is
    /// and interpreted under `layout`; nothing is reordered.
    pub fn from_vec<T: Element>(rows: usize, cols: usize, data: Vec<T>, layout: Layout) -> Result<Self> {
        let numel = checked_numel(rows, cols)?;
        if data.len() != numel {
            return Err(TableError::shape(vec![rows, cols], vec![data.len()]));
        }
        Ok(Self::from_storage(rows, cols, Storage::from_vec(data), layout))
    }

    /// Copying variant of [`from_vec`](Self::from_vec).
    pub fn from_slice<T: Element>(rows: usize, cols: usize, data: &[T], layout: Layout) -> Result<Self> {
        Self::from_vec(rows, cols, data.to_vec(), layout)
    }

    /// Create a table bound to `device`.
    ///
    /// Binding to `gpu` needs an available accelerator on `ctx`.
    pub fn from_vec_on<T: Element>(
        rows: usize,
        cols: usize,
        data: Vec<T>,
        layout: Layout,
        device: ComputeDevice,
        ctx: &ExecutionContext,
    ) -> Result<Self> {
        ctx.ensure_available(device)?;
        Ok(Self::from_vec(rows, cols, data, layout)?.with_device(device))
    }

    /// Build a table from native-endian bytes of `dtype` elements.
    pub fn from_bytes(rows: usize, cols: usize, dtype: ElementType, bytes: &[u8], layout: Layout) -> Result<Self> {
        let numel = checked_numel(rows, cols)?;
        let storage = Storage::from_bytes(dtype, numel, bytes)?;
        Ok(Self::from_storage(rows, cols, storage, layout))
    }

    fn from_storage(rows: usize, cols: usize, storage: Storage, layout: Layout) -> Self {
        let dtype = storage.dtype();
        tracing::debug!(
            "created {}x{} {} table ({}, {} bytes)",
            rows,
            cols,
            dtype,
            layout,
            storage.nbytes()
        );
        Self {
            rows,
            cols,
            layout,
            metadata: TableMetadata::uniform(dtype, cols),
            device: ComputeDevice::Host,
            storage,
        }
    }

    /// Record the device this table is bound to. Callers check availability.
    pub(crate) fn with_device(mut self, device: ComputeDevice) -> Self {
        self.device = device;
        self
    }

    // =========================================================================
    // Properties
    // =========================================================================

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn column_count(&self) -> usize {
        self.cols
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn element_type(&self) -> ElementType {
        self.storage.dtype()
    }

    pub fn metadata(&self) -> &TableMetadata {
        &self.metadata
    }

    pub fn device(&self) -> ComputeDevice {
        self.device
    }

    /// Total number of elements.
    pub fn numel(&self) -> usize {
        self.storage.numel()
    }

    /// True when the table has at least one row and one column.
    pub fn has_data(&self) -> bool {
        self.rows > 0 && self.cols > 0
    }

    pub fn kind(&self) -> TableKind {
        if self.rows == 0 && self.cols == 0 {
            TableKind::Empty
        } else {
            TableKind::Homogen
        }
    }

    pub(crate) fn storage(&self) -> &Storage {
        &self.storage
    }

    // =========================================================================
    // Raw export
    // =========================================================================

    /// Borrow the buffer in storage order.
    ///
    /// `T` must be the stored element type. Use the accessors for converted
    /// reads.
    pub fn as_slice<T: Element>(&self) -> Result<&[T]> {
        self.storage.as_slice::<T>().ok_or(TableError::TypeMismatch {
            expected: self.element_type(),
            got: T::TYPE,
        })
    }

    pub fn as_i32_slice(&self) -> Result<&[i32]> {
        self.as_slice::<i32>()
    }

    pub fn as_i64_slice(&self) -> Result<&[i64]> {
        self.as_slice::<i64>()
    }

    pub fn as_f32_slice(&self) -> Result<&[f32]> {
        self.as_slice::<f32>()
    }

    pub fn as_f64_slice(&self) -> Result<&[f64]> {
        self.as_slice::<f64>()
    }

    /// Owned copy of the buffer. Same type rule as [`as_slice`](Self::as_slice).
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>> {
        self.as_slice::<T>().map(|s| s.to_vec())
    }

    /// Native-endian byte image of the buffer.
    pub fn as_bytes(&self) -> &[u8] {
        self.storage.as_bytes()
    }

    // =========================================================================
    // Merge
    // =========================================================================

    /// Append the rows of `other` on the host.
    pub fn add_homogen_table(&mut self, other: &HomogenTable) -> Result<()> {
        self.add_homogen_table_on(other, ComputeDevice::Host, ExecutionContext::shared())
    }

    /// Append the rows of `other`, running the copy on `device`.
    ///
    /// Both tables need the same column count and element type. The result
    /// keeps this table's layout: a column-major receiver gets each of
    /// `other`'s columns spliced after its own column of the same index.
    /// On error `self` is left untouched.
    pub fn add_homogen_table_on(&mut self, other: &HomogenTable, device: ComputeDevice, ctx: &ExecutionContext) -> Result<()> {
        if other.cols != self.cols {
            return Err(TableError::shape(vec![self.cols], vec![other.cols]));
        }
        if other.element_type() != self.element_type() {
            return Err(TableError::merge_types(self.cols, self.element_type(), other.element_type()));
        }
        let rows = self
            .rows
            .checked_add(other.rows)
            .ok_or_else(|| TableError::shape(vec![self.rows, other.rows], vec![usize::MAX]))?;

        let storage = match self.layout {
            Layout::RowMajor => {
                let plan = GatherPlan::rows(other.layout, other.rows, other.cols, 0..other.rows);
                let tail = ctx.gather(device, &other.storage, &plan, self.element_type())?;
                self.storage.interleave(self.storage.numel(), &tail, tail.numel(), 1)?
            }
            Layout::ColumnMajor => {
                let plan = GatherPlan::columns(other.layout, other.rows, other.cols);
                let tail = ctx.gather(device, &other.storage, &plan, self.element_type())?;
                self.storage.interleave(self.rows, &tail, other.rows, self.cols)?
            }
        };

        tracing::debug!(
            "merged {}x{} {} table into {} receiver on {}: {} -> {} rows",
            other.rows,
            other.cols,
            other.layout,
            self.layout,
            device,
            self.rows,
            rows
        );
        self.storage = storage;
        self.rows = rows;
        Ok(())
    }

    /// Non-mutating merge: a new table holding `a`'s rows then `b`'s.
    pub fn merge(a: &HomogenTable, b: &HomogenTable) -> Result<HomogenTable> {
        let mut out = a.clone();
        out.add_homogen_table(b)?;
        Ok(out)
    }
}

impl Default for HomogenTable {
    fn default() -> Self {
        Self::new()
    }
}

fn checked_numel(rows: usize, cols: usize) -> Result<usize> {
    rows.checked_mul(cols)
        .ok_or_else(|| TableError::shape(vec![rows, cols], vec![usize::MAX]))
}

impl fmt::Debug for HomogenTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HomogenTable(rows={}, cols={}, dtype={}, layout={}, device={}, kind={})",
            self.rows,
            self.cols,
            self.element_type(),
            self.layout,
            self.device,
            self.kind(),
        )
    }
}

impl fmt::Display for HomogenTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.has_data() {
            return write!(f, "table({}x{}, {})", self.rows, self.cols, self.kind());
        }
        write!(
            f,
            "table({}x{}, {}, {}, {})",
            self.rows,
            self.cols,
            self.element_type(),
            self.layout,
            self.device
        )
    }
}
