//! Read-only views that extract typed arrays from a [`HomogenTable`].
//!
//! Accessors borrow the table and an [`ExecutionContext`]. Every pull
//! compiles a [`GatherPlan`], runs it on the requested device and returns a
//! freshly allocated `Vec<T>`, converting elements to `T` with `as`
//! semantics when `T` differs from the stored type.

pub mod column;
pub mod row;

use std::ops::{Range, RangeFrom, RangeFull};

use crate::device::ComputeDevice;
use crate::dtype::Element;
use crate::error::TableError;
use crate::exec::{ExecutionContext, GatherPlan};
use crate::table::HomogenTable;
use crate::Result;

pub use column::ColumnAccessor;
pub use row::RowAccessor;

/// Half-open row interval `[start, end)`. An open `end` means "through the
/// last row" and is resolved against the table at pull time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowRange {
    pub start: usize,
    pub end: Option<usize>,
}

impl RowRange {
    /// Every row.
    pub const ALL: RowRange = RowRange { start: 0, end: None };

    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end: Some(end) }
    }

    pub fn from_start(start: usize) -> Self {
        Self { start, end: None }
    }

    /// Build a range from signed bounds where `end == -1` means all rows.
    pub fn from_signed(start: i64, end: i64) -> Result<Self> {
        let start = usize::try_from(start).map_err(|_| TableError::out_of_bounds("row", start, 0))?;
        let end = match end {
            -1 => None,
            e => Some(usize::try_from(e).map_err(|_| TableError::out_of_bounds("row", e, 0))?),
        };
        Ok(Self { start, end })
    }

    /// Concrete index range for a table of `row_count` rows.
    pub fn resolve(&self, row_count: usize) -> Result<Range<usize>> {
        let end = self.end.unwrap_or(row_count);
        if end > row_count {
            return Err(TableError::out_of_bounds("row", end, row_count));
        }
        if self.start > end {
            return Err(TableError::out_of_bounds("row", self.start, end));
        }
        Ok(self.start..end)
    }
}

impl Default for RowRange {
    fn default() -> Self {
        Self::ALL
    }
}

impl From<Range<usize>> for RowRange {
    fn from(r: Range<usize>) -> Self {
        Self::new(r.start, r.end)
    }
}

impl From<RangeFrom<usize>> for RowRange {
    fn from(r: RangeFrom<usize>) -> Self {
        Self::from_start(r.start)
    }
}

impl From<RangeFull> for RowRange {
    fn from(_: RangeFull) -> Self {
        Self::ALL
    }
}

/// Run `plan` against `table` on `device` and hand back the typed result.
fn materialize<T: Element>(
    table: &HomogenTable,
    ctx: &ExecutionContext,
    plan: &GatherPlan,
    device: ComputeDevice,
) -> Result<Vec<T>> {
    ctx.gather(device, table.storage(), plan, T::TYPE)?.into_vec::<T>()
}
