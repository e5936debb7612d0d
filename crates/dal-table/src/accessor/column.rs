use crate::device::ComputeDevice;
use crate::dtype::Element;
use crate::error::TableError;
use crate::exec::{ExecutionContext, GatherPlan};
use crate::table::HomogenTable;
use crate::Result;

use super::{materialize, RowRange};

/// Extracts one column, or a row slice of it, as a contiguous array.
#[derive(Debug, Clone, Copy)]
pub struct ColumnAccessor<'a> {
    table: &'a HomogenTable,
    ctx: &'a ExecutionContext,
}

impl<'a> ColumnAccessor<'a> {
    /// Accessor using the process-wide default context.
    pub fn new(table: &'a HomogenTable) -> Self {
        Self::with_context(table, ExecutionContext::shared())
    }

    pub fn with_context(table: &'a HomogenTable, ctx: &'a ExecutionContext) -> Self {
        Self { table, ctx }
    }

    /// Every row of `column`, on the host.
    pub fn pull<T: Element>(&self, column: usize) -> Result<Vec<T>> {
        self.pull_on(column, RowRange::ALL, ComputeDevice::Host)
    }

    pub fn pull_rows<T: Element>(&self, column: usize, rows: impl Into<RowRange>) -> Result<Vec<T>> {
        self.pull_on(column, rows, ComputeDevice::Host)
    }

    /// Rows `rows` of `column`, gathered on `device` and converted to `T`.
    pub fn pull_on<T: Element>(&self, column: usize, rows: impl Into<RowRange>, device: ComputeDevice) -> Result<Vec<T>> {
        let t = self.table;
        if column >= t.column_count() {
            return Err(TableError::out_of_bounds("column", column, t.column_count()));
        }
        let range = rows.into().resolve(t.row_count())?;
        tracing::trace!(
            "column pull: col={} rows={:?} {}->{} on {}",
            column,
            range,
            t.element_type(),
            T::TYPE,
            device
        );
        let plan = GatherPlan::column(t.layout(), t.row_count(), t.column_count(), column, range);
        materialize(t, self.ctx, &plan, device)
    }

    pub fn pull_f64(&self, column: usize, rows: impl Into<RowRange>, device: ComputeDevice) -> Result<Vec<f64>> {
        self.pull_on(column, rows, device)
    }

    pub fn pull_f32(&self, column: usize, rows: impl Into<RowRange>, device: ComputeDevice) -> Result<Vec<f32>> {
        self.pull_on(column, rows, device)
    }

    pub fn pull_i32(&self, column: usize, rows: impl Into<RowRange>, device: ComputeDevice) -> Result<Vec<i32>> {
        self.pull_on(column, rows, device)
    }

    pub fn pull_i64(&self, column: usize, rows: impl Into<RowRange>, device: ComputeDevice) -> Result<Vec<i64>> {
        self.pull_on(column, rows, device)
    }
}
