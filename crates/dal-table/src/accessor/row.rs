use crate::device::ComputeDevice;
use crate::dtype::Element;
use crate::exec::{ExecutionContext, GatherPlan};
use crate::table::HomogenTable;
use crate::Result;

use super::{materialize, RowRange};

/// Extracts a block of whole rows, always in row-major order.
#[derive(Debug, Clone, Copy)]
pub struct RowAccessor<'a> {
    table: &'a HomogenTable,
    ctx: &'a ExecutionContext,
}

impl<'a> RowAccessor<'a> {
    pub fn new(table: &'a HomogenTable) -> Self {
        Self::with_context(table, ExecutionContext::shared())
    }

    pub fn with_context(table: &'a HomogenTable, ctx: &'a ExecutionContext) -> Self {
        Self { table, ctx }
    }

    /// The whole table, row-major, on the host.
    pub fn pull<T: Element>(&self) -> Result<Vec<T>> {
        self.pull_on(RowRange::ALL, ComputeDevice::Host)
    }

    pub fn pull_rows<T: Element>(&self, rows: impl Into<RowRange>) -> Result<Vec<T>> {
        self.pull_on(rows, ComputeDevice::Host)
    }

    /// Rows `rows` flattened row-major: `(end - start) * column_count` elements.
    pub fn pull_on<T: Element>(&self, rows: impl Into<RowRange>, device: ComputeDevice) -> Result<Vec<T>> {
        let t = self.table;
        let range = rows.into().resolve(t.row_count())?;
        tracing::trace!(
            "row pull: rows={:?} cols={} {}->{} on {}",
            range,
            t.column_count(),
            t.element_type(),
            T::TYPE,
            device
        );
        let plan = GatherPlan::rows(t.layout(), t.row_count(), t.column_count(), range);
        materialize(t, self.ctx, &plan, device)
    }

    pub fn pull_f64(&self, rows: impl Into<RowRange>, device: ComputeDevice) -> Result<Vec<f64>> {
        self.pull_on(rows, device)
    }

    pub fn pull_f32(&self, rows: impl Into<RowRange>, device: ComputeDevice) -> Result<Vec<f32>> {
        self.pull_on(rows, device)
    }

    pub fn pull_i32(&self, rows: impl Into<RowRange>, device: ComputeDevice) -> Result<Vec<i32>> {
        self.pull_on(rows, device)
    }

    pub fn pull_i64(&self, rows: impl Into<RowRange>, device: ComputeDevice) -> Result<Vec<i64>> {
        self.pull_on(rows, device)
    }
}
