//! Convenience re-exports for common dal-table types.
//!
//! ```rust
//! use dal_table::prelude::*;
//! ```

pub use crate::HomogenTable;
pub use crate::ColumnAccessor;
pub use crate::RowAccessor;
pub use crate::RowRange;
pub use crate::ElementType;
pub use crate::Layout;
pub use crate::ComputeDevice;
pub use crate::ExecutionContext;
pub use crate::TableError;
pub use crate::Result;
