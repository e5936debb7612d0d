//! # dal-table
//!
//! Dense homogeneous tables for data-analytics pipelines.
//!
//! Provides the `HomogenTable` type with:
//! - Four element types (int32, int64, float32, float64)
//! - Row-major and column-major layouts
//! - Column and row accessors with per-element type conversion
//! - Host, multi-threaded CPU and pluggable accelerator execution
//! - Row-wise merge of compatible tables

pub mod dtype;
pub mod layout;
pub mod device;
pub mod metadata;
pub mod storage;
pub mod table;
pub mod accessor;
pub mod exec;
pub mod config;
pub mod error;
pub mod prelude;

pub use dtype::{Element, ElementType};
pub use layout::Layout;
pub use device::ComputeDevice;
pub use metadata::{ColumnInfo, FeatureKind, TableMetadata};
pub use storage::Storage;
pub use table::{HomogenTable, TableKind};
pub use accessor::{ColumnAccessor, RowAccessor, RowRange};
pub use exec::{Accelerator, ExecutionContext, GatherPlan, Segment};
pub use config::ExecutionConfig;
pub use error::TableError;

pub type Result<T> = std::result::Result<T, TableError>;
