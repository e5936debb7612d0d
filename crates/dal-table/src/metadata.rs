use std::fmt;

use smallvec::SmallVec;

use crate::dtype::ElementType;
use crate::error::TableError;
use crate::Result;

/// Statistical kind of a feature (column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    Ordinal,
    Ratio,
    Nominal,
    Interval,
}

impl FeatureKind {
    /// Kind inferred for a column of the given element type:
    /// integers are ordinal, floats are ratio.
    pub fn for_type(dtype: ElementType) -> Self {
        if dtype.is_integer() {
            FeatureKind::Ordinal
        } else {
            FeatureKind::Ratio
        }
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureKind::Ordinal => write!(f, "ordinal"),
            FeatureKind::Ratio => write!(f, "ratio"),
            FeatureKind::Nominal => write!(f, "nominal"),
            FeatureKind::Interval => write!(f, "interval"),
        }
    }
}

/// Type information for one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColumnInfo {
    pub dtype: ElementType,
    pub feature: FeatureKind,
}

impl ColumnInfo {
    pub fn new(dtype: ElementType) -> Self {
        Self {
            dtype,
            feature: FeatureKind::for_type(dtype),
        }
    }
}

/// Per-column type registry of a table.
///
/// Holds exactly one entry per column. Inline storage covers the common
/// case of narrow tables without a heap allocation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableMetadata {
    columns: SmallVec<[ColumnInfo; 8]>,
}

impl TableMetadata {
    /// Metadata with no columns.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Replicate the inferred `(dtype, feature kind)` pair for `column_count` columns.
    pub fn uniform(dtype: ElementType, column_count: usize) -> Self {
        Self {
            columns: SmallVec::from_elem(ColumnInfo::new(dtype), column_count),
        }
    }

    /// Number of described columns.
    pub fn feature_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Element type of column `index`.
    pub fn data_type(&self, index: usize) -> Result<ElementType> {
        self.column(index).map(|c| c.dtype)
    }

    /// Feature kind of column `index`.
    pub fn feature_type(&self, index: usize) -> Result<FeatureKind> {
        self.column(index).map(|c| c.feature)
    }

    /// Full column entry for `index`.
    pub fn column(&self, index: usize) -> Result<&ColumnInfo> {
        self.columns
            .get(index)
            .ok_or_else(|| TableError::out_of_bounds("feature", index, self.columns.len()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnInfo> {
        self.columns.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_inference() {
        assert_eq!(FeatureKind::for_type(ElementType::Int32), FeatureKind::Ordinal);
        assert_eq!(FeatureKind::for_type(ElementType::Int64), FeatureKind::Ordinal);
        assert_eq!(FeatureKind::for_type(ElementType::Float32), FeatureKind::Ratio);
        assert_eq!(FeatureKind::for_type(ElementType::Float64), FeatureKind::Ratio);
    }

    #[test]
    fn test_uniform() {
        let m = TableMetadata::uniform(ElementType::Int64, 3);
        assert_eq!(m.feature_count(), 3);
        for i in 0..3 {
            assert_eq!(m.data_type(i).unwrap(), ElementType::Int64);
            assert_eq!(m.feature_type(i).unwrap(), FeatureKind::Ordinal);
        }
    }

    #[test]
    fn test_wide_table_spills() {
        let m = TableMetadata::uniform(ElementType::Float32, 40);
        assert_eq!(m.feature_count(), 40);
        assert_eq!(m.iter().filter(|c| c.feature == FeatureKind::Ratio).count(), 40);
    }

    #[test]
    fn test_out_of_range() {
        let m = TableMetadata::uniform(ElementType::Float64, 2);
        assert!(matches!(
            m.data_type(2),
            Err(TableError::IndexOutOfBounds { what: "feature", index: 2, bound: 2 })
        ));
        assert!(m.feature_type(5).is_err());
    }

    #[test]
    fn test_empty() {
        let m = TableMetadata::empty();
        assert!(m.is_empty());
        assert_eq!(m.feature_count(), 0);
    }
}
