use crate::device::ComputeDevice;
use crate::dtype::ElementType;

/// Errors raised by table construction, export, merge and accessor pulls.
///
/// All of these are contract violations detected eagerly at the offending
/// call. Nothing is retried and no partial result is ever returned.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// Incompatible extents, or tables that cannot be merged.
    ///
    /// `dtypes` is set when the tables agree on shape but not on element
    /// type, as `(receiver, other)`.
    #[error("{}", describe_shape(.expected, .got, .dtypes))]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
        dtypes: Option<(ElementType, ElementType)>,
    },

    #[error("{what} index {index} out of bounds (limit {bound})")]
    IndexOutOfBounds {
        what: &'static str,
        index: i64,
        bound: usize,
    },

    #[error("Unsupported element type: {0}")]
    UnsupportedType(String),

    #[error("Type mismatch: table stores {expected}, requested {got}")]
    TypeMismatch { expected: ElementType, got: ElementType },

    #[error("Compute device '{0}' is not available")]
    DeviceUnavailable(ComputeDevice),

    #[error("Unknown {kind} '{name}'")]
    InvalidName { kind: &'static str, name: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

fn describe_shape(expected: &[usize], got: &[usize], dtypes: &Option<(ElementType, ElementType)>) -> String {
    match dtypes {
        Some((want, have)) => format!("Shape mismatch: cannot merge {} rows into a {} table", have, want),
        None => format!("Shape mismatch: expected {:?}, got {:?}", expected, got),
    }
}

impl TableError {
    /// Whether this error reports incompatible shapes or incompatible tables.
    pub fn is_shape_mismatch(&self) -> bool {
        matches!(self, TableError::ShapeMismatch { .. })
    }

    pub(crate) fn shape(expected: Vec<usize>, got: Vec<usize>) -> Self {
        TableError::ShapeMismatch {
            expected,
            got,
            dtypes: None,
        }
    }

    /// Merge of two tables with `cols` columns each but different element types.
    pub(crate) fn merge_types(cols: usize, receiver: ElementType, other: ElementType) -> Self {
        TableError::ShapeMismatch {
            expected: vec![cols],
            got: vec![cols],
            dtypes: Some((receiver, other)),
        }
    }

    pub(crate) fn out_of_bounds(what: &'static str, index: impl TryInto<i64>, bound: usize) -> Self {
        TableError::IndexOutOfBounds {
            what,
            index: index.try_into().unwrap_or(i64::MAX),
            bound,
        }
    }
}
