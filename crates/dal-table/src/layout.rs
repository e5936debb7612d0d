use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TableError;

/// Physical memory order of a 2-D table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// Element (r, c) at `r * column_count + c`.
    #[default]
    RowMajor,
    /// Element (r, c) at `c * row_count + r`.
    ColumnMajor,
}

impl Layout {
    /// Flat buffer offset of logical element (`row`, `col`) in a
    /// `rows` x `cols` table stored with this layout.
    #[inline]
    pub fn offset(&self, row: usize, col: usize, rows: usize, cols: usize) -> usize {
        match self {
            Layout::RowMajor => row * cols + col,
            Layout::ColumnMajor => col * rows + row,
        }
    }

    /// Distance between vertically adjacent elements of one column.
    #[inline]
    pub fn row_stride(&self, cols: usize) -> usize {
        match self {
            Layout::RowMajor => cols,
            Layout::ColumnMajor => 1,
        }
    }

    /// Distance between horizontally adjacent elements of one row.
    #[inline]
    pub fn column_stride(&self, rows: usize) -> usize {
        match self {
            Layout::RowMajor => 1,
            Layout::ColumnMajor => rows,
        }
    }
}

impl TryFrom<u32> for Layout {
    type Error = TableError;

    fn try_from(ordinal: u32) -> Result<Self, Self::Error> {
        match ordinal {
            0 => Ok(Layout::RowMajor),
            1 => Ok(Layout::ColumnMajor),
            other => Err(TableError::InvalidName {
                kind: "layout",
                name: other.to_string(),
            }),
        }
    }
}

impl FromStr for Layout {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "row_major" | "rowmajor" | "row" => Ok(Layout::RowMajor),
            "column_major" | "columnmajor" | "col_major" | "column" | "col" => {
                Ok(Layout::ColumnMajor)
            }
            _ => Err(TableError::InvalidName {
                kind: "layout",
                name: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::RowMajor => write!(f, "row_major"),
            Layout::ColumnMajor => write!(f, "column_major"),
        }
    }
}
