//! Rectangular cell ranges and whole column/row ranges.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::reference::{CellRef, ColumnRef, RowRef, SelectionParseError};

fn split_range(s: &str) -> Result<(&str, &str), SelectionParseError> {
    let mut parts = s.split(':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(begin), Some(end), None) if !begin.is_empty() && !end.is_empty() => Ok((begin, end)),
        _ => Err(SelectionParseError::InvalidRange(s.to_string())),
    }
}

// ============================================================================
// CellRange
// ============================================================================

/// A rectangular range of cells, inclusive on both ends.
///
/// Always normalized so `begin` is the top-left and `end` the bottom-right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CellRange {
    begin: CellRef,
    end: CellRef,
}

impl CellRange {
    /// Create a new range, normalizing so begin <= end on both axes.
    pub fn new(a: CellRef, b: CellRef) -> Self {
        let (c1, c2) = (a.column(), b.column());
        let (r1, r2) = (a.row(), b.row());
        Self {
            begin: CellRef::new(c1.min(c2), r1.min(r2)),
            end: CellRef::new(c1.max(c2), r1.max(r2)),
        }
    }

    /// Create a single-cell range.
    pub fn single(cell: CellRef) -> Self {
        Self {
            begin: cell,
            end: cell,
        }
    }

    pub fn begin(&self) -> CellRef {
        self.begin
    }

    pub fn end(&self) -> CellRef {
        self.end
    }

    pub fn width(&self) -> u32 {
        self.end.column().value() - self.begin.column().value() + 1
    }

    pub fn height(&self) -> u32 {
        self.end.row().value() - self.begin.row().value() + 1
    }

    /// Number of cells in this range.
    pub fn cell_count(&self) -> u64 {
        u64::from(self.width()) * u64::from(self.height())
    }

    /// Check if this range contains a cell.
    pub fn contains(&self, cell: CellRef) -> bool {
        cell.column() >= self.begin.column()
            && cell.column() <= self.end.column()
            && cell.row() >= self.begin.row()
            && cell.row() <= self.end.row()
    }

    pub fn intersects(&self, other: &CellRange) -> bool {
        self.intersection(other).is_some()
    }

    /// The overlapping rectangle, if any.
    pub fn intersection(&self, other: &CellRange) -> Option<CellRange> {
        let begin_col = self.begin.column().max(other.begin.column());
        let end_col = self.end.column().min(other.end.column());
        let begin_row = self.begin.row().max(other.begin.row());
        let end_row = self.end.row().min(other.end.row());
        if begin_col > end_col || begin_row > end_row {
            return None;
        }
        Some(Self {
            begin: CellRef::new(begin_col, begin_row),
            end: CellRef::new(end_col, end_row),
        })
    }

    pub fn columns(&self) -> ColumnRange {
        ColumnRange::new(self.begin.column(), self.end.column())
    }

    pub fn rows(&self) -> RowRange {
        RowRange::new(self.begin.row(), self.end.row())
    }

    /// Iterate over all cells in this range (row-major order).
    pub fn cells(&self) -> impl Iterator<Item = CellRef> {
        let (start_col, end_col) = (self.begin.column().value(), self.end.column().value());
        let (start_row, end_row) = (self.begin.row().value(), self.end.row().value());

        (start_row..=end_row).flat_map(move |r| {
            (start_col..=end_col).filter_map(move |c| CellRef::from_coords(c, r))
        })
    }

    /// Check if this is a single cell.
    pub fn is_single(&self) -> bool {
        self.begin == self.end
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.begin, self.end)
    }
}

impl FromStr for CellRange {
    type Err = SelectionParseError;

    /// Accepts `A1:B2` as well as a lone cell `A1`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.contains(':') {
            return s.parse().map(CellRange::single);
        }
        let (begin, end) = split_range(s)?;
        let bad = |_| SelectionParseError::InvalidRange(s.to_string());
        Ok(CellRange::new(begin.parse().map_err(bad)?, end.parse().map_err(bad)?))
    }
}

impl TryFrom<String> for CellRange {
    type Error = SelectionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CellRange> for String {
    fn from(value: CellRange) -> Self {
        value.to_string()
    }
}

// ============================================================================
// ColumnRange / RowRange
// ============================================================================

/// A run of whole columns, e.g. `B:D`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ColumnRange {
    begin: ColumnRef,
    end: ColumnRef,
}

impl ColumnRange {
    pub fn new(a: ColumnRef, b: ColumnRef) -> Self {
        Self {
            begin: a.min(b),
            end: a.max(b),
        }
    }

    pub fn begin(&self) -> ColumnRef {
        self.begin
    }

    pub fn end(&self) -> ColumnRef {
        self.end
    }

    pub fn contains(&self, column: ColumnRef) -> bool {
        column >= self.begin && column <= self.end
    }

    pub fn count(&self) -> u32 {
        self.end.value() - self.begin.value() + 1
    }
}

impl fmt::Display for ColumnRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.begin, self.end)
    }
}

impl FromStr for ColumnRange {
    type Err = SelectionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (begin, end) = split_range(s)?;
        let bad = |_| SelectionParseError::InvalidRange(s.to_string());
        Ok(ColumnRange::new(begin.parse().map_err(bad)?, end.parse().map_err(bad)?))
    }
}

impl TryFrom<String> for ColumnRange {
    type Error = SelectionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ColumnRange> for String {
    fn from(value: ColumnRange) -> Self {
        value.to_string()
    }
}

/// A run of whole rows, e.g. `3:9`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RowRange {
    begin: RowRef,
    end: RowRef,
}

impl RowRange {
    pub fn new(a: RowRef, b: RowRef) -> Self {
        Self {
            begin: a.min(b),
            end: a.max(b),
        }
    }

    pub fn begin(&self) -> RowRef {
        self.begin
    }

    pub fn end(&self) -> RowRef {
        self.end
    }

    pub fn contains(&self, row: RowRef) -> bool {
        row >= self.begin && row <= self.end
    }

    pub fn count(&self) -> u32 {
        self.end.value() - self.begin.value() + 1
    }
}

impl fmt::Display for RowRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.begin, self.end)
    }
}

impl FromStr for RowRange {
    type Err = SelectionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (begin, end) = split_range(s)?;
        let bad = |_| SelectionParseError::InvalidRange(s.to_string());
        Ok(RowRange::new(begin.parse().map_err(bad)?, end.parse().map_err(bad)?))
    }
}

impl TryFrom<String> for RowRange {
    type Error = SelectionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RowRange> for String {
    fn from(value: RowRange) -> Self {
        value.to_string()
    }
}
