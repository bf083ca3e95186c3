//! Cell, column and row references.
//!
//! All coordinates are 0-based internally and displayed the usual way:
//! column 0 is `A`, row 0 is `1`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Number of columns addressable (`A` through `XFD`).
pub const MAX_COLUMNS: u32 = 16_384;
/// Number of rows addressable.
pub const MAX_ROWS: u32 = 1_048_576;

/// Error returned when text is not a valid reference, range or label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionParseError {
    /// Empty input
    Empty,
    /// Not a column (letters only)
    InvalidColumn(String),
    /// Not a row (digits only, 1-based)
    InvalidRow(String),
    /// Not a cell reference such as `B7`
    InvalidCell(String),
    /// Range text with a bad `:` structure
    InvalidRange(String),
    /// Not a valid label name
    InvalidLabel(String),
    /// Column or row beyond the sheet bounds
    OutOfBounds(String),
    /// Not any kind of selection
    InvalidSelection(String),
}

impl fmt::Display for SelectionParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionParseError::Empty => write!(f, "Empty selection"),
            SelectionParseError::InvalidColumn(text) => write!(f, "Invalid column {:?}", text),
            SelectionParseError::InvalidRow(text) => write!(f, "Invalid row {:?}", text),
            SelectionParseError::InvalidCell(text) => write!(f, "Invalid cell reference {:?}", text),
            SelectionParseError::InvalidRange(text) => write!(f, "Invalid range {:?}", text),
            SelectionParseError::InvalidLabel(text) => write!(f, "Invalid label {:?}", text),
            SelectionParseError::OutOfBounds(text) => write!(f, "Reference out of bounds {:?}", text),
            SelectionParseError::InvalidSelection(text) => write!(f, "Invalid selection {:?}", text),
        }
    }
}

impl std::error::Error for SelectionParseError {}

/// Convert 0-based column index to Excel-style letter(s).
pub fn col_to_letters(col: u32) -> String {
    let mut result = String::new();
    let mut n = col;
    loop {
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    result
}

/// Convert Excel-style column letters (any case) to a 0-based index.
pub fn letters_to_col(text: &str) -> Result<u32, SelectionParseError> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_alphabetic()) {
        return Err(SelectionParseError::InvalidColumn(text.to_string()));
    }
    // Longer than XFD can never be in bounds; also keeps the arithmetic small.
    if text.len() > 3 {
        return Err(SelectionParseError::OutOfBounds(text.to_string()));
    }

    let mut value: u32 = 0;
    for b in text.bytes() {
        value = value * 26 + u32::from(b.to_ascii_uppercase() - b'A') + 1;
    }
    let col = value - 1;
    if col >= MAX_COLUMNS {
        return Err(SelectionParseError::OutOfBounds(text.to_string()));
    }
    Ok(col)
}

fn digits_to_row(text: &str) -> Result<u32, SelectionParseError> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) || text.starts_with('0') {
        return Err(SelectionParseError::InvalidRow(text.to_string()));
    }
    let value: u64 = text
        .parse()
        .map_err(|_| SelectionParseError::OutOfBounds(text.to_string()))?;
    if value > u64::from(MAX_ROWS) {
        return Err(SelectionParseError::OutOfBounds(text.to_string()));
    }
    Ok(value as u32 - 1)
}

// ============================================================================
// ColumnRef
// ============================================================================

/// A whole column, e.g. `C`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ColumnRef(u32);

impl ColumnRef {
    pub fn new(col: u32) -> Option<Self> {
        (col < MAX_COLUMNS).then_some(Self(col))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&col_to_letters(self.0))
    }
}

impl FromStr for ColumnRef {
    type Err = SelectionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        letters_to_col(s).map(ColumnRef)
    }
}

impl TryFrom<String> for ColumnRef {
    type Error = SelectionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ColumnRef> for String {
    fn from(value: ColumnRef) -> Self {
        value.to_string()
    }
}

// ============================================================================
// RowRef
// ============================================================================

/// A whole row, e.g. `7` (stored 0-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RowRef(u32);

impl RowRef {
    pub fn new(row: u32) -> Option<Self> {
        (row < MAX_ROWS).then_some(Self(row))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for RowRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0 + 1)
    }
}

impl FromStr for RowRef {
    type Err = SelectionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        digits_to_row(s).map(RowRef)
    }
}

impl TryFrom<String> for RowRef {
    type Error = SelectionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RowRef> for String {
    fn from(value: RowRef) -> Self {
        value.to_string()
    }
}

// ============================================================================
// CellRef
// ============================================================================

/// A single cell, e.g. `B7`.
///
/// Ordering is row-major: every cell of row 1 sorts before any cell of row 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CellRef {
    column: ColumnRef,
    row: RowRef,
}

impl CellRef {
    pub fn new(column: ColumnRef, row: RowRef) -> Self {
        Self { column, row }
    }

    /// Build from 0-based coordinates, `None` when outside the sheet.
    pub fn from_coords(col: u32, row: u32) -> Option<Self> {
        Some(Self {
            column: ColumnRef::new(col)?,
            row: RowRef::new(row)?,
        })
    }

    pub fn column(self) -> ColumnRef {
        self.column
    }

    pub fn row(self) -> RowRef {
        self.row
    }

    /// Offset by whole cells, `None` when the result leaves the sheet.
    pub fn add(self, d_col: i64, d_row: i64) -> Option<Self> {
        let col = i64::from(self.column.0) + d_col;
        let row = i64::from(self.row.0) + d_row;
        if col < 0 || row < 0 {
            return None;
        }
        Self::from_coords(u32::try_from(col).ok()?, u32::try_from(row).ok()?)
    }
}

impl Ord for CellRef {
    fn cmp(&self, other: &Self) -> Ordering {
        self.row
            .cmp(&other.row)
            .then_with(|| self.column.cmp(&other.column))
    }
}

impl PartialOrd for CellRef {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.column, self.row)
    }
}

impl FromStr for CellRef {
    type Err = SelectionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(SelectionParseError::Empty);
        }
        let split = s
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| SelectionParseError::InvalidCell(s.to_string()))?;
        let (letters, digits) = s.split_at(split);
        if letters.is_empty() {
            return Err(SelectionParseError::InvalidCell(s.to_string()));
        }

        let column = letters_to_col(letters).map_err(|e| match e {
            SelectionParseError::OutOfBounds(_) => SelectionParseError::OutOfBounds(s.to_string()),
            _ => SelectionParseError::InvalidCell(s.to_string()),
        })?;
        let row = digits_to_row(digits).map_err(|e| match e {
            SelectionParseError::OutOfBounds(_) => SelectionParseError::OutOfBounds(s.to_string()),
            _ => SelectionParseError::InvalidCell(s.to_string()),
        })?;

        Ok(Self {
            column: ColumnRef(column),
            row: RowRef(row),
        })
    }
}

impl TryFrom<String> for CellRef {
    type Error = SelectionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CellRef> for String {
    fn from(value: CellRef) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(text: &str) -> CellRef {
        text.parse().unwrap()
    }

    #[test]
    fn test_col_to_letters() {
        assert_eq!(col_to_letters(0), "A");
        assert_eq!(col_to_letters(25), "Z");
        assert_eq!(col_to_letters(26), "AA");
        assert_eq!(col_to_letters(701), "ZZ");
        assert_eq!(col_to_letters(702), "AAA");
        assert_eq!(col_to_letters(MAX_COLUMNS - 1), "XFD");
    }

    #[test]
    fn test_letters_to_col() {
        assert_eq!(letters_to_col("A").unwrap(), 0);
        assert_eq!(letters_to_col("aa").unwrap(), 26);
        assert_eq!(letters_to_col("XFD").unwrap(), MAX_COLUMNS - 1);
        assert!(matches!(letters_to_col("XFE"), Err(SelectionParseError::OutOfBounds(_))));
        assert!(matches!(letters_to_col("A1"), Err(SelectionParseError::InvalidColumn(_))));
    }

    #[test]
    fn test_cell_parse_and_display() {
        let b7 = cell("B7");
        assert_eq!(b7.column().value(), 1);
        assert_eq!(b7.row().value(), 6);
        assert_eq!(b7.to_string(), "B7");
        assert_eq!(cell("b7"), b7);
    }

    #[test]
    fn test_cell_parse_rejects_garbage() {
        assert!("".parse::<CellRef>().is_err());
        assert!("7".parse::<CellRef>().is_err());
        assert!("B".parse::<CellRef>().is_err());
        assert!("B0".parse::<CellRef>().is_err());
        assert!("B07".parse::<CellRef>().is_err());
        assert!("B7C".parse::<CellRef>().is_err());
        assert!("B1048577".parse::<CellRef>().is_err());
    }

    #[test]
    fn test_cell_ordering_is_row_major() {
        let mut cells = vec![cell("B1"), cell("A2"), cell("A1"), cell("C1")];
        cells.sort();
        let text: Vec<String> = cells.iter().map(|c| c.to_string()).collect();
        assert_eq!(text, vec!["A1", "B1", "C1", "A2"]);
    }

    #[test]
    fn test_cell_add() {
        assert_eq!(cell("B2").add(1, 1), Some(cell("C3")));
        assert_eq!(cell("A1").add(-1, 0), None);
    }

    #[test]
    fn test_cell_serde_as_string() {
        let json = serde_json::to_string(&cell("C3")).unwrap();
        assert_eq!(json, "\"C3\"");
        let back: CellRef = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cell("C3"));
        assert!(serde_json::from_str::<CellRef>("\"3C\"").is_err());
    }

    #[test]
    fn test_row_display_is_one_based() {
        let row: RowRef = "12".parse().unwrap();
        assert_eq!(row.value(), 11);
        assert_eq!(row.to_string(), "12");
    }
}
