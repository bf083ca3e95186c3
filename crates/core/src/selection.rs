//! The selection model: what the user has selected and which corner anchors it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::label::LabelName;
use crate::range::{CellRange, ColumnRange, RowRange};
use crate::reference::{CellRef, ColumnRef, RowRef, SelectionParseError};

/// Anything the user can select.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SpreadsheetSelection {
    Cell(CellRef),
    CellRange(CellRange),
    Column(ColumnRef),
    ColumnRange(ColumnRange),
    Row(RowRef),
    RowRange(RowRange),
    Label(LabelName),
}

impl SpreadsheetSelection {
    /// Ranges need an anchor; single cells, columns, rows and labels never have one.
    pub fn is_range(&self) -> bool {
        matches!(
            self,
            SpreadsheetSelection::CellRange(_)
                | SpreadsheetSelection::ColumnRange(_)
                | SpreadsheetSelection::RowRange(_)
        )
    }

    /// True for cells, cell ranges and labels.
    pub fn is_cell_like(&self) -> bool {
        matches!(
            self,
            SpreadsheetSelection::Cell(_)
                | SpreadsheetSelection::CellRange(_)
                | SpreadsheetSelection::Label(_)
        )
    }

    pub fn is_column_like(&self) -> bool {
        matches!(self, SpreadsheetSelection::Column(_) | SpreadsheetSelection::ColumnRange(_))
    }

    pub fn is_row_like(&self) -> bool {
        matches!(self, SpreadsheetSelection::Row(_) | SpreadsheetSelection::RowRange(_))
    }

    /// The anchor used when a range arrives without one.
    pub fn default_anchor(&self) -> AnchorCorner {
        match self {
            SpreadsheetSelection::CellRange(_) => AnchorCorner::BottomRight,
            SpreadsheetSelection::ColumnRange(_) => AnchorCorner::Right,
            SpreadsheetSelection::RowRange(_) => AnchorCorner::Bottom,
            _ => AnchorCorner::None,
        }
    }

    /// Anchors that make sense for this kind of selection.
    pub fn accepts_anchor(&self, anchor: AnchorCorner) -> bool {
        match self {
            SpreadsheetSelection::CellRange(_) => matches!(
                anchor,
                AnchorCorner::TopLeft
                    | AnchorCorner::TopRight
                    | AnchorCorner::BottomLeft
                    | AnchorCorner::BottomRight
            ),
            SpreadsheetSelection::ColumnRange(_) => {
                matches!(anchor, AnchorCorner::Left | AnchorCorner::Right)
            }
            SpreadsheetSelection::RowRange(_) => {
                matches!(anchor, AnchorCorner::Top | AnchorCorner::Bottom)
            }
            _ => anchor == AnchorCorner::None,
        }
    }

    /// Parse text known to be a cell, cell range or label.
    pub fn parse_cell_like(text: &str) -> Result<Self, SelectionParseError> {
        if let Ok(cell) = text.parse::<CellRef>() {
            return Ok(SpreadsheetSelection::Cell(cell));
        }
        if text.contains(':') {
            return text.parse().map(SpreadsheetSelection::CellRange);
        }
        text.parse().map(SpreadsheetSelection::Label)
    }

    /// Parse text known to be a column or column range.
    pub fn parse_column_like(text: &str) -> Result<Self, SelectionParseError> {
        if text.contains(':') {
            text.parse().map(SpreadsheetSelection::ColumnRange)
        } else {
            text.parse().map(SpreadsheetSelection::Column)
        }
    }

    /// Parse text known to be a row or row range.
    pub fn parse_row_like(text: &str) -> Result<Self, SelectionParseError> {
        if text.contains(':') {
            text.parse().map(SpreadsheetSelection::RowRange)
        } else {
            text.parse().map(SpreadsheetSelection::Row)
        }
    }
}

impl fmt::Display for SpreadsheetSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpreadsheetSelection::Cell(c) => c.fmt(f),
            SpreadsheetSelection::CellRange(r) => r.fmt(f),
            SpreadsheetSelection::Column(c) => c.fmt(f),
            SpreadsheetSelection::ColumnRange(r) => r.fmt(f),
            SpreadsheetSelection::Row(r) => r.fmt(f),
            SpreadsheetSelection::RowRange(r) => r.fmt(f),
            SpreadsheetSelection::Label(l) => l.fmt(f),
        }
    }
}

impl FromStr for SpreadsheetSelection {
    type Err = SelectionParseError;

    /// Tries cell, cell range, column, column range, row, row range and
    /// finally label. Letters-only text therefore reads as a column.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(SelectionParseError::Empty);
        }
        if let Ok(cell) = s.parse::<CellRef>() {
            return Ok(SpreadsheetSelection::Cell(cell));
        }
        if let Ok(range) = s.parse::<CellRange>() {
            return Ok(SpreadsheetSelection::CellRange(range));
        }
        if let Ok(selection) = Self::parse_column_like(s) {
            return Ok(selection);
        }
        if let Ok(selection) = Self::parse_row_like(s) {
            return Ok(selection);
        }
        s.parse::<LabelName>()
            .map(SpreadsheetSelection::Label)
            .map_err(|_| SelectionParseError::InvalidSelection(s.to_string()))
    }
}

impl TryFrom<String> for SpreadsheetSelection {
    type Error = SelectionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SpreadsheetSelection> for String {
    fn from(value: SpreadsheetSelection) -> Self {
        value.to_string()
    }
}

// ============================================================================
// Anchors
// ============================================================================

/// The fixed corner (or edge) of a range selection; extending the
/// selection moves the opposite corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AnchorCorner {
    #[default]
    None,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Left,
    Right,
    Top,
    Bottom,
}

impl AnchorCorner {
    pub fn as_str(self) -> &'static str {
        match self {
            AnchorCorner::None => "",
            AnchorCorner::TopLeft => "top-left",
            AnchorCorner::TopRight => "top-right",
            AnchorCorner::BottomLeft => "bottom-left",
            AnchorCorner::BottomRight => "bottom-right",
            AnchorCorner::Left => "left",
            AnchorCorner::Right => "right",
            AnchorCorner::Top => "top",
            AnchorCorner::Bottom => "bottom",
        }
    }

    pub fn parse(text: &str) -> Option<AnchorCorner> {
        match text {
            "top-left" => Some(AnchorCorner::TopLeft),
            "top-right" => Some(AnchorCorner::TopRight),
            "bottom-left" => Some(AnchorCorner::BottomLeft),
            "bottom-right" => Some(AnchorCorner::BottomRight),
            "left" => Some(AnchorCorner::Left),
            "right" => Some(AnchorCorner::Right),
            "top" => Some(AnchorCorner::Top),
            "bottom" => Some(AnchorCorner::Bottom),
            _ => None,
        }
    }
}

/// A selection plus its anchor. Ranges always carry an anchor, everything
/// else carries [`AnchorCorner::None`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnchoredSelection {
    selection: SpreadsheetSelection,
    anchor: AnchorCorner,
}

impl AnchoredSelection {
    /// Anchor a selection, substituting the default anchor when `anchor` does
    /// not fit the selection kind.
    pub fn new(selection: SpreadsheetSelection, anchor: AnchorCorner) -> Self {
        let anchor = if selection.accepts_anchor(anchor) {
            anchor
        } else {
            selection.default_anchor()
        };
        Self { selection, anchor }
    }

    pub fn selection(&self) -> &SpreadsheetSelection {
        &self.selection
    }

    pub fn anchor(&self) -> AnchorCorner {
        self.anchor
    }

    pub fn set_anchor(&self, anchor: AnchorCorner) -> Self {
        Self::new(self.selection.clone(), anchor)
    }

    /// The cell the anchor sits on for cell ranges, the cell itself for cells.
    pub fn anchor_cell(&self) -> Option<CellRef> {
        match (&self.selection, self.anchor) {
            (SpreadsheetSelection::Cell(cell), _) => Some(*cell),
            (SpreadsheetSelection::CellRange(range), anchor) => {
                let (begin, end) = (range.begin(), range.end());
                Some(match anchor {
                    AnchorCorner::TopLeft => begin,
                    AnchorCorner::TopRight => CellRef::new(end.column(), begin.row()),
                    AnchorCorner::BottomLeft => CellRef::new(begin.column(), end.row()),
                    _ => end,
                })
            }
            _ => None,
        }
    }
}

impl From<SpreadsheetSelection> for AnchoredSelection {
    fn from(selection: SpreadsheetSelection) -> Self {
        let anchor = selection.default_anchor();
        Self { selection, anchor }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_order() {
        assert!(matches!("B2".parse::<SpreadsheetSelection>(), Ok(SpreadsheetSelection::Cell(_))));
        assert!(matches!("B2:C3".parse::<SpreadsheetSelection>(), Ok(SpreadsheetSelection::CellRange(_))));
        assert!(matches!("B".parse::<SpreadsheetSelection>(), Ok(SpreadsheetSelection::Column(_))));
        assert!(matches!("B:C".parse::<SpreadsheetSelection>(), Ok(SpreadsheetSelection::ColumnRange(_))));
        assert!(matches!("2".parse::<SpreadsheetSelection>(), Ok(SpreadsheetSelection::Row(_))));
        assert!(matches!("2:3".parse::<SpreadsheetSelection>(), Ok(SpreadsheetSelection::RowRange(_))));
        assert!(matches!("Total".parse::<SpreadsheetSelection>(), Ok(SpreadsheetSelection::Label(_))));
        assert!("!!".parse::<SpreadsheetSelection>().is_err());
    }

    #[test]
    fn test_parse_cell_like_prefers_label_over_column() {
        let sel = SpreadsheetSelection::parse_cell_like("Tax").unwrap();
        assert!(matches!(sel, SpreadsheetSelection::Label(_)));
        assert!(SpreadsheetSelection::parse_cell_like("A1:").is_err());
    }

    #[test]
    fn test_anchor_defaults_for_ranges() {
        let range: SpreadsheetSelection = "A1:B2".parse().unwrap();
        let anchored = AnchoredSelection::new(range.clone(), AnchorCorner::Left);
        assert_eq!(anchored.anchor(), AnchorCorner::BottomRight);

        let cell: SpreadsheetSelection = "A1".parse().unwrap();
        let anchored = AnchoredSelection::new(cell, AnchorCorner::TopLeft);
        assert_eq!(anchored.anchor(), AnchorCorner::None);

        let anchored = AnchoredSelection::new(range, AnchorCorner::TopRight);
        assert_eq!(anchored.anchor_cell(), Some("B1".parse().unwrap()));
    }

    #[test]
    fn test_anchor_text() {
        for anchor in [
            AnchorCorner::TopLeft,
            AnchorCorner::TopRight,
            AnchorCorner::BottomLeft,
            AnchorCorner::BottomRight,
            AnchorCorner::Left,
            AnchorCorner::Right,
            AnchorCorner::Top,
            AnchorCorner::Bottom,
        ] {
            assert_eq!(AnchorCorner::parse(anchor.as_str()), Some(anchor));
        }
        assert_eq!(AnchorCorner::parse(""), None);
    }
}
