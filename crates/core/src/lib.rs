//! Core spreadsheet types shared by every websheet crate.
//!
//! No networking, no history, no UI: references, ranges, labels, the
//! selection model and the single-threaded watcher list.

mod label;
mod range;
mod reference;
mod selection;
pub mod watchers;

pub use label::LabelName;
pub use range::{CellRange, ColumnRange, RowRange};
pub use reference::{
    col_to_letters, letters_to_col, CellRef, ColumnRef, RowRef, SelectionParseError, MAX_COLUMNS,
    MAX_ROWS,
};
pub use selection::{AnchorCorner, AnchoredSelection, SpreadsheetSelection};
pub use watchers::{WatcherRemover, Watchers};
