//! History tokens and the history controller.
//!
//! A [`HistoryToken`] is the whole navigation state of the client encoded
//! as a URL fragment (`#/1f/Budget/cell/A1/formula`). The
//! [`HistoryController`] owns the current/previous token pair, rejects
//! fragments that do not parse, and broadcasts every genuine change to its
//! watchers.

mod controller;
mod parse;
mod token;

pub use controller::{HistoryController, HistoryTokenWatcher, Location, MemoryLocation};
pub use token::{
    CellAction, ColumnRowAction, FindQuery, HistoryToken, StylePropertyName, STYLE_PROPERTY_NAMES,
};
