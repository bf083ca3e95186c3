//! Headless component models. Rendering is up to the front end; these hold
//! the state a dialog or panel shows and compute the tokens its buttons push.

mod find;
mod formula;
mod metadata_dialog;
mod name_dialog;
mod viewport;

pub use find::{FindDialog, FindMatch, DEFAULT_FIND_COUNT};
pub use formula::CellFormulaComponent;
pub use metadata_dialog::MetadataPropertyDialog;
pub use name_dialog::SpreadsheetNameDialog;
pub use viewport::{ViewportCell, ViewportComponent};
