//! Spreadsheet server JSON wire format.
//!
//! These are the request/response bodies exchanged with the spreadsheet
//! server. Field names are camelCase on the wire; references, ranges and
//! labels travel as their text form (`"A1"`, `"A1:B2"`, `"Total"`).
//!
//! # Usage
//!
//! ```ignore
//! use websheet_protocol::SpreadsheetDelta;
//!
//! let delta: SpreadsheetDelta = serde_json::from_str(&body)?;
//! for cell in &delta.cells { println!("{}", cell.reference); }
//! ```

mod delta;
mod ids;
mod locale;
mod metadata;

pub use delta::{LabelMapping, LabelTarget, SpreadsheetCell, SpreadsheetDelta, SpreadsheetFormula};
pub use ids::{ProtocolError, SpreadsheetId, SpreadsheetName};
pub use locale::{Currency, Locale};
pub use metadata::{MetadataPropertyName, SpreadsheetMetadata, METADATA_PROPERTY_NAMES};
