//! Spreadsheet metadata: a flat property bag keyed by well-known names.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use websheet_core::CellRef;

use crate::ids::{ProtocolError, SpreadsheetId, SpreadsheetName};

/// Every property the server understands, in URL/JSON spelling.
pub const METADATA_PROPERTY_NAMES: &[&str] = &[
    "cell-character-width",
    "created-by",
    "created-date-time",
    "currency-symbol",
    "date-format-pattern",
    "date-parse-pattern",
    "date-time-format-pattern",
    "date-time-offset",
    "decimal-separator",
    "default-year",
    "exponent-symbol",
    "expression-number-kind",
    "frozen-columns",
    "frozen-rows",
    "grouping-separator",
    "locale",
    "modified-by",
    "modified-date-time",
    "negative-sign",
    "number-format-pattern",
    "percentage-symbol",
    "positive-sign",
    "precision",
    "rounding-mode",
    "spreadsheet-id",
    "spreadsheet-name",
    "style",
    "text-format-pattern",
    "time-format-pattern",
    "two-digit-year",
    "value-separator",
    "viewport",
];

const READ_ONLY: &[&str] = &[
    "created-by",
    "created-date-time",
    "modified-by",
    "modified-date-time",
    "spreadsheet-id",
];

const NUMERIC: &[&str] = &[
    "cell-character-width",
    "date-time-offset",
    "default-year",
    "frozen-columns",
    "frozen-rows",
    "precision",
    "two-digit-year",
];

/// One of [`METADATA_PROPERTY_NAMES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MetadataPropertyName(&'static str);

impl MetadataPropertyName {
    pub const SPREADSHEET_ID: MetadataPropertyName = MetadataPropertyName("spreadsheet-id");
    pub const SPREADSHEET_NAME: MetadataPropertyName = MetadataPropertyName("spreadsheet-name");
    pub const LOCALE: MetadataPropertyName = MetadataPropertyName("locale");
    pub const FROZEN_COLUMNS: MetadataPropertyName = MetadataPropertyName("frozen-columns");
    pub const FROZEN_ROWS: MetadataPropertyName = MetadataPropertyName("frozen-rows");
    pub const VIEWPORT: MetadataPropertyName = MetadataPropertyName("viewport");

    pub fn as_str(self) -> &'static str {
        self.0
    }

    /// Properties maintained by the server that no dialog may edit.
    pub fn is_read_only(self) -> bool {
        READ_ONLY.contains(&self.0)
    }

    /// Convert text typed into a dialog (or carried by a save token) to the
    /// JSON value sent to the server. Empty text removes the property.
    pub fn parse_value(self, text: &str) -> Value {
        let text = text.trim();
        if text.is_empty() {
            return Value::Null;
        }
        if NUMERIC.contains(&self.0) {
            if let Ok(n) = text.parse::<i64>() {
                return Value::from(n);
            }
        }
        Value::String(text.to_string())
    }
}

impl fmt::Display for MetadataPropertyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl FromStr for MetadataPropertyName {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        METADATA_PROPERTY_NAMES
            .iter()
            .copied()
            .find(|name| *name == s)
            .map(MetadataPropertyName)
            .ok_or_else(|| ProtocolError::UnknownMetadataProperty(s.to_string()))
    }
}

impl TryFrom<String> for MetadataPropertyName {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MetadataPropertyName> for String {
    fn from(value: MetadataPropertyName) -> Self {
        value.0.to_string()
    }
}

/// The metadata of one spreadsheet. Unknown keys from the server are dropped.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Value>", into = "BTreeMap<String, Value>")]
pub struct SpreadsheetMetadata {
    properties: BTreeMap<MetadataPropertyName, Value>,
}

impl From<BTreeMap<String, Value>> for SpreadsheetMetadata {
    fn from(raw: BTreeMap<String, Value>) -> Self {
        let properties = raw
            .into_iter()
            .filter(|(_, value)| !value.is_null())
            .filter_map(|(key, value)| key.parse::<MetadataPropertyName>().ok().map(|name| (name, value)))
            .collect();
        Self { properties }
    }
}

impl From<SpreadsheetMetadata> for BTreeMap<String, Value> {
    fn from(metadata: SpreadsheetMetadata) -> Self {
        metadata
            .properties
            .into_iter()
            .map(|(name, value)| (name.as_str().to_string(), value))
            .collect()
    }
}

impl SpreadsheetMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, property: MetadataPropertyName) -> Option<&Value> {
        self.properties.get(&property)
    }

    /// Text form of a property, as shown in a property dialog.
    pub fn get_text(&self, property: MetadataPropertyName) -> Option<String> {
        self.get(property).map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// Return a copy with `property` replaced; a null value removes it.
    pub fn set(&self, property: MetadataPropertyName, value: Value) -> Self {
        let mut copy = self.clone();
        if value.is_null() {
            copy.properties.remove(&property);
        } else {
            copy.properties.insert(property, value);
        }
        copy
    }

    pub fn id(&self) -> Option<SpreadsheetId> {
        self.get(MetadataPropertyName::SPREADSHEET_ID)?
            .as_str()?
            .parse()
            .ok()
    }

    pub fn name(&self) -> Option<SpreadsheetName> {
        self.get(MetadataPropertyName::SPREADSHEET_NAME)?
            .as_str()?
            .parse()
            .ok()
    }

    pub fn locale(&self) -> Option<&str> {
        self.get(MetadataPropertyName::LOCALE)?.as_str()
    }

    pub fn frozen_columns(&self) -> u32 {
        self.get_u32(MetadataPropertyName::FROZEN_COLUMNS)
    }

    pub fn frozen_rows(&self) -> u32 {
        self.get_u32(MetadataPropertyName::FROZEN_ROWS)
    }

    fn get_u32(&self, property: MetadataPropertyName) -> u32 {
        self.get(property)
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(0)
    }

    /// Top-left cell of the saved viewport, `{"viewport": {"home": "B2"}}`.
    pub fn viewport_home(&self) -> Option<CellRef> {
        self.get(MetadataPropertyName::VIEWPORT)?
            .get("home")?
            .as_str()?
            .parse()
            .ok()
    }

    /// Body for a PATCH that changes a single property.
    pub fn patch_body(property: MetadataPropertyName, value: Value) -> Value {
        let mut body = serde_json::Map::new();
        body.insert(property.as_str().to_string(), value);
        Value::Object(body)
    }

    pub fn properties(&self) -> impl Iterator<Item = (MetadataPropertyName, &Value)> {
        self.properties.iter().map(|(name, value)| (*name, value))
    }
}
