//! Cells, label mappings and the delta envelope the server answers with.

use std::fmt;

use serde::{Deserialize, Serialize};
use websheet_core::{CellRange, CellRef, LabelName, SelectionParseError};

/// The formula (or plain value) entered into a cell and its evaluation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpreadsheetFormula {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A single cell as the server reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpreadsheetCell {
    pub reference: CellRef,
    #[serde(default)]
    pub formula: SpreadsheetFormula,
    /// Text ready for display, already formatted by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<serde_json::Map<String, serde_json::Value>>,
}

impl SpreadsheetCell {
    pub fn new(reference: CellRef, formula_text: impl Into<String>) -> Self {
        Self {
            reference,
            formula: SpreadsheetFormula {
                text: formula_text.into(),
                ..Default::default()
            },
            formatted_value: None,
            style: None,
        }
    }

    pub fn with_formatted_value(mut self, formatted: impl Into<String>) -> Self {
        self.formatted_value = Some(formatted.into());
        self
    }

    /// What the grid shows: the formatted value, the error, else the raw text.
    pub fn display_text(&self) -> &str {
        if let Some(formatted) = &self.formatted_value {
            return formatted;
        }
        if let Some(error) = &self.formula.error {
            return error;
        }
        &self.formula.text
    }
}

/// What a label points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LabelTarget {
    Cell(CellRef),
    Range(CellRange),
    /// Label-to-label chains are legal on the wire but the client does not
    /// follow them.
    Label(LabelName),
}

impl fmt::Display for LabelTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelTarget::Cell(cell) => cell.fmt(f),
            LabelTarget::Range(range) => range.fmt(f),
            LabelTarget::Label(label) => label.fmt(f),
        }
    }
}

impl TryFrom<String> for LabelTarget {
    type Error = SelectionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if let Ok(cell) = value.parse::<CellRef>() {
            return Ok(LabelTarget::Cell(cell));
        }
        if value.contains(':') {
            return value.parse().map(LabelTarget::Range);
        }
        value.parse().map(LabelTarget::Label)
    }
}

impl From<LabelTarget> for String {
    fn from(value: LabelTarget) -> Self {
        value.to_string()
    }
}

/// `label -> cell | range | label`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelMapping {
    pub label: LabelName,
    pub reference: LabelTarget,
}

impl LabelMapping {
    pub fn new(label: LabelName, reference: LabelTarget) -> Self {
        Self { label, reference }
    }
}

/// Partial update returned by every cell load or mutation.
///
/// `window` scopes the response: cells inside the window that are absent
/// from `cells` do not exist on the server.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpreadsheetDelta {
    pub cells: Vec<SpreadsheetCell>,
    pub labels: Vec<LabelMapping>,
    pub deleted_cells: Vec<CellRef>,
    pub window: Vec<CellRange>,
}

impl SpreadsheetDelta {
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
            && self.labels.is_empty()
            && self.deleted_cells.is_empty()
            && self.window.is_empty()
    }
}
