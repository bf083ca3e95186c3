use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

const MAX_NAME_LENGTH: usize = 255;

/// Error for identifiers and names that fail validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    InvalidSpreadsheetId(String),
    InvalidSpreadsheetName(String),
    UnknownMetadataProperty(String),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::InvalidSpreadsheetId(text) => write!(f, "Invalid spreadsheet id {:?}", text),
            ProtocolError::InvalidSpreadsheetName(text) => {
                write!(f, "Invalid spreadsheet name {:?}", text)
            }
            ProtocolError::UnknownMetadataProperty(text) => {
                write!(f, "Unknown metadata property {:?}", text)
            }
        }
    }
}

impl std::error::Error for ProtocolError {}

/// Server-assigned spreadsheet id, written as lowercase hex (`"1f"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SpreadsheetId(u64);

impl SpreadsheetId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SpreadsheetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}", self.0)
    }
}

impl FromStr for SpreadsheetId {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s.len() > 16 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ProtocolError::InvalidSpreadsheetId(s.to_string()));
        }
        u64::from_str_radix(s, 16)
            .map(SpreadsheetId)
            .map_err(|_| ProtocolError::InvalidSpreadsheetId(s.to_string()))
    }
}

impl TryFrom<String> for SpreadsheetId {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SpreadsheetId> for String {
    fn from(value: SpreadsheetId) -> Self {
        value.to_string()
    }
}

/// User-visible spreadsheet name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SpreadsheetName(String);

impl SpreadsheetName {
    pub fn new(name: impl Into<String>) -> Result<Self, ProtocolError> {
        let name = name.into();
        let valid = !name.trim().is_empty()
            && name.chars().count() <= MAX_NAME_LENGTH
            && !name.chars().any(char::is_control);
        if !valid {
            return Err(ProtocolError::InvalidSpreadsheetName(name));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpreadsheetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SpreadsheetName {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SpreadsheetName::new(s)
    }
}

impl TryFrom<String> for SpreadsheetName {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        SpreadsheetName::new(value)
    }
}

impl From<SpreadsheetName> for String {
    fn from(value: SpreadsheetName) -> Self {
        value.0
    }
}
