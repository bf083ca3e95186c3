//! Label names: user-assigned names for a cell or a range.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::reference::{CellRef, SelectionParseError};

const MAX_LABEL_LENGTH: usize = 255;

/// A label such as `Total` or `tax_rate`.
///
/// Case is preserved for display and comparison. A label may never be
/// readable as a cell reference (`AB12` is a cell, not a label).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LabelName(String);

impl LabelName {
    pub fn new(name: impl Into<String>) -> Result<Self, SelectionParseError> {
        let name = name.into();
        if name.is_empty() {
            return Err(SelectionParseError::Empty);
        }
        if !Self::is_valid(&name) {
            return Err(SelectionParseError::InvalidLabel(name));
        }
        Ok(Self(name))
    }

    fn is_valid(name: &str) -> bool {
        let mut chars = name.chars();
        let first_ok = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');

        first_ok
            && name.len() <= MAX_LABEL_LENGTH
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
            && name.parse::<CellRef>().is_err()
            && !name.eq_ignore_ascii_case("true")
            && !name.eq_ignore_ascii_case("false")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LabelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LabelName {
    type Err = SelectionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LabelName::new(s)
    }
}

impl TryFrom<String> for LabelName {
    type Error = SelectionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        LabelName::new(value)
    }
}

impl From<LabelName> for String {
    fn from(value: LabelName) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_labels() {
        for name in ["Total", "tax_rate", "_hidden", "Q1.Revenue", "A", "ABCD1"] {
            assert!(LabelName::new(name).is_ok(), "{} should be a label", name);
        }
    }

    #[test]
    fn test_invalid_labels() {
        for name in ["", "1abc", "A1", "xfd99", "has space", "a-b", "TRUE"] {
            assert!(LabelName::new(name).is_err(), "{} should not be a label", name);
        }
        assert!(LabelName::new("x".repeat(256)).is_err());
    }

    #[test]
    fn test_label_preserves_case() {
        assert_eq!(LabelName::new("Total").unwrap().to_string(), "Total");
    }
}
