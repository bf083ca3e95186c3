use serde::{Deserialize, Serialize};

/// Number/date symbols for a language tag such as `en-AU`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Locale {
    pub tag: String,
    pub display_name: String,
    #[serde(default = "default_decimal_separator")]
    pub decimal_separator: String,
    #[serde(default = "default_grouping_separator")]
    pub grouping_separator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_format_pattern: Option<String>,
}

fn default_decimal_separator() -> String {
    ".".to_string()
}

fn default_grouping_separator() -> String {
    ",".to_string()
}

/// ISO 4217 currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Currency {
    pub code: String,
    pub symbol: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default = "default_fraction_digits")]
    pub default_fraction_digits: u8,
}

fn default_fraction_digits() -> u8 {
    2
}
