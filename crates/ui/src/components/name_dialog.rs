use websheet_history::HistoryToken;
use websheet_protocol::{ProtocolError, SpreadsheetName};

use crate::context::AppContext;
use crate::lifecycle::{ComponentLifecycle, HistoryTokenMatcher, Openable, Refreshable};

/// Rename dialog, open for `/<id>/<name>/rename`.
#[derive(Debug, Default)]
pub struct SpreadsheetNameDialog {
    open: bool,
    focused: bool,
    value: String,
}

impl SpreadsheetNameDialog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn has_focus(&self) -> bool {
        self.focused
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    /// The token that saves the entered name.
    pub fn save(&self, current: &HistoryToken) -> Result<HistoryToken, ProtocolError> {
        let name = SpreadsheetName::new(self.value.as_str())?;
        Ok(current.set_save(name.as_str()))
    }
}

impl HistoryTokenMatcher for SpreadsheetNameDialog {
    fn is_match(&self, token: &HistoryToken) -> bool {
        matches!(token, HistoryToken::SpreadsheetRename { save: None, .. })
    }
}

impl Openable<AppContext> for SpreadsheetNameDialog {
    fn is_open(&self) -> bool {
        self.open
    }

    fn open(&mut self, _context: &AppContext) {
        self.open = true;
    }

    fn open_give_focus(&mut self, _context: &AppContext) {
        self.focused = true;
    }

    fn close(&mut self, _context: &AppContext) {
        self.open = false;
        self.focused = false;
        self.value.clear();
    }
}

impl Refreshable<AppContext> for SpreadsheetNameDialog {
    fn refresh(&mut self, context: &AppContext) {
        if let Some(name) = context.history().history_token().spreadsheet_name() {
            self.value = name.to_string();
        }
    }
}

impl ComponentLifecycle<AppContext> for SpreadsheetNameDialog {}
