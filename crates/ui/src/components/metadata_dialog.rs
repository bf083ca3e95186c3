use websheet_history::HistoryToken;
use websheet_protocol::MetadataPropertyName;

use crate::context::AppContext;
use crate::lifecycle::{ComponentLifecycle, HistoryTokenMatcher, Openable, Refreshable};

/// Editor for one spreadsheet metadata property, open for
/// `/<id>/<name>/metadata/<property>`. One dialog serves every property.
#[derive(Debug, Default)]
pub struct MetadataPropertyDialog {
    open: bool,
    focused: bool,
    property: Option<MetadataPropertyName>,
    value: String,
}

impl MetadataPropertyDialog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn property(&self) -> Option<MetadataPropertyName> {
        self.property
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn has_focus(&self) -> bool {
        self.focused
    }

    pub fn is_read_only(&self) -> bool {
        self.property.map_or(true, MetadataPropertyName::is_read_only)
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    /// The token that saves the entered value; `None` for read-only
    /// properties.
    pub fn save(&self, current: &HistoryToken) -> Option<HistoryToken> {
        if self.is_read_only() {
            return None;
        }
        Some(current.set_save(&self.value))
    }

    /// The token that removes the property, so the server default applies.
    pub fn reset(&mut self, current: &HistoryToken) -> Option<HistoryToken> {
        self.value.clear();
        self.save(current)
    }
}

impl HistoryTokenMatcher for MetadataPropertyDialog {
    fn is_match(&self, token: &HistoryToken) -> bool {
        matches!(token, HistoryToken::Metadata { save: None, .. })
    }
}

impl Openable<AppContext> for MetadataPropertyDialog {
    fn is_open(&self) -> bool {
        self.open
    }

    fn open(&mut self, _context: &AppContext) {
        self.open = true;
    }

    fn open_give_focus(&mut self, _context: &AppContext) {
        self.focused = !self.is_read_only();
    }

    fn close(&mut self, _context: &AppContext) {
        self.open = false;
        self.focused = false;
        self.property = None;
        self.value.clear();
    }
}

impl Refreshable<AppContext> for MetadataPropertyDialog {
    fn refresh(&mut self, context: &AppContext) {
        self.property = context.history().history_token().metadata_property();
        self.value = match (self.property, context.metadata()) {
            (Some(property), Some(metadata)) => metadata.get_text(property).unwrap_or_default(),
            _ => String::new(),
        };
    }
}

impl ComponentLifecycle<AppContext> for MetadataPropertyDialog {
    fn requires_loaded_metadata(&self) -> bool {
        true
    }
}
