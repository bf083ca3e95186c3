//! The history token model.
//!
//! Tokens are immutable values; every `set_*` returns a new token. The
//! fragment grammar lives in the segment constants below and in `parse.rs`,
//! which must stay in step with `url_fragment`.

use std::fmt;
use std::num::NonZeroU32;

use websheet_core::{AnchorCorner, AnchoredSelection, LabelName, SpreadsheetSelection};
use websheet_protocol::{MetadataPropertyName, SpreadsheetId, SpreadsheetName};

// ── Segment vocabulary ──────────────────────────────────────────────
//
// Bookmarked and shared URLs depend on these; never rename one.

pub(crate) const CELL: &str = "cell";
pub(crate) const CLEAR: &str = "clear";
pub(crate) const COLUMN: &str = "column";
pub(crate) const CREATE: &str = "create";
pub(crate) const DELETE: &str = "delete";
pub(crate) const FIND: &str = "find";
pub(crate) const FORMULA: &str = "formula";
pub(crate) const FREEZE: &str = "freeze";
pub(crate) const INSERT_AFTER: &str = "insert-after";
pub(crate) const INSERT_BEFORE: &str = "insert-before";
pub(crate) const LABEL: &str = "label";
pub(crate) const MAX: &str = "max";
pub(crate) const MENU: &str = "menu";
pub(crate) const METADATA: &str = "metadata";
pub(crate) const OFFSET: &str = "offset";
pub(crate) const QUERY: &str = "query";
pub(crate) const RENAME: &str = "rename";
pub(crate) const ROW: &str = "row";
pub(crate) const SAVE: &str = "save";
pub(crate) const SORT: &str = "sort";
pub(crate) const STYLE: &str = "style";
pub(crate) const UNFREEZE: &str = "unfreeze";

/// Cell style properties that have their own editing dialog.
pub const STYLE_PROPERTY_NAMES: &[&str] = &[
    "background-color",
    "color",
    "font-family",
    "font-size",
    "font-style",
    "font-weight",
    "text-align",
    "text-decoration-line",
    "vertical-align",
    "word-wrap",
];

/// One of [`STYLE_PROPERTY_NAMES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StylePropertyName(&'static str);

impl StylePropertyName {
    pub fn parse(text: &str) -> Option<Self> {
        STYLE_PROPERTY_NAMES
            .iter()
            .copied()
            .find(|name| *name == text)
            .map(StylePropertyName)
    }

    pub fn as_str(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for StylePropertyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Find dialog state: paging window and the query text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FindQuery {
    pub offset: Option<u32>,
    pub count: Option<NonZeroU32>,
    pub query: Option<String>,
}

/// What is happening to a cell, cell range or label selection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum CellAction {
    #[default]
    Select,
    Clear,
    Delete,
    Formula { save: Option<String> },
    Find(FindQuery),
    Sort { save: Option<String> },
    Freeze,
    Unfreeze,
    Menu,
    Label { save: Option<LabelName> },
    Style { property: StylePropertyName, save: Option<String> },
}

impl CellAction {
    fn should_ignore(&self) -> bool {
        match self {
            CellAction::Clear | CellAction::Delete | CellAction::Freeze | CellAction::Unfreeze => true,
            CellAction::Formula { save } | CellAction::Sort { save } => save.is_some(),
            CellAction::Style { save, .. } => save.is_some(),
            CellAction::Label { save } => save.is_some(),
            CellAction::Select | CellAction::Find(_) | CellAction::Menu => false,
        }
    }

    fn clear_action(&self) -> CellAction {
        match self {
            CellAction::Clear | CellAction::Delete | CellAction::Freeze | CellAction::Unfreeze => {
                CellAction::Select
            }
            CellAction::Formula { .. } => CellAction::Formula { save: None },
            CellAction::Sort { .. } => CellAction::Sort { save: None },
            CellAction::Label { .. } => CellAction::Label { save: None },
            CellAction::Style { property, .. } => CellAction::Style {
                property: *property,
                save: None,
            },
            other => other.clone(),
        }
    }

    fn save_value(&self) -> Option<String> {
        match self {
            CellAction::Formula { save } | CellAction::Sort { save } => save.clone(),
            CellAction::Style { save, .. } => save.clone(),
            CellAction::Label { save } => save.as_ref().map(LabelName::to_string),
            _ => None,
        }
    }
}

/// What is happening to a column or row selection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ColumnRowAction {
    #[default]
    Select,
    Clear,
    Delete,
    Freeze,
    Unfreeze,
    Menu,
    InsertAfter(NonZeroU32),
    InsertBefore(NonZeroU32),
    Sort { save: Option<String> },
}

impl ColumnRowAction {
    fn should_ignore(&self) -> bool {
        match self {
            ColumnRowAction::Clear
            | ColumnRowAction::Delete
            | ColumnRowAction::Freeze
            | ColumnRowAction::Unfreeze
            | ColumnRowAction::InsertAfter(_)
            | ColumnRowAction::InsertBefore(_) => true,
            ColumnRowAction::Sort { save } => save.is_some(),
            ColumnRowAction::Select | ColumnRowAction::Menu => false,
        }
    }

    fn clear_action(&self) -> ColumnRowAction {
        match self {
            ColumnRowAction::Sort { .. } => ColumnRowAction::Sort { save: None },
            ColumnRowAction::Menu => ColumnRowAction::Menu,
            _ => ColumnRowAction::Select,
        }
    }
}

/// The complete navigation state of the client.
///
/// Parse with [`HistoryToken::parse`], which never fails: anything it does
/// not understand becomes [`HistoryToken::Unknown`]. Serialize with
/// [`HistoryToken::url_fragment`] (also `Display`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HistoryToken {
    /// A fragment that did not parse. Never becomes the current token.
    Unknown { fragment: String },
    /// The spreadsheet browser, optionally paged.
    SpreadsheetList {
        offset: Option<u32>,
        count: Option<NonZeroU32>,
    },
    SpreadsheetCreate,
    /// Spreadsheet id known, metadata (and so the name) not yet loaded.
    SpreadsheetLoad { id: SpreadsheetId },
    SpreadsheetSelect { id: SpreadsheetId, name: SpreadsheetName },
    SpreadsheetRename {
        id: SpreadsheetId,
        name: SpreadsheetName,
        save: Option<SpreadsheetName>,
    },
    Metadata {
        id: SpreadsheetId,
        name: SpreadsheetName,
        property: MetadataPropertyName,
        save: Option<String>,
    },
    Cell {
        id: SpreadsheetId,
        name: SpreadsheetName,
        selection: AnchoredSelection,
        action: CellAction,
    },
    Column {
        id: SpreadsheetId,
        name: SpreadsheetName,
        selection: AnchoredSelection,
        action: ColumnRowAction,
    },
    Row {
        id: SpreadsheetId,
        name: SpreadsheetName,
        selection: AnchoredSelection,
        action: ColumnRowAction,
    },
}

impl Default for HistoryToken {
    fn default() -> Self {
        HistoryToken::SpreadsheetList {
            offset: None,
            count: None,
        }
    }
}

impl HistoryToken {
    /// Parse a URL fragment; the leading `#` is optional.
    pub fn parse(fragment: &str) -> HistoryToken {
        crate::parse::parse(fragment)
    }

    pub fn unknown(fragment: impl Into<String>) -> HistoryToken {
        HistoryToken::Unknown {
            fragment: fragment.into(),
        }
    }

    pub fn spreadsheet_select(id: SpreadsheetId, name: SpreadsheetName) -> HistoryToken {
        HistoryToken::SpreadsheetSelect { id, name }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, HistoryToken::Unknown { .. })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn spreadsheet_id(&self) -> Option<SpreadsheetId> {
        match self {
            HistoryToken::SpreadsheetLoad { id }
            | HistoryToken::SpreadsheetSelect { id, .. }
            | HistoryToken::SpreadsheetRename { id, .. }
            | HistoryToken::Metadata { id, .. }
            | HistoryToken::Cell { id, .. }
            | HistoryToken::Column { id, .. }
            | HistoryToken::Row { id, .. } => Some(*id),
            _ => None,
        }
    }

    pub fn spreadsheet_name(&self) -> Option<&SpreadsheetName> {
        match self {
            HistoryToken::SpreadsheetSelect { name, .. }
            | HistoryToken::SpreadsheetRename { name, .. }
            | HistoryToken::Metadata { name, .. }
            | HistoryToken::Cell { name, .. }
            | HistoryToken::Column { name, .. }
            | HistoryToken::Row { name, .. } => Some(name),
            _ => None,
        }
    }

    fn id_name(&self) -> Option<(SpreadsheetId, SpreadsheetName)> {
        Some((self.spreadsheet_id()?, self.spreadsheet_name()?.clone()))
    }

    pub fn anchored_selection(&self) -> Option<&AnchoredSelection> {
        match self {
            HistoryToken::Cell { selection, .. }
            | HistoryToken::Column { selection, .. }
            | HistoryToken::Row { selection, .. } => Some(selection),
            _ => None,
        }
    }

    pub fn selection(&self) -> Option<&SpreadsheetSelection> {
        self.anchored_selection().map(AnchoredSelection::selection)
    }

    pub fn metadata_property(&self) -> Option<MetadataPropertyName> {
        match self {
            HistoryToken::Metadata { property, .. } => Some(*property),
            _ => None,
        }
    }

    pub fn cell_action(&self) -> Option<&CellAction> {
        match self {
            HistoryToken::Cell { action, .. } => Some(action),
            _ => None,
        }
    }

    pub fn column_row_action(&self) -> Option<&ColumnRowAction> {
        match self {
            HistoryToken::Column { action, .. } | HistoryToken::Row { action, .. } => Some(action),
            _ => None,
        }
    }

    /// The save payload as text, for any token that carries one.
    pub fn save_value(&self) -> Option<String> {
        match self {
            HistoryToken::SpreadsheetRename { save, .. } => save.as_ref().map(SpreadsheetName::to_string),
            HistoryToken::Metadata { save, .. } => save.clone(),
            HistoryToken::Cell { action, .. } => action.save_value(),
            HistoryToken::Column { action, .. } | HistoryToken::Row { action, .. } => match action {
                ColumnRowAction::Sort { save } => save.clone(),
                _ => None,
            },
            _ => None,
        }
    }

    // =========================================================================
    // Capabilities
    // =========================================================================

    /// True for tokens that perform a one-shot mutation (a save, clear,
    /// delete, freeze, insert...). Replaying one would repeat the mutation.
    pub fn should_ignore(&self) -> bool {
        match self {
            HistoryToken::SpreadsheetRename { save, .. } => save.is_some(),
            HistoryToken::Metadata { save, .. } => save.is_some(),
            HistoryToken::Cell { action, .. } => action.should_ignore(),
            HistoryToken::Column { action, .. } | HistoryToken::Row { action, .. } => {
                action.should_ignore()
            }
            _ => false,
        }
    }

    /// Close whatever dialog or action is open, keeping the spreadsheet and
    /// selection.
    pub fn close(&self) -> HistoryToken {
        match self {
            HistoryToken::SpreadsheetRename { id, name, .. } | HistoryToken::Metadata { id, name, .. } => {
                HistoryToken::spreadsheet_select(*id, name.clone())
            }
            HistoryToken::Cell { id, name, selection, .. } => HistoryToken::Cell {
                id: *id,
                name: name.clone(),
                selection: selection.clone(),
                action: CellAction::Select,
            },
            HistoryToken::Column { id, name, selection, .. } => HistoryToken::Column {
                id: *id,
                name: name.clone(),
                selection: selection.clone(),
                action: ColumnRowAction::Select,
            },
            HistoryToken::Row { id, name, selection, .. } => HistoryToken::Row {
                id: *id,
                name: name.clone(),
                selection: selection.clone(),
                action: ColumnRowAction::Select,
            },
            other => other.clone(),
        }
    }

    /// Drop a save payload or one-shot mutation, leaving any dialog open.
    pub fn clear_action(&self) -> HistoryToken {
        match self {
            HistoryToken::SpreadsheetRename { id, name, .. } => HistoryToken::SpreadsheetRename {
                id: *id,
                name: name.clone(),
                save: None,
            },
            HistoryToken::Metadata { id, name, property, .. } => HistoryToken::Metadata {
                id: *id,
                name: name.clone(),
                property: *property,
                save: None,
            },
            HistoryToken::Cell { id, name, selection, action } => HistoryToken::Cell {
                id: *id,
                name: name.clone(),
                selection: selection.clone(),
                action: action.clear_action(),
            },
            HistoryToken::Column { id, name, selection, action } => HistoryToken::Column {
                id: *id,
                name: name.clone(),
                selection: selection.clone(),
                action: action.clear_action(),
            },
            HistoryToken::Row { id, name, selection, action } => HistoryToken::Row {
                id: *id,
                name: name.clone(),
                selection: selection.clone(),
                action: action.clear_action(),
            },
            other => other.clone(),
        }
    }

    // =========================================================================
    // Setters (each returns a new token)
    // =========================================================================

    /// Point the token at another spreadsheet. Spreadsheet-less tokens become
    /// a plain select.
    pub fn set_id_name(&self, id: SpreadsheetId, name: SpreadsheetName) -> HistoryToken {
        match self {
            HistoryToken::SpreadsheetRename { save, .. } => HistoryToken::SpreadsheetRename {
                id,
                name,
                save: save.clone(),
            },
            HistoryToken::Metadata { property, save, .. } => HistoryToken::Metadata {
                id,
                name,
                property: *property,
                save: save.clone(),
            },
            HistoryToken::Cell { selection, action, .. } => HistoryToken::Cell {
                id,
                name,
                selection: selection.clone(),
                action: action.clone(),
            },
            HistoryToken::Column { selection, action, .. } => HistoryToken::Column {
                id,
                name,
                selection: selection.clone(),
                action: action.clone(),
            },
            HistoryToken::Row { selection, action, .. } => HistoryToken::Row {
                id,
                name,
                selection: selection.clone(),
                action: action.clone(),
            },
            _ => HistoryToken::spreadsheet_select(id, name),
        }
    }

    /// Replace the selection; any action is dropped. `None` clears the
    /// selection. Tokens without a spreadsheet are returned unchanged.
    pub fn set_selection(&self, selection: Option<AnchoredSelection>) -> HistoryToken {
        let Some((id, name)) = self.id_name() else {
            return self.clone();
        };
        match selection {
            None => HistoryToken::spreadsheet_select(id, name),
            Some(selection) if selection.selection().is_cell_like() => HistoryToken::Cell {
                id,
                name,
                selection,
                action: CellAction::Select,
            },
            Some(selection) if selection.selection().is_column_like() => HistoryToken::Column {
                id,
                name,
                selection,
                action: ColumnRowAction::Select,
            },
            Some(selection) => HistoryToken::Row {
                id,
                name,
                selection,
                action: ColumnRowAction::Select,
            },
        }
    }

    pub fn set_anchor(&self, anchor: AnchorCorner) -> HistoryToken {
        let mut token = self.clone();
        match &mut token {
            HistoryToken::Cell { selection, .. }
            | HistoryToken::Column { selection, .. }
            | HistoryToken::Row { selection, .. } => *selection = selection.set_anchor(anchor),
            _ => {}
        }
        token
    }

    pub fn set_rename(&self) -> HistoryToken {
        match self.id_name() {
            Some((id, name)) => HistoryToken::SpreadsheetRename { id, name, save: None },
            None => self.clone(),
        }
    }

    pub fn set_metadata_property(&self, property: MetadataPropertyName) -> HistoryToken {
        match self.id_name() {
            Some((id, name)) => HistoryToken::Metadata {
                id,
                name,
                property,
                save: None,
            },
            None => self.clone(),
        }
    }

    fn set_cell_action(&self, action: CellAction) -> HistoryToken {
        match self {
            HistoryToken::Cell { id, name, selection, .. } => HistoryToken::Cell {
                id: *id,
                name: name.clone(),
                selection: selection.clone(),
                action,
            },
            other => other.clone(),
        }
    }

    fn set_column_row_action(&self, action: ColumnRowAction) -> HistoryToken {
        match self {
            HistoryToken::Column { id, name, selection, .. } => HistoryToken::Column {
                id: *id,
                name: name.clone(),
                selection: selection.clone(),
                action,
            },
            HistoryToken::Row { id, name, selection, .. } => HistoryToken::Row {
                id: *id,
                name: name.clone(),
                selection: selection.clone(),
                action,
            },
            other => other.clone(),
        }
    }

    /// Open the formula editor. Only single cells and labels have a formula.
    pub fn set_formula(&self) -> HistoryToken {
        match self.selection() {
            Some(SpreadsheetSelection::Cell(_)) | Some(SpreadsheetSelection::Label(_)) => {
                self.set_cell_action(CellAction::Formula { save: None })
            }
            _ => self.clone(),
        }
    }

    pub fn set_find(&self) -> HistoryToken {
        self.set_cell_action(CellAction::Find(FindQuery::default()))
    }

    pub fn set_label(&self) -> HistoryToken {
        self.set_cell_action(CellAction::Label { save: None })
    }

    pub fn set_style(&self, property: StylePropertyName) -> HistoryToken {
        self.set_cell_action(CellAction::Style { property, save: None })
    }

    pub fn set_sort(&self) -> HistoryToken {
        match self {
            HistoryToken::Cell { .. } => self.set_cell_action(CellAction::Sort { save: None }),
            _ => self.set_column_row_action(ColumnRowAction::Sort { save: None }),
        }
    }

    pub fn set_menu(&self) -> HistoryToken {
        match self {
            HistoryToken::Cell { .. } => self.set_cell_action(CellAction::Menu),
            _ => self.set_column_row_action(ColumnRowAction::Menu),
        }
    }

    pub fn set_clear(&self) -> HistoryToken {
        match self {
            HistoryToken::Cell { .. } => self.set_cell_action(CellAction::Clear),
            _ => self.set_column_row_action(ColumnRowAction::Clear),
        }
    }

    pub fn set_delete(&self) -> HistoryToken {
        match self {
            HistoryToken::Cell { .. } => self.set_cell_action(CellAction::Delete),
            _ => self.set_column_row_action(ColumnRowAction::Delete),
        }
    }

    pub fn set_freeze(&self) -> HistoryToken {
        match self {
            HistoryToken::Cell { .. } => self.set_cell_action(CellAction::Freeze),
            _ => self.set_column_row_action(ColumnRowAction::Freeze),
        }
    }

    pub fn set_unfreeze(&self) -> HistoryToken {
        match self {
            HistoryToken::Cell { .. } => self.set_cell_action(CellAction::Unfreeze),
            _ => self.set_column_row_action(ColumnRowAction::Unfreeze),
        }
    }

    pub fn set_insert_after(&self, count: NonZeroU32) -> HistoryToken {
        self.set_column_row_action(ColumnRowAction::InsertAfter(count))
    }

    pub fn set_insert_before(&self, count: NonZeroU32) -> HistoryToken {
        self.set_column_row_action(ColumnRowAction::InsertBefore(count))
    }

    /// Attach a save payload. Tokens that take no payload, and payloads that
    /// are invalid for their target (a bad spreadsheet or label name), return
    /// the token unchanged.
    pub fn set_save(&self, value: &str) -> HistoryToken {
        let value = value.to_string();
        match self {
            HistoryToken::SpreadsheetRename { id, name, .. } => match SpreadsheetName::new(value) {
                Ok(save) => HistoryToken::SpreadsheetRename {
                    id: *id,
                    name: name.clone(),
                    save: Some(save),
                },
                Err(_) => self.clone(),
            },
            HistoryToken::Metadata { id, name, property, .. } => HistoryToken::Metadata {
                id: *id,
                name: name.clone(),
                property: *property,
                save: Some(value),
            },
            HistoryToken::Cell { action, .. } => match action {
                CellAction::Formula { .. } => self.set_cell_action(CellAction::Formula { save: Some(value) }),
                CellAction::Sort { .. } => self.set_cell_action(CellAction::Sort { save: Some(value) }),
                CellAction::Style { property, .. } => self.set_cell_action(CellAction::Style {
                    property: *property,
                    save: Some(value),
                }),
                CellAction::Label { .. } => match LabelName::new(value) {
                    Ok(label) => self.set_cell_action(CellAction::Label { save: Some(label) }),
                    Err(_) => self.clone(),
                },
                _ => self.clone(),
            },
            HistoryToken::Column { action: ColumnRowAction::Sort { .. }, .. }
            | HistoryToken::Row { action: ColumnRowAction::Sort { .. }, .. } => {
                self.set_column_row_action(ColumnRowAction::Sort { save: Some(value) })
            }
            other => other.clone(),
        }
    }

    /// Set the find query text; other tokens are unchanged.
    pub fn set_query(&self, query: Option<String>) -> HistoryToken {
        match self {
            HistoryToken::Cell { action: CellAction::Find(find), .. } => {
                self.set_cell_action(CellAction::Find(FindQuery {
                    query: query.filter(|q| !q.is_empty()),
                    ..find.clone()
                }))
            }
            other => other.clone(),
        }
    }

    /// Set the paging offset of the spreadsheet list or find dialog.
    pub fn set_offset(&self, offset: Option<u32>) -> HistoryToken {
        match self {
            HistoryToken::SpreadsheetList { count, .. } => HistoryToken::SpreadsheetList {
                offset,
                count: *count,
            },
            HistoryToken::Cell { action: CellAction::Find(find), .. } => {
                self.set_cell_action(CellAction::Find(FindQuery {
                    offset,
                    ..find.clone()
                }))
            }
            other => other.clone(),
        }
    }

    /// Set the page size of the spreadsheet list or find dialog.
    pub fn set_count(&self, count: Option<NonZeroU32>) -> HistoryToken {
        match self {
            HistoryToken::SpreadsheetList { offset, .. } => HistoryToken::SpreadsheetList {
                offset: *offset,
                count,
            },
            HistoryToken::Cell { action: CellAction::Find(find), .. } => {
                self.set_cell_action(CellAction::Find(FindQuery {
                    count,
                    ..find.clone()
                }))
            }
            other => other.clone(),
        }
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    /// The URL fragment for this token, without the leading `#`.
    pub fn url_fragment(&self) -> String {
        let mut out = String::new();
        match self {
            HistoryToken::Unknown { fragment } => return fragment.clone(),
            HistoryToken::SpreadsheetList { offset, count } => {
                if let Some(offset) = offset {
                    push(&mut out, OFFSET);
                    push(&mut out, &offset.to_string());
                }
                if let Some(count) = count {
                    push(&mut out, MAX);
                    push(&mut out, &count.to_string());
                }
                if out.is_empty() {
                    out.push('/');
                }
            }
            HistoryToken::SpreadsheetCreate => push(&mut out, CREATE),
            HistoryToken::SpreadsheetLoad { id } => push(&mut out, &id.to_string()),
            HistoryToken::SpreadsheetSelect { id, name } => push_id_name(&mut out, *id, name),
            HistoryToken::SpreadsheetRename { id, name, save } => {
                push_id_name(&mut out, *id, name);
                push(&mut out, RENAME);
                push_save(&mut out, save.as_ref().map(SpreadsheetName::as_str));
            }
            HistoryToken::Metadata { id, name, property, save } => {
                push_id_name(&mut out, *id, name);
                push(&mut out, METADATA);
                push(&mut out, property.as_str());
                push_save(&mut out, save.as_deref());
            }
            HistoryToken::Cell { id, name, selection, action } => {
                push_id_name(&mut out, *id, name);
                push(&mut out, CELL);
                push_selection(&mut out, selection);
                push_cell_action(&mut out, action);
            }
            HistoryToken::Column { id, name, selection, action } => {
                push_id_name(&mut out, *id, name);
                push(&mut out, COLUMN);
                push_selection(&mut out, selection);
                push_column_row_action(&mut out, action);
            }
            HistoryToken::Row { id, name, selection, action } => {
                push_id_name(&mut out, *id, name);
                push(&mut out, ROW);
                push_selection(&mut out, selection);
                push_column_row_action(&mut out, action);
            }
        }
        out
    }
}

fn push(out: &mut String, segment: &str) {
    out.push('/');
    out.push_str(segment);
}

fn push_encoded(out: &mut String, text: &str) {
    push(out, &urlencoding::encode(text));
}

fn push_id_name(out: &mut String, id: SpreadsheetId, name: &SpreadsheetName) {
    push(out, &id.to_string());
    push_encoded(out, name.as_str());
}

fn push_save(out: &mut String, save: Option<&str>) {
    if let Some(value) = save {
        push(out, SAVE);
        push_encoded(out, value);
    }
}

fn push_selection(out: &mut String, selection: &AnchoredSelection) {
    push(out, &selection.selection().to_string());
    if selection.anchor() != AnchorCorner::None {
        push(out, selection.anchor().as_str());
    }
}

fn push_cell_action(out: &mut String, action: &CellAction) {
    match action {
        CellAction::Select => {}
        CellAction::Clear => push(out, CLEAR),
        CellAction::Delete => push(out, DELETE),
        CellAction::Formula { save } => {
            push(out, FORMULA);
            push_save(out, save.as_deref());
        }
        CellAction::Find(find) => {
            push(out, FIND);
            if let Some(offset) = find.offset {
                push(out, OFFSET);
                push(out, &offset.to_string());
            }
            if let Some(count) = find.count {
                push(out, MAX);
                push(out, &count.to_string());
            }
            if let Some(query) = &find.query {
                push(out, QUERY);
                push_encoded(out, query);
            }
        }
        CellAction::Sort { save } => {
            push(out, SORT);
            push_save(out, save.as_deref());
        }
        CellAction::Freeze => push(out, FREEZE),
        CellAction::Unfreeze => push(out, UNFREEZE),
        CellAction::Menu => push(out, MENU),
        CellAction::Label { save } => {
            push(out, LABEL);
            push_save(out, save.as_ref().map(LabelName::as_str));
        }
        CellAction::Style { property, save } => {
            push(out, STYLE);
            push(out, property.as_str());
            push_save(out, save.as_deref());
        }
    }
}

fn push_column_row_action(out: &mut String, action: &ColumnRowAction) {
    match action {
        ColumnRowAction::Select => {}
        ColumnRowAction::Clear => push(out, CLEAR),
        ColumnRowAction::Delete => push(out, DELETE),
        ColumnRowAction::Freeze => push(out, FREEZE),
        ColumnRowAction::Unfreeze => push(out, UNFREEZE),
        ColumnRowAction::Menu => push(out, MENU),
        ColumnRowAction::InsertAfter(count) => {
            push(out, INSERT_AFTER);
            push(out, &count.to_string());
        }
        ColumnRowAction::InsertBefore(count) => {
            push(out, INSERT_BEFORE);
            push(out, &count.to_string());
        }
        ColumnRowAction::Sort { save } => {
            push(out, SORT);
            push_save(out, save.as_deref());
        }
    }
}

impl fmt::Display for HistoryToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url_fragment())
    }
}
