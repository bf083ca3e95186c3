use websheet_core::{CellRef, SpreadsheetSelection};
use websheet_history::{CellAction, HistoryToken};

use crate::context::AppContext;
use crate::lifecycle::{ComponentLifecycle, HistoryTokenMatcher, Openable, Refreshable};

/// Formula bar for a single cell or label, open for `.../cell/<sel>/formula`.
#[derive(Debug, Default)]
pub struct CellFormulaComponent {
    open: bool,
    focused: bool,
    cell: Option<CellRef>,
    text: String,
}

impl CellFormulaComponent {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cell being edited; `None` for a label not in the viewport.
    pub fn cell(&self) -> Option<CellRef> {
        self.cell
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn has_focus(&self) -> bool {
        self.focused
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// The token that saves the edited text.
    pub fn save(&self, current: &HistoryToken) -> HistoryToken {
        current.set_save(&self.text)
    }

    /// Discard edits and reload the cached formula.
    pub fn undo(&mut self, context: &AppContext) {
        self.refresh(context);
    }
}

impl HistoryTokenMatcher for CellFormulaComponent {
    fn is_match(&self, token: &HistoryToken) -> bool {
        matches!(
            token,
            HistoryToken::Cell {
                action: CellAction::Formula { save: None },
                ..
            }
        )
    }
}

impl Openable<AppContext> for CellFormulaComponent {
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
        self.cell = None;
        self.text.clear();
    }
}

impl Refreshable<AppContext> for CellFormulaComponent {
    fn refresh(&mut self, context: &AppContext) {
        let token = context.history().history_token();
        let cache = context.cache();
        self.cell = match token.selection() {
            Some(SpreadsheetSelection::Cell(cell)) => Some(*cell),
            Some(SpreadsheetSelection::Label(label)) => cache.cells_with_label(label).first().copied(),
            _ => None,
        };
        self.text = self
            .cell
            .and_then(|cell| cache.cell(cell))
            .map(|cell| cell.formula.text.clone())
            .unwrap_or_default();
    }
}

impl ComponentLifecycle<AppContext> for CellFormulaComponent {
    fn requires_loaded_metadata(&self) -> bool {
        true
    }
}
