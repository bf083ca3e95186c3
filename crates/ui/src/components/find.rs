use std::num::NonZeroU32;

use websheet_core::{CellRef, SpreadsheetSelection};
use websheet_history::{CellAction, FindQuery, HistoryToken};
use websheet_protocol::SpreadsheetDelta;

use crate::context::AppContext;
use crate::lifecycle::{ComponentLifecycle, HistoryTokenMatcher, Openable, Refreshable};

/// Page size when the token does not say.
pub const DEFAULT_FIND_COUNT: u32 = 20;

/// A single find result row.
#[derive(Debug, Clone, PartialEq)]
pub struct FindMatch {
    pub reference: CellRef,
    pub formula: String,
    pub value: String,
}

/// Find dialog, open for `.../cell/<sel>/find[...]`.
///
/// The query fields mirror the token; results arrive separately from the
/// find fetcher through [`set_results`](Self::set_results).
#[derive(Debug, Default)]
pub struct FindDialog {
    open: bool,
    focused: bool,
    query: FindQuery,
    results: Vec<FindMatch>,
}

impl FindDialog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &FindQuery {
        &self.query
    }

    pub fn results(&self) -> &[FindMatch] {
        &self.results
    }

    pub fn has_focus(&self) -> bool {
        self.focused
    }

    pub fn set_results(&mut self, delta: &SpreadsheetDelta) {
        self.results = delta
            .cells
            .iter()
            .map(|cell| FindMatch {
                reference: cell.reference,
                formula: cell.formula.text.clone(),
                value: cell.display_text().to_string(),
            })
            .collect();
    }

    /// Search for `query` from the first result.
    pub fn search(&self, current: &HistoryToken, query: &str) -> HistoryToken {
        current.set_query(Some(query.to_string())).set_offset(None)
    }

    pub fn next_page(&self, current: &HistoryToken) -> HistoryToken {
        let offset = self.query.offset.unwrap_or(0).saturating_add(self.page_size());
        current.set_offset(Some(offset))
    }

    pub fn previous_page(&self, current: &HistoryToken) -> HistoryToken {
        let offset = self.query.offset.unwrap_or(0).saturating_sub(self.page_size());
        current.set_offset(Some(offset).filter(|offset| *offset > 0))
    }

    fn page_size(&self) -> u32 {
        self.query.count.map_or(DEFAULT_FIND_COUNT, NonZeroU32::get)
    }

    /// Select a result cell, closing the dialog.
    pub fn select(&self, current: &HistoryToken, reference: CellRef) -> HistoryToken {
        current.set_selection(Some(SpreadsheetSelection::Cell(reference).into()))
    }
}

impl HistoryTokenMatcher for FindDialog {
    fn is_match(&self, token: &HistoryToken) -> bool {
        matches!(
            token,
            HistoryToken::Cell {
                action: CellAction::Find(_),
                ..
            }
        )
    }
}

impl Openable<AppContext> for FindDialog {
    fn is_open(&self) -> bool {
        self.open
    }

    fn open(&mut self, _context: &AppContext) {
        self.open = true;
        self.results.clear();
    }

    fn open_give_focus(&mut self, _context: &AppContext) {
        self.focused = true;
    }

    fn close(&mut self, _context: &AppContext) {
        self.open = false;
        self.focused = false;
        self.query = FindQuery::default();
        self.results.clear();
    }
}

impl Refreshable<AppContext> for FindDialog {
    fn refresh(&mut self, context: &AppContext) {
        if let Some(CellAction::Find(query)) = context.history().history_token().cell_action() {
            self.query = query.clone();
        }
    }
}

impl ComponentLifecycle<AppContext> for FindDialog {
    fn requires_loaded_metadata(&self) -> bool {
        true
    }
}
