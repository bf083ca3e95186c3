use std::collections::BTreeSet;
use std::fmt::Write as _;

use websheet_core::{col_to_letters, CellRange, CellRef, LabelName, SpreadsheetSelection};
use websheet_history::HistoryToken;
use websheet_protocol::SpreadsheetId;
use websheet_viewport::Viewport;

use crate::context::AppContext;
use crate::lifecycle::{ComponentLifecycle, HistoryTokenMatcher, Openable, Refreshable};

/// One rendered grid cell.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportCell {
    pub reference: CellRef,
    pub text: String,
    pub labels: BTreeSet<LabelName>,
    pub selected: bool,
}

/// The cell grid. Open whenever a named spreadsheet is showing.
///
/// Each refresh works out the windows the current viewport needs and asks
/// the server for them when the cache holds different ones, then renders
/// whatever the cache has.
#[derive(Debug, Default)]
pub struct ViewportComponent {
    open: bool,
    focused: bool,
    /// Scroll position; `None` follows the saved viewport of the spreadsheet.
    home: Option<CellRef>,
    requested: Option<(SpreadsheetId, Vec<CellRange>)>,
    rows: Vec<Vec<ViewportCell>>,
}

impl ViewportComponent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[Vec<ViewportCell>] {
        &self.rows
    }

    pub fn has_focus(&self) -> bool {
        self.focused
    }

    /// Rendered cell at `reference`, if it is on screen.
    pub fn cell(&self, reference: CellRef) -> Option<&ViewportCell> {
        self.rows.iter().flatten().find(|cell| cell.reference == reference)
    }

    pub fn scroll_to(&mut self, context: &AppContext, home: CellRef) {
        self.home = Some(home);
        if self.open {
            self.refresh(context);
        }
    }

    /// Replace the selection, closing any open cell dialog.
    pub fn select(&self, current: &HistoryToken, selection: SpreadsheetSelection) -> HistoryToken {
        current.set_selection(Some(selection.into()))
    }

    /// The grid as tab-separated text with column letters and row numbers.
    /// Selected cells are wrapped in `[...]`.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        if let Some(first) = self.rows.first() {
            for cell in first {
                let _ = write!(out, "\t{}", col_to_letters(cell.reference.column().value()));
            }
            out.push('\n');
        }
        for row in &self.rows {
            if let Some(cell) = row.first() {
                let _ = write!(out, "{}", cell.reference.row());
            }
            for cell in row {
                if cell.selected {
                    let _ = write!(out, "\t[{}]", cell.text);
                } else {
                    let _ = write!(out, "\t{}", cell.text);
                }
            }
            out.push('\n');
        }
        out
    }

    fn viewport(&self, context: &AppContext) -> Option<Viewport> {
        let settings = context.settings();
        let home = self
            .home
            .or_else(|| context.metadata().and_then(|m| m.viewport_home()))
            .or_else(|| CellRef::from_coords(0, 0))?;
        Some(Viewport::new(home, settings.viewport_width, settings.viewport_height))
    }

    fn windows(&self, context: &AppContext, viewport: &Viewport) -> Vec<CellRange> {
        if !context.settings().include_frozen_columns_rows {
            return vec![viewport.window()];
        }
        match context.metadata() {
            Some(metadata) => viewport.windows(metadata.frozen_columns(), metadata.frozen_rows()),
            None => vec![viewport.window()],
        }
    }

    fn load_if_needed(&mut self, context: &AppContext, viewport: &Viewport, windows: &[CellRange]) {
        let Some(id) = context.metadata_id() else {
            return;
        };
        if context.cache().windows() == windows {
            return;
        }
        if let Some((requested_id, requested)) = &self.requested {
            if *requested_id == id && requested.as_slice() == windows {
                return;
            }
        }
        log::debug!("loading viewport {} for {}", viewport.window(), id);
        self.requested = Some((id, windows.to_vec()));
        let include = context.settings().include_frozen_columns_rows;
        context.spawn(context.delta_fetcher().load_viewport(id, viewport, include));
    }

    fn render(&mut self, context: &AppContext, windows: &[CellRange]) {
        let Some(main) = windows.last() else {
            self.rows.clear();
            return;
        };
        let (frozen_columns, frozen_rows) = match (context.settings().include_frozen_columns_rows, context.metadata()) {
            (true, Some(metadata)) => (metadata.frozen_columns(), metadata.frozen_rows()),
            _ => (0, 0),
        };
        let columns: Vec<u32> = (0..frozen_columns)
            .chain(main.begin().column().value()..=main.end().column().value())
            .collect();
        let rows: Vec<u32> = (0..frozen_rows)
            .chain(main.begin().row().value()..=main.end().row().value())
            .collect();

        let token = context.history().history_token();
        let selection = token.selection();
        let cache = context.cache();
        self.rows = rows
            .iter()
            .map(|&row| {
                columns
                    .iter()
                    .filter_map(|&col| CellRef::from_coords(col, row))
                    .map(|reference| {
                        let labels = cache.labels(reference);
                        let selected = selection.map_or(false, |s| is_selected(s, reference, &labels));
                        ViewportCell {
                            reference,
                            text: cache
                                .cell(reference)
                                .map(|cell| cell.display_text().to_string())
                                .unwrap_or_default(),
                            labels,
                            selected,
                        }
                    })
                    .collect()
            })
            .collect();
    }
}

fn is_selected(selection: &SpreadsheetSelection, cell: CellRef, labels: &BTreeSet<LabelName>) -> bool {
    match selection {
        SpreadsheetSelection::Cell(selected) => *selected == cell,
        SpreadsheetSelection::CellRange(range) => range.contains(cell),
        SpreadsheetSelection::Column(column) => *column == cell.column(),
        SpreadsheetSelection::ColumnRange(range) => range.contains(cell.column()),
        SpreadsheetSelection::Row(row) => *row == cell.row(),
        SpreadsheetSelection::RowRange(range) => range.contains(cell.row()),
        SpreadsheetSelection::Label(label) => labels.contains(label),
    }
}

impl HistoryTokenMatcher for ViewportComponent {
    fn is_match(&self, token: &HistoryToken) -> bool {
        token.spreadsheet_name().is_some()
    }
}

impl Openable<AppContext> for ViewportComponent {
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
        self.home = None;
        self.requested = None;
        self.rows.clear();
    }
}

impl Refreshable<AppContext> for ViewportComponent {
    fn refresh(&mut self, context: &AppContext) {
        let Some(viewport) = self.viewport(context) else {
            self.rows.clear();
            return;
        };
        let windows = self.windows(context, &viewport);
        self.load_if_needed(context, &viewport, &windows);
        self.render(context, &windows);
    }
}

impl ComponentLifecycle<AppContext> for ViewportComponent {
    fn requires_loaded_metadata(&self) -> bool {
        true
    }
}
