//! Turns navigation into server calls.
//!
//! Save tokens and one-shot mutations (clear, delete, insert, freeze...)
//! are performed here exactly once, then replaced in the location bar by
//! their action-less form so reloading or re-broadcasting them is harmless.

use std::rc::Weak;

use serde_json::Value;
use websheet_core::{CellRef, LabelName, SpreadsheetSelection};
use websheet_history::{CellAction, ColumnRowAction, HistoryController, HistoryToken, HistoryTokenWatcher};
use websheet_protocol::{LabelTarget, MetadataPropertyName, SpreadsheetId};

use crate::context::AppContext;

/// History watcher that loads metadata and performs token actions.
pub struct HistoryTokenActions {
    context: Weak<AppContext>,
}

impl HistoryTokenActions {
    pub fn new(context: Weak<AppContext>) -> Self {
        Self { context }
    }

    fn handle(&self, context: &AppContext, token: &HistoryToken) {
        match token {
            HistoryToken::SpreadsheetCreate => {
                context.spawn(context.metadata_fetcher().create());
                return;
            }
            HistoryToken::SpreadsheetLoad { id } => {
                context.reload_metadata(*id);
                return;
            }
            _ => {}
        }

        let Some(id) = token.spreadsheet_id() else {
            return;
        };
        context.load_metadata(id);

        match token {
            HistoryToken::SpreadsheetRename { save: Some(name), .. } => {
                context.spawn(context.metadata_fetcher().patch_property(
                    id,
                    MetadataPropertyName::SPREADSHEET_NAME,
                    Value::String(name.to_string()),
                ));
                context.push_history_token(&token.close());
            }
            HistoryToken::Metadata { property, save: Some(text), .. } => {
                if property.is_read_only() {
                    context.warning(&format!("{} is read only", property));
                } else {
                    let value = property.parse_value(text);
                    context.spawn(context.metadata_fetcher().patch_property(id, *property, value));
                }
                context.push_history_token(&token.close());
            }
            HistoryToken::Cell { selection, action, .. } => {
                self.cell_action(context, token, id, selection.selection(), action);
            }
            HistoryToken::Column { selection, action, .. } | HistoryToken::Row { selection, action, .. } => {
                self.column_row_action(context, token, id, selection.selection(), action);
            }
            _ => {}
        }
    }

    fn cell_action(
        &self,
        context: &AppContext,
        token: &HistoryToken,
        id: SpreadsheetId,
        selection: &SpreadsheetSelection,
        action: &CellAction,
    ) {
        let delta = context.delta_fetcher();
        match action {
            CellAction::Select | CellAction::Menu => return,
            CellAction::Formula { save: None }
            | CellAction::Sort { save: None }
            | CellAction::Label { save: None }
            | CellAction::Style { save: None, .. } => return,
            CellAction::Find(find) => {
                context.spawn(context.find_fetcher().find_cells(
                    id,
                    selection,
                    find.offset,
                    find.count,
                    find.query.as_deref(),
                ));
                return;
            }
            CellAction::Clear => context.spawn(delta.clear(id, selection)),
            CellAction::Delete => context.spawn(delta.delete_cells(id, selection)),
            CellAction::Formula { save: Some(text) } => match formula_cell(context, selection) {
                Some(cell) => context.spawn(delta.save_formula(id, cell, text)),
                None => context.error(&format!("{} is not in the viewport", selection)),
            },
            CellAction::Sort { save: Some(comparators) } => {
                context.spawn(delta.sort(id, selection, comparators));
                context.push_history_token(&token.close());
                return;
            }
            CellAction::Label { save: Some(label) } => {
                match label_target(selection) {
                    Some(target) => context.spawn(delta.save_label(id, label.clone(), target)),
                    None => context.error(&format!("Label {} must point at a cell or range", label)),
                }
                context.push_history_token(&token.close());
                return;
            }
            CellAction::Style { property, save: Some(text) } => {
                let value = if text.is_empty() {
                    Value::Null
                } else {
                    Value::String(text.clone())
                };
                context.spawn(delta.patch_style(id, selection, property.as_str(), value));
            }
            CellAction::Freeze => freeze(context, id, selection),
            CellAction::Unfreeze => unfreeze(context, id, selection),
        }
        context.push_history_token(&token.clear_action());
    }

    fn column_row_action(
        &self,
        context: &AppContext,
        token: &HistoryToken,
        id: SpreadsheetId,
        selection: &SpreadsheetSelection,
        action: &ColumnRowAction,
    ) {
        let delta = context.delta_fetcher();
        match action {
            ColumnRowAction::Select | ColumnRowAction::Menu | ColumnRowAction::Sort { save: None } => return,
            ColumnRowAction::Clear => context.spawn(delta.clear(id, selection)),
            ColumnRowAction::Delete => context.spawn(delta.delete_cells(id, selection)),
            ColumnRowAction::InsertAfter(count) => context.spawn(delta.insert_after(id, selection, *count)),
            ColumnRowAction::InsertBefore(count) => context.spawn(delta.insert_before(id, selection, *count)),
            ColumnRowAction::Sort { save: Some(comparators) } => {
                context.spawn(delta.sort(id, selection, comparators));
                context.push_history_token(&token.close());
                return;
            }
            ColumnRowAction::Freeze => freeze(context, id, selection),
            ColumnRowAction::Unfreeze => unfreeze(context, id, selection),
        }
        context.push_history_token(&token.clear_action());
    }
}

impl HistoryTokenWatcher for HistoryTokenActions {
    fn on_history_token_change(&self, _previous: &HistoryToken, controller: &HistoryController) {
        let Some(context) = self.context.upgrade() else {
            return;
        };
        let token = controller.history_token();
        if token.should_ignore() && controller.firing_token().as_ref() == Some(&token) {
            log::debug!("{} is being re-fired, not repeating it", token);
            return;
        }
        self.handle(&context, &token);
    }
}

/// The cell whose formula a token edits: the cell itself, or the first
/// cached cell carrying the label.
fn formula_cell(context: &AppContext, selection: &SpreadsheetSelection) -> Option<CellRef> {
    match selection {
        SpreadsheetSelection::Cell(cell) => Some(*cell),
        SpreadsheetSelection::Label(label) => first_labelled(context, label),
        _ => None,
    }
}

fn first_labelled(context: &AppContext, label: &LabelName) -> Option<CellRef> {
    context.cache().cells_with_label(label).first().copied()
}

fn label_target(selection: &SpreadsheetSelection) -> Option<LabelTarget> {
    match selection {
        SpreadsheetSelection::Cell(cell) => Some(LabelTarget::Cell(*cell)),
        SpreadsheetSelection::CellRange(range) => Some(LabelTarget::Range(*range)),
        _ => None,
    }
}

/// Frozen column and row counts that end at `selection`. Columns and rows
/// freeze from the first one, so the selection must start there.
fn frozen_counts(selection: &SpreadsheetSelection) -> Option<(Option<u32>, Option<u32>)> {
    match selection {
        SpreadsheetSelection::Cell(cell) => Some((Some(cell.column().value() + 1), Some(cell.row().value() + 1))),
        SpreadsheetSelection::CellRange(range) => {
            let (begin, end) = (range.begin(), range.end());
            if begin.column().value() != 0 || begin.row().value() != 0 {
                return None;
            }
            Some((Some(end.column().value() + 1), Some(end.row().value() + 1)))
        }
        SpreadsheetSelection::Column(column) => Some((Some(column.value() + 1), None)),
        SpreadsheetSelection::ColumnRange(range) if range.begin().value() == 0 => {
            Some((Some(range.end().value() + 1), None))
        }
        SpreadsheetSelection::Row(row) => Some((None, Some(row.value() + 1))),
        SpreadsheetSelection::RowRange(range) if range.begin().value() == 0 => {
            Some((None, Some(range.end().value() + 1)))
        }
        _ => None,
    }
}

fn freeze(context: &AppContext, id: SpreadsheetId, selection: &SpreadsheetSelection) {
    let Some((columns, rows)) = frozen_counts(selection) else {
        context.warning(&format!("Cannot freeze {}", selection));
        return;
    };
    let metadata = context.metadata_fetcher();
    if let Some(columns) = columns {
        context.spawn(metadata.patch_property(id, MetadataPropertyName::FROZEN_COLUMNS, Value::from(columns)));
    }
    if let Some(rows) = rows {
        context.spawn(metadata.patch_property(id, MetadataPropertyName::FROZEN_ROWS, Value::from(rows)));
    }
}

fn unfreeze(context: &AppContext, id: SpreadsheetId, selection: &SpreadsheetSelection) {
    let metadata = context.metadata_fetcher();
    if !selection.is_row_like() {
        context.spawn(metadata.patch_property(id, MetadataPropertyName::FROZEN_COLUMNS, Value::Null));
    }
    if !selection.is_column_like() {
        context.spawn(metadata.patch_property(id, MetadataPropertyName::FROZEN_ROWS, Value::Null));
    }
}
