//! URL fragment -> [`HistoryToken`].
//!
//! The parser walks `/`-separated segments with a cursor. Every branch
//! either consumes the whole fragment or gives up, and giving up always
//! yields [`HistoryToken::Unknown`].

use std::borrow::Cow;
use std::num::NonZeroU32;

use websheet_core::{AnchorCorner, AnchoredSelection, LabelName, SelectionParseError, SpreadsheetSelection};
use websheet_protocol::{MetadataPropertyName, SpreadsheetId, SpreadsheetName};

use crate::token::*;

pub(crate) fn parse(fragment: &str) -> HistoryToken {
    let text = fragment.strip_prefix('#').unwrap_or(fragment);
    let path = text.strip_prefix('/').unwrap_or(text);

    let mut cursor = Cursor::new(path);
    match parse_root(&mut cursor) {
        Some(token) if cursor.is_done() => token,
        _ => HistoryToken::unknown(text),
    }
}

struct Cursor<'a> {
    segments: Vec<&'a str>,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(path: &'a str) -> Self {
        let segments = if path.is_empty() {
            Vec::new()
        } else {
            path.split('/').collect()
        };
        Self { segments, pos: 0 }
    }

    fn peek(&self) -> Option<&'a str> {
        self.segments.get(self.pos).copied()
    }

    /// The next segment; empty segments only appear as save values.
    fn next(&mut self) -> Option<&'a str> {
        let segment = self.peek().filter(|s| !s.is_empty())?;
        self.pos += 1;
        Some(segment)
    }

    fn next_raw(&mut self) -> Option<&'a str> {
        let segment = self.peek()?;
        self.pos += 1;
        Some(segment)
    }

    /// Consume `keyword` if it is the next segment.
    fn eat(&mut self, keyword: &str) -> bool {
        if self.peek() == Some(keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn is_done(&self) -> bool {
        self.pos >= self.segments.len()
    }

    fn next_number(&mut self) -> Option<u32> {
        let text = self.next()?;
        if !text.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let n = text.parse::<u32>().ok()?;
        // Reject "007" so the token serializes back to the same text.
        (n.to_string() == text).then_some(n)
    }

    fn next_count(&mut self) -> Option<NonZeroU32> {
        NonZeroU32::new(self.next_number()?)
    }

    fn next_decoded(&mut self) -> Option<String> {
        decode(self.next()?)
    }

    /// Optional trailing `save/<value>`. Returns `Some(None)` when absent and
    /// `None` when the fragment is malformed.
    fn save(&mut self) -> Option<Option<String>> {
        if self.is_done() {
            return Some(None);
        }
        if !self.eat(SAVE) {
            return None;
        }
        let value = decode(self.next_raw()?)?;
        self.is_done().then_some(Some(value))
    }
}

fn decode(segment: &str) -> Option<String> {
    urlencoding::decode(segment).ok().map(Cow::into_owned)
}

fn parse_root(cursor: &mut Cursor) -> Option<HistoryToken> {
    let Some(first) = cursor.peek() else {
        return Some(HistoryToken::default());
    };

    match first {
        OFFSET | MAX => parse_list(cursor),
        CREATE => {
            cursor.next();
            Some(HistoryToken::SpreadsheetCreate)
        }
        _ => parse_spreadsheet(cursor),
    }
}

fn parse_list(cursor: &mut Cursor) -> Option<HistoryToken> {
    let offset = if cursor.eat(OFFSET) {
        Some(cursor.next_number()?)
    } else {
        None
    };
    let count = if cursor.eat(MAX) {
        Some(cursor.next_count()?)
    } else {
        None
    };
    Some(HistoryToken::SpreadsheetList { offset, count })
}

fn parse_spreadsheet(cursor: &mut Cursor) -> Option<HistoryToken> {
    let id_text = cursor.next()?;
    let id = id_text.parse::<SpreadsheetId>().ok()?;
    if id.to_string() != id_text {
        return None;
    }
    if cursor.is_done() {
        return Some(HistoryToken::SpreadsheetLoad { id });
    }

    let name = SpreadsheetName::new(cursor.next_decoded()?).ok()?;
    let Some(keyword) = cursor.next() else {
        return Some(HistoryToken::SpreadsheetSelect { id, name });
    };

    match keyword {
        RENAME => {
            let save = match cursor.save()? {
                Some(value) => Some(SpreadsheetName::new(value).ok()?),
                None => None,
            };
            Some(HistoryToken::SpreadsheetRename { id, name, save })
        }
        METADATA => {
            let property = cursor.next()?.parse::<MetadataPropertyName>().ok()?;
            let save = cursor.save()?;
            Some(HistoryToken::Metadata { id, name, property, save })
        }
        CELL => {
            let selection = parse_selection(cursor, SpreadsheetSelection::parse_cell_like)?;
            let action = parse_cell_action(cursor, selection.selection())?;
            Some(HistoryToken::Cell { id, name, selection, action })
        }
        COLUMN => {
            let selection = parse_selection(cursor, SpreadsheetSelection::parse_column_like)?;
            let action = parse_column_row_action(cursor)?;
            Some(HistoryToken::Column { id, name, selection, action })
        }
        ROW => {
            let selection = parse_selection(cursor, SpreadsheetSelection::parse_row_like)?;
            let action = parse_column_row_action(cursor)?;
            Some(HistoryToken::Row { id, name, selection, action })
        }
        _ => None,
    }
}

/// A selection followed by an optional anchor. An anchor that does not fit
/// the selection (any anchor on a single cell, `left` on a cell range...)
/// is rejected rather than corrected.
fn parse_selection(
    cursor: &mut Cursor,
    parse: fn(&str) -> Result<SpreadsheetSelection, SelectionParseError>,
) -> Option<AnchoredSelection> {
    let selection = parse(cursor.next()?).ok()?;
    match cursor.peek().and_then(AnchorCorner::parse) {
        Some(anchor) => {
            if !selection.accepts_anchor(anchor) {
                return None;
            }
            cursor.next();
            Some(AnchoredSelection::new(selection, anchor))
        }
        None => Some(AnchoredSelection::from(selection)),
    }
}

fn parse_cell_action(cursor: &mut Cursor, selection: &SpreadsheetSelection) -> Option<CellAction> {
    let Some(keyword) = cursor.next() else {
        return Some(CellAction::Select);
    };

    let action = match keyword {
        CLEAR => CellAction::Clear,
        DELETE => CellAction::Delete,
        FREEZE => CellAction::Freeze,
        UNFREEZE => CellAction::Unfreeze,
        MENU => CellAction::Menu,
        FORMULA => {
            if !matches!(selection, SpreadsheetSelection::Cell(_) | SpreadsheetSelection::Label(_)) {
                return None;
            }
            CellAction::Formula { save: cursor.save()? }
        }
        SORT => CellAction::Sort { save: cursor.save()? },
        LABEL => {
            let save = match cursor.save()? {
                Some(value) => Some(LabelName::new(value).ok()?),
                None => None,
            };
            CellAction::Label { save }
        }
        STYLE => {
            let property = StylePropertyName::parse(cursor.next()?)?;
            CellAction::Style {
                property,
                save: cursor.save()?,
            }
        }
        FIND => CellAction::Find(parse_find(cursor)?),
        _ => return None,
    };
    Some(action)
}

fn parse_find(cursor: &mut Cursor) -> Option<FindQuery> {
    let mut find = FindQuery::default();
    if cursor.eat(OFFSET) {
        find.offset = Some(cursor.next_number()?);
    }
    if cursor.eat(MAX) {
        find.count = Some(cursor.next_count()?);
    }
    if cursor.eat(QUERY) {
        find.query = Some(cursor.next_decoded()?);
    }
    Some(find)
}

fn parse_column_row_action(cursor: &mut Cursor) -> Option<ColumnRowAction> {
    let Some(keyword) = cursor.next() else {
        return Some(ColumnRowAction::Select);
    };

    let action = match keyword {
        CLEAR => ColumnRowAction::Clear,
        DELETE => ColumnRowAction::Delete,
        FREEZE => ColumnRowAction::Freeze,
        UNFREEZE => ColumnRowAction::Unfreeze,
        MENU => ColumnRowAction::Menu,
        INSERT_AFTER => ColumnRowAction::InsertAfter(cursor.next_count()?),
        INSERT_BEFORE => ColumnRowAction::InsertBefore(cursor.next_count()?),
        SORT => ColumnRowAction::Sort { save: cursor.save()? },
        _ => return None,
    };
    Some(action)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_unknown(fragment: &str) {
        let token = parse(fragment);
        assert!(token.is_unknown(), "{} parsed as {:?}", fragment, token);
    }

    fn assert_same(fragment: &str) {
        let token = parse(fragment);
        assert!(!token.is_unknown(), "{} did not parse", fragment);
        assert_eq!(token.url_fragment(), fragment);
    }

    #[test]
    fn test_list_and_create() {
        assert_eq!(parse(""), HistoryToken::default());
        assert_eq!(parse("#"), HistoryToken::default());
        assert_eq!(parse("#/"), HistoryToken::default());
        assert_same("/offset/10/max/5");
        assert_same("/max/5");
        assert_same("/create");
        assert_unknown("/max/0");
        assert_unknown("/max/5/offset/10");
        assert_unknown("/offset/-1");
        assert_unknown("/create/now");
    }

    #[test]
    fn test_spreadsheet_tokens() {
        assert_eq!(parse("#/1f"), HistoryToken::SpreadsheetLoad { id: SpreadsheetId::new(0x1f) });
        assert_same("/1f/Budget");
        assert_same("/1f/Budget/rename");
        assert_same("/1f/Budget/rename/save/Budget%202027");
        assert_same("/1f/Budget/metadata/locale");
        assert_same("/1f/Budget/metadata/frozen-rows/save/2");
        assert_same("/1f/Budget/metadata/locale/save/");
    }

    #[test]
    fn test_name_is_decoded() {
        let token = parse("/1/My%20Sheet%2FQ1");
        assert_eq!(token.spreadsheet_name().unwrap().as_str(), "My Sheet/Q1");
        assert_eq!(token.url_fragment(), "/1/My%20Sheet%2FQ1");
    }

    #[test]
    fn test_non_canonical_ids_rejected() {
        assert_unknown("/1F/Budget");
        assert_unknown("/01/Budget");
        assert_unknown("/xyz/Budget");
    }

    #[test]
    fn test_cell_tokens() {
        assert_same("/1/Budget/cell/B2");
        assert_same("/1/Budget/cell/B2/formula");
        assert_same("/1/Budget/cell/B2/formula/save/%3DA1%2A2");
        assert_same("/1/Budget/cell/A1:C3/top-left/clear");
        assert_same("/1/Budget/cell/Total/label/save/GrandTotal");
        assert_same("/1/Budget/cell/A1/style/font-weight/save/bold");
        assert_same("/1/Budget/cell/A1:B9/bottom-right/find/offset/0/max/20/query/a%20b");
        assert_same("/1/Budget/cell/A1/menu");
    }

    #[test]
    fn test_range_without_anchor_gets_default() {
        let token = parse("/1/Budget/cell/A1:B2");
        assert_eq!(token.anchored_selection().unwrap().anchor(), AnchorCorner::BottomRight);
        assert_eq!(token.url_fragment(), "/1/Budget/cell/A1:B2/bottom-right");
    }

    #[test]
    fn test_column_and_row_tokens() {
        assert_same("/1/Budget/column/C");
        assert_same("/1/Budget/column/B:D/left/insert-after/2");
        assert_same("/1/Budget/row/3:7/top/sort/save/A%20UP");
        assert_same("/1/Budget/row/12/insert-before/1");
        assert_unknown("/1/Budget/row/12/insert-before/0");
        assert_unknown("/1/Budget/column/C/formula");
    }

    #[test]
    fn test_invalid_fragments_are_unknown() {
        assert_unknown("/1/Budget/cell/B2/top-left");
        assert_unknown("/1/Budget/cell/A1:B2/left");
        assert_unknown("/1/Budget/cell/A1:B2/formula");
        assert_unknown("/1/Budget/cell/A1/formula/save");
        assert_unknown("/1/Budget/cell/A1/formula/save/x/extra");
        assert_unknown("/1/Budget/cell/A1/label/save/B2");
        assert_unknown("/1/Budget/cell/A1/style/not-a-style");
        assert_unknown("/1/Budget/metadata/no-such-property");
        assert_unknown("/1/Budget/rename/save/%20%20");
        assert_unknown("/1/Budget/");
        assert_unknown("/1//cell/A1");
        assert_unknown("/1/Budget/sheet");
        assert_unknown("/1/Budget/cell/A1/find/query/");
    }

    #[test]
    fn test_unknown_keeps_fragment() {
        let token = parse("#/nope/nope/nope");
        assert_eq!(token, HistoryToken::unknown("/nope/nope/nope"));
        assert_eq!(token.url_fragment(), "/nope/nope/nope");
    }
}
