// Plain-text snapshot of a session: location, open dialogs, then the grid.

use std::fmt::Write;

use websheet_ui::Openable;

use crate::session::Session;

pub fn render(session: &Session) -> String {
    let app = session.app();
    let mut out = String::new();
    let _ = writeln!(out, "location: {}", session.location_hash());

    let name = app.name_dialog();
    if name.is_open() {
        let _ = writeln!(out, "rename: {}", name.value());
    }

    let metadata = app.metadata_dialog();
    if metadata.is_open() {
        let property = metadata.property().map_or("?", |p| p.as_str());
        let read_only = if metadata.is_read_only() { " (read only)" } else { "" };
        let _ = writeln!(out, "metadata {}: {}{}", property, metadata.value(), read_only);
    }

    let formula = app.formula();
    if formula.is_open() {
        let cell = formula.cell().map_or_else(|| "?".to_string(), |cell| cell.to_string());
        let _ = writeln!(out, "formula {}: {}", cell, formula.text());
    }

    let find = app.find();
    if find.is_open() {
        let _ = writeln!(out, "find: {} match(es)", find.results().len());
        for found in find.results() {
            let _ = writeln!(out, "  {}\t{}\t{}", found.reference, found.value, found.formula);
        }
    }

    let viewport = app.viewport();
    if viewport.is_open() {
        out.push('\n');
        out.push_str(&viewport.to_text());
    }
    out
}
