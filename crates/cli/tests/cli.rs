// Integration tests for the websheet binary: stdout shape and exit codes.
//
// Run with: cargo test -p websheet-cli --test cli -- --nocapture

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use httpmock::prelude::*;
use serde_json::json;

fn websheet() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_websheet"));
    cmd.env_remove("WEBSHEET_SETTINGS").env_remove("WEBSHEET_BASE_URL");
    cmd
}

/// A settings.json with a 2x1 viewport and no frozen panes.
fn write_settings(dir: &Path) -> PathBuf {
    let path = dir.join("settings.json");
    std::fs::write(
        &path,
        r#"{
            // small grid
            "viewport.width": 2,
            "viewport.height": 1,
            "viewport.includeFrozenColumnsRows": false
        }"#,
    )
    .unwrap();
    path
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// ===========================================================================
// websheet parse
// ===========================================================================

#[test]
fn parse_prints_canonical_fragments() {
    let output = websheet()
        .args(["parse", "/1f/Budget/cell/A1:B2", "#/1f/Budget/column/B/freeze"])
        .output()
        .expect("websheet parse");

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "#/1f/Budget/cell/A1:B2/bottom-right\n#/1f/Budget/column/B/freeze\n"
    );
}

#[test]
fn parse_invalid_fragment_exits_3() {
    let output = websheet()
        .args(["parse", "/1f/Budget", "/1f/Budget/cell/not-a-cell!"])
        .output()
        .expect("websheet parse");

    assert_eq!(output.status.code(), Some(3));
    assert_eq!(stdout(&output), "#/1f/Budget\n");
    assert!(stderr(&output).contains("1 of 2 fragment(s) invalid"), "{}", stderr(&output));
}

#[test]
fn parse_json_marks_one_shot_tokens() {
    let output = websheet()
        .args(["parse", "--json", "/1f/Budget/cell/A1/clear", "/1f/Budget/cell/A1"])
        .output()
        .expect("websheet parse --json");

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let entries = value.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["oneShot"], json!(true));
    assert_eq!(entries[0]["spreadsheetId"], json!("1f"));
    assert_eq!(entries[1]["oneShot"], json!(false));
    assert_eq!(entries[1]["fragment"], json!("#/1f/Budget/cell/A1"));
}

// ===========================================================================
// websheet open
// ===========================================================================

#[test]
fn open_prints_named_location_and_grid() {
    let server = MockServer::start();
    let metadata = server.mock(|when, then| {
        when.method(GET).path("/api/spreadsheet/1f");
        then.status(200)
            .json_body(json!({ "spreadsheet-id": "1f", "spreadsheet-name": "Budget" }));
    });
    let cells = server.mock(|when, then| {
        when.method(GET)
            .path("/api/spreadsheet/1f/cell/*/force-recompute")
            .query_param("width", "2")
            .query_param("height", "1");
        then.status(200).json_body(json!({
            "cells": [ { "reference": "A1", "formula": { "text": "=1+1" }, "formattedValue": "2" } ],
            "window": ["A1:B1"]
        }));
    });

    let dir = tempfile::tempdir().unwrap();
    let settings = write_settings(dir.path());
    let output = websheet()
        .arg("--settings")
        .arg(&settings)
        .args(["--base-url", &server.base_url(), "open", "#/1f"])
        .output()
        .expect("websheet open");

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "location: #/1f/Budget\n\n\tA\tB\n1\t2\t\n");
    metadata.assert();
    cells.assert();
}

#[test]
fn open_then_navigates_after_settling() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/spreadsheet/1f");
        then.status(200)
            .json_body(json!({ "spreadsheet-id": "1f", "spreadsheet-name": "Budget" }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/spreadsheet/1f/cell/*/force-recompute");
        then.status(200).json_body(json!({
            "cells": [ { "reference": "B1", "formula": { "text": "'hello" }, "formattedValue": "hello" } ],
            "window": ["A1:B1"]
        }));
    });

    let dir = tempfile::tempdir().unwrap();
    let settings = write_settings(dir.path());
    let output = websheet()
        .arg("--settings")
        .arg(&settings)
        .args(["--base-url", &server.base_url()])
        .args(["open", "/1f/Budget", "--then", "/1f/Budget/cell/B1/formula"])
        .output()
        .expect("websheet open --then");

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.starts_with("location: #/1f/Budget/cell/B1/formula\n"), "{}", text);
    assert!(text.contains("formula B1: 'hello\n"), "{}", text);
    assert!(text.contains("1\t\t[hello]\n"), "{}", text);
}

#[test]
fn open_reports_server_error_with_exit_5() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/spreadsheet/2a");
        then.status(500).body("boom");
    });

    let dir = tempfile::tempdir().unwrap();
    let settings = write_settings(dir.path());
    let output = websheet()
        .arg("--settings")
        .arg(&settings)
        .args(["--base-url", &server.base_url(), "open", "/2a"])
        .output()
        .expect("websheet open");

    assert_eq!(output.status.code(), Some(5));
    assert!(
        stderr(&output).contains("error: Spreadsheet request failed (500): boom"),
        "{}",
        stderr(&output)
    );
}

#[test]
fn open_rejects_invalid_fragment_before_connecting() {
    let dir = tempfile::tempdir().unwrap();
    let settings = write_settings(dir.path());
    let output = websheet()
        .arg("--settings")
        .arg(&settings)
        .args(["--base-url", "http://127.0.0.1:9", "open", "/1f/Budget/cell/not-a-cell!"])
        .output()
        .expect("websheet open");

    assert_eq!(output.status.code(), Some(3));
    assert!(stdout(&output).is_empty());
}

// ===========================================================================
// websheet settings / locale
// ===========================================================================

#[test]
fn settings_reflect_file_and_flags() {
    let dir = tempfile::tempdir().unwrap();
    let settings = write_settings(dir.path());
    let output = websheet()
        .arg("--settings")
        .arg(&settings)
        .args(["--base-url", "http://example.test:8080", "settings"])
        .output()
        .expect("websheet settings");

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["api.baseUrl"], json!("http://example.test:8080"));
    assert_eq!(value["viewport.width"], json!(2));
}

#[test]
fn unreadable_settings_exit_4() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, "{ not json").unwrap();
    let output = websheet()
        .arg("--settings")
        .arg(&path)
        .arg("settings")
        .output()
        .expect("websheet settings");

    assert_eq!(output.status.code(), Some(4));
}

#[test]
fn locale_prints_server_answer() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/api/locale/en-AU");
        then.status(200).json_body(json!({
            "tag": "en-AU",
            "displayName": "English (Australia)"
        }));
    });

    let dir = tempfile::tempdir().unwrap();
    let settings = write_settings(dir.path());
    let output = websheet()
        .arg("--settings")
        .arg(&settings)
        .args(["--base-url", &server.base_url(), "locale", "en-AU"])
        .output()
        .expect("websheet locale");

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["tag"], json!("en-AU"));
    mock.assert();
}
