//! Golden schema tests for the server wire format.
//!
//! The golden files are captured server responses. If a field is renamed
//! or its text form changes, these tests fail before the client silently
//! stops understanding the server.

use websheet_protocol::{LabelTarget, MetadataPropertyName, SpreadsheetDelta, SpreadsheetMetadata};

fn read_golden(path: &str) -> serde_json::Value {
    serde_json::from_str(
        &std::fs::read_to_string(path).unwrap_or_else(|e| panic!("Cannot read {}: {}", path, e)),
    )
    .unwrap_or_else(|e| panic!("Cannot parse {}: {}", path, e))
}

#[test]
fn test_golden_viewport_delta() {
    let golden = read_golden("tests/golden/viewport-delta.json");
    let delta: SpreadsheetDelta = serde_json::from_value(golden.clone()).unwrap();

    assert_eq!(delta.cells.len(), 2);
    assert_eq!(delta.cells[1].display_text(), "30.00");
    assert_eq!(delta.labels.len(), 2);
    assert!(matches!(delta.labels[0].reference, LabelTarget::Range(_)));
    assert!(matches!(delta.labels[1].reference, LabelTarget::Cell(_)));

    // Re-serializing must produce every key the server sent
    let serialized = serde_json::to_value(&delta).unwrap();
    for key in golden.as_object().unwrap().keys() {
        assert!(serialized.get(key).is_some(), "Golden key '{}' lost in re-serialization", key);
    }
    assert_eq!(serialized["window"], golden["window"]);
    assert_eq!(serialized["deletedCells"], golden["deletedCells"]);
}

#[test]
fn test_golden_metadata() {
    let golden = read_golden("tests/golden/metadata.json");
    let metadata: SpreadsheetMetadata = serde_json::from_value(golden.clone()).unwrap();

    assert_eq!(metadata.id().unwrap().to_string(), "7b");
    assert_eq!(metadata.name().unwrap().as_str(), "Quarterly");
    assert_eq!(metadata.frozen_rows(), 1);
    assert_eq!(
        metadata.get_text(MetadataPropertyName::LOCALE).as_deref(),
        Some("en-AU")
    );

    let serialized = serde_json::to_value(&metadata).unwrap();
    assert_eq!(serialized, golden);
}
