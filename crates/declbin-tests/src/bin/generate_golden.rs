//! Golden fixture generator for the declbin CLI and conformance suite.
//!
//! Writes a schema document, a binary payload and the matching JSON value
//! document for each fixture under `tests/golden/`. Run it after changing
//! a fixture layout; the payloads are produced by the encoder, so the
//! decode side of every fixture is checked against encoder output.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin generate_golden -p declbin-tests
//! declbin decode tests/golden/archive/schema.json tests/golden/archive/payload.bin
//! ```
//!
//! # Generated fixtures
//!
//! | Directory      | Contents                                              |
//! |----------------|-------------------------------------------------------|
//! | archive        | Header, current offset, skip field, deferred table    |
//! | tagged         | Discriminated payload, tag = 1 selects TypeB          |
//! | counted        | `{count: u32, items: u8[count]}` with three items     |
//! | eof_bytes      | A single EOF-terminated byte array over five bytes    |
//! | trailing_data  | The counted fixture followed by four extra bytes      |

use std::path::Path;

use declbin_driver::{json_to_record, value_to_json};
use declbin_encoder::LayoutEncoder;
use declbin_schema::{IntoRecord, SchemaDocument, Value};
use declbin_tests::{ARCHIVE_SCHEMA_JSON, sample_archive};

fn main() {
    let manifest_dir = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let golden_dir = manifest_dir.join("tests/golden");

    generate_archive(&golden_dir);
    generate_tagged(&golden_dir);
    generate_counted(&golden_dir);
    generate_eof_bytes(&golden_dir);
    generate_trailing_data(&golden_dir);

    println!("All golden fixtures written to {}", golden_dir.display());
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn write_file(path: &Path, data: &[u8]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create_dir_all");
    }
    std::fs::write(path, data).expect("write_file");
    println!("  wrote {}", path.display());
}

/// Encode `values` against `schema` and write all three fixture files.
fn write_fixture(dir: &Path, schema: &str, values: &serde_json::Value) -> Vec<u8> {
    let document = SchemaDocument::from_json(schema).expect("parse schema");
    let registry = document.build().expect("build schema");
    let record = json_to_record(values, &registry, &document.root)
        .expect("values match schema");
    let payload = LayoutEncoder::new()
        .encode_record(&registry, &record)
        .expect("encode fixture");

    write_file(&dir.join("schema.json"), schema.as_bytes());
    let values = serde_json::to_string_pretty(values).expect("serialize values");
    write_file(&dir.join("values.json"), values.as_bytes());
    write_file(&dir.join("payload.bin"), &payload);
    payload
}

// ── Fixture generators ────────────────────────────────────────────────────────

fn generate_archive(golden: &Path) {
    let archive = sample_archive();
    let mut values = value_to_json(&Value::Struct(archive.header.to_record()));
    let entries: Vec<_> = archive
        .entries
        .iter()
        .map(|e| value_to_json(&Value::Struct(e.to_record())))
        .collect();
    if let serde_json::Value::Object(map) = &mut values {
        map.insert("note".into(), archive.note.clone().into());
        map.insert("entries".into(), entries.into());
    }
    write_fixture(&golden.join("archive"), ARCHIVE_SCHEMA_JSON, &values);
}

fn generate_tagged(golden: &Path) {
    let schema = r#"{
  "root": "Tagged",
  "structs": [
    { "name": "TypeA", "fields": [ { "name": "value", "type": "u16" } ] },
    { "name": "TypeB", "fields": [
        { "name": "id", "type": "u32" },
        { "name": "label", "type": "string" } ] },
    { "name": "Tagged", "fields": [
        { "name": "tag", "type": "u8" },
        { "name": "payload", "type": "TypeA",
          "read_as": [ { "when": "tag", "equals": 0, "type": "TypeA" },
                       { "when": "tag", "equals": 1, "type": "TypeB" } ] } ] }
  ]
}"#;
    let values = serde_json::json!({ "tag": 1, "payload": { "id": 7, "label": "seven" } });
    write_fixture(&golden.join("tagged"), schema, &values);
}

const COUNTED_SCHEMA: &str = r#"{
  "root": "Counted",
  "structs": [
    { "name": "Counted", "fields": [
        { "name": "count", "type": "u32" },
        { "name": "items", "type": "u8[]", "size": "count" } ] }
  ]
}"#;

fn generate_counted(golden: &Path) {
    let values = serde_json::json!({ "count": 3, "items": "aabbcc" });
    write_fixture(&golden.join("counted"), COUNTED_SCHEMA, &values);
}

fn generate_eof_bytes(golden: &Path) {
    let schema = r#"{
  "root": "Rest",
  "structs": [
    { "name": "Rest", "fields": [
        { "name": "rest", "type": "u8[]", "size": { "terminated": "eof" } } ] }
  ]
}"#;
    let values = serde_json::json!({ "rest": "0102030405" });
    write_fixture(&golden.join("eof_bytes"), schema, &values);
}

fn generate_trailing_data(golden: &Path) {
    let dir = golden.join("trailing_data");
    let values = serde_json::json!({ "count": 3, "items": "aabbcc" });
    let mut payload = write_fixture(&dir, COUNTED_SCHEMA, &values);
    payload.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
    write_file(&dir.join("payload.bin"), &payload);
}
