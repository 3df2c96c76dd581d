#![no_main]

use std::sync::OnceLock;

use declbin_decoder::LayoutDecoder;
use declbin_schema::{SchemaDocument, SchemaRegistry};
use declbin_wire::ByteCursor;
use libfuzzer_sys::fuzz_target;

// One layout that touches every size policy, a deferred field, alignment
// and a discriminated field.
const SCHEMA: &str = r#"{
  "root": "Container",
  "enums": [ { "name": "Kind", "repr": "u8", "variants": { "Word": 0, "Text": 1 } } ],
  "structs": [
    { "name": "Word", "fields": [ { "name": "value", "type": "u16" } ] },
    { "name": "Text", "fields": [ { "name": "text", "type": "string" } ] },
    { "name": "Container", "fields": [
        { "name": "kind", "type": "Kind" },
        { "name": "tag", "type": "u8" },
        { "name": "count", "type": "u16", "endian": "big" },
        { "name": "items", "type": "u8[]", "size": "count" },
        { "name": "words", "type": "u16[]", "size": { "terminated": "default" } },
        { "name": "here", "type": "u32", "current_offset": true },
        { "name": "aligned", "type": "u32", "align": 4 },
        { "name": "payload", "type": "Word",
          "read_as": [ { "when": "tag", "equals": 1, "type": "Text" } ] },
        { "name": "table_at", "type": "i32" },
        { "name": "table", "type": "Word[]", "size": 2, "offset": "table_at" },
        { "name": "rest", "type": "u8[]", "size": { "terminated": "eof" } }
    ] }
  ]
}"#;

fn registry() -> Option<&'static (SchemaRegistry, String)> {
    static REGISTRY: OnceLock<Option<(SchemaRegistry, String)>> = OnceLock::new();
    REGISTRY
        .get_or_init(|| {
            let document = SchemaDocument::from_json(SCHEMA).ok()?;
            let registry = document.build().ok()?;
            Some((registry, document.root))
        })
        .as_ref()
}

// Fuzz target: schema-driven decode of arbitrary bytes.
//
// Catches bugs in:
// - Member-sized, terminated and end-of-stream arrays
// - Negative and out-of-range deferred offsets
// - Alignment past the end of the stream
// - Discriminated type selection
fuzz_target!(|data: &[u8]| {
    let Some((registry, root)) = registry() else {
        return;
    };
    let mut cursor = ByteCursor::from_slice(data);
    if let Ok(decoded) = LayoutDecoder::new().decode_record(registry, root, &mut cursor) {
        assert!(decoded.end <= decoded.stream_len);
        assert_eq!(cursor.position(), decoded.end);
    }
});
