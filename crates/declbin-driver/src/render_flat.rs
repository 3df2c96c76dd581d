use std::fmt::Write as _;

use declbin_decoder::DecodedRecord;
use declbin_schema::Value;

use crate::config::RenderConfig;
use crate::format::leaf_text;

/// Flat renderer, one `path = value` line per leaf.
///
/// Empty arrays and structs still get a line (`[]`, `{}`) so every
/// field of the record is visible.
///
/// ```text
/// count = 2
/// entries[0].size = 512
/// entries[1].size = 64
/// ```
pub struct FlatRenderer;

impl FlatRenderer {
    pub fn render(decoded: &DecodedRecord, config: &RenderConfig) -> String {
        let mut out = String::new();
        if config.show_offsets {
            let _ = writeln!(
                out,
                "# {} @ {}..{} of {}",
                decoded.record.type_name(),
                decoded.start,
                decoded.end,
                decoded.stream_len
            );
        }
        for (name, value) in decoded.record.fields() {
            Self::render_value(&mut out, name.to_string(), value, config);
        }
        out
    }

    fn render_value(out: &mut String, path: String, value: &Value, config: &RenderConfig) {
        match value {
            Value::Struct(record) if record.is_empty() => {
                let _ = writeln!(out, "{path} = {{}}");
            }
            Value::Struct(record) => {
                for (name, inner) in record.fields() {
                    Self::render_value(out, format!("{path}.{name}"), inner, config);
                }
            }
            Value::Array(items) if items.is_empty() => {
                let _ = writeln!(out, "{path} = []");
            }
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    Self::render_value(out, format!("{path}[{i}]"), item, config);
                }
            }
            leaf => {
                let text = leaf_text(leaf, config.max_bytes).unwrap_or_default();
                let _ = writeln!(out, "{path} = {text}");
            }
        }
    }
}
