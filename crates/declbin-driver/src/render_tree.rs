use std::fmt::Write as _;

use declbin_decoder::DecodedRecord;
use declbin_schema::Value;

use crate::config::RenderConfig;
use crate::format::{leaf_text, type_label};

/// Indented tree renderer, one `name: type = value` line per field.
///
/// Example output:
///
/// ```text
/// Archive
///   count: u32 = 2
///   kind: Kind = File (1)
///   items: u8[2] = aabb
///   entries: array[1]
///     [0]: Entry
///       size: u16 = 512
/// ```
pub struct TreeRenderer;

impl TreeRenderer {
    pub fn render(decoded: &DecodedRecord, config: &RenderConfig) -> String {
        let mut out = String::new();
        let record = &decoded.record;
        out.push_str(record.type_name());
        if config.show_offsets {
            let _ = write!(
                out,
                " @ {}..{} of {}",
                decoded.start, decoded.end, decoded.stream_len
            );
        }
        out.push('\n');
        for (name, value) in record.fields() {
            Self::render_value(&mut out, name, value, 1, config);
        }
        out
    }

    fn render_value(out: &mut String, name: &str, value: &Value, depth: usize, config: &RenderConfig) {
        let indent = "  ".repeat(depth);
        let label = type_label(value);
        match value {
            Value::Struct(record) => {
                let _ = writeln!(out, "{indent}{name}: {label}");
                for (field, inner) in record.fields() {
                    Self::render_value(out, field, inner, depth + 1, config);
                }
            }
            Value::Array(items) => {
                let _ = writeln!(out, "{indent}{name}: {label}");
                for (i, item) in items.iter().enumerate() {
                    Self::render_value(out, &format!("[{i}]"), item, depth + 1, config);
                }
            }
            leaf => {
                let text = leaf_text(leaf, config.max_bytes).unwrap_or_default();
                let _ = writeln!(out, "{indent}{name}: {label} = {text}");
            }
        }
    }
}
