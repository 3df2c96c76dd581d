use declbin_decoder::DecodedRecord;
use declbin_schema::Value;
use serde_json::json;

use crate::config::RenderConfig;
use crate::error::RenderError;
use crate::json::value_to_json;

/// Pretty-printed JSON renderer.
///
/// Without offsets the output is the root record as an object. With
/// `show_offsets` it is wrapped:
///
/// ```text
/// { "type": "Archive", "start": 0, "end": 12, "stream_len": 16,
///   "record": { ... } }
/// ```
pub struct JsonRenderer;

impl JsonRenderer {
    /// # Errors
    ///
    /// Returns [`RenderError::Json`] if serialization fails.
    pub fn render(decoded: &DecodedRecord, config: &RenderConfig) -> Result<String, RenderError> {
        let record = value_to_json(&Value::Struct(decoded.record.clone()));
        let document = if config.show_offsets {
            json!({
                "type": decoded.record.type_name(),
                "start": decoded.start,
                "end": decoded.end,
                "stream_len": decoded.stream_len,
                "record": record,
            })
        } else {
            record
        };
        let mut out = serde_json::to_string_pretty(&document)?;
        out.push('\n');
        Ok(out)
    }
}
