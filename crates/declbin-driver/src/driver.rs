use declbin_decoder::DecodedRecord;

use crate::config::{OutputMode, RenderConfig};
use crate::error::RenderError;
use crate::render_flat::FlatRenderer;
use crate::render_json::JsonRenderer;
use crate::render_tree::TreeRenderer;

/// Renders a decoded record as text.
///
/// ```text
/// DecodedRecord ──▶ RecordDriver::render() ──▶ String
///                          │
///                    RenderConfig
///                    (mode, max_bytes, show_offsets)
/// ```
pub trait RecordDriver {
    /// # Errors
    ///
    /// Returns [`RenderError`] if the selected output format cannot be
    /// produced.
    fn render(&self, decoded: &DecodedRecord, config: &RenderConfig) -> Result<String, RenderError>;
}

/// Dispatches to the renderer selected by [`RenderConfig::mode`].
pub struct DefaultDriver;

impl RecordDriver for DefaultDriver {
    fn render(&self, decoded: &DecodedRecord, config: &RenderConfig) -> Result<String, RenderError> {
        match config.mode {
            OutputMode::Tree => Ok(TreeRenderer::render(decoded, config)),
            OutputMode::Flat => Ok(FlatRenderer::render(decoded, config)),
            OutputMode::Json => JsonRenderer::render(decoded, config),
        }
    }
}

#[cfg(test)]
mod tests {
    use declbin_schema::Record;

    use super::*;

    #[test]
    fn dispatches_on_mode() {
        let decoded = DecodedRecord {
            record: Record::new("T").with("n", 5u16),
            start: 0,
            end: 2,
            stream_len: 2,
        };
        let render = |mode| {
            let config = RenderConfig {
                mode,
                ..RenderConfig::default()
            };
            DefaultDriver.render(&decoded, &config).unwrap()
        };
        assert_eq!(render(OutputMode::Tree), "T\n  n: u16 = 5\n");
        assert_eq!(render(OutputMode::Flat), "n = 5\n");
        assert_eq!(render(OutputMode::Json), "{\n  \"n\": 5\n}\n");
    }
}
