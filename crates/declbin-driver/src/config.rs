/// Configuration for the record driver.
///
/// ```text
/// ┌──────────────┬───────────────────────────────────────────────────┐
/// │ Field        │ Purpose                                           │
/// ├──────────────┼───────────────────────────────────────────────────┤
/// │ mode         │ Tree, Flat, or Json output                        │
/// │ max_bytes    │ Byte arrays longer than this are truncated in     │
/// │              │ Tree and Flat output (0 = never truncate)         │
/// │ show_offsets │ Include the root record's byte range              │
/// └──────────────┴───────────────────────────────────────────────────┘
/// ```
///
/// Json output always carries complete byte arrays.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderConfig {
    pub mode: OutputMode,
    pub max_bytes: usize,
    pub show_offsets: bool,
}

impl Default for RenderConfig {
    /// Tree mode, 16-byte previews, no offsets.
    fn default() -> Self {
        Self {
            mode: OutputMode::Tree,
            max_bytes: 16,
            show_offsets: false,
        }
    }
}

/// Output formats.
///
/// ```text
/// ┌──────┬────────────────────────────────────────────┐
/// │ Mode │ Example line                               │
/// ├──────┼────────────────────────────────────────────┤
/// │ Tree │   count: u32 = 3                           │
/// │ Flat │ header.entries[0].size = 512               │
/// │ Json │ { "count": 3, "items": "aabbcc" }          │
/// └──────┴────────────────────────────────────────────┘
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputMode {
    #[default]
    Tree,
    Flat,
    Json,
}
