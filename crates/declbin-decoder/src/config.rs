use declbin_wire::Endian;

/// Configuration for [`LayoutDecoder`](crate::LayoutDecoder).
///
/// ```text
/// ┌───────────┬──────────────────────────────────────────────────────┐
/// │ Field     │ Purpose                                              │
/// ├───────────┼──────────────────────────────────────────────────────┤
/// │ endian    │ Byte order for fields with no field- or type-level   │
/// │           │ override                                             │
/// │ max_depth │ Deepest allowed nesting of structured values         │
/// └───────────┴──────────────────────────────────────────────────────┘
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecoderConfig {
    pub endian: Endian,
    pub max_depth: usize,
}

impl DecoderConfig {
    pub const DEFAULT_MAX_DEPTH: usize = 64;

    #[must_use]
    pub fn big_endian(mut self) -> Self {
        self.endian = Endian::Big;
        self
    }

    #[must_use]
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}

impl Default for DecoderConfig {
    /// Little-endian with a nesting limit of 64.
    fn default() -> Self {
        Self {
            endian: Endian::Little,
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }
}
