/// Errors raised by the byte-level cursor and sink.
///
/// Every variant that describes a failed read carries the absolute
/// stream offset at which the read started, so higher layers can attach
/// it to the field being decoded.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// Fewer bytes remain than the read requires.
    #[error("unexpected end of input at offset {offset}: needed {needed} bytes, {available} available")]
    UnexpectedEof {
        offset: u64,
        needed: u64,
        available: u64,
    },

    /// A NUL-terminated string ran off the end of the stream.
    #[error("unterminated string starting at offset {offset}")]
    UnterminatedString { offset: u64 },

    /// A seek target that cannot be represented as a stream position.
    #[error("cannot seek to offset {target}")]
    InvalidSeek { target: i64 },

    /// I/O error from the underlying reader or writer.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
