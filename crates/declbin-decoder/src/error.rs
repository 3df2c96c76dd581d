use std::fmt;
use std::io;

use declbin_schema::SchemaError;
use declbin_wire::WireError;

/// Where a decode failed: the innermost field being decoded and the
/// absolute byte offset at which its read started.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldContext {
    pub type_name: String,
    pub field: String,
    pub offset: u64,
}

impl FieldContext {
    pub fn new(type_name: &str, field: &str, offset: u64) -> Self {
        Self {
            type_name: type_name.to_string(),
            field: field.to_string(),
            offset,
        }
    }
}

impl fmt::Display for FieldContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.type_name.is_empty(), self.field.is_empty()) {
            (true, _) => write!(f, "offset {}", self.offset),
            (false, true) => write!(f, "{} at offset {}", self.type_name, self.offset),
            (false, false) => write!(
                f,
                "{}.{} at offset {}",
                self.type_name, self.field, self.offset
            ),
        }
    }
}

/// Errors that abort a decode call.
///
/// Every variant carries a [`FieldContext`], so a malformed schema can be
/// told apart from malformed input. A failed decode leaves nothing
/// behind: records are assembled only after their field walk succeeds.
///
/// ```text
///   DecodeError
///   ├── Schema          ← bad layout, unresolved or undecoded member,
///   │                     negative count, recursion limit
///   ├── UnsupportedType ← no decode rule (unregistered name, nested array)
///   ├── TruncatedInput  ← fixed-width read, string or count past the end
///   └── Io              ← source unreadable or unseekable, negative offset
/// ```
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("schema error in {context}: {source}")]
    Schema {
        source: SchemaError,
        context: FieldContext,
    },

    #[error("no decode rule for type {ty} in {context}")]
    UnsupportedType { ty: String, context: FieldContext },

    #[error("truncated input in {context}: needed {needed} bytes, {available} available")]
    TruncatedInput {
        needed: u64,
        available: u64,
        context: FieldContext,
    },

    #[error("i/o error in {context}: {source}")]
    Io {
        source: io::Error,
        context: FieldContext,
    },
}

impl DecodeError {
    pub fn context(&self) -> &FieldContext {
        match self {
            Self::Schema { context, .. }
            | Self::UnsupportedType { context, .. }
            | Self::TruncatedInput { context, .. }
            | Self::Io { context, .. } => context,
        }
    }

    pub(crate) fn schema(source: SchemaError, context: FieldContext) -> Self {
        Self::Schema { source, context }
    }

    /// Attach `context` to a cursor error. Reads that report their own
    /// start offset override the context's offset.
    pub(crate) fn wire(err: WireError, mut context: FieldContext) -> Self {
        match err {
            WireError::UnexpectedEof {
                offset,
                needed,
                available,
            } => {
                context.offset = offset;
                Self::TruncatedInput {
                    needed,
                    available,
                    context,
                }
            }
            WireError::UnterminatedString { offset } => {
                context.offset = offset;
                Self::TruncatedInput {
                    needed: 1,
                    available: 0,
                    context,
                }
            }
            WireError::InvalidSeek { target } => Self::Io {
                source: io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("cannot seek to offset {target}"),
                ),
                context,
            },
            WireError::Io(source) => Self::Io { source, context },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_display() {
        assert_eq!(FieldContext::new("Hdr", "count", 4).to_string(), "Hdr.count at offset 4");
        assert_eq!(FieldContext::new("Hdr", "", 0).to_string(), "Hdr at offset 0");
        assert_eq!(FieldContext::default().to_string(), "offset 0");
    }

    #[test]
    fn eof_maps_to_truncated_input_at_read_offset() {
        let err = DecodeError::wire(
            WireError::UnexpectedEof {
                offset: 6,
                needed: 4,
                available: 2,
            },
            FieldContext::new("T", "n", 0),
        );
        assert!(matches!(
            err,
            DecodeError::TruncatedInput {
                needed: 4,
                available: 2,
                ref context,
            } if context.offset == 6
        ));
    }

    #[test]
    fn negative_seek_is_io() {
        let err = DecodeError::wire(WireError::InvalidSeek { target: -3 }, FieldContext::default());
        assert!(matches!(err, DecodeError::Io { .. }));
        assert!(err.to_string().contains("-3"));
    }
}
