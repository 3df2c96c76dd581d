use declbin_schema::SchemaError;

/// Errors from rendering records or converting JSON into values.
///
/// ```text
/// ┌─────────────────┬───────────────────────────────────────────────┐
/// │ Variant         │ Cause                                         │
/// ├─────────────────┼───────────────────────────────────────────────┤
/// │ Json            │ serde_json failed to parse or print           │
/// │ Schema          │ unknown type, missing field, bad member       │
/// │ Mismatch        │ JSON value kind does not fit the field type   │
/// │ UnexpectedField │ JSON object has a key the type does not have  │
/// │ InvalidHex      │ byte array given as a malformed hex string    │
/// │ UnknownVariant  │ enum given by a name it does not declare      │
/// │ OutOfRange      │ number does not fit the field's width         │
/// └─────────────────┴───────────────────────────────────────────────┘
/// ```
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("{path}: expected {expected}, found {found}")]
    Mismatch {
        path: String,
        expected: String,
        found: &'static str,
    },

    #[error("{path}: type {type_name} has no field {field}")]
    UnexpectedField {
        path: String,
        type_name: String,
        field: String,
    },

    #[error("{path}: invalid hex string: {source}")]
    InvalidHex {
        path: String,
        source: hex::FromHexError,
    },

    #[error("{path}: enum {enum_name} has no variant {variant}")]
    UnknownVariant {
        path: String,
        enum_name: String,
        variant: String,
    },

    #[error("{path}: {value} does not fit {ty}")]
    OutOfRange {
        path: String,
        ty: &'static str,
        value: String,
    },
}
