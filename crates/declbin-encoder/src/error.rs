use declbin_schema::SchemaError;
use declbin_wire::WireError;

/// Errors that can occur while laying out a record.
///
/// Error hierarchy:
///
/// ```text
///   EncodeError
///   ├── Schema          ← missing field, unresolvable member
///   ├── UnsupportedType ← no encode rule (unregistered name, nested array)
///   ├── ValueMismatch   ← value kind does not fit the field type
///   ├── LengthMismatch  ← array length disagrees with its size policy
///   ├── OutOfRange      ← integer does not fit the declared width
///   ├── InteriorNul     ← string would end early on decode
///   ├── NegativeOffset  ← deferred field offset resolved below zero
///   └── Wire(WireError) ← from declbin-wire
/// ```
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("schema error in {type_name}.{field}: {source}")]
    Schema {
        source: SchemaError,
        type_name: String,
        field: String,
    },

    #[error("no encode rule for type {ty} in {type_name}.{field}")]
    UnsupportedType {
        ty: String,
        type_name: String,
        field: String,
    },

    #[error("{type_name}.{field} expects {expected}, found {found}")]
    ValueMismatch {
        type_name: String,
        field: String,
        expected: String,
        found: &'static str,
    },

    #[error("{type_name}.{field} has {actual} elements, its size policy requires {expected}")]
    LengthMismatch {
        type_name: String,
        field: String,
        expected: u64,
        actual: u64,
    },

    #[error("{type_name}.{field}: {value} does not fit {ty}")]
    OutOfRange {
        type_name: String,
        field: String,
        ty: &'static str,
        value: String,
    },

    #[error("string in {type_name}.{field} contains a NUL byte")]
    InteriorNul { type_name: String, field: String },

    #[error("{type_name}.{field} resolves to negative offset {offset}")]
    NegativeOffset {
        type_name: String,
        field: String,
        offset: i64,
    },

    #[error(transparent)]
    Wire(#[from] WireError),
}
