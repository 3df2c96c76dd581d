/// Errors in a schema definition, or in resolving a member named by one.
///
/// Build-time variants (duplicate fields, missing array sizes, unknown
/// member names) mean the schema itself is malformed. The resolve-time
/// variants (`MemberNotDecoded`, `NotAnInteger`, `InvalidCount`) are
/// raised while decoding, when a referenced sibling value cannot be used
/// as a size, offset, or discriminator.
///
/// ```text
/// ┌────────────────────────┬────────────────────────────────────────────┐
/// │ Variant                │ Raised by                                  │
/// ├────────────────────────┼────────────────────────────────────────────┤
/// │ MissingArraySize       │ build: array field without a size policy   │
/// │ UnexpectedArraySize    │ build: size policy on a non-array field    │
/// │ DuplicateField/Member  │ build: name declared twice                 │
/// │ InvalidCurrentOffset   │ build: current-offset field misdeclared    │
/// │ UnknownMember          │ build/resolve: no field, property, method  │
/// │ MemberNotDecoded       │ resolve: member read before it is decoded  │
/// │ NotAnInteger           │ resolve: member value is not integral      │
/// │ InvalidCount           │ resolve: negative array element count      │
/// │ UnknownType            │ registry lookup of an unregistered name    │
/// │ RecursionLimit         │ nesting deeper than the configured limit   │
/// │ MissingField/Mismatch  │ record → typed struct conversion           │
/// └────────────────────────┴────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("array field {type_name}.{field} has no size policy")]
    MissingArraySize { type_name: String, field: String },

    #[error("field {type_name}.{field} has a size policy but is not an array")]
    UnexpectedArraySize { type_name: String, field: String },

    #[error("field {field} declared twice in {type_name}")]
    DuplicateField { type_name: String, field: String },

    #[error("accessor {member} declared twice in {type_name}")]
    DuplicateMember { type_name: String, member: String },

    #[error("field {type_name}.{field} cannot take the current offset: {reason}")]
    InvalidCurrentOffset {
        type_name: String,
        field: String,
        reason: &'static str,
    },

    #[error("no field, property or method named {member:?} on {type_name}")]
    UnknownMember { type_name: String, member: String },

    #[error("member {type_name}.{member} is referenced before it has been decoded")]
    MemberNotDecoded { type_name: String, member: String },

    #[error("member {member} does not hold an integer (found {found})")]
    NotAnInteger { member: String, found: String },

    #[error("array size from {member} is negative ({value})")]
    InvalidCount { member: String, value: i64 },

    #[error("value {value} does not fit the {ty} field {field}")]
    ValueOutOfRange {
        field: String,
        ty: &'static str,
        value: u64,
    },

    #[error("invalid type name {text:?}")]
    InvalidTypeName { text: String },

    #[error("enum {name} must use an integer representation, not {repr}")]
    InvalidEnumRepr { name: String, repr: String },

    #[error("type {name} is not registered")]
    UnknownType { name: String },

    #[error("type {name} is defined more than once")]
    DuplicateType { name: String },

    #[error("nesting in {type_name} exceeds the depth limit of {limit}")]
    RecursionLimit { type_name: String, limit: usize },

    #[error("record {type_name} has no field {field}")]
    MissingField { type_name: String, field: String },

    #[error("field {type_name}.{field} holds {found}, expected {expected}")]
    TypeMismatch {
        type_name: String,
        field: String,
        expected: &'static str,
        found: &'static str,
    },
}
