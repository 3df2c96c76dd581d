use std::sync::Arc;

use crate::error::SchemaError;
use crate::layout::BinaryLayout;
use crate::types::Primitive;

/// A decoded value.
///
/// Byte arrays are kept as [`Value::Bytes`] because they are read in one
/// bulk operation; every other array is a [`Value::Array`] of element
/// values. Structured values are immutable [`Record`]s assembled after
/// their field walk completes.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    F32(f32),
    F64(f64),
    String(String),
    Bytes(Vec<u8>),
    Array(Vec<Value>),
    Enum(EnumValue),
    Struct(Record),
}

impl Value {
    /// The zero value of a primitive.
    pub fn zero(p: Primitive) -> Self {
        match p {
            Primitive::U8 => Self::U8(0),
            Primitive::I8 => Self::I8(0),
            Primitive::U16 => Self::U16(0),
            Primitive::I16 => Self::I16(0),
            Primitive::U32 => Self::U32(0),
            Primitive::I32 => Self::I32(0),
            Primitive::U64 => Self::U64(0),
            Primitive::I64 => Self::I64(0),
            Primitive::F32 => Self::F32(0.0),
            Primitive::F64 => Self::F64(0.0),
        }
    }

    /// An integer value of primitive type `p`, if `v` fits its range.
    /// Float primitives accept any value.
    #[allow(clippy::cast_precision_loss)]
    pub fn from_integer(p: Primitive, v: i64) -> Option<Self> {
        Some(match p {
            Primitive::U8 => Self::U8(u8::try_from(v).ok()?),
            Primitive::I8 => Self::I8(i8::try_from(v).ok()?),
            Primitive::U16 => Self::U16(u16::try_from(v).ok()?),
            Primitive::I16 => Self::I16(i16::try_from(v).ok()?),
            Primitive::U32 => Self::U32(u32::try_from(v).ok()?),
            Primitive::I32 => Self::I32(i32::try_from(v).ok()?),
            Primitive::U64 => Self::U64(u64::try_from(v).ok()?),
            Primitive::I64 => Self::I64(v),
            Primitive::F32 => Self::F32(v as f32),
            Primitive::F64 => Self::F64(v as f64),
        })
    }

    /// Short name of the variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::U8(_) => "u8",
            Self::I8(_) => "i8",
            Self::U16(_) => "u16",
            Self::I16(_) => "i16",
            Self::U32(_) => "u32",
            Self::I32(_) => "i32",
            Self::U64(_) => "u64",
            Self::I64(_) => "i64",
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Array(_) => "array",
            Self::Enum(_) => "enum",
            Self::Struct(_) => "struct",
        }
    }

    /// Interpret this value as a signed 64-bit integer, the way sizes,
    /// offsets and discriminators are consumed.
    ///
    /// Integers and enums convert directly, floats only when integral,
    /// and strings when they parse as a decimal integer. A `u64` above
    /// `i64::MAX` does not convert.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn integer(&self) -> Option<i64> {
        match self {
            Self::U8(v) => Some(i64::from(*v)),
            Self::I8(v) => Some(i64::from(*v)),
            Self::U16(v) => Some(i64::from(*v)),
            Self::I16(v) => Some(i64::from(*v)),
            Self::U32(v) => Some(i64::from(*v)),
            Self::I32(v) => Some(i64::from(*v)),
            Self::U64(v) => i64::try_from(*v).ok(),
            Self::I64(v) => Some(*v),
            Self::F32(v) => float_to_i64(f64::from(*v)),
            Self::F64(v) => float_to_i64(*v),
            Self::String(s) => s.trim().parse().ok(),
            Self::Enum(e) => Some(e.raw),
            Self::Bytes(_) | Self::Array(_) | Self::Struct(_) => None,
        }
    }

    /// Like [`integer`](Self::integer), but reports which member failed.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::NotAnInteger`] when the value has no
    /// integer interpretation.
    pub fn to_i64(&self, member: &str) -> Result<i64, SchemaError> {
        self.integer().ok_or_else(|| SchemaError::NotAnInteger {
            member: member.to_string(),
            found: self.describe(),
        })
    }

    fn describe(&self) -> String {
        match self {
            Self::String(s) => format!("string {s:?}"),
            Self::F32(v) => format!("f32 {v}"),
            Self::F64(v) => format!("f64 {v}"),
            other => other.kind().to_string(),
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn float_to_i64(v: f64) -> Option<i64> {
    if v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 {
        Some(v as i64)
    } else {
        None
    }
}

/// A decoded enum: the raw integer plus the variant name, if the raw
/// value matches a declared variant. Unknown raw values are kept.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumValue {
    pub type_name: Arc<str>,
    pub variant: Option<Arc<str>>,
    pub raw: i64,
}

/// A fully decoded structured value.
///
/// Fields appear in declaration order, including skipped fields (at
/// their default value) and deferred fields (at their declared
/// position, not their read position).
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    type_name: Arc<str>,
    fields: Vec<(Arc<str>, Value)>,
}

impl Record {
    pub fn new(type_name: impl Into<Arc<str>>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    /// Builder-style append, used when constructing records to encode.
    #[must_use]
    pub fn with(mut self, name: &str, value: impl IntoValue) -> Self {
        self.push(name, value.into_value());
        self
    }

    pub fn push(&mut self, name: impl Into<Arc<str>>, value: Value) {
        self.fields.push((name.into(), value));
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(n, _)| &**n == name)
            .map(|(_, v)| v)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (&**n, v))
    }

    fn remove(&mut self, name: &str) -> Result<Value, SchemaError> {
        let index = self
            .fields
            .iter()
            .position(|(n, _)| &**n == name)
            .ok_or_else(|| SchemaError::MissingField {
                type_name: self.type_name.to_string(),
                field: name.to_string(),
            })?;
        Ok(self.fields.remove(index).1)
    }

    fn mismatch(&self, field: &str, expected: &'static str, found: &'static str) -> SchemaError {
        SchemaError::TypeMismatch {
            type_name: self.type_name.to_string(),
            field: field.to_string(),
            expected,
            found,
        }
    }

    /// Move a field out of the record and convert it.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::MissingField`] if no field has this name.
    /// - [`SchemaError::TypeMismatch`] if the value does not convert.
    pub fn take<T: FromValue>(&mut self, name: &str) -> Result<T, SchemaError> {
        let value = self.remove(name)?;
        let found = value.kind();
        T::from_value(value).ok_or_else(|| self.mismatch(name, T::EXPECTED, found))
    }

    /// Move a nested structured field out and convert it to `T`.
    ///
    /// # Errors
    ///
    /// Same as [`take`](Self::take), plus any error from `T::from_record`.
    pub fn nested<T: BinaryLayout>(&mut self, name: &str) -> Result<T, SchemaError> {
        match self.remove(name)? {
            Value::Struct(record) => T::from_record(record),
            other => Err(self.mismatch(name, "struct", other.kind())),
        }
    }

    /// Move an array of structured values out and convert each element.
    ///
    /// # Errors
    ///
    /// Same as [`nested`](Self::nested).
    pub fn list<T: BinaryLayout>(&mut self, name: &str) -> Result<Vec<T>, SchemaError> {
        match self.remove(name)? {
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Struct(record) => T::from_record(record),
                    other => Err(self.mismatch(name, "struct", other.kind())),
                })
                .collect(),
            other => Err(self.mismatch(name, "array", other.kind())),
        }
    }
}

// ── Conversions ───────────────────────────────────────────────────────
//
// FromValue is the read side of typed decoding: a Record is decoded
// first, then each typed struct pulls its fields out by name. IntoValue
// is the write side used to build records for the encoder.

/// Conversion from a decoded [`Value`] into a Rust type.
pub trait FromValue: Sized {
    /// Name used in mismatch diagnostics.
    const EXPECTED: &'static str;

    fn from_value(value: Value) -> Option<Self>;
}

/// Conversion from a Rust value into a [`Value`] for encoding.
pub trait IntoValue {
    fn into_value(self) -> Value;
}

macro_rules! integer_conversions {
    ($($ty:ty => $variant:ident),+ $(,)?) => {
        $(
            impl FromValue for $ty {
                const EXPECTED: &'static str = stringify!($ty);

                fn from_value(value: Value) -> Option<Self> {
                    match value {
                        Value::$variant(v) => Some(v),
                        ref other => other.integer().and_then(|v| <$ty>::try_from(v).ok()),
                    }
                }
            }

            impl IntoValue for $ty {
                fn into_value(self) -> Value {
                    Value::$variant(self)
                }
            }
        )+
    };
}

integer_conversions! {
    u8 => U8,
    i8 => I8,
    u16 => U16,
    i16 => I16,
    u32 => U32,
    i32 => I32,
    u64 => U64,
    i64 => I64,
}

impl FromValue for f32 {
    const EXPECTED: &'static str = "f32";

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::F32(v) => Some(v),
            _ => None,
        }
    }
}

impl FromValue for f64 {
    const EXPECTED: &'static str = "f64";

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::F64(v) => Some(v),
            Value::F32(v) => Some(f64::from(v)),
            _ => None,
        }
    }
}

impl FromValue for String {
    const EXPECTED: &'static str = "string";

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    const EXPECTED: &'static str = "array";

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Array(items) => items.into_iter().map(T::from_value).collect(),
            Value::Bytes(bytes) => bytes
                .into_iter()
                .map(|b| T::from_value(Value::U8(b)))
                .collect(),
            _ => None,
        }
    }
}

impl FromValue for EnumValue {
    const EXPECTED: &'static str = "enum";

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Enum(e) => Some(e),
            _ => None,
        }
    }
}

impl FromValue for Record {
    const EXPECTED: &'static str = "struct";

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Struct(r) => Some(r),
            _ => None,
        }
    }
}

impl FromValue for Value {
    const EXPECTED: &'static str = "value";

    fn from_value(value: Value) -> Option<Self> {
        Some(value)
    }
}

impl IntoValue for f32 {
    fn into_value(self) -> Value {
        Value::F32(self)
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::F64(self)
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::String(self)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::String(self.to_string())
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn into_value(self) -> Value {
        Value::Array(self.into_iter().map(IntoValue::into_value).collect())
    }
}

impl IntoValue for EnumValue {
    fn into_value(self) -> Value {
        Value::Enum(self)
    }
}

impl IntoValue for Record {
    fn into_value(self) -> Value {
        Value::Struct(self)
    }
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}
