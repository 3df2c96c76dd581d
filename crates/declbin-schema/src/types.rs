use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::SchemaError;

/// Fixed-width numeric types with a direct decode rule.
///
/// ```text
/// ┌───────────┬───────┬─────────┐
/// │ Primitive │ Width │ Kind    │
/// ├───────────┼───────┼─────────┤
/// │ u8 / i8   │ 1     │ integer │
/// │ u16 / i16 │ 2     │ integer │
/// │ u32 / i32 │ 4     │ integer │
/// │ u64 / i64 │ 8     │ integer │
/// │ f32       │ 4     │ float   │
/// │ f64       │ 8     │ float   │
/// └───────────┴───────┴─────────┘
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Primitive {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
}

impl Primitive {
    pub const ALL: [Primitive; 10] = [
        Self::U8,
        Self::I8,
        Self::U16,
        Self::I16,
        Self::U32,
        Self::I32,
        Self::U64,
        Self::I64,
        Self::F32,
        Self::F64,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::I8 => "i8",
            Self::U16 => "u16",
            Self::I16 => "i16",
            Self::U32 => "u32",
            Self::I32 => "i32",
            Self::U64 => "u64",
            Self::I64 => "i64",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    /// Width on the wire in bytes.
    pub fn width(self) -> usize {
        match self {
            Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::U64 | Self::I64 | Self::F64 => 8,
        }
    }

    pub fn is_integer(self) -> bool {
        !matches!(self, Self::F32 | Self::F64)
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The declared (or rule-selected) type of a field.
///
/// Named types are resolved through a
/// [`SchemaRegistry`](crate::SchemaRegistry) at decode time to either a
/// structured type or an enum. Keeping the reference by name lets a
/// structure contain arrays of itself.
///
/// The textual form is what JSON schemas and diagnostics use:
///
/// ```text
///   u32        → Primitive(U32)
///   string     → String (NUL-terminated UTF-8)
///   u8[]       → Array(U8), decoded as one bulk byte read
///   Header     → Named("Header")
///   Header[]   → Array(Named("Header"))
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Primitive(Primitive),
    String,
    Array(Box<TypeRef>),
    Named(Arc<str>),
}

impl TypeRef {
    pub const U8: Self = Self::Primitive(Primitive::U8);
    pub const I8: Self = Self::Primitive(Primitive::I8);
    pub const U16: Self = Self::Primitive(Primitive::U16);
    pub const I16: Self = Self::Primitive(Primitive::I16);
    pub const U32: Self = Self::Primitive(Primitive::U32);
    pub const I32: Self = Self::Primitive(Primitive::I32);
    pub const U64: Self = Self::Primitive(Primitive::U64);
    pub const I64: Self = Self::Primitive(Primitive::I64);
    pub const F32: Self = Self::Primitive(Primitive::F32);
    pub const F64: Self = Self::Primitive(Primitive::F64);

    pub fn named(name: &str) -> Self {
        Self::Named(Arc::from(name))
    }

    #[must_use]
    pub fn array_of(element: TypeRef) -> Self {
        Self::Array(Box::new(element))
    }

    /// Shorthand for `u8[]`.
    pub fn bytes() -> Self {
        Self::array_of(Self::U8)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Self::Primitive(p) if p.is_integer())
    }

    /// The registry name this type depends on, looking through arrays.
    pub fn named_type(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name),
            Self::Array(element) => element.named_type(),
            Self::Primitive(_) | Self::String => None,
        }
    }

    /// Parse the textual form (`u32`, `string`, `Foo[]`, ...).
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidTypeName`] for empty names or names
    /// containing characters other than ASCII alphanumerics, `_`, `::`.
    pub fn parse(text: &str) -> Result<Self, SchemaError> {
        let text = text.trim();
        if let Some(element) = text.strip_suffix("[]") {
            return Ok(Self::array_of(Self::parse(element)?));
        }
        if text == "string" {
            return Ok(Self::String);
        }
        if let Some(p) = Primitive::from_name(text) {
            return Ok(Self::Primitive(p));
        }
        let valid = !text.is_empty()
            && text
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
            && !text.starts_with(|c: char| c.is_ascii_digit());
        if !valid {
            return Err(SchemaError::InvalidTypeName {
                text: text.to_string(),
            });
        }
        Ok(Self::named(text))
    }
}

impl From<Primitive> for TypeRef {
    fn from(p: Primitive) -> Self {
        Self::Primitive(p)
    }
}

impl FromStr for TypeRef {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(p) => write!(f, "{p}"),
            Self::String => f.write_str("string"),
            Self::Array(element) => write!(f, "{element}[]"),
            Self::Named(name) => f.write_str(name),
        }
    }
}
