use crate::error::SchemaError;
use crate::registry::SchemaRegistry;
use crate::schema::StructSchema;
use crate::value::Record;

/// A Rust type with a declared binary layout.
///
/// Implementations describe the layout once in [`schema`](Self::schema);
/// the decoder builds it a single time per type and caches it. Nested
/// named types are registered by
/// [`register_dependencies`](Self::register_dependencies), usually with
/// one [`SchemaRegistry::register`] call per dependency.
///
/// ```rust
/// use declbin_schema::{BinaryLayout, FieldDescriptor, Record, SchemaError, StructSchema, TypeRef};
///
/// struct Point { x: i16, y: i16 }
///
/// impl BinaryLayout for Point {
///     const NAME: &'static str = "Point";
///
///     fn schema() -> Result<StructSchema, SchemaError> {
///         StructSchema::builder(Self::NAME)
///             .field(FieldDescriptor::new("x", TypeRef::I16))
///             .field(FieldDescriptor::new("y", TypeRef::I16))
///             .build()
///     }
///
///     fn from_record(mut record: Record) -> Result<Self, SchemaError> {
///         Ok(Self { x: record.take("x")?, y: record.take("y")? })
///     }
/// }
/// ```
pub trait BinaryLayout: Sized + 'static {
    const NAME: &'static str;

    /// # Errors
    ///
    /// Any [`SchemaError`] from building the layout.
    fn schema() -> Result<StructSchema, SchemaError>;

    /// # Errors
    ///
    /// Any [`SchemaError`] from building a dependency's layout.
    fn register_dependencies(_registry: &mut SchemaRegistry) -> Result<(), SchemaError> {
        Ok(())
    }

    /// # Errors
    ///
    /// [`SchemaError::MissingField`] or [`SchemaError::TypeMismatch`] when
    /// the record does not have the expected shape.
    fn from_record(record: Record) -> Result<Self, SchemaError>;
}

/// The write side of [`BinaryLayout`]: turn a value back into a record
/// the encoder can lay out.
pub trait IntoRecord {
    fn to_record(&self) -> Record;
}
