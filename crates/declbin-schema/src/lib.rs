#![warn(clippy::pedantic)]

pub mod enum_def;
pub mod error;
pub mod field;
pub mod layout;
pub mod registry;
pub mod resolver;
pub mod schema;
pub mod types;
pub mod value;

#[cfg(feature = "serde")]
pub mod definition;

#[cfg(feature = "serde")]
pub use definition::{DefinitionError, SchemaDocument};

pub use declbin_wire::Endian;
pub use enum_def::EnumDef;
pub use error::SchemaError;
pub use field::{ArraySize, FieldDescriptor, Offset, TypeRule};
pub use layout::{BinaryLayout, IntoRecord};
pub use registry::{SchemaRegistry, TypeDef, registry_for};
pub use resolver::{Accessor, InstanceView, Member, MemberKind};
pub use schema::{StructSchema, StructSchemaBuilder};
pub use types::{Primitive, TypeRef};
pub use value::{EnumValue, FromValue, IntoValue, Record, Value};
