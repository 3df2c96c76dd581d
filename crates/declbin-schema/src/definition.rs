//! Schema documents in JSON.
//!
//! A document lists enums and structured types and names the root type
//! to decode:
//!
//! ```json
//! { "root": "Archive",
//!   "enums":   [ { "name": "Kind", "repr": "u8", "variants": { "File": 1 } } ],
//!   "structs": [ { "name": "Archive", "endian": "big",
//!                  "fields": [ { "name": "count", "type": "u32" },
//!                              { "name": "items", "type": "u8[]", "size": "count" } ] } ] }
//! ```
//!
//! `size` is a number, a member name, or `{ "terminated": "default" }` /
//! `{ "terminated": "eof" }`. `offset` is a number or a member name.

use std::collections::BTreeMap;
use std::io::Read;

use declbin_wire::Endian;
use serde::{Deserialize, Serialize};

use crate::enum_def::EnumDef;
use crate::error::SchemaError;
use crate::field::{ArraySize, FieldDescriptor};
use crate::registry::SchemaRegistry;
use crate::resolver::Member;
use crate::schema::StructSchema;
use crate::types::{Primitive, TypeRef};

#[derive(Debug, thiserror::Error)]
pub enum DefinitionError {
    #[error("malformed schema document: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("root type {name} is not defined in the document")]
    UnknownRoot { name: String },
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SchemaDocument {
    pub root: String,
    #[serde(default)]
    pub enums: Vec<EnumDocument>,
    #[serde(default)]
    pub structs: Vec<StructDocument>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EnumDocument {
    pub name: String,
    pub repr: String,
    #[serde(default)]
    pub variants: BTreeMap<String, i64>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct StructDocument {
    pub name: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub alignment: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endian: Option<Endian>,
    pub fields: Vec<FieldDocument>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct FieldDocument {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<SizeDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<OffsetDocument>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub align: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endian: Option<Endian>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub skip: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub current_offset: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub read_as: Vec<RuleDocument>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SizeDocument {
    Fixed(u64),
    Member(String),
    Terminated { terminated: Termination },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Termination {
    Default,
    Eof,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum OffsetDocument {
    Absolute(u64),
    Member(String),
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RuleDocument {
    pub when: String,
    pub equals: i64,
    #[serde(rename = "type")]
    pub ty: String,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero(v: &u32) -> bool {
    *v == 0
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(v: &bool) -> bool {
    !*v
}

impl SchemaDocument {
    /// # Errors
    ///
    /// [`DefinitionError::Json`] if the text is not a schema document.
    pub fn from_json(text: &str) -> Result<Self, DefinitionError> {
        Ok(serde_json::from_str(text)?)
    }

    /// # Errors
    ///
    /// [`DefinitionError::Json`] on malformed or unreadable input.
    pub fn from_reader(reader: impl Read) -> Result<Self, DefinitionError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Build every declared type into a registry.
    ///
    /// # Errors
    ///
    /// - [`DefinitionError::UnknownRoot`] if `root` is not a declared struct.
    /// - [`DefinitionError::Schema`] for any invalid type, field or member.
    pub fn build(&self) -> Result<SchemaRegistry, DefinitionError> {
        if !self.structs.iter().any(|s| s.name == self.root) {
            return Err(DefinitionError::UnknownRoot {
                name: self.root.clone(),
            });
        }

        let mut registry = SchemaRegistry::new();
        for doc in &self.enums {
            registry.register_enum(doc.build()?)?;
        }
        for doc in &self.structs {
            registry.register_struct(doc.build()?)?;
        }
        Ok(registry)
    }
}

impl EnumDocument {
    fn build(&self) -> Result<EnumDef, SchemaError> {
        let repr = Primitive::from_name(self.repr.trim()).ok_or_else(|| {
            SchemaError::InvalidEnumRepr {
                name: self.name.clone(),
                repr: self.repr.clone(),
            }
        })?;
        let mut def = EnumDef::new(&self.name, repr)?;
        for (variant, value) in &self.variants {
            def = def.variant(variant, *value);
        }
        Ok(def)
    }
}

impl StructDocument {
    fn build(&self) -> Result<StructSchema, SchemaError> {
        let mut builder = StructSchema::builder(&self.name).alignment(self.alignment);
        if let Some(endian) = self.endian {
            builder = builder.endian(endian);
        }
        for field in &self.fields {
            builder = builder.field(field.build()?);
        }
        builder.build()
    }
}

impl FieldDocument {
    fn build(&self) -> Result<FieldDescriptor, SchemaError> {
        let mut field = FieldDescriptor::new(&self.name, TypeRef::parse(&self.ty)?).align(self.align);

        if let Some(size) = &self.size {
            field = field.array_size(match size {
                SizeDocument::Fixed(n) => ArraySize::Fixed(*n),
                SizeDocument::Member(member) => ArraySize::Member(Member::parse(member)),
                SizeDocument::Terminated {
                    terminated: Termination::Default,
                } => ArraySize::DefaultTerminated,
                SizeDocument::Terminated {
                    terminated: Termination::Eof,
                } => ArraySize::EndOfStream,
            });
        }
        match &self.offset {
            Some(OffsetDocument::Absolute(offset)) => field = field.at_offset(*offset),
            Some(OffsetDocument::Member(member)) => field = field.offset_from(member),
            None => {}
        }
        if let Some(endian) = self.endian {
            field = field.endian(endian);
        }
        if self.skip {
            field = field.internal();
        }
        if self.current_offset {
            field = field.current_offset();
        }
        for rule in &self.read_as {
            field = field.read_as(&rule.when, rule.equals, TypeRef::parse(&rule.ty)?);
        }
        Ok(field)
    }
}
