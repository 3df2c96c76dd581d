use std::fmt;
use std::sync::Arc;

use crate::error::SchemaError;
use crate::schema::StructSchema;
use crate::value::{Record, Value};

/// A computed member of a structured type: a property or a zero-argument
/// method that derives an integer from the instance being decoded.
///
/// Accessors are bound when the schema is built, so decoding never looks
/// members up by name.
pub type Accessor = Arc<dyn Fn(&InstanceView<'_>) -> Result<i64, SchemaError> + Send + Sync>;

/// Whether a member reference names a stored field/property or calls a
/// method (`name()`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MemberKind {
    FieldOrProperty,
    Method,
}

#[derive(Clone)]
enum Binding {
    Unbound,
    Field(usize),
    Accessor(Accessor),
}

/// A reference to a sibling member, used for dynamic array sizes,
/// offsets, and type discriminators.
///
/// Written as text (`"count"`, `"data_start()"`) and bound to a field
/// index or an accessor closure by
/// [`StructSchemaBuilder::build`](crate::StructSchemaBuilder::build).
#[derive(Clone)]
pub struct Member {
    name: Arc<str>,
    kind: MemberKind,
    binding: Binding,
}

impl Member {
    /// Parse a member reference. A trailing `()` marks a method call.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        let (name, kind) = match text.strip_suffix("()") {
            Some(name) => (name, MemberKind::Method),
            None => (text, MemberKind::FieldOrProperty),
        };
        Self {
            name: Arc::from(name.trim()),
            kind,
            binding: Binding::Unbound,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    /// Index of the referenced field, when bound to a stored field.
    pub fn field_index(&self) -> Option<usize> {
        match self.binding {
            Binding::Field(index) => Some(index),
            _ => None,
        }
    }

    /// Bind against the fields and accessors of `schema`.
    ///
    /// A method reference binds only to a method accessor. A plain name
    /// binds to a stored field first, then to a property accessor.
    pub(crate) fn bind(
        &mut self,
        type_name: &str,
        field_index: impl Fn(&str) -> Option<usize>,
        accessor: impl Fn(&str, MemberKind) -> Option<Accessor>,
    ) -> Result<(), SchemaError> {
        let binding = match self.kind {
            MemberKind::Method => accessor(&self.name, MemberKind::Method).map(Binding::Accessor),
            MemberKind::FieldOrProperty => field_index(&self.name)
                .map(Binding::Field)
                .or_else(|| {
                    accessor(&self.name, MemberKind::FieldOrProperty).map(Binding::Accessor)
                }),
        };
        self.binding = binding.ok_or_else(|| SchemaError::UnknownMember {
            type_name: type_name.to_string(),
            member: self.to_string(),
        })?;
        Ok(())
    }

    /// Resolve the member to an integer against a live instance.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::MemberNotDecoded`] if the referenced field has not
    ///   been populated yet.
    /// - [`SchemaError::NotAnInteger`] if its value is not integral.
    /// - [`SchemaError::UnknownMember`] if the member was never bound.
    /// - Any error returned by an accessor.
    pub fn resolve(&self, instance: &InstanceView<'_>) -> Result<i64, SchemaError> {
        match &self.binding {
            Binding::Field(index) => instance
                .value_at(*index)
                .ok_or_else(|| SchemaError::MemberNotDecoded {
                    type_name: instance.type_name().to_string(),
                    member: self.name.to_string(),
                })?
                .to_i64(&self.name),
            Binding::Accessor(accessor) => accessor(instance),
            Binding::Unbound => Err(SchemaError::UnknownMember {
                type_name: instance.type_name().to_string(),
                member: self.to_string(),
            }),
        }
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            MemberKind::Method => write!(f, "{}()", self.name),
            MemberKind::FieldOrProperty => f.write_str(&self.name),
        }
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let binding = match &self.binding {
            Binding::Unbound => "unbound".to_string(),
            Binding::Field(index) => format!("field #{index}"),
            Binding::Accessor(_) => "accessor".to_string(),
        };
        write!(f, "Member({self} → {binding})")
    }
}

impl PartialEq for Member {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.kind == other.kind
    }
}

enum Slots<'a> {
    Partial(&'a [Option<Value>]),
    Complete(&'a Record),
}

/// Read-only view of an instance, handed to member resolution.
///
/// During decoding the view is *partial*: only fields already decoded
/// hold values. The encoder resolves against a *complete* record.
pub struct InstanceView<'a> {
    schema: &'a StructSchema,
    slots: Slots<'a>,
}

impl<'a> InstanceView<'a> {
    /// View over the per-field slots of an instance being decoded. Slots
    /// are indexed in declaration order.
    pub fn partial(schema: &'a StructSchema, slots: &'a [Option<Value>]) -> Self {
        Self {
            schema,
            slots: Slots::Partial(slots),
        }
    }

    pub fn complete(schema: &'a StructSchema, record: &'a Record) -> Self {
        Self {
            schema,
            slots: Slots::Complete(record),
        }
    }

    pub fn type_name(&self) -> &str {
        self.schema.name()
    }

    pub fn schema(&self) -> &StructSchema {
        self.schema
    }

    /// Value of the field at `index` in declaration order, if populated.
    pub fn value_at(&self, index: usize) -> Option<&Value> {
        match self.slots {
            Slots::Partial(slots) => slots.get(index).and_then(Option::as_ref),
            Slots::Complete(record) => {
                let field = self.schema.fields().get(index)?;
                record.get(field.name())
            }
        }
    }

    /// Value of a stored field by name.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::UnknownMember`] if there is no such field.
    /// - [`SchemaError::MemberNotDecoded`] if it is not populated yet.
    pub fn value(&self, name: &str) -> Result<&Value, SchemaError> {
        let index = self
            .schema
            .field_index(name)
            .ok_or_else(|| SchemaError::UnknownMember {
                type_name: self.type_name().to_string(),
                member: name.to_string(),
            })?;
        self.value_at(index)
            .ok_or_else(|| SchemaError::MemberNotDecoded {
                type_name: self.type_name().to_string(),
                member: name.to_string(),
            })
    }

    /// Integer value of a stored field by name.
    ///
    /// # Errors
    ///
    /// Same as [`value`](Self::value), plus [`SchemaError::NotAnInteger`].
    pub fn int(&self, name: &str) -> Result<i64, SchemaError> {
        self.value(name)?.to_i64(name)
    }

    /// Resolve a member reference written as text, without binding it
    /// ahead of time: `name()` calls a method, a plain name reads a
    /// stored field first and then a property.
    ///
    /// # Errors
    ///
    /// [`SchemaError::UnknownMember`] if nothing matches, otherwise the
    /// errors of [`Member::resolve`].
    pub fn resolve(&self, text: &str) -> Result<i64, SchemaError> {
        let mut member = Member::parse(text);
        member.bind(
            self.type_name(),
            |name| self.schema.field_index(name),
            |name, kind| self.schema.accessor(name, kind).cloned(),
        )?;
        member.resolve(self)
    }
}
