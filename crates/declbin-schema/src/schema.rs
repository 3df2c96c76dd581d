use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use declbin_wire::Endian;

use crate::error::SchemaError;
use crate::field::FieldDescriptor;
use crate::resolver::{Accessor, InstanceView, MemberKind};

/// Ordered field layout of one structured type.
///
/// Declaration order is the wire order of every inline field. It is fixed
/// when the schema is built and never changes afterwards. Schemas are
/// immutable and cheap to share behind an `Arc`.
#[derive(Clone)]
pub struct StructSchema {
    name: Arc<str>,
    fields: Vec<FieldDescriptor>,
    accessors: Vec<(Arc<str>, MemberKind, Accessor)>,
    alignment: u32,
    endian: Option<Endian>,
}

impl StructSchema {
    pub fn builder(name: &str) -> StructSchemaBuilder {
        StructSchemaBuilder {
            name: Arc::from(name),
            fields: Vec::new(),
            accessors: Vec::new(),
            alignment: 0,
            endian: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shared_name(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name() == name)
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name() == name)
    }

    /// A registered property (`FieldOrProperty`) or method accessor.
    pub fn accessor(&self, name: &str, kind: MemberKind) -> Option<&Accessor> {
        self.accessors
            .iter()
            .find(|(n, k, _)| &**n == name && *k == kind)
            .map(|(_, _, accessor)| accessor)
    }

    /// Names of the computed members, methods written with `()`.
    pub fn accessor_names(&self) -> impl Iterator<Item = String> + '_ {
        self.accessors.iter().map(|(name, kind, _)| match kind {
            MemberKind::Method => format!("{name}()"),
            MemberKind::FieldOrProperty => name.to_string(),
        })
    }

    /// Type-level alignment, applied to inline fields without their own.
    pub fn alignment(&self) -> u32 {
        self.alignment
    }

    pub fn endian(&self) -> Option<Endian> {
        self.endian
    }

    /// Alignment boundary in effect for `field`; 0 means none.
    pub fn alignment_for(&self, field: &FieldDescriptor) -> u32 {
        match field.alignment() {
            0 => self.alignment,
            own => own,
        }
    }

    /// Byte order for `field`: its own override, else the type default,
    /// else `fallback`.
    pub fn endian_for(&self, field: &FieldDescriptor, fallback: Endian) -> Endian {
        field.endianness().or(self.endian).unwrap_or(fallback)
    }

    /// Registry names referenced by field types and type rules.
    pub fn dependencies(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().flat_map(|field| {
            std::iter::once(field.ty())
                .chain(field.rules().iter().map(|rule| &rule.ty))
                .filter_map(|ty| ty.named_type())
        })
    }
}

impl fmt::Debug for StructSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructSchema")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("accessors", &self.accessor_names().collect::<Vec<_>>())
            .field("alignment", &self.alignment)
            .field("endian", &self.endian)
            .finish()
    }
}

/// Builder for [`StructSchema`].
///
/// Fields are kept in the order they are added. Member references made
/// by fields (sizes, offsets, discriminators) may name fields declared
/// later and accessors registered after them; they are bound in
/// [`build`](Self::build).
///
/// ```rust
/// use declbin_schema::{FieldDescriptor, StructSchema, TypeRef};
///
/// let schema = StructSchema::builder("Chunk")
///     .field(FieldDescriptor::new("len", TypeRef::U16).big_endian())
///     .field(FieldDescriptor::new("body", TypeRef::bytes()).size_from("body_len"))
///     .property("body_len", |v| Ok(v.int("len")? - 2))
///     .build()
///     .unwrap();
/// assert_eq!(schema.fields().len(), 2);
/// ```
pub struct StructSchemaBuilder {
    name: Arc<str>,
    fields: Vec<FieldDescriptor>,
    accessors: Vec<(Arc<str>, MemberKind, Accessor)>,
    alignment: u32,
    endian: Option<Endian>,
}

impl StructSchemaBuilder {
    #[must_use]
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Pad before every inline field that has no alignment of its own.
    #[must_use]
    pub fn alignment(mut self, boundary: u32) -> Self {
        self.alignment = boundary;
        self
    }

    #[must_use]
    pub fn endian(mut self, endian: Endian) -> Self {
        self.endian = Some(endian);
        self
    }

    /// Register a computed property, referenced by its bare name.
    #[must_use]
    pub fn property<F>(self, name: &str, accessor: F) -> Self
    where
        F: Fn(&InstanceView<'_>) -> Result<i64, SchemaError> + Send + Sync + 'static,
    {
        self.accessor(name, MemberKind::FieldOrProperty, Arc::new(accessor))
    }

    /// Register a zero-argument method, referenced as `name()`.
    #[must_use]
    pub fn method<F>(self, name: &str, accessor: F) -> Self
    where
        F: Fn(&InstanceView<'_>) -> Result<i64, SchemaError> + Send + Sync + 'static,
    {
        self.accessor(name, MemberKind::Method, Arc::new(accessor))
    }

    #[must_use]
    pub fn accessor(mut self, name: &str, kind: MemberKind, accessor: Accessor) -> Self {
        self.accessors.push((Arc::from(name), kind, accessor));
        self
    }

    /// Validate the layout and bind every member reference.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::DuplicateField`] / [`SchemaError::DuplicateMember`]
    ///   for repeated names.
    /// - Field-level violations, see [`FieldDescriptor`].
    /// - [`SchemaError::UnknownMember`] for a reference nothing matches.
    pub fn build(self) -> Result<StructSchema, SchemaError> {
        let Self {
            name,
            mut fields,
            accessors,
            alignment,
            endian,
        } = self;

        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(field.name()) {
                return Err(SchemaError::DuplicateField {
                    type_name: name.to_string(),
                    field: field.name().to_string(),
                });
            }
        }

        let mut seen_accessors = HashSet::new();
        for (member, kind, _) in &accessors {
            if !seen_accessors.insert((&**member, *kind)) {
                return Err(SchemaError::DuplicateMember {
                    type_name: name.to_string(),
                    member: member.to_string(),
                });
            }
        }

        for field in &fields {
            field.validate(&name)?;
        }

        let names: Vec<Arc<str>> = fields.iter().map(|f| Arc::from(f.name())).collect();
        for field in &mut fields {
            for member in field.members_mut() {
                member.bind(
                    &name,
                    |target| names.iter().position(|n| &**n == target),
                    |target, kind| {
                        accessors
                            .iter()
                            .find(|(n, k, _)| &**n == target && *k == kind)
                            .map(|(_, _, accessor)| Arc::clone(accessor))
                    },
                )?;
            }
        }

        Ok(StructSchema {
            name,
            fields,
            accessors,
            alignment,
            endian,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::ArraySize;
    use crate::types::TypeRef;
    use crate::value::Value;

    #[test]
    fn build_binds_sibling_references() {
        let schema = StructSchema::builder("List")
            .field(FieldDescriptor::new("count", TypeRef::U32))
            .field(FieldDescriptor::new("items", TypeRef::bytes()).size_from("count"))
            .build()
            .unwrap();
        let Some(ArraySize::Member(member)) = schema.fields()[1].size() else {
            panic!("expected member size");
        };
        assert_eq!(member.field_index(), Some(0));
    }

    #[test]
    fn references_may_point_forward() {
        let schema = StructSchema::builder("Fwd")
            .field(FieldDescriptor::new("items", TypeRef::bytes()).size_from("count"))
            .field(FieldDescriptor::new("count", TypeRef::U8))
            .build()
            .unwrap();
        let slots = vec![None, None];
        let view = InstanceView::partial(&schema, &slots);
        let Some(ArraySize::Member(member)) = schema.fields()[0].size() else {
            panic!("expected member size");
        };
        assert!(matches!(
            member.resolve(&view),
            Err(SchemaError::MemberNotDecoded { .. })
        ));
    }

    #[test]
    fn duplicate_field_is_rejected() {
        let result = StructSchema::builder("Dup")
            .field(FieldDescriptor::new("a", TypeRef::U8))
            .field(FieldDescriptor::new("a", TypeRef::U16))
            .build();
        assert!(matches!(result, Err(SchemaError::DuplicateField { .. })));
    }

    #[test]
    fn duplicate_accessor_is_rejected() {
        let result = StructSchema::builder("Dup")
            .property("n", |_| Ok(1))
            .property("n", |_| Ok(2))
            .build();
        assert!(matches!(result, Err(SchemaError::DuplicateMember { .. })));
    }

    #[test]
    fn property_and_method_may_share_a_name() {
        let schema = StructSchema::builder("Both")
            .field(FieldDescriptor::new("data", TypeRef::bytes()).size_from("len()"))
            .property("len", |_| Ok(1))
            .method("len", |_| Ok(2))
            .build()
            .unwrap();
        assert!(schema.accessor("len", MemberKind::FieldOrProperty).is_some());
        assert!(schema.accessor("len", MemberKind::Method).is_some());
    }

    #[test]
    fn unknown_reference_fails_build() {
        let result = StructSchema::builder("Bad")
            .field(FieldDescriptor::new("items", TypeRef::bytes()).size_from("nope"))
            .build();
        assert_eq!(
            result.unwrap_err(),
            SchemaError::UnknownMember {
                type_name: "Bad".into(),
                member: "nope".into()
            }
        );
    }

    #[test]
    fn method_reference_needs_method_accessor() {
        let result = StructSchema::builder("Bad")
            .field(FieldDescriptor::new("blob", TypeRef::U32).offset_from("start()"))
            .property("start", |_| Ok(0))
            .build();
        assert!(matches!(result, Err(SchemaError::UnknownMember { .. })));
    }

    #[test]
    fn field_wins_over_property_of_same_name() {
        let schema = StructSchema::builder("Shadow")
            .field(FieldDescriptor::new("n", TypeRef::U8))
            .property("n", |_| Ok(99))
            .build()
            .unwrap();
        let slots = vec![Some(Value::U8(4))];
        let view = InstanceView::partial(&schema, &slots);
        assert_eq!(view.resolve("n").unwrap(), 4);
    }

    #[test]
    fn effective_alignment_and_endian() {
        let schema = StructSchema::builder("Aligned")
            .alignment(4)
            .endian(Endian::Big)
            .field(FieldDescriptor::new("a", TypeRef::U8))
            .field(FieldDescriptor::new("b", TypeRef::U8).align(8).little_endian())
            .build()
            .unwrap();
        let [a, b] = schema.fields() else {
            panic!("two fields");
        };
        assert_eq!(schema.alignment_for(a), 4);
        assert_eq!(schema.alignment_for(b), 8);
        assert_eq!(schema.endian_for(a, Endian::Little), Endian::Big);
        assert_eq!(schema.endian_for(b, Endian::Big), Endian::Little);
    }

    #[test]
    fn dependencies_include_rule_types() {
        let schema = StructSchema::builder("Msg")
            .field(FieldDescriptor::new("tag", TypeRef::U8))
            .field(
                FieldDescriptor::new("body", TypeRef::named("A"))
                    .read_as("tag", 1, TypeRef::named("B")),
            )
            .field(
                FieldDescriptor::new("rest", TypeRef::array_of(TypeRef::named("C"))).until_eof(),
            )
            .build()
            .unwrap();
        let deps: Vec<_> = schema.dependencies().collect();
        assert_eq!(deps, ["A", "B", "C"]);
    }
}
