use std::sync::Arc;

use declbin_wire::Endian;

use crate::resolver::{InstanceView, Member};
use crate::error::SchemaError;
use crate::types::TypeRef;

/// Element-count policy of an array field.
///
/// ```text
/// ┌───────────────────┬──────────────────────────────────────────────┐
/// │ Policy            │ Element count                                │
/// ├───────────────────┼──────────────────────────────────────────────┤
/// │ Fixed(n)          │ n                                            │
/// │ Member(m)         │ sibling member m, resolved at decode time    │
/// │ DefaultTerminated │ until an element equals the zero value; the  │
/// │                   │ terminator is kept in the array              │
/// │ EndOfStream       │ until the cursor reaches end-of-stream       │
/// └───────────────────┴──────────────────────────────────────────────┘
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum ArraySize {
    Fixed(u64),
    Member(Member),
    DefaultTerminated,
    EndOfStream,
}

/// Where a deferred field lives in the stream.
#[derive(Clone, Debug, PartialEq)]
pub enum Offset {
    Absolute(u64),
    Member(Member),
}

impl Offset {
    /// Absolute offset, possibly negative when computed from decoded values.
    ///
    /// # Errors
    ///
    /// Errors from [`Member::resolve`].
    pub fn resolve(&self, instance: &InstanceView<'_>) -> Result<i64, SchemaError> {
        match self {
            Self::Absolute(offset) => Ok(i64::try_from(*offset).unwrap_or(i64::MAX)),
            Self::Member(member) => member.resolve(instance),
        }
    }
}

/// Conditional type override: when `discriminator` resolves to `value`,
/// the field is decoded as `ty` instead of its declared type.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeRule {
    pub discriminator: Member,
    pub value: i64,
    pub ty: TypeRef,
}

/// On-wire layout of one field.
///
/// Built with chaining methods and frozen once the owning
/// [`StructSchema`](crate::StructSchema) is built:
///
/// ```rust
/// use declbin_schema::{FieldDescriptor, TypeRef};
///
/// let items = FieldDescriptor::new("items", TypeRef::bytes())
///     .size_from("count")
///     .big_endian();
/// assert!(items.ty().is_array());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct FieldDescriptor {
    name: Arc<str>,
    ty: TypeRef,
    endian: Option<Endian>,
    array_size: Option<ArraySize>,
    offset: Option<Offset>,
    alignment: u32,
    skip: bool,
    current_offset: bool,
    rules: Vec<TypeRule>,
}

impl FieldDescriptor {
    pub fn new(name: &str, ty: TypeRef) -> Self {
        Self {
            name: Arc::from(name),
            ty,
            endian: None,
            array_size: None,
            offset: None,
            alignment: 0,
            skip: false,
            current_offset: false,
            rules: Vec::new(),
        }
    }

    // ── Layout attributes ─────────────────────────────────────────────

    #[must_use]
    pub fn endian(mut self, endian: Endian) -> Self {
        self.endian = Some(endian);
        self
    }

    #[must_use]
    pub fn little_endian(self) -> Self {
        self.endian(Endian::Little)
    }

    #[must_use]
    pub fn big_endian(self) -> Self {
        self.endian(Endian::Big)
    }

    #[must_use]
    pub fn array_size(mut self, size: ArraySize) -> Self {
        self.array_size = Some(size);
        self
    }

    #[must_use]
    pub fn fixed_size(self, count: u64) -> Self {
        self.array_size(ArraySize::Fixed(count))
    }

    /// Element count comes from a sibling member (`"count"`,
    /// `"entry_count()"`).
    #[must_use]
    pub fn size_from(self, member: &str) -> Self {
        self.array_size(ArraySize::Member(Member::parse(member)))
    }

    #[must_use]
    pub fn default_terminated(self) -> Self {
        self.array_size(ArraySize::DefaultTerminated)
    }

    #[must_use]
    pub fn until_eof(self) -> Self {
        self.array_size(ArraySize::EndOfStream)
    }

    /// Defer the field to an absolute offset.
    #[must_use]
    pub fn at_offset(mut self, offset: u64) -> Self {
        self.offset = Some(Offset::Absolute(offset));
        self
    }

    /// Defer the field to an offset held by a sibling member.
    #[must_use]
    pub fn offset_from(mut self, member: &str) -> Self {
        self.offset = Some(Offset::Member(Member::parse(member)));
        self
    }

    /// Pad the cursor to the next multiple of `boundary` before reading.
    #[must_use]
    pub fn align(mut self, boundary: u32) -> Self {
        self.alignment = boundary;
        self
    }

    /// Never read; the field keeps its default value.
    #[must_use]
    pub fn internal(mut self) -> Self {
        self.skip = true;
        self
    }

    /// Receive the cursor position instead of reading any bytes.
    #[must_use]
    pub fn current_offset(mut self) -> Self {
        self.current_offset = true;
        self
    }

    /// Decode as `ty` when `discriminator` resolves to `value`. Rules are
    /// tried in the order they are added; the first match wins.
    #[must_use]
    pub fn read_as(mut self, discriminator: &str, value: i64, ty: TypeRef) -> Self {
        self.rules.push(TypeRule {
            discriminator: Member::parse(discriminator),
            value,
            ty,
        });
        self
    }

    // ── Accessors ─────────────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    pub fn endianness(&self) -> Option<Endian> {
        self.endian
    }

    pub fn size(&self) -> Option<&ArraySize> {
        self.array_size.as_ref()
    }

    pub fn offset(&self) -> Option<&Offset> {
        self.offset.as_ref()
    }

    pub fn alignment(&self) -> u32 {
        self.alignment
    }

    pub fn is_skipped(&self) -> bool {
        self.skip
    }

    pub fn is_current_offset(&self) -> bool {
        self.current_offset
    }

    /// Read after the inline pass, at an explicit offset.
    pub fn is_deferred(&self) -> bool {
        !self.skip && !self.current_offset && self.offset.is_some()
    }

    pub fn rules(&self) -> &[TypeRule] {
        &self.rules
    }

    /// Pick the decode type: the first rule whose discriminator matches,
    /// else the declared type.
    ///
    /// # Errors
    ///
    /// Errors from resolving a discriminator.
    pub fn effective_type(&self, instance: &InstanceView<'_>) -> Result<&TypeRef, SchemaError> {
        for rule in &self.rules {
            if rule.discriminator.resolve(instance)? == rule.value {
                return Ok(&rule.ty);
            }
        }
        Ok(&self.ty)
    }

    /// Every member reference this field holds, for binding.
    pub(crate) fn members_mut(&mut self) -> impl Iterator<Item = &mut Member> {
        let size = match &mut self.array_size {
            Some(ArraySize::Member(member)) => Some(member),
            _ => None,
        };
        let offset = match &mut self.offset {
            Some(Offset::Member(member)) => Some(member),
            _ => None,
        };
        size.into_iter()
            .chain(offset)
            .chain(self.rules.iter_mut().map(|rule| &mut rule.discriminator))
    }

    /// Structural checks that need only this field.
    pub(crate) fn validate(&self, type_name: &str) -> Result<(), SchemaError> {
        if self.skip {
            return Ok(());
        }

        if self.current_offset {
            let reason = if self.offset.is_some() {
                Some("it also has an explicit offset")
            } else if !self.ty.is_integer() {
                Some("its type is not an integer")
            } else {
                None
            };
            if let Some(reason) = reason {
                return Err(SchemaError::InvalidCurrentOffset {
                    type_name: type_name.to_string(),
                    field: self.name.to_string(),
                    reason,
                });
            }
            return Ok(());
        }

        let any_array = self.ty.is_array() || self.rules.iter().any(|r| r.ty.is_array());
        match (any_array, self.array_size.is_some()) {
            (true, false) => Err(SchemaError::MissingArraySize {
                type_name: type_name.to_string(),
                field: self.name.to_string(),
            }),
            (false, true) => Err(SchemaError::UnexpectedArraySize {
                type_name: type_name.to_string(),
                field: self.name.to_string(),
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_attributes() {
        let field = FieldDescriptor::new("data", TypeRef::bytes())
            .fixed_size(4)
            .big_endian()
            .align(8);
        assert_eq!(field.size(), Some(&ArraySize::Fixed(4)));
        assert_eq!(field.endianness(), Some(Endian::Big));
        assert_eq!(field.alignment(), 8);
        assert!(!field.is_deferred());
    }

    #[test]
    fn offset_marks_deferred() {
        let field = FieldDescriptor::new("blob", TypeRef::U32).offset_from("blob_at");
        assert!(field.is_deferred());
        assert_eq!(field.offset(), Some(&Offset::Member(Member::parse("blob_at"))));
    }

    #[test]
    fn array_without_size_is_rejected() {
        let field = FieldDescriptor::new("items", TypeRef::bytes());
        assert!(matches!(
            field.validate("T"),
            Err(SchemaError::MissingArraySize { .. })
        ));
    }

    #[test]
    fn size_on_scalar_is_rejected() {
        let field = FieldDescriptor::new("n", TypeRef::U32).fixed_size(2);
        assert!(matches!(
            field.validate("T"),
            Err(SchemaError::UnexpectedArraySize { .. })
        ));
    }

    #[test]
    fn rule_selecting_array_needs_a_size() {
        let field = FieldDescriptor::new("payload", TypeRef::U32).read_as("tag", 2, TypeRef::bytes());
        assert!(matches!(
            field.validate("T"),
            Err(SchemaError::MissingArraySize { .. })
        ));
    }

    #[test]
    fn current_offset_must_be_integer_and_inline() {
        let float = FieldDescriptor::new("here", TypeRef::F32).current_offset();
        assert!(matches!(
            float.validate("T"),
            Err(SchemaError::InvalidCurrentOffset { .. })
        ));
        let with_offset = FieldDescriptor::new("here", TypeRef::U32)
            .current_offset()
            .at_offset(4);
        assert!(matches!(
            with_offset.validate("T"),
            Err(SchemaError::InvalidCurrentOffset { .. })
        ));
        let ok = FieldDescriptor::new("here", TypeRef::U64).current_offset();
        assert!(ok.validate("T").is_ok());
    }

    #[test]
    fn skipped_fields_are_not_validated() {
        let field = FieldDescriptor::new("scratch", TypeRef::bytes()).internal();
        assert!(field.validate("T").is_ok());
    }
}
