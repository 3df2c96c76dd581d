use std::sync::Arc;

use crate::error::SchemaError;
use crate::types::Primitive;
use crate::value::EnumValue;

/// An enum decoded through its underlying integer representation.
///
/// Raw values without a declared variant are kept as-is; the decoder
/// never rejects them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumDef {
    name: Arc<str>,
    repr: Primitive,
    variants: Vec<(Arc<str>, i64)>,
}

impl EnumDef {
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidEnumRepr`] if `repr` is a float.
    pub fn new(name: &str, repr: Primitive) -> Result<Self, SchemaError> {
        if !repr.is_integer() {
            return Err(SchemaError::InvalidEnumRepr {
                name: name.to_string(),
                repr: repr.to_string(),
            });
        }
        Ok(Self {
            name: Arc::from(name),
            repr,
            variants: Vec::new(),
        })
    }

    #[must_use]
    pub fn variant(mut self, name: &str, value: i64) -> Self {
        self.variants.push((Arc::from(name), value));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn repr(&self) -> Primitive {
        self.repr
    }

    pub fn variants(&self) -> impl Iterator<Item = (&str, i64)> {
        self.variants.iter().map(|(n, v)| (&**n, *v))
    }

    /// First variant declared with this raw value.
    pub fn variant_name(&self, raw: i64) -> Option<&str> {
        self.variants
            .iter()
            .find(|(_, v)| *v == raw)
            .map(|(n, _)| &**n)
    }

    pub fn value_of(&self, variant: &str) -> Option<i64> {
        self.variants
            .iter()
            .find(|(n, _)| &**n == variant)
            .map(|(_, v)| *v)
    }

    /// Wrap a raw value, attaching the variant name when one matches.
    pub fn value(&self, raw: i64) -> EnumValue {
        EnumValue {
            type_name: Arc::clone(&self.name),
            variant: self
                .variants
                .iter()
                .find(|(_, v)| *v == raw)
                .map(|(n, _)| Arc::clone(n)),
            raw,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind() -> EnumDef {
        EnumDef::new("Kind", Primitive::U8)
            .unwrap()
            .variant("File", 1)
            .variant("Dir", 2)
    }

    #[test]
    fn lookup_both_ways() {
        let kind = kind();
        assert_eq!(kind.variant_name(2), Some("Dir"));
        assert_eq!(kind.value_of("File"), Some(1));
        assert_eq!(kind.variant_name(7), None);
    }

    #[test]
    fn unknown_raw_values_are_kept() {
        let value = kind().value(9);
        assert_eq!(value.raw, 9);
        assert!(value.variant.is_none());
        assert_eq!(&*value.type_name, "Kind");
    }

    #[test]
    fn float_repr_is_rejected() {
        assert!(matches!(
            EnumDef::new("Bad", Primitive::F32),
            Err(SchemaError::InvalidEnumRepr { .. })
        ));
    }
}
