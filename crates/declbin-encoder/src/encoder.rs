use std::sync::Arc;

use declbin_schema::{
    ArraySize, BinaryLayout, FieldDescriptor, InstanceView, IntoRecord, Primitive, Record,
    SchemaError, SchemaRegistry, StructSchema, TypeDef, TypeRef, Value, registry_for,
};
use declbin_wire::{ByteSink, Endian};
use tracing::{debug, trace};

use crate::config::EncoderConfig;
use crate::error::EncodeError;

/// Depth bound for default values written in place of empty fixed arrays.
const DEFAULT_VALUE_DEPTH: usize = 64;

/// Schema-driven encoder, the inverse of the decoder's field walk.
///
/// Inline fields are written in declaration order with zero padding for
/// alignment. Skipped and current-offset fields produce no bytes.
/// Deferred fields are written at their resolved offsets after the
/// inline region, and the position then returns to the end of the inline
/// region, so the next value continues where a decoder would.
///
/// ```text
/// ┌────────────────────┬─────────────────────────────────────────────┐
/// │ Size policy        │ Accepted value                              │
/// ├────────────────────┼─────────────────────────────────────────────┤
/// │ Fixed(n)           │ exactly n elements, or empty for n zeros    │
/// │ Member(m)          │ exactly as many elements as m resolves to   │
/// │ DefaultTerminated  │ any; a zero terminator is appended if absent│
/// │ EndOfStream        │ any                                         │
/// └────────────────────┴─────────────────────────────────────────────┘
/// ```
#[derive(Clone, Debug, Default)]
pub struct LayoutEncoder {
    config: EncoderConfig,
}

impl LayoutEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EncoderConfig) -> Self {
        Self { config }
    }

    /// Encode a typed value using its cached layout.
    ///
    /// # Errors
    ///
    /// Any [`EncodeError`]; see [`encode_record`](Self::encode_record).
    pub fn encode<T: BinaryLayout + IntoRecord>(&self, value: &T) -> Result<Vec<u8>, EncodeError> {
        let registry = registry_for::<T>().map_err(|source| EncodeError::Schema {
            source,
            type_name: T::NAME.to_string(),
            field: String::new(),
        })?;
        self.encode_record(&registry, &value.to_record())
    }

    /// Encode a record whose type name is registered in `registry`.
    ///
    /// # Errors
    ///
    /// - [`EncodeError::UnsupportedType`] if the record's type is not a
    ///   registered struct.
    /// - [`EncodeError::Schema`] if a field is missing or a member does
    ///   not resolve.
    /// - The value-level variants when a value does not fit its field.
    pub fn encode_record(&self, registry: &SchemaRegistry, record: &Record) -> Result<Vec<u8>, EncodeError> {
        let mut sink = ByteSink::new();
        self.encode_into(registry, record, &mut sink)?;
        debug!(root = record.type_name(), bytes = sink.len(), "encode finished");
        Ok(sink.into_bytes())
    }

    /// Encode a record at the sink's current position.
    ///
    /// # Errors
    ///
    /// As [`encode_record`](Self::encode_record).
    pub fn encode_into(
        &self,
        registry: &SchemaRegistry,
        record: &Record,
        sink: &mut ByteSink,
    ) -> Result<(), EncodeError> {
        let mut ctx = EncodeContext {
            registry,
            sink,
            endian: self.config.endian,
            type_name: Arc::from(record.type_name()),
            field: Arc::from(""),
        };
        let Some(schema) = registry.struct_schema(record.type_name()) else {
            return Err(ctx.unsupported(&TypeRef::named(record.type_name())));
        };
        ctx.write_struct(schema, record)
    }
}

struct EncodeContext<'a> {
    registry: &'a SchemaRegistry,
    sink: &'a mut ByteSink,
    endian: Endian,
    type_name: Arc<str>,
    field: Arc<str>,
}

impl EncodeContext<'_> {
    // ── Error context ─────────────────────────────────────────────────

    fn schema_err(&self, source: SchemaError) -> EncodeError {
        EncodeError::Schema {
            source,
            type_name: self.type_name.to_string(),
            field: self.field.to_string(),
        }
    }

    fn unsupported(&self, ty: &TypeRef) -> EncodeError {
        EncodeError::UnsupportedType {
            ty: ty.to_string(),
            type_name: self.type_name.to_string(),
            field: self.field.to_string(),
        }
    }

    fn mismatch(&self, expected: impl ToString, found: &Value) -> EncodeError {
        EncodeError::ValueMismatch {
            type_name: self.type_name.to_string(),
            field: self.field.to_string(),
            expected: expected.to_string(),
            found: found.kind(),
        }
    }

    fn length_mismatch(&self, expected: u64, actual: usize) -> EncodeError {
        EncodeError::LengthMismatch {
            type_name: self.type_name.to_string(),
            field: self.field.to_string(),
            expected,
            actual: actual as u64,
        }
    }

    fn out_of_range(&self, ty: Primitive, value: impl ToString) -> EncodeError {
        EncodeError::OutOfRange {
            type_name: self.type_name.to_string(),
            field: self.field.to_string(),
            ty: ty.name(),
            value: value.to_string(),
        }
    }

    // ── Structured values ─────────────────────────────────────────────

    fn write_struct(&mut self, schema: &StructSchema, record: &Record) -> Result<(), EncodeError> {
        let outer_type = std::mem::replace(&mut self.type_name, schema.shared_name());
        let outer_field = std::mem::replace(&mut self.field, Arc::from(""));

        let mut deferred = Vec::new();
        for field in schema.fields() {
            if field.is_skipped() || field.is_current_offset() {
                continue;
            }
            if field.is_deferred() {
                deferred.push(field);
                continue;
            }
            self.field = Arc::from(field.name());
            self.sink.align_to(schema.alignment_for(field));
            trace!(
                type_name = schema.name(),
                field = field.name(),
                offset = self.sink.position(),
                "encoding field"
            );
            self.write_field(schema, field, record)?;
        }

        let end_of_record = self.sink.position();

        for field in deferred {
            self.field = Arc::from(field.name());
            let Some(offset) = field.offset() else {
                continue;
            };
            let target = offset
                .resolve(&InstanceView::complete(schema, record))
                .map_err(|e| self.schema_err(e))?;
            let position = usize::try_from(target).map_err(|_| EncodeError::NegativeOffset {
                type_name: self.type_name.to_string(),
                field: self.field.to_string(),
                offset: target,
            })?;
            debug!(
                type_name = schema.name(),
                field = field.name(),
                offset = target,
                "writing deferred field"
            );
            self.sink.seek_to(position);
            self.write_field(schema, field, record)?;
        }

        self.sink.seek_to(usize::try_from(end_of_record).unwrap_or(usize::MAX));
        self.type_name = outer_type;
        self.field = outer_field;
        Ok(())
    }

    fn write_field(
        &mut self,
        schema: &StructSchema,
        field: &FieldDescriptor,
        record: &Record,
    ) -> Result<(), EncodeError> {
        let value = record.get(field.name()).ok_or_else(|| {
            self.schema_err(SchemaError::MissingField {
                type_name: schema.name().to_string(),
                field: field.name().to_string(),
            })
        })?;
        let view = InstanceView::complete(schema, record);
        let ty = field
            .effective_type(&view)
            .map_err(|e| self.schema_err(e))?;
        let endian = schema.endian_for(field, self.endian);

        match ty {
            TypeRef::Array(element) => {
                let Some(size) = field.size() else {
                    return Err(self.schema_err(SchemaError::MissingArraySize {
                        type_name: schema.name().to_string(),
                        field: field.name().to_string(),
                    }));
                };
                self.write_array(element, size, value, endian, &view)
            }
            other => self.write_value(other, value, endian),
        }
    }

    // ── Arrays ────────────────────────────────────────────────────────

    fn write_array(
        &mut self,
        element: &TypeRef,
        size: &ArraySize,
        value: &Value,
        endian: Endian,
        view: &InstanceView<'_>,
    ) -> Result<(), EncodeError> {
        let len = match value {
            Value::Bytes(bytes) => bytes.len(),
            Value::Array(items) => items.len(),
            other => return Err(self.mismatch(TypeRef::array_of(element.clone()), other)),
        };

        match size {
            ArraySize::Fixed(count) if len == 0 => {
                let zero = self
                    .registry
                    .default_value(element, DEFAULT_VALUE_DEPTH)
                    .map_err(|e| self.schema_err(e))?;
                for _ in 0..*count {
                    self.write_value(element, &zero, endian)?;
                }
                Ok(())
            }
            ArraySize::Fixed(count) => {
                if len as u64 != *count {
                    return Err(self.length_mismatch(*count, len));
                }
                self.write_elements(element, value, endian)
            }
            ArraySize::Member(member) => {
                let count = member.resolve(view).map_err(|e| self.schema_err(e))?;
                if i64::try_from(len).ok() != Some(count) {
                    return Err(self.length_mismatch(u64::try_from(count).unwrap_or(0), len));
                }
                self.write_elements(element, value, endian)
            }
            ArraySize::DefaultTerminated => {
                self.write_elements(element, value, endian)?;
                let zero = self
                    .registry
                    .default_value(element, DEFAULT_VALUE_DEPTH)
                    .map_err(|e| self.schema_err(e))?;
                let terminated = match value {
                    Value::Bytes(bytes) => bytes.last() == Some(&0),
                    Value::Array(items) => items.last().is_some_and(|last| self.is_zero(last, &zero)),
                    _ => false,
                };
                if terminated {
                    Ok(())
                } else {
                    self.write_value(element, &zero, endian)
                }
            }
            ArraySize::EndOfStream => self.write_elements(element, value, endian),
        }
    }

    /// Whether `item` decodes back to the terminator `zero`.
    fn is_zero(&self, item: &Value, zero: &Value) -> bool {
        match (item, zero) {
            (Value::Enum(a), Value::Enum(b)) => a.raw == b.raw,
            _ => item == zero || (item.integer() == Some(0) && zero.integer() == Some(0)),
        }
    }

    fn write_elements(&mut self, element: &TypeRef, value: &Value, endian: Endian) -> Result<(), EncodeError> {
        if element.is_array() {
            return Err(self.unsupported(&TypeRef::array_of(element.clone())));
        }
        match value {
            Value::Bytes(bytes) if *element == TypeRef::U8 => {
                self.sink.write_bytes(bytes);
                Ok(())
            }
            Value::Bytes(bytes) => {
                for byte in bytes {
                    self.write_value(element, &Value::U8(*byte), endian)?;
                }
                Ok(())
            }
            Value::Array(items) => {
                for item in items {
                    self.write_value(element, item, endian)?;
                }
                Ok(())
            }
            other => Err(self.mismatch(TypeRef::array_of(element.clone()), other)),
        }
    }

    // ── Values ────────────────────────────────────────────────────────

    fn write_value(&mut self, ty: &TypeRef, value: &Value, endian: Endian) -> Result<(), EncodeError> {
        match ty {
            TypeRef::Primitive(p) => self.write_primitive(*p, value, endian),
            TypeRef::String => {
                let Value::String(text) = value else {
                    return Err(self.mismatch(ty, value));
                };
                if text.as_bytes().contains(&0) {
                    return Err(EncodeError::InteriorNul {
                        type_name: self.type_name.to_string(),
                        field: self.field.to_string(),
                    });
                }
                self.sink.write_cstring(text.as_bytes());
                Ok(())
            }
            TypeRef::Named(name) => {
                let registry = self.registry;
                match registry.get(name) {
                    Some(TypeDef::Struct(schema)) => {
                        let Value::Struct(record) = value else {
                            return Err(self.mismatch(ty, value));
                        };
                        self.write_struct(schema, record)
                    }
                    Some(TypeDef::Enum(def)) => {
                        let raw = match value {
                            Value::Enum(e) => e.raw,
                            Value::String(variant) => def
                                .value_of(variant)
                                .ok_or_else(|| self.mismatch(ty, value))?,
                            other => other.integer().ok_or_else(|| self.mismatch(ty, other))?,
                        };
                        self.write_integer(def.repr(), raw, endian)
                    }
                    None => Err(self.unsupported(ty)),
                }
            }
            TypeRef::Array(_) => Err(self.unsupported(ty)),
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn write_primitive(&mut self, p: Primitive, value: &Value, endian: Endian) -> Result<(), EncodeError> {
        match (p, value) {
            (Primitive::U64, Value::U64(v)) => {
                self.sink.write_scalar(*v, endian);
                Ok(())
            }
            (Primitive::F32, Value::F32(v)) => {
                self.sink.write_scalar(*v, endian);
                Ok(())
            }
            (Primitive::F32, Value::F64(v)) => {
                self.sink.write_scalar(*v as f32, endian);
                Ok(())
            }
            (Primitive::F64, Value::F64(v)) => {
                self.sink.write_scalar(*v, endian);
                Ok(())
            }
            (Primitive::F64, Value::F32(v)) => {
                self.sink.write_scalar(f64::from(*v), endian);
                Ok(())
            }
            _ => {
                let raw = value
                    .integer()
                    .ok_or_else(|| self.mismatch(p, value))?;
                self.write_integer(p, raw, endian)
            }
        }
    }

    fn write_integer(&mut self, p: Primitive, raw: i64, endian: Endian) -> Result<(), EncodeError> {
        let value = Value::from_integer(p, raw).ok_or_else(|| self.out_of_range(p, raw))?;
        let sink = &mut *self.sink;
        match value {
            Value::U8(v) => sink.write_scalar(v, endian),
            Value::I8(v) => sink.write_scalar(v, endian),
            Value::U16(v) => sink.write_scalar(v, endian),
            Value::I16(v) => sink.write_scalar(v, endian),
            Value::U32(v) => sink.write_scalar(v, endian),
            Value::I32(v) => sink.write_scalar(v, endian),
            Value::U64(v) => sink.write_scalar(v, endian),
            Value::I64(v) => sink.write_scalar(v, endian),
            Value::F32(v) => sink.write_scalar(v, endian),
            Value::F64(v) => sink.write_scalar(v, endian),
            other => return Err(self.mismatch(p, &other)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use declbin_schema::{EnumDef, FieldDescriptor, StructSchema};

    use super::*;

    fn registry(schemas: Vec<StructSchema>) -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        for schema in schemas {
            registry.register_struct(schema).unwrap();
        }
        registry
    }

    fn encode(registry: &SchemaRegistry, record: &Record) -> Result<Vec<u8>, EncodeError> {
        LayoutEncoder::new().encode_record(registry, record)
    }

    #[test]
    fn writes_fields_in_declaration_order() {
        let registry = registry(vec![
            StructSchema::builder("Pair")
                .field(FieldDescriptor::new("a", TypeRef::U16).big_endian())
                .field(FieldDescriptor::new("b", TypeRef::U8))
                .build()
                .unwrap(),
        ]);
        let record = Record::new("Pair").with("b", 7u8).with("a", 0x0102u16);
        assert_eq!(encode(&registry, &record).unwrap(), [0x01, 0x02, 0x07]);
    }

    #[test]
    fn deferred_fields_land_at_their_offset() {
        let registry = registry(vec![
            StructSchema::builder("Blob")
                .field(FieldDescriptor::new("at", TypeRef::U8))
                .field(FieldDescriptor::new("value", TypeRef::U16).offset_from("at"))
                .field(FieldDescriptor::new("tail", TypeRef::U8))
                .build()
                .unwrap(),
        ]);
        let record = Record::new("Blob")
            .with("at", 4u8)
            .with("value", 0x1234u16)
            .with("tail", 0x7Fu8);
        assert_eq!(
            encode(&registry, &record).unwrap(),
            [0x04, 0x7F, 0, 0, 0x34, 0x12]
        );
    }

    #[test]
    fn alignment_is_zero_padded_and_skips_write_nothing() {
        let registry = registry(vec![
            StructSchema::builder("Padded")
                .field(FieldDescriptor::new("a", TypeRef::U8))
                .field(FieldDescriptor::new("scratch", TypeRef::U32).internal())
                .field(FieldDescriptor::new("here", TypeRef::U32).current_offset())
                .field(FieldDescriptor::new("b", TypeRef::U16).align(4))
                .build()
                .unwrap(),
        ]);
        let record = Record::new("Padded")
            .with("a", 1u8)
            .with("scratch", 0u32)
            .with("here", 0u32)
            .with("b", 2u16);
        assert_eq!(encode(&registry, &record).unwrap(), [1, 0, 0, 0, 2, 0]);
    }

    #[test]
    fn empty_fixed_array_is_written_as_zeros() {
        let registry = registry(vec![
            StructSchema::builder("Fixed")
                .field(FieldDescriptor::new("data", TypeRef::array_of(TypeRef::U16)).fixed_size(2))
                .build()
                .unwrap(),
        ]);
        let record = Record::new("Fixed").with("data", Value::Array(Vec::new()));
        assert_eq!(encode(&registry, &record).unwrap(), [0, 0, 0, 0]);
    }

    #[test]
    fn length_must_match_size_policy() {
        let registry = registry(vec![
            StructSchema::builder("Counted")
                .field(FieldDescriptor::new("count", TypeRef::U8))
                .field(FieldDescriptor::new("items", TypeRef::bytes()).size_from("count"))
                .build()
                .unwrap(),
        ]);
        let record = Record::new("Counted")
            .with("count", 3u8)
            .with("items", Value::Bytes(vec![1, 2]));
        assert!(matches!(
            encode(&registry, &record),
            Err(EncodeError::LengthMismatch {
                expected: 3,
                actual: 2,
                ..
            })
        ));
    }

    #[test]
    fn default_terminated_appends_missing_terminator() {
        let registry = registry(vec![
            StructSchema::builder("Words")
                .field(FieldDescriptor::new("words", TypeRef::array_of(TypeRef::U16)).default_terminated())
                .build()
                .unwrap(),
        ]);
        let open = Record::new("Words").with("words", vec![5u16]);
        assert_eq!(encode(&registry, &open).unwrap(), [5, 0, 0, 0]);
        let closed = Record::new("Words").with("words", vec![5u16, 0]);
        assert_eq!(encode(&registry, &closed).unwrap(), [5, 0, 0, 0]);
    }

    #[test]
    fn integers_are_range_checked() {
        let registry = registry(vec![
            StructSchema::builder("Small")
                .field(FieldDescriptor::new("n", TypeRef::U8))
                .build()
                .unwrap(),
        ]);
        let record = Record::new("Small").with("n", 300u32);
        assert!(matches!(
            encode(&registry, &record),
            Err(EncodeError::OutOfRange { ty: "u8", .. })
        ));
    }

    #[test]
    fn strings_get_a_terminator_and_enums_their_raw_value() {
        let mut registry = registry(vec![
            StructSchema::builder("Named")
                .field(FieldDescriptor::new("kind", TypeRef::named("Kind")))
                .field(FieldDescriptor::new("name", TypeRef::String))
                .build()
                .unwrap(),
        ]);
        registry
            .register_enum(EnumDef::new("Kind", Primitive::U8).unwrap().variant("Dir", 2))
            .unwrap();
        let record = Record::new("Named").with("kind", "Dir").with("name", "hi");
        assert_eq!(encode(&registry, &record).unwrap(), [2, b'h', b'i', 0]);
    }

    #[test]
    fn missing_field_is_a_schema_error() {
        let registry = registry(vec![
            StructSchema::builder("Pair")
                .field(FieldDescriptor::new("a", TypeRef::U8))
                .build()
                .unwrap(),
        ]);
        assert!(matches!(
            encode(&registry, &Record::new("Pair")),
            Err(EncodeError::Schema {
                source: SchemaError::MissingField { .. },
                ..
            })
        ));
    }
}
