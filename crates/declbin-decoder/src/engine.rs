use std::io::{Read, Seek};
use std::sync::Arc;

use declbin_schema::{
    ArraySize, FieldDescriptor, InstanceView, Primitive, Record, SchemaError, SchemaRegistry,
    StructSchema, TypeDef, TypeRef, Value,
};
use declbin_wire::{ByteCursor, Endian, WireError};
use tracing::{debug, trace};

use crate::config::DecoderConfig;
use crate::error::{DecodeError, FieldContext};

/// Transient state of one decode call.
///
/// Holds the cursor, the registry used to resolve named types, and the
/// location of the innermost field being read so errors can name it.
/// Never shared between calls.
pub(crate) struct DecodeContext<'a, R> {
    registry: &'a SchemaRegistry,
    cursor: &'a mut ByteCursor<R>,
    config: &'a DecoderConfig,
    depth: usize,
    type_name: Arc<str>,
    field: Arc<str>,
    field_start: u64,
}

impl<'a, R: Read + Seek> DecodeContext<'a, R> {
    pub(crate) fn new(
        registry: &'a SchemaRegistry,
        cursor: &'a mut ByteCursor<R>,
        config: &'a DecoderConfig,
    ) -> Self {
        let field_start = cursor.position();
        Self {
            registry,
            cursor,
            config,
            depth: 0,
            type_name: Arc::from(""),
            field: Arc::from(""),
            field_start,
        }
    }

    // ── Error context ─────────────────────────────────────────────────

    fn context(&self) -> FieldContext {
        FieldContext::new(&self.type_name, &self.field, self.field_start)
    }

    fn schema_err(&self, err: SchemaError) -> DecodeError {
        DecodeError::schema(err, self.context())
    }

    fn wire_err(&self, err: WireError) -> DecodeError {
        DecodeError::wire(err, self.context())
    }

    fn unsupported(&self, ty: &TypeRef) -> DecodeError {
        DecodeError::UnsupportedType {
            ty: ty.to_string(),
            context: self.context(),
        }
    }

    fn enter_field(&mut self, field: &FieldDescriptor) {
        self.field = Arc::from(field.name());
        self.field_start = self.cursor.position();
    }

    // ── Structured values ─────────────────────────────────────────────

    /// Decode the registered structured type `name` at the cursor.
    pub(crate) fn decode_named_struct(&mut self, name: &str) -> Result<Record, DecodeError> {
        let registry = self.registry;
        match registry.get(name) {
            Some(TypeDef::Struct(schema)) => self.decode_struct(schema),
            _ => Err(self.unsupported(&TypeRef::named(name))),
        }
    }

    fn decode_struct(&mut self, schema: &StructSchema) -> Result<Record, DecodeError> {
        if self.depth >= self.config.max_depth {
            return Err(self.schema_err(SchemaError::RecursionLimit {
                type_name: schema.name().to_string(),
                limit: self.config.max_depth,
            }));
        }

        let outer_type = std::mem::replace(&mut self.type_name, schema.shared_name());
        let outer_field = std::mem::replace(&mut self.field, Arc::from(""));
        self.depth += 1;

        let record = self.walk(schema)?;

        self.depth -= 1;
        self.type_name = outer_type;
        self.field = outer_field;
        Ok(record)
    }

    /// The field walk: inline fields in declaration order, then deferred
    /// fields at their offsets, then back to the end of the inline region.
    fn walk(&mut self, schema: &StructSchema) -> Result<Record, DecodeError> {
        let fields = schema.fields();
        let mut slots: Vec<Option<Value>> = vec![None; fields.len()];
        let mut deferred = Vec::new();

        for (index, field) in fields.iter().enumerate() {
            self.enter_field(field);

            if field.is_skipped() {
                let depth_left = self.config.max_depth.saturating_sub(self.depth);
                let value = self
                    .registry
                    .default_value(field.ty(), depth_left)
                    .map_err(|e| self.schema_err(e))?;
                slots[index] = Some(value);
                continue;
            }

            if field.is_current_offset() {
                slots[index] = Some(self.current_offset_value(field)?);
                continue;
            }

            if field.is_deferred() {
                deferred.push(index);
                continue;
            }

            self.cursor
                .align_to(schema.alignment_for(field))
                .map_err(|e| self.wire_err(e))?;
            self.field_start = self.cursor.position();
            trace!(
                type_name = schema.name(),
                field = field.name(),
                offset = self.field_start,
                "decoding field"
            );
            let value = self.read_field(schema, field, &slots)?;
            slots[index] = Some(value);
        }

        let end_of_record = self.cursor.position();

        for index in deferred {
            let field = &fields[index];
            self.enter_field(field);
            let target = match field.offset() {
                Some(offset) => offset
                    .resolve(&InstanceView::partial(schema, &slots))
                    .map_err(|e| self.schema_err(e))?,
                None => continue,
            };
            debug!(
                type_name = schema.name(),
                field = field.name(),
                offset = target,
                "seeking to deferred field"
            );
            self.cursor
                .seek_signed(target)
                .map_err(|e| self.wire_err(e))?;
            self.field_start = self.cursor.position();
            let value = self.read_field(schema, field, &slots)?;
            slots[index] = Some(value);
        }

        self.cursor
            .seek_to(end_of_record)
            .map_err(|e| self.wire_err(e))?;

        let mut record = Record::new(schema.shared_name());
        for (field, slot) in fields.iter().zip(slots) {
            if let Some(value) = slot {
                record.push(field.name(), value);
            }
        }
        Ok(record)
    }

    fn current_offset_value(&self, field: &FieldDescriptor) -> Result<Value, DecodeError> {
        let position = self.cursor.position();
        let TypeRef::Primitive(p) = field.ty() else {
            return Err(self.unsupported(field.ty()));
        };
        i64::try_from(position)
            .ok()
            .and_then(|v| Value::from_integer(*p, v))
            .ok_or_else(|| {
                self.schema_err(SchemaError::ValueOutOfRange {
                    field: field.name().to_string(),
                    ty: p.name(),
                    value: position,
                })
            })
    }

    // ── Fields ────────────────────────────────────────────────────────

    fn read_field(
        &mut self,
        schema: &StructSchema,
        field: &FieldDescriptor,
        slots: &[Option<Value>],
    ) -> Result<Value, DecodeError> {
        let view = InstanceView::partial(schema, slots);
        let ty = field
            .effective_type(&view)
            .map_err(|e| self.schema_err(e))?;
        let endian = schema.endian_for(field, self.config.endian);

        match ty {
            TypeRef::Array(element) => {
                let Some(size) = field.size() else {
                    return Err(self.schema_err(SchemaError::MissingArraySize {
                        type_name: schema.name().to_string(),
                        field: field.name().to_string(),
                    }));
                };
                self.read_array(element, size, endian, &view)
            }
            other => self.read_value(other, endian),
        }
    }

    fn read_array(
        &mut self,
        element: &TypeRef,
        size: &ArraySize,
        endian: Endian,
        view: &InstanceView<'_>,
    ) -> Result<Value, DecodeError> {
        match size {
            ArraySize::Fixed(count) => self.read_counted(element, *count, endian),
            ArraySize::Member(member) => {
                let count = member.resolve(view).map_err(|e| self.schema_err(e))?;
                let count = u64::try_from(count).map_err(|_| {
                    self.schema_err(SchemaError::InvalidCount {
                        member: member.to_string(),
                        value: count,
                    })
                })?;
                self.read_counted(element, count, endian)
            }
            ArraySize::DefaultTerminated => self.read_terminated(element, endian),
            ArraySize::EndOfStream => self.read_to_end(element, endian),
        }
    }

    fn read_counted(&mut self, element: &TypeRef, count: u64, endian: Endian) -> Result<Value, DecodeError> {
        if *element == TypeRef::U8 {
            let bytes = self.cursor.read_bytes(count).map_err(|e| self.wire_err(e))?;
            return Ok(Value::Bytes(bytes));
        }
        // Every element consumes at least one byte, so the remaining
        // length bounds the allocation.
        let capacity = usize::try_from(count.min(self.cursor.remaining())).unwrap_or(0);
        let mut items = Vec::with_capacity(capacity);
        for _ in 0..count {
            let before = self.cursor.position();
            items.push(self.read_element(element, endian)?);
            if self.cursor.position() == before {
                // The count comes from the input, so zero-width elements
                // would repeat without bound.
                return Err(self.unsupported(element));
            }
        }
        Ok(Value::Array(items))
    }

    /// Read until an element equals the element type's default value. The
    /// terminator is kept as the last element.
    ///
    /// A struct element whose default holds an empty array or a zero
    /// current offset never matches what the wire decodes to, so such
    /// arrays run until the input ends.
    fn read_terminated(&mut self, element: &TypeRef, endian: Endian) -> Result<Value, DecodeError> {
        if *element == TypeRef::U8 {
            let mut bytes = Vec::new();
            loop {
                let byte = self.cursor.read_u8().map_err(|e| self.wire_err(e))?;
                bytes.push(byte);
                if byte == 0 {
                    return Ok(Value::Bytes(bytes));
                }
            }
        }

        let depth_left = self.config.max_depth.saturating_sub(self.depth);
        let terminator = self
            .registry
            .default_value(element, depth_left)
            .map_err(|e| self.schema_err(e))?;
        let mut items = Vec::new();
        loop {
            let before = self.cursor.position();
            let item = self.read_element(element, endian)?;
            let done = item == terminator;
            items.push(item);
            if done {
                return Ok(Value::Array(items));
            }
            if self.cursor.position() == before {
                return Err(self.unsupported(element));
            }
        }
    }

    fn read_to_end(&mut self, element: &TypeRef, endian: Endian) -> Result<Value, DecodeError> {
        if *element == TypeRef::U8 {
            let remaining = self.cursor.remaining();
            return self.read_counted(element, remaining, endian);
        }
        let mut items = Vec::new();
        while !self.cursor.is_eof() {
            let before = self.cursor.position();
            items.push(self.read_element(element, endian)?);
            if self.cursor.position() == before {
                // A zero-width element would never reach the end.
                return Err(self.unsupported(element));
            }
        }
        Ok(Value::Array(items))
    }

    fn read_element(&mut self, element: &TypeRef, endian: Endian) -> Result<Value, DecodeError> {
        if element.is_array() {
            return Err(self.unsupported(&TypeRef::array_of(element.clone())));
        }
        self.read_value(element, endian)
    }

    // ── Values ────────────────────────────────────────────────────────

    fn read_value(&mut self, ty: &TypeRef, endian: Endian) -> Result<Value, DecodeError> {
        match ty {
            TypeRef::Primitive(p) => self.read_primitive(*p, endian),
            TypeRef::String => {
                let bytes = self.cursor.read_cstring().map_err(|e| self.wire_err(e))?;
                Ok(Value::String(String::from_utf8_lossy(&bytes).into_owned()))
            }
            TypeRef::Named(name) => {
                let registry = self.registry;
                match registry.get(name) {
                    Some(TypeDef::Struct(schema)) => Ok(Value::Struct(self.decode_struct(schema)?)),
                    Some(TypeDef::Enum(def)) => {
                        let raw = self.read_primitive(def.repr(), endian)?;
                        let raw = raw
                            .integer()
                            .ok_or_else(|| self.unsupported(ty))?;
                        Ok(Value::Enum(def.value(raw)))
                    }
                    None => Err(self.unsupported(ty)),
                }
            }
            TypeRef::Array(_) => Err(self.unsupported(ty)),
        }
    }

    fn read_primitive(&mut self, p: Primitive, endian: Endian) -> Result<Value, DecodeError> {
        let cursor = &mut *self.cursor;
        let value = match p {
            Primitive::U8 => cursor.read_scalar(endian).map(Value::U8),
            Primitive::I8 => cursor.read_scalar(endian).map(Value::I8),
            Primitive::U16 => cursor.read_scalar(endian).map(Value::U16),
            Primitive::I16 => cursor.read_scalar(endian).map(Value::I16),
            Primitive::U32 => cursor.read_scalar(endian).map(Value::U32),
            Primitive::I32 => cursor.read_scalar(endian).map(Value::I32),
            Primitive::U64 => cursor.read_scalar(endian).map(Value::U64),
            Primitive::I64 => cursor.read_scalar(endian).map(Value::I64),
            Primitive::F32 => cursor.read_scalar(endian).map(Value::F32),
            Primitive::F64 => cursor.read_scalar(endian).map(Value::F64),
        };
        value.map_err(|e| self.wire_err(e))
    }
}
