//! Conversion between decoded values and JSON.
//!
//! Decoded values go to JSON without a schema: bytes become hex strings,
//! enums their variant name (or raw number when unnamed), structs objects
//! in field order. The reverse direction needs the schema, since JSON
//! cannot tell a `u16` from a `u32` or a hex string from text.

use declbin_schema::{
    FieldDescriptor, InstanceView, Primitive, Record, SchemaError, SchemaRegistry, StructSchema,
    TypeDef, TypeRef, Value,
};
use serde_json::{Map, Number, Value as Json};

use crate::error::RenderError;

/// Depth bound for defaults filled in for omitted fields.
const DEFAULT_VALUE_DEPTH: usize = 64;

pub fn value_to_json(value: &Value) -> Json {
    match value {
        Value::U8(v) => Json::from(*v),
        Value::I8(v) => Json::from(*v),
        Value::U16(v) => Json::from(*v),
        Value::I16(v) => Json::from(*v),
        Value::U32(v) => Json::from(*v),
        Value::I32(v) => Json::from(*v),
        Value::U64(v) => Json::from(*v),
        Value::I64(v) => Json::from(*v),
        Value::F32(v) => Number::from_f64(f64::from(*v)).map_or(Json::Null, Json::Number),
        Value::F64(v) => Number::from_f64(*v).map_or(Json::Null, Json::Number),
        Value::String(s) => Json::String(s.clone()),
        Value::Bytes(bytes) => Json::String(hex::encode(bytes)),
        Value::Array(items) => Json::Array(items.iter().map(value_to_json).collect()),
        Value::Enum(e) => match &e.variant {
            Some(variant) => Json::String(variant.to_string()),
            None => Json::from(e.raw),
        },
        Value::Struct(record) => Json::Object(record_to_map(record)),
    }
}

fn record_to_map(record: &Record) -> Map<String, Json> {
    record
        .fields()
        .map(|(name, value)| (name.to_string(), value_to_json(value)))
        .collect()
}

fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

fn mismatch(path: &str, expected: impl ToString, found: &Json) -> RenderError {
    RenderError::Mismatch {
        path: path.to_string(),
        expected: expected.to_string(),
        found: json_kind(found),
    }
}

/// Build a record of the registered struct `root` from a JSON object.
///
/// Skipped and current-offset fields may be omitted and take their
/// default value. Fields with type rules are converted after the others,
/// so their discriminators can be read from the record.
///
/// # Errors
///
/// - [`RenderError::Schema`] if `root` is not a registered struct or a
///   required field is missing.
/// - The conversion variants of [`RenderError`] for values that do not
///   fit their fields.
pub fn json_to_record(json: &Json, registry: &SchemaRegistry, root: &str) -> Result<Record, RenderError> {
    let schema = registry
        .struct_schema(root)
        .ok_or_else(|| SchemaError::UnknownType {
            name: root.to_string(),
        })?;
    struct_from_json(json, schema, registry, root)
}

/// Convert a JSON value into a [`Value`] of type `ty`. `path` names the
/// value in error messages.
///
/// # Errors
///
/// As [`json_to_record`].
pub fn json_to_value(json: &Json, ty: &TypeRef, registry: &SchemaRegistry, path: &str) -> Result<Value, RenderError> {
    match ty {
        TypeRef::Primitive(p) => primitive_from_json(json, *p, path),
        TypeRef::String => match json {
            Json::String(s) => Ok(Value::String(s.clone())),
            other => Err(mismatch(path, "string", other)),
        },
        TypeRef::Array(element) if **element == TypeRef::U8 => match json {
            Json::String(text) => hex::decode(text.trim())
                .map(Value::Bytes)
                .map_err(|source| RenderError::InvalidHex {
                    path: path.to_string(),
                    source,
                }),
            Json::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    match primitive_from_json(item, Primitive::U8, &format!("{path}[{i}]"))? {
                        Value::U8(byte) => Ok(byte),
                        _ => Err(mismatch(path, "u8", item)),
                    }
                })
                .collect::<Result<Vec<u8>, _>>()
                .map(Value::Bytes),
            other => Err(mismatch(path, "hex string or byte array", other)),
        },
        TypeRef::Array(element) => match json {
            Json::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| json_to_value(item, element, registry, &format!("{path}[{i}]")))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            other => Err(mismatch(path, ty, other)),
        },
        TypeRef::Named(name) => match registry.lookup(name)? {
            TypeDef::Struct(schema) => struct_from_json(json, schema, registry, path).map(Value::Struct),
            TypeDef::Enum(def) => {
                let raw = match json {
                    Json::String(variant) => {
                        def.value_of(variant)
                            .ok_or_else(|| RenderError::UnknownVariant {
                                path: path.to_string(),
                                enum_name: def.name().to_string(),
                                variant: variant.clone(),
                            })?
                    }
                    Json::Number(n) => n.as_i64().ok_or_else(|| mismatch(path, def.repr(), json))?,
                    other => return Err(mismatch(path, format!("{name} variant"), other)),
                };
                if Value::from_integer(def.repr(), raw).is_none() {
                    return Err(RenderError::OutOfRange {
                        path: path.to_string(),
                        ty: def.repr().name(),
                        value: raw.to_string(),
                    });
                }
                Ok(Value::Enum(def.value(raw)))
            }
        },
    }
}

fn struct_from_json(
    json: &Json,
    schema: &StructSchema,
    registry: &SchemaRegistry,
    path: &str,
) -> Result<Record, RenderError> {
    let Json::Object(object) = json else {
        return Err(mismatch(path, schema.name(), json));
    };

    if let Some(key) = object.keys().find(|key| schema.field(key).is_none()) {
        return Err(RenderError::UnexpectedField {
            path: path.to_string(),
            type_name: schema.name().to_string(),
            field: key.clone(),
        });
    }

    // Plain fields first, then rule-typed ones against the partial record.
    let mut partial = Record::new(schema.shared_name());
    let (plain, ruled): (Vec<&FieldDescriptor>, Vec<&FieldDescriptor>) =
        schema.fields().iter().partition(|f| f.rules().is_empty());
    for field in plain.into_iter().chain(ruled) {
        let field_path = format!("{path}.{}", field.name());
        let value = match object.get(field.name()) {
            Some(item) => {
                let view = InstanceView::complete(schema, &partial);
                let ty = field.effective_type(&view)?;
                json_to_value(item, ty, registry, &field_path)?
            }
            None if field.is_skipped() || field.is_current_offset() => {
                registry.default_value(field.ty(), DEFAULT_VALUE_DEPTH)?
            }
            None => {
                return Err(SchemaError::MissingField {
                    type_name: schema.name().to_string(),
                    field: field.name().to_string(),
                }
                .into());
            }
        };
        partial.push(field.name(), value);
    }

    // Back to declaration order.
    let mut record = Record::new(schema.shared_name());
    for field in schema.fields() {
        if let Some(value) = partial.get(field.name()) {
            record.push(field.name(), value.clone());
        }
    }
    Ok(record)
}

#[allow(clippy::cast_possible_truncation)]
fn primitive_from_json(json: &Json, p: Primitive, path: &str) -> Result<Value, RenderError> {
    let Json::Number(n) = json else {
        return Err(mismatch(path, p, json));
    };
    match p {
        Primitive::F32 => n
            .as_f64()
            .map(|v| Value::F32(v as f32))
            .ok_or_else(|| mismatch(path, p, json)),
        Primitive::F64 => n
            .as_f64()
            .map(Value::F64)
            .ok_or_else(|| mismatch(path, p, json)),
        Primitive::U64 => n.as_u64().map(Value::U64).ok_or_else(|| out_of_range(path, p, n)),
        _ => n
            .as_i64()
            .and_then(|v| Value::from_integer(p, v))
            .ok_or_else(|| out_of_range(path, p, n)),
    }
}

fn out_of_range(path: &str, p: Primitive, n: &Number) -> RenderError {
    RenderError::OutOfRange {
        path: path.to_string(),
        ty: p.name(),
        value: n.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use declbin_schema::{EnumDef, FieldDescriptor, StructSchema};
    use serde_json::json;

    use super::*;

    fn registry() -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        registry
            .register_enum(EnumDef::new("Kind", Primitive::U8).unwrap().variant("File", 1))
            .unwrap();
        registry
            .register_struct(
                StructSchema::builder("Entry")
                    .field(FieldDescriptor::new("kind", TypeRef::named("Kind")))
                    .field(FieldDescriptor::new("size", TypeRef::U16))
                    .field(FieldDescriptor::new("data", TypeRef::bytes()).size_from("size"))
                    .field(FieldDescriptor::new("here", TypeRef::U32).current_offset())
                    .build()
                    .unwrap(),
            )
            .unwrap();
        registry
    }

    #[test]
    fn record_from_json_in_declaration_order() {
        let registry = registry();
        let record = json_to_record(
            &json!({ "data": "aabb", "size": 2, "kind": "File" }),
            &registry,
            "Entry",
        )
        .unwrap();
        let names: Vec<_> = record.fields().map(|(n, _)| n).collect();
        assert_eq!(names, ["kind", "size", "data", "here"]);
        assert_eq!(record.get("data"), Some(&Value::Bytes(vec![0xAA, 0xBB])));
        assert_eq!(record.get("here"), Some(&Value::U32(0)));
    }

    #[test]
    fn json_round_trip_of_values() {
        let registry = registry();
        let json = json!({ "kind": "File", "size": 1, "data": [7], "here": 0 });
        let record = json_to_record(&json, &registry, "Entry").unwrap();
        assert_eq!(
            value_to_json(&Value::Struct(record)),
            json!({ "kind": "File", "size": 1, "data": "07", "here": 0 })
        );
    }

    #[test]
    fn conversion_errors_name_the_path() {
        let registry = registry();
        let err = json_to_record(
            &json!({ "kind": "Pipe", "size": 0, "data": "" }),
            &registry,
            "Entry",
        )
        .unwrap_err();
        assert!(matches!(err, RenderError::UnknownVariant { ref path, .. } if path == "Entry.kind"));

        let err = json_to_record(
            &json!({ "kind": 1, "size": 70000, "data": "" }),
            &registry,
            "Entry",
        )
        .unwrap_err();
        assert!(matches!(err, RenderError::OutOfRange { ty: "u16", .. }));

        let err = json_to_record(
            &json!({ "kind": 1, "size": 0, "data": "", "extra": 1 }),
            &registry,
            "Entry",
        )
        .unwrap_err();
        assert!(matches!(err, RenderError::UnexpectedField { .. }));
    }

    #[test]
    fn missing_required_field_is_reported() {
        let registry = registry();
        let err = json_to_record(&json!({ "kind": 1 }), &registry, "Entry").unwrap_err();
        assert!(matches!(
            err,
            RenderError::Schema(SchemaError::MissingField { .. })
        ));
    }
}
