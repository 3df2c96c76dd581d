//! Edge cases of the field walk, checked end-to-end through the public
//! decoder API.
//!
//! - **Array policies**: fixed, member-sized, default-terminated and
//!   end-of-stream arrays, including bulk byte arrays and string arrays.
//! - **Ordering**: inline fields consume bytes strictly in declaration
//!   order; deferred fields never move the end of the record.
//! - **Type selection**: a discriminator picks the payload type.
//! - **Failures**: truncation, undecoded members, unknown types and
//!   negative offsets each map to their own error variant with the field
//!   that failed.

use std::io::Cursor;

use declbin_decoder::{DecodeError, DecodedRecord, DecoderConfig, LayoutDecoder, decode};
use declbin_schema::{
    BinaryLayout, FieldDescriptor, Record, SchemaError, SchemaRegistry, StructSchema, TypeRef,
    Value,
};
use declbin_tests::{
    Archive, Kind, Payload, SAMPLE_ARCHIVE_BYTES, Tagged, TypeA, TypeB, sample_archive,
};
use declbin_wire::ByteCursor;

// ── Helpers ───────────────────────────────────────────────────────────────────

fn registry(schemas: impl IntoIterator<Item = StructSchema>) -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    for schema in schemas {
        registry.register_struct(schema).unwrap();
    }
    registry
}

fn single(field: FieldDescriptor) -> SchemaRegistry {
    registry([StructSchema::builder("T").field(field).build().unwrap()])
}

fn decode_root(registry: &SchemaRegistry, root: &str, bytes: &[u8]) -> Result<DecodedRecord, DecodeError> {
    let mut cursor = ByteCursor::from_slice(bytes);
    LayoutDecoder::new().decode_record(registry, root, &mut cursor)
}

fn field<'a>(decoded: &'a DecodedRecord, name: &str) -> &'a Value {
    decoded
        .record
        .get(name)
        .unwrap_or_else(|| panic!("record has no field {name}"))
}

// ── Arrays ────────────────────────────────────────────────────────────────────

#[test]
fn fixed_byte_array() {
    let registry = single(FieldDescriptor::new("data", TypeRef::bytes()).fixed_size(4));
    let decoded = decode_root(&registry, "T", &[0xAA, 0xBB, 0xCC, 0xDD]).unwrap();
    assert_eq!(field(&decoded, "data"), &Value::Bytes(vec![0xAA, 0xBB, 0xCC, 0xDD]));
    assert_eq!(decoded.end, 4);
}

#[test]
fn member_sized_array() {
    let registry = registry([StructSchema::builder("Counted")
        .field(FieldDescriptor::new("count", TypeRef::U32))
        .field(FieldDescriptor::new("items", TypeRef::bytes()).size_from("count"))
        .build()
        .unwrap()]);
    let decoded = decode_root(&registry, "Counted", &[0x03, 0, 0, 0, 0xAA, 0xBB, 0xCC]).unwrap();
    assert_eq!(field(&decoded, "count"), &Value::U32(3));
    assert_eq!(field(&decoded, "items"), &Value::Bytes(vec![0xAA, 0xBB, 0xCC]));
}

#[test]
fn end_of_stream_array_takes_every_remaining_byte() {
    let registry = single(FieldDescriptor::new("rest", TypeRef::bytes()).until_eof());
    let decoded = decode_root(&registry, "T", &[1, 2, 3, 4, 5]).unwrap();
    assert_eq!(field(&decoded, "rest"), &Value::Bytes(vec![1, 2, 3, 4, 5]));
}

#[test]
fn end_of_stream_array_of_u16() {
    let registry = single(FieldDescriptor::new("rest", TypeRef::array_of(TypeRef::U16)).until_eof());
    let decoded = decode_root(&registry, "T", &[1, 0, 2, 0]).unwrap();
    assert_eq!(
        field(&decoded, "rest"),
        &Value::Array(vec![Value::U16(1), Value::U16(2)])
    );
}

#[test]
fn default_terminated_array_keeps_terminator() {
    let registry = single(
        FieldDescriptor::new("values", TypeRef::array_of(TypeRef::U16)).default_terminated(),
    );
    let decoded = decode_root(&registry, "T", &[0x01, 0x00, 0x02, 0x00, 0x00, 0x00, 0xFF]).unwrap();
    assert_eq!(
        field(&decoded, "values"),
        &Value::Array(vec![Value::U16(1), Value::U16(2), Value::U16(0)])
    );
    assert_eq!(decoded.end, 6);
    assert_eq!(decoded.trailing_bytes(), 1);
}

#[test]
fn string_array_reads_consecutive_strings() {
    let registry = single(
        FieldDescriptor::new("names", TypeRef::array_of(TypeRef::String)).fixed_size(2),
    );
    let decoded = decode_root(&registry, "T", b"ab\0c\0").unwrap();
    assert_eq!(
        field(&decoded, "names"),
        &Value::Array(vec![
            Value::String("ab".to_string()),
            Value::String("c".to_string())
        ])
    );
}

// ── Strings ───────────────────────────────────────────────────────────────────

#[test]
fn nul_terminated_strings() {
    let registry = single(FieldDescriptor::new("s", TypeRef::String));

    let decoded = decode_root(&registry, "T", &[0x48, 0x65, 0x6C, 0x6C, 0x6F, 0x00]).unwrap();
    assert_eq!(field(&decoded, "s"), &Value::String("Hello".to_string()));

    let decoded = decode_root(&registry, "T", &[0x00]).unwrap();
    assert_eq!(field(&decoded, "s"), &Value::String(String::new()));
}

#[test]
fn unterminated_string_is_truncated_input() {
    let registry = single(FieldDescriptor::new("s", TypeRef::String));
    let err = decode_root(&registry, "T", b"abc").unwrap_err();
    assert!(matches!(err, DecodeError::TruncatedInput { .. }));
    assert_eq!(err.context().field, "s");
}

// ── Ordering ──────────────────────────────────────────────────────────────────

#[test]
fn declaration_order_decides_byte_mapping() {
    let ab = StructSchema::builder("AB")
        .field(FieldDescriptor::new("a", TypeRef::U8))
        .field(FieldDescriptor::new("b", TypeRef::U16))
        .build()
        .unwrap();
    let ba = StructSchema::builder("BA")
        .field(FieldDescriptor::new("b", TypeRef::U16))
        .field(FieldDescriptor::new("a", TypeRef::U8))
        .build()
        .unwrap();
    let registry = registry([ab, ba]);
    let bytes = [0x01, 0x02, 0x03];

    let decoded = decode_root(&registry, "AB", &bytes).unwrap();
    assert_eq!(field(&decoded, "a"), &Value::U8(0x01));
    assert_eq!(field(&decoded, "b"), &Value::U16(0x0302));

    let decoded = decode_root(&registry, "BA", &bytes).unwrap();
    assert_eq!(field(&decoded, "b"), &Value::U16(0x0201));
    assert_eq!(field(&decoded, "a"), &Value::U8(0x03));
}

#[test]
fn deferred_fields_do_not_move_end_of_record() {
    let decoded = decode_root(
        &SchemaRegistry::of::<Archive>().unwrap(),
        "Archive",
        &SAMPLE_ARCHIVE_BYTES,
    )
    .unwrap();
    // The entry table sits at 16..37; the inline region ends after the note.
    assert_eq!(decoded.end, 15);
    assert_eq!(decoded.stream_len, 37);
    let names: Vec<_> = decoded.record.fields().map(|(name, _)| name).collect();
    assert_eq!(names, ["header", "here", "reserved", "note", "entries"]);
}

#[test]
fn alignment_pads_before_field() {
    let registry = registry([StructSchema::builder("Padded")
        .field(FieldDescriptor::new("a", TypeRef::U8))
        .field(FieldDescriptor::new("b", TypeRef::U32).align(4))
        .build()
        .unwrap()]);
    let decoded = decode_root(&registry, "Padded", &[0x01, 0xEE, 0xEE, 0xEE, 0x02, 0, 0, 0]).unwrap();
    assert_eq!(field(&decoded, "b"), &Value::U32(2));
    assert_eq!(decoded.end, 8);
}

#[test]
fn configured_byte_order_applies_without_override() {
    let registry = single(FieldDescriptor::new("n", TypeRef::U16));
    let mut cursor = ByteCursor::from_slice(&[0x01, 0x02]);
    let decoded = LayoutDecoder::with_config(DecoderConfig::default().big_endian())
        .decode_record(&registry, "T", &mut cursor)
        .unwrap();
    assert_eq!(field(&decoded, "n"), &Value::U16(0x0102));
}

// ── Typed layouts ─────────────────────────────────────────────────────────────

#[test]
fn typed_archive_decodes_every_feature() {
    let archive: Archive = LayoutDecoder::new().decode_bytes(&SAMPLE_ARCHIVE_BYTES).unwrap();
    assert_eq!(archive, sample_archive());
    assert_eq!(archive.here, 12);
    assert_eq!(archive.entries[0].kind, Kind::File);
    assert_eq!(archive.entries[1].name, "docs");
}

#[test]
fn unknown_enum_raw_value_is_kept() {
    let mut bytes = SAMPLE_ARCHIVE_BYTES;
    bytes[16] = 0x09;
    let archive: Archive = decode(Cursor::new(&bytes[..])).unwrap();
    assert_eq!(archive.entries[0].kind, Kind::Other(9));
}

#[test]
fn discriminator_selects_type_b() {
    let bytes = [0x01, 0x07, 0x00, 0x00, 0x00, b'x', 0x00];
    let tagged: Tagged = LayoutDecoder::new().decode_bytes(&bytes).unwrap();
    assert_eq!(
        tagged.payload,
        Payload::B(TypeB {
            id: 7,
            label: "x".to_string()
        })
    );
}

#[test]
fn discriminator_selects_type_a() {
    let tagged: Tagged = LayoutDecoder::new().decode_bytes(&[0x00, 0x34, 0x12]).unwrap();
    assert_eq!(tagged.payload, Payload::A(TypeA { value: 0x1234 }));
}

#[test]
fn unmatched_discriminator_uses_declared_type() {
    let tagged: Tagged = LayoutDecoder::new().decode_bytes(&[0x05, 0x01, 0x00]).unwrap();
    assert_eq!(tagged.tag, 5);
    assert_eq!(tagged.payload, Payload::A(TypeA { value: 1 }));
}

#[derive(Debug, PartialEq)]
struct Sample {
    value: u16,
    first: u8,
}

impl BinaryLayout for Sample {
    const NAME: &'static str = "Sample";

    fn schema() -> Result<StructSchema, SchemaError> {
        StructSchema::builder(Self::NAME)
            .field(FieldDescriptor::new("value", TypeRef::U16))
            .field(FieldDescriptor::new("first", TypeRef::U8).at_offset(0))
            .build()
    }

    fn from_record(mut record: Record) -> Result<Self, SchemaError> {
        Ok(Self {
            value: record.take("value")?,
            first: record.take("first")?,
        })
    }
}

#[test]
fn records_continue_after_each_inline_region() {
    let bytes = [0x01, 0x00, 0x02, 0x00, 0x03, 0x00];
    let samples: Vec<Sample> = LayoutDecoder::new()
        .records_in(&bytes)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(
        samples,
        [
            Sample { value: 1, first: 1 },
            Sample { value: 2, first: 1 },
            Sample { value: 3, first: 1 },
        ]
    );
}

#[test]
fn decode_file_reads_from_disk() {
    let path = std::env::temp_dir().join(format!("declbin-edge-{}.bin", std::process::id()));
    std::fs::write(&path, SAMPLE_ARCHIVE_BYTES).unwrap();
    let result = LayoutDecoder::new().decode_file::<Archive>(&path);
    std::fs::remove_file(&path).unwrap();
    assert_eq!(result.unwrap(), sample_archive());
}

// ── Failures ──────────────────────────────────────────────────────────────────

#[test]
fn truncated_fixed_width_read() {
    let registry = single(FieldDescriptor::new("n", TypeRef::U32));
    let err = decode_root(&registry, "T", &[0xAA, 0xBB]).unwrap_err();
    let DecodeError::TruncatedInput {
        needed,
        available,
        context,
    } = err
    else {
        panic!("expected truncated input");
    };
    assert_eq!((needed, available), (4, 2));
    assert_eq!(context.type_name, "T");
    assert_eq!(context.field, "n");
    assert_eq!(context.offset, 0);
}

#[test]
fn truncated_entry_table_names_innermost_field() {
    let err = LayoutDecoder::new()
        .decode_bytes::<Archive>(&SAMPLE_ARCHIVE_BYTES[..30])
        .unwrap_err();
    assert!(matches!(err, DecodeError::TruncatedInput { .. }));
    assert_eq!(err.context().type_name, "Entry");
    assert_eq!(err.context().field, "size");
    assert_eq!(err.context().offset, 28);
}

#[test]
fn member_declared_later_is_not_decoded_yet() {
    let registry = registry([StructSchema::builder("Late")
        .field(FieldDescriptor::new("items", TypeRef::bytes()).size_from("count"))
        .field(FieldDescriptor::new("count", TypeRef::U32))
        .build()
        .unwrap()]);
    let err = decode_root(&registry, "Late", &[0; 8]).unwrap_err();
    assert!(matches!(
        err,
        DecodeError::Schema {
            source: SchemaError::MemberNotDecoded { .. },
            ..
        }
    ));
    assert_eq!(err.context().field, "items");
}

#[test]
fn unregistered_type_is_unsupported() {
    let registry = single(FieldDescriptor::new("inner", TypeRef::named("Missing")));
    let err = decode_root(&registry, "T", &[0; 4]).unwrap_err();
    assert!(matches!(err, DecodeError::UnsupportedType { ref ty, .. } if ty == "Missing"));
}

#[test]
fn negative_offset_is_an_io_error() {
    let registry = registry([StructSchema::builder("Neg")
        .field(FieldDescriptor::new("at", TypeRef::I8))
        .field(FieldDescriptor::new("value", TypeRef::U8).offset_from("at"))
        .build()
        .unwrap()]);
    let err = decode_root(&registry, "Neg", &[0xFF]).unwrap_err();
    let DecodeError::Io { source, context } = err else {
        panic!("expected an i/o error");
    };
    assert_eq!(source.kind(), std::io::ErrorKind::InvalidInput);
    assert_eq!(context.field, "value");
}

#[test]
fn unknown_member_fails_the_build() {
    let result = StructSchema::builder("Bad")
        .field(FieldDescriptor::new("items", TypeRef::bytes()).size_from("nope"))
        .build();
    assert!(matches!(result, Err(SchemaError::UnknownMember { .. })));
}
