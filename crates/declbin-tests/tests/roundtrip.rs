//! Encoder and decoder agreement.
//!
//! Each test writes a value with `LayoutEncoder` and reads it back with
//! `LayoutDecoder` (or the reverse, starting from hand-assembled bytes),
//! and asserts the two sides agree exactly.

use declbin_decoder::{DecodeError, LayoutDecoder};
use declbin_driver::{json_to_record, value_to_json};
use declbin_encoder::{EncodeError, EncoderConfig, LayoutEncoder};
use declbin_schema::{
    FieldDescriptor, IntoRecord, Record, SchemaDocument, SchemaRegistry, StructSchema, TypeRef,
    Value,
};
use declbin_tests::{
    ARCHIVE_SCHEMA_JSON, Archive, Entry, Kind, Payload, SAMPLE_ARCHIVE_BYTES, Tagged, TypeA, TypeB,
    sample_archive,
};
use declbin_wire::{ByteCursor, Endian};

fn encode<T: declbin_schema::BinaryLayout + IntoRecord>(value: &T) -> Vec<u8> {
    LayoutEncoder::new()
        .encode(value)
        .unwrap_or_else(|e| panic!("encode failed: {e}"))
}

fn decode<T: declbin_schema::BinaryLayout>(bytes: &[u8]) -> T {
    LayoutDecoder::new()
        .decode_bytes(bytes)
        .unwrap_or_else(|e| panic!("decode failed: {e}"))
}

// ── Typed layouts ─────────────────────────────────────────────────────────────

#[test]
fn archive_encodes_to_reference_bytes() {
    assert_eq!(encode(&sample_archive()), SAMPLE_ARCHIVE_BYTES);
}

#[test]
fn archive_round_trip() {
    let archive = sample_archive();
    let decoded: Archive = decode(&encode(&archive));
    assert_eq!(decoded, archive);
}

#[test]
fn archive_with_no_entries() {
    let mut archive = sample_archive();
    archive.header.entry_count = 0;
    archive.entries.clear();
    let bytes = encode(&archive);
    // The empty table still starts at table_offset, so the gap is padded.
    assert_eq!(bytes.len(), 16);
    let decoded: Archive = decode(&bytes);
    assert_eq!(decoded, archive);
}

#[test]
fn current_offset_is_recomputed_not_written() {
    let mut archive = sample_archive();
    archive.here = 999;
    let decoded: Archive = decode(&encode(&archive));
    assert_eq!(decoded.here, 12);
}

#[test]
fn entry_count_must_match_entries() {
    let mut archive = sample_archive();
    archive.entries.pop();
    let err = LayoutEncoder::new().encode(&archive).unwrap_err();
    assert!(matches!(
        err,
        EncodeError::LengthMismatch {
            expected: 2,
            actual: 1,
            ..
        }
    ));
}

#[test]
fn unknown_kind_survives_round_trip() {
    let mut archive = sample_archive();
    archive.entries[1].kind = Kind::Other(7);
    let decoded: Archive = decode(&encode(&archive));
    assert_eq!(decoded.entries[1].kind, Kind::Other(7));
}

#[test]
fn tagged_round_trip_for_both_payloads() {
    let a = Tagged {
        tag: 0,
        payload: Payload::A(TypeA { value: 0xBEEF }),
    };
    let bytes = encode(&a);
    assert_eq!(bytes, [0x00, 0xEF, 0xBE]);
    assert_eq!(decode::<Tagged>(&bytes), a);

    let b = Tagged {
        tag: 1,
        payload: Payload::B(TypeB {
            id: 7,
            label: "seven".to_string(),
        }),
    };
    let bytes = encode(&b);
    assert_eq!(bytes, b"\x01\x07\x00\x00\x00seven\x00");
    assert_eq!(decode::<Tagged>(&bytes), b);
}

#[test]
fn entry_round_trip_alone() {
    let entry = Entry {
        kind: Kind::Dir,
        size: 0x0102_0304,
        name: String::new(),
    };
    let bytes = encode(&entry);
    assert_eq!(bytes, [0x02, 0x04, 0x03, 0x02, 0x01, 0x00]);
    assert_eq!(decode::<Entry>(&bytes), entry);
}

// ── Schema-level records ──────────────────────────────────────────────────────

fn counted_registry() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    registry
        .register_struct(
            StructSchema::builder("Counted")
                .field(FieldDescriptor::new("count", TypeRef::U16))
                .field(FieldDescriptor::new("items", TypeRef::bytes()).size_from("count"))
                .field(FieldDescriptor::new("tail", TypeRef::array_of(TypeRef::U16)).default_terminated())
                .build()
                .unwrap(),
        )
        .unwrap();
    registry
}

#[test]
fn record_round_trip_with_terminator_appended() {
    let registry = counted_registry();
    let record = Record::new("Counted")
        .with("count", 2u16)
        .with("items", Value::Bytes(vec![0xAA, 0xBB]))
        .with("tail", vec![5u16]);
    let bytes = LayoutEncoder::new().encode_record(&registry, &record).unwrap();
    assert_eq!(bytes, [0x02, 0x00, 0xAA, 0xBB, 0x05, 0x00, 0x00, 0x00]);

    let decoded = LayoutDecoder::new()
        .decode_record(&registry, "Counted", &mut ByteCursor::from_slice(&bytes))
        .unwrap();
    assert_eq!(
        decoded.record.get("tail"),
        Some(&Value::Array(vec![Value::U16(5), Value::U16(0)]))
    );
    assert_eq!(decoded.end, 8);
}

#[test]
fn big_endian_config_round_trip() {
    let registry = counted_registry();
    let record = Record::new("Counted")
        .with("count", 1u16)
        .with("items", Value::Bytes(vec![0x7F]))
        .with("tail", Value::Array(vec![Value::U16(0)]));
    let bytes = LayoutEncoder::with_config(EncoderConfig {
        endian: Endian::Big,
    })
    .encode_record(&registry, &record)
    .unwrap();
    assert_eq!(bytes, [0x00, 0x01, 0x7F, 0x00, 0x00]);

    let decoded = LayoutDecoder::with_config(declbin_decoder::DecoderConfig::default().big_endian())
        .decode_record(&registry, "Counted", &mut ByteCursor::from_slice(&bytes))
        .unwrap();
    assert_eq!(decoded.record, record);
}

#[test]
fn interior_nul_is_rejected() {
    let entry = Entry {
        kind: Kind::File,
        size: 0,
        name: "a\0b".to_string(),
    };
    let err = LayoutEncoder::new().encode(&entry).unwrap_err();
    assert!(matches!(err, EncodeError::InteriorNul { ref field, .. } if field == "name"));
}

// ── JSON documents ────────────────────────────────────────────────────────────

#[test]
fn schema_document_decodes_reference_bytes() {
    let document = SchemaDocument::from_json(ARCHIVE_SCHEMA_JSON).unwrap();
    let registry = document.build().unwrap();
    let decoded = LayoutDecoder::new()
        .decode_record(&registry, &document.root, &mut ByteCursor::from_slice(&SAMPLE_ARCHIVE_BYTES))
        .unwrap();
    assert_eq!(decoded.end, 15);

    let json = value_to_json(&Value::Struct(decoded.record.clone()));
    assert_eq!(json["magic"], "44424152");
    assert_eq!(json["version"], 1);
    assert_eq!(json["here"], 12);
    assert_eq!(json["entries"][0]["kind"], "File");
    assert_eq!(json["entries"][1]["name"], "docs");

    let record = json_to_record(&json, &registry, &document.root).unwrap();
    assert_eq!(record, decoded.record);
    let bytes = LayoutEncoder::new().encode_record(&registry, &record).unwrap();
    assert_eq!(bytes, SAMPLE_ARCHIVE_BYTES);
}

#[test]
fn typed_and_document_layouts_agree() {
    let typed: Archive = decode(&SAMPLE_ARCHIVE_BYTES);
    let document = SchemaDocument::from_json(ARCHIVE_SCHEMA_JSON).unwrap();
    let registry = document.build().unwrap();
    let flat = LayoutDecoder::new()
        .decode_record(&registry, &document.root, &mut ByteCursor::from_slice(&SAMPLE_ARCHIVE_BYTES))
        .unwrap()
        .record;

    assert_eq!(flat.get("note"), Some(&Value::String(typed.note.clone())));
    let entries = typed
        .entries
        .iter()
        .map(|e| Value::Struct(e.to_record()))
        .collect::<Vec<_>>();
    assert_eq!(flat.get("entries"), Some(&Value::Array(entries)));
}

#[test]
fn truncated_reference_bytes_fail_cleanly() {
    for len in 0..SAMPLE_ARCHIVE_BYTES.len() {
        let result = LayoutDecoder::new().decode_bytes::<Archive>(&SAMPLE_ARCHIVE_BYTES[..len]);
        assert!(
            matches!(result, Err(DecodeError::TruncatedInput { .. })),
            "prefix of {len} bytes: {result:?}"
        );
    }
}
