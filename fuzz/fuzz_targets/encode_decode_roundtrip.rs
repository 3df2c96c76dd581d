#![no_main]

use arbitrary::{Arbitrary, Unstructured};
use declbin_decoder::LayoutDecoder;
use declbin_encoder::LayoutEncoder;
use declbin_schema::{FieldDescriptor, Record, SchemaRegistry, StructSchema, TypeRef, Value};
use declbin_wire::ByteCursor;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    text_payload: bool,
    items: Vec<u8>,
    words: Vec<u16>,
    name: String,
    word: u16,
    wide: u64,
    big: bool,
}

fn registry() -> Option<SchemaRegistry> {
    let mut registry = SchemaRegistry::new();
    registry
        .register_struct(
            StructSchema::builder("Word")
                .field(FieldDescriptor::new("value", TypeRef::U16))
                .build()
                .ok()?,
        )
        .ok()?;
    registry
        .register_struct(
            StructSchema::builder("Text")
                .field(FieldDescriptor::new("text", TypeRef::String))
                .build()
                .ok()?,
        )
        .ok()?;
    registry
        .register_struct(
            StructSchema::builder("Fuzzed")
                .field(FieldDescriptor::new("tag", TypeRef::U8))
                .field(FieldDescriptor::new("count", TypeRef::U16).big_endian())
                .field(FieldDescriptor::new("items", TypeRef::bytes()).size_from("count"))
                .field(FieldDescriptor::new("words", TypeRef::array_of(TypeRef::U16)).default_terminated())
                .field(FieldDescriptor::new("name", TypeRef::String))
                .field(FieldDescriptor::new("wide", TypeRef::U64).align(8))
                .field(
                    FieldDescriptor::new("payload", TypeRef::named("Word"))
                        .read_as("tag", 1, TypeRef::named("Text")),
                )
                .build()
                .ok()?,
        )
        .ok()?;
    Some(registry)
}

// Fuzz target: LayoutEncoder -> LayoutDecoder roundtrip.
//
// Builds records from structured input, encodes them, and decodes the
// result. Anything the encoder accepts must decode back to the same record.
fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);
    let Ok(input) = FuzzInput::arbitrary(&mut u) else {
        return;
    };
    let Some(registry) = registry() else {
        return;
    };
    let Ok(count) = u16::try_from(input.items.len()) else {
        return;
    };

    // Interior zeros would end the terminated array early.
    let mut words: Vec<Value> = input
        .words
        .iter()
        .filter(|w| **w != 0)
        .map(|w| Value::U16(*w))
        .collect();
    words.push(Value::U16(0));

    let payload = if input.text_payload {
        Record::new("Text").with("text", input.name.as_str())
    } else {
        Record::new("Word").with("value", input.word)
    };
    let record = Record::new("Fuzzed")
        .with("tag", u8::from(input.text_payload))
        .with("count", count)
        .with("items", Value::Bytes(input.items.clone()))
        .with("words", Value::Array(words))
        .with("name", input.name.as_str())
        .with("wide", input.wide)
        .with("payload", payload);

    let encoder = if input.big {
        LayoutEncoder::with_config(declbin_encoder::EncoderConfig {
            endian: declbin_wire::Endian::Big,
        })
    } else {
        LayoutEncoder::new()
    };
    // Strings with a NUL byte are rejected by the encoder.
    let Ok(bytes) = encoder.encode_record(&registry, &record) else {
        return;
    };

    let decoder = if input.big {
        LayoutDecoder::with_config(declbin_decoder::DecoderConfig::default().big_endian())
    } else {
        LayoutDecoder::new()
    };
    let decoded = decoder.decode_record(&registry, "Fuzzed", &mut ByteCursor::from_slice(&bytes));
    assert!(decoded.is_ok(), "decoder failed on valid encoder output: {:?}", decoded.err());

    let decoded = decoded.unwrap();
    assert_eq!(decoded.record, record);
    assert_eq!(decoded.end, bytes.len() as u64);
});
