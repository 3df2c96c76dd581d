#![no_main]

use arbitrary::{Arbitrary, Unstructured};
use declbin_decoder::{DecoderConfig, LayoutDecoder};
use declbin_schema::SchemaDocument;
use declbin_wire::ByteCursor;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    schema: String,
    payload: Vec<u8>,
    big_endian: bool,
}

// Fuzz target: arbitrary schema documents over arbitrary payloads.
//
// Any document that builds must decode without panicking, including
// self-referencing structs, which stop at the depth limit.
fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);
    let Ok(input) = FuzzInput::arbitrary(&mut u) else {
        return;
    };
    let Ok(document) = SchemaDocument::from_json(&input.schema) else {
        return;
    };
    let Ok(registry) = document.build() else {
        return;
    };

    let mut config = DecoderConfig::default().max_depth(16);
    if input.big_endian {
        config = config.big_endian();
    }
    let mut cursor = ByteCursor::from_slice(&input.payload);
    let _ = LayoutDecoder::with_config(config).decode_record(&registry, &document.root, &mut cursor);
});
