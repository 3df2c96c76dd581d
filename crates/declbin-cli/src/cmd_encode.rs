/// Implementation of `declbin encode`.
///
/// Converts a JSON value document into a record of the schema's root type
/// and writes it with `LayoutEncoder`. The value document has the same
/// shape as `declbin decode --mode json` output, so decode and encode
/// round-trip.
///
/// ```text
/// values.json ──▶ json_to_record ──▶ Record ──▶ LayoutEncoder ──▶ out.bin
///                      ▲                             ▲
///                 SchemaRegistry               EncoderConfig
/// ```
use std::fs;

use anyhow::{Context, Result};
use declbin_driver::json_to_record;
use declbin_encoder::{EncoderConfig, LayoutEncoder};
use declbin_schema::Endian;
use tracing::info;

use crate::EncodeArgs;
use crate::input;

/// Run the `declbin encode` command.
///
/// # Errors
///
/// Returns an error if an input cannot be read, the schema is invalid,
/// the values do not match the schema, or the output cannot be written.
pub fn run(args: &EncodeArgs) -> Result<()> {
    let schema = input::load_schema(&args.schema)?;
    let values = input::read_json(&args.values)?;

    let record = json_to_record(&values, &schema.registry, schema.root())
        .with_context(|| format!("{} does not match {}", args.values.display(), schema.root()))?;

    let endian = if args.big_endian {
        Endian::Big
    } else {
        Endian::Little
    };
    let bytes = LayoutEncoder::with_config(EncoderConfig { endian })
        .encode_record(&schema.registry, &record)
        .with_context(|| format!("failed to encode {}", schema.root()))?;

    fs::write(&args.output, &bytes)
        .with_context(|| format!("cannot write {}", args.output.display()))?;
    info!(root = schema.root(), bytes = bytes.len(), "encoded");
    println!("Wrote {} bytes to {}", bytes.len(), args.output.display());

    Ok(())
}
