/// Implementation of `declbin inspect`.
///
/// Prints three sections: the types the schema declares, the decoded root
/// record with its byte range, and (with `--show-hex`) a hex dump of the
/// bytes the root record covered inline.
///
/// # Example output
///
/// ```text
/// Schema: root Archive, 2 types
///   struct Archive
///     count     u32
///     items     u8[]     size=count
///   enum Kind: u8
///     File = 1
/// ---
/// Archive @ 0..7 of 7
///   count: u32 = 3
///   items: u8[3] = aabbcc
/// ---
/// Trailing bytes: 0
/// ```
use std::fmt::Write as _;

use anyhow::Result;
use declbin_decoder::DecodedRecord;
use declbin_driver::{OutputMode, RenderConfig};
use declbin_driver::render_tree::TreeRenderer;
use declbin_schema::{ArraySize, EnumDef, FieldDescriptor, Offset, StructSchema, TypeDef};

use crate::InspectArgs;
use crate::input::{self, LoadedSchema};

/// Run the `declbin inspect` command.
///
/// # Errors
///
/// Returns an error if either file cannot be read, the schema is invalid,
/// or decoding fails.
pub fn run(args: &InspectArgs) -> Result<()> {
    let schema = input::load_schema(&args.schema)?;
    let bytes = input::read_file(&args.file)?;

    print!("{}", schema_summary(&schema));
    println!("---");

    let decoded = input::decode_bytes(&schema, &bytes, input::decoder_config(args.big_endian))?;
    let config = RenderConfig {
        mode: OutputMode::Tree,
        max_bytes: 32,
        show_offsets: true,
    };
    print!("{}", TreeRenderer::render(&decoded, &config));

    if args.show_hex {
        println!("---");
        print!("{}", hex_dump(&bytes, &decoded));
    }

    println!("---");
    println!("Trailing bytes: {}", decoded.trailing_bytes());

    Ok(())
}

// ── Schema summary ────────────────────────────────────────────────────────────

fn schema_summary(schema: &LoadedSchema) -> String {
    let count = schema.registry.len();
    let mut out = format!(
        "Schema: root {}, {count} type{}\n",
        schema.root(),
        if count == 1 { "" } else { "s" }
    );
    for def in schema.registry.iter() {
        match def {
            TypeDef::Struct(s) => describe_struct(&mut out, s),
            TypeDef::Enum(e) => describe_enum(&mut out, e),
        }
    }
    out
}

fn describe_struct(out: &mut String, schema: &StructSchema) {
    let _ = write!(out, "  struct {}", schema.name());
    if let Some(endian) = schema.endian() {
        let _ = write!(out, "  endian={endian:?}");
    }
    if schema.alignment() > 1 {
        let _ = write!(out, "  align={}", schema.alignment());
    }
    out.push('\n');

    let width = schema
        .fields()
        .iter()
        .map(|f| f.name().len())
        .max()
        .unwrap_or(0);
    for field in schema.fields() {
        let _ = writeln!(
            out,
            "    {:<width$}  {:<8}{}",
            field.name(),
            field.ty().to_string(),
            field_attributes(field)
        );
    }
}

fn describe_enum(out: &mut String, def: &EnumDef) {
    let _ = writeln!(out, "  enum {}: {}", def.name(), def.repr());
    for (name, value) in def.variants() {
        let _ = writeln!(out, "    {name} = {value}");
    }
}

/// Space-separated `key=value` attributes, each preceded by a space.
fn field_attributes(field: &FieldDescriptor) -> String {
    let mut attrs = String::new();
    match field.size() {
        Some(ArraySize::Fixed(n)) => {
            let _ = write!(attrs, " size={n}");
        }
        Some(ArraySize::Member(member)) => {
            let _ = write!(attrs, " size={member}");
        }
        Some(ArraySize::DefaultTerminated) => attrs.push_str(" size=terminated"),
        Some(ArraySize::EndOfStream) => attrs.push_str(" size=eof"),
        None => {}
    }
    match field.offset() {
        Some(Offset::Absolute(offset)) => {
            let _ = write!(attrs, " offset={offset}");
        }
        Some(Offset::Member(member)) => {
            let _ = write!(attrs, " offset={member}");
        }
        None => {}
    }
    if field.alignment() > 1 {
        let _ = write!(attrs, " align={}", field.alignment());
    }
    if let Some(endian) = field.endianness() {
        let _ = write!(attrs, " endian={endian:?}");
    }
    if field.is_skipped() {
        attrs.push_str(" skip");
    }
    if field.is_current_offset() {
        attrs.push_str(" current_offset");
    }
    for rule in field.rules() {
        let _ = write!(attrs, " {}=={}→{}", rule.discriminator, rule.value, rule.ty);
    }
    attrs
}

// ── Hex dump ──────────────────────────────────────────────────────────────────

/// 16 bytes per line over the root record's inline range, offsets absolute.
fn hex_dump(bytes: &[u8], decoded: &DecodedRecord) -> String {
    let start = usize::try_from(decoded.start).unwrap_or(usize::MAX).min(bytes.len());
    let end = usize::try_from(decoded.end).unwrap_or(usize::MAX).min(bytes.len());
    let mut out = format!("Hex dump {start}..{end}:\n");
    for (i, chunk) in bytes[start..end].chunks(16).enumerate() {
        let offset = start + i * 16;
        let hex: String = chunk
            .iter()
            .fold(String::with_capacity(chunk.len() * 3), |mut s, b| {
                if !s.is_empty() {
                    s.push(' ');
                }
                let _ = write!(s, "{b:02x}");
                s
            });
        let ascii: String = chunk
            .iter()
            .map(|&b| if b.is_ascii_graphic() { b as char } else { '.' })
            .collect();
        let _ = writeln!(out, "  {offset:04x}  {hex:<48}  {ascii}");
    }
    out
}
