//! Loading schema documents and binary inputs shared by every command.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use declbin_decoder::{DecodedRecord, DecoderConfig, LayoutDecoder};
use declbin_schema::{SchemaDocument, SchemaRegistry, TypeDef};
use declbin_wire::ByteCursor;

/// A parsed schema document and the registry built from it.
pub struct LoadedSchema {
    pub document: SchemaDocument,
    pub registry: SchemaRegistry,
}

impl LoadedSchema {
    pub fn root(&self) -> &str {
        &self.document.root
    }
}

/// Parse and build the schema document at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be opened, is not a schema
/// document, or declares an invalid type.
pub fn load_schema(path: &Path) -> Result<LoadedSchema> {
    let document = parse_schema(path)?;
    let registry = document
        .build()
        .with_context(|| format!("invalid schema {}", path.display()))?;
    Ok(LoadedSchema { document, registry })
}

/// Parse the schema document at `path` without building it.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or parsed.
pub fn parse_schema(path: &Path) -> Result<SchemaDocument> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    SchemaDocument::from_reader(BufReader::new(file))
        .with_context(|| format!("cannot parse {}", path.display()))
}

pub fn decoder_config(big_endian: bool) -> DecoderConfig {
    if big_endian {
        DecoderConfig::default().big_endian()
    } else {
        DecoderConfig::default()
    }
}

/// Decode the schema's root type from the start of `path`.
///
/// The file is read through a buffered reader and closed on return.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or the decode fails.
pub fn decode_file(schema: &LoadedSchema, path: &Path, config: DecoderConfig) -> Result<DecodedRecord> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let mut cursor = ByteCursor::new(BufReader::new(file))
        .with_context(|| format!("cannot read {}", path.display()))?;
    LayoutDecoder::with_config(config)
        .decode_record(&schema.registry, schema.root(), &mut cursor)
        .with_context(|| format!("failed to decode {} as {}", path.display(), schema.root()))
}

/// Decode the schema's root type from an in-memory buffer.
///
/// # Errors
///
/// Returns an error if the decode fails.
pub fn decode_bytes(schema: &LoadedSchema, bytes: &[u8], config: DecoderConfig) -> Result<DecodedRecord> {
    let mut cursor = ByteCursor::from_slice(bytes);
    LayoutDecoder::with_config(config)
        .decode_record(&schema.registry, schema.root(), &mut cursor)
        .with_context(|| format!("failed to decode as {}", schema.root()))
}

/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("cannot read {}", path.display()))
}

/// Parse a JSON value document.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not JSON.
pub fn read_json(path: &Path) -> Result<serde_json::Value> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("cannot parse {}", path.display()))
}

/// Number of structured types and enums in the registry.
pub fn registry_summary(registry: &SchemaRegistry) -> (usize, usize) {
    let structs = registry
        .iter()
        .filter(|def| matches!(def, TypeDef::Struct(_)))
        .count();
    (structs, registry.len() - structs)
}
