/// Implementation of `declbin validate`.
///
/// Reports each check as a `✓` line. The first failing check prints a `✗`
/// line and the command exits with code 1.
///
/// # Success output
///
/// ```text
/// ✓ Schema: 2 structs, 1 enum, root Archive
/// ✓ Types: every referenced type is declared
/// ✓ Decode: Archive covers bytes 0..7 of 7
/// ✓ Trailing: no bytes after the root record
/// ```
///
/// # Checks
///
/// ```text
/// 1. Schema     the document parses and every type builds
/// 2. Types      every named field or rule type is declared
/// 3. Decode     (with a file) the root type decodes from offset 0
/// 4. Trailing   (with a file) warns about bytes after the root record
/// ```
///
/// Trailing bytes are reported with `!` and do not fail validation.
use anyhow::{Result, anyhow};

use crate::ValidateArgs;
use crate::input;

/// Run the `declbin validate` command.
///
/// # Errors
///
/// Returns an error if a file cannot be read or any check fails.
pub fn run(args: &ValidateArgs) -> Result<()> {
    let document = input::parse_schema(&args.schema)?;
    let registry = match document.build() {
        Ok(registry) => registry,
        Err(e) => {
            println!("✗ Schema: {e}");
            return Err(anyhow!("validation failed"));
        }
    };

    let (structs, enums) = input::registry_summary(&registry);
    println!(
        "✓ Schema: {structs} struct{}, {enums} enum{}, root {}",
        plural(structs),
        plural(enums),
        document.root
    );

    let unresolved = registry.unresolved_names();
    if !unresolved.is_empty() {
        println!("✗ Types: undeclared {}", unresolved.join(", "));
        return Err(anyhow!("validation failed"));
    }
    println!("✓ Types: every referenced type is declared");

    let Some(file) = &args.file else {
        return Ok(());
    };

    let schema = input::LoadedSchema { document, registry };
    let bytes = input::read_file(file)?;
    let decoded = match input::decode_bytes(&schema, &bytes, input::decoder_config(args.big_endian)) {
        Ok(decoded) => decoded,
        Err(e) => {
            println!("✗ Decode: {e:#}");
            return Err(anyhow!("validation failed"));
        }
    };
    println!(
        "✓ Decode: {} covers bytes {}..{} of {}",
        schema.root(),
        decoded.start,
        decoded.end,
        decoded.stream_len
    );

    match decoded.trailing_bytes() {
        0 => println!("✓ Trailing: no bytes after the root record"),
        n => println!("! Trailing: {n} byte{} after the root record", plural_u64(n)),
    }

    Ok(())
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

fn plural_u64(n: u64) -> &'static str {
    if n == 1 { "" } else { "s" }
}
