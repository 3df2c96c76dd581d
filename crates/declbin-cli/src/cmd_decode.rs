/// Implementation of `declbin decode`.
///
/// Loads the schema document, decodes its root type from the start of the
/// file, and renders the record through `DefaultDriver`. The output goes
/// to stdout or to `-o <file>`.
///
/// # Output modes
///
/// ```text
/// ┌──────┬──────────────────────────────────────────────────────────────┐
/// │ Mode │ Format                                                       │
/// ├──────┼──────────────────────────────────────────────────────────────┤
/// │ tree │ Archive\n  count: u32 = 3\n  items: u8[3] = aabbcc (default) │
/// │ flat │ count = 3\nitems = aabbcc                                    │
/// │ json │ { "count": 3, "items": "aabbcc" }                            │
/// └──────┴──────────────────────────────────────────────────────────────┘
/// ```
use std::fs;
use std::io::{self, Write as _};

use anyhow::{Context, Result, anyhow};
use declbin_driver::{DefaultDriver, OutputMode, RecordDriver, RenderConfig};

use crate::DecodeArgs;
use crate::input;

/// Run the `declbin decode` command.
///
/// # Errors
///
/// Returns an error if either file cannot be read, the schema is invalid,
/// the `--mode` value is unrecognised, decoding fails, or the output
/// cannot be written.
pub fn run(args: &DecodeArgs) -> Result<()> {
    let mode = parse_output_mode(&args.mode)?;
    let schema = input::load_schema(&args.schema)?;
    let decoded = input::decode_file(&schema, &args.file, input::decoder_config(args.big_endian))?;

    let config = RenderConfig {
        mode,
        max_bytes: args.max_bytes,
        show_offsets: args.show_offsets,
    };
    let rendered = DefaultDriver
        .render(&decoded, &config)
        .context("driver render failed")?;

    if let Some(path) = &args.output {
        fs::write(path, rendered.as_bytes())
            .with_context(|| format!("cannot write {}", path.display()))?;
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(rendered.as_bytes())
            .context("cannot write to stdout")?;
        if !rendered.ends_with('\n') {
            handle.write_all(b"\n").context("cannot write to stdout")?;
        }
    }

    Ok(())
}

// ── Flag parsers ──────────────────────────────────────────────────────────────

/// Parses the `--mode` string to an [`OutputMode`].
///
/// # Errors
///
/// Returns an error for unrecognised mode names.
fn parse_output_mode(s: &str) -> Result<OutputMode> {
    match s.to_lowercase().as_str() {
        "tree" => Ok(OutputMode::Tree),
        "flat" => Ok(OutputMode::Flat),
        "json" => Ok(OutputMode::Json),
        _ => Err(anyhow!("unknown mode {s:?}, expected tree|flat|json")),
    }
}
