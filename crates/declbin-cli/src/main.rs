/// declbin command-line tool. It decodes, inspects, validates, and encodes
/// binary files described by a JSON schema document.
///
/// # Command overview
///
/// ```text
/// declbin <COMMAND> [OPTIONS]
///
/// Commands:
///   inspect    Print the schema summary, decoded tree and byte ranges
///   decode     Render a file as tree, flat, or JSON text
///   validate   Check a schema document (and optionally a file against it)
///   encode     Build a binary file from a JSON value document
///   help       Print help information
///
/// Global options:
///   -v, --verbose    Log decode progress to stderr (RUST_LOG overrides)
///   -h, --help       Print help
///   -V, --version    Print version
/// ```
///
/// # Exit codes
///
/// | Code | Meaning                                        |
/// |------|------------------------------------------------|
/// | 0    | Success                                        |
/// | 1    | Error (I/O failure, invalid schema, bad input) |
///
/// Logs and error details go to stderr so stdout can be piped cleanly.
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod cmd_decode;
mod cmd_encode;
mod cmd_inspect;
mod cmd_validate;
mod input;

// ── CLI root ──────────────────────────────────────────────────────────────────

/// Declarative binary decoding driven by JSON schema documents.
#[derive(Parser)]
#[command(name = "declbin", version, about = "Schema-driven binary decoder")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log decode progress (debug level) to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
}

// ── Sub-commands ──────────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum Commands {
    /// Print the schema summary, the decoded tree and its byte ranges.
    Inspect(InspectArgs),
    /// Render a binary file as tree, flat, or JSON text.
    Decode(DecodeArgs),
    /// Check a schema document, and optionally decode a file against it.
    Validate(ValidateArgs),
    /// Build a binary file from a JSON value document.
    Encode(EncodeArgs),
}

// ── Argument structs ──────────────────────────────────────────────────────────

/// Arguments for `declbin inspect`.
///
/// ```text
/// ┌──────────────┬──────────────────────────────────────────────────────┐
/// │ Flag         │ Effect                                               │
/// ├──────────────┼──────────────────────────────────────────────────────┤
/// │ --show-hex   │ Hex dump of the root record's inline byte range      │
/// │ --big-endian │ Default byte order for fields without an override    │
/// └──────────────┴──────────────────────────────────────────────────────┘
/// ```
#[derive(clap::Args)]
pub struct InspectArgs {
    /// Path to the JSON schema document.
    pub schema: PathBuf,

    /// Path to the binary file to inspect.
    pub file: PathBuf,

    /// Show a 16-byte-per-line hex dump of the root record.
    #[arg(long)]
    pub show_hex: bool,

    /// Decode fields without an explicit byte order as big-endian.
    #[arg(long)]
    pub big_endian: bool,
}

/// Arguments for `declbin decode`.
///
/// ```text
/// ┌────────────────┬────────────────────────────────────────────────────┐
/// │ Flag           │ Values / default                                   │
/// ├────────────────┼────────────────────────────────────────────────────┤
/// │ --mode         │ tree (default) | flat | json                       │
/// │ --big-endian   │ default byte order big-endian (little otherwise)   │
/// │ --max-bytes    │ byte-array preview length, 0 = full (default 16)   │
/// │ --show-offsets │ include the root record's byte range               │
/// │ -o / --output  │ write to file instead of stdout                    │
/// └────────────────┴────────────────────────────────────────────────────┘
/// ```
#[derive(clap::Args)]
pub struct DecodeArgs {
    /// Path to the JSON schema document.
    pub schema: PathBuf,

    /// Path to the binary file to decode.
    pub file: PathBuf,

    /// Output format: `tree`, `flat`, or `json`.
    #[arg(long, default_value = "tree")]
    pub mode: String,

    /// Decode fields without an explicit byte order as big-endian.
    #[arg(long)]
    pub big_endian: bool,

    /// Truncate byte arrays longer than this in tree and flat output.
    #[arg(long, default_value_t = 16)]
    pub max_bytes: usize,

    /// Include the root record's byte range in the output.
    #[arg(long)]
    pub show_offsets: bool,

    /// Write rendered output to this file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for `declbin validate`.
///
/// Without `file` only the schema document is checked. With `file` the
/// root type is also decoded from it and any bytes left after the root
/// record are reported.
#[derive(clap::Args)]
pub struct ValidateArgs {
    /// Path to the JSON schema document.
    pub schema: PathBuf,

    /// Optional binary file to decode against the schema.
    pub file: Option<PathBuf>,

    /// Decode fields without an explicit byte order as big-endian.
    #[arg(long)]
    pub big_endian: bool,
}

/// Arguments for `declbin encode`.
///
/// The value document mirrors `decode --mode json` output: an object per
/// structured value, hex strings for byte arrays, variant names (or raw
/// numbers) for enums.
///
/// ```json
/// { "count": 3, "items": "aabbcc" }
/// ```
#[derive(clap::Args)]
pub struct EncodeArgs {
    /// Path to the JSON schema document.
    pub schema: PathBuf,

    /// Path to the JSON value document.
    pub values: PathBuf,

    /// Output binary file path.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Encode fields without an explicit byte order as big-endian.
    #[arg(long)]
    pub big_endian: bool,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Inspect(args) => cmd_inspect::run(&args),
        Commands::Decode(args) => cmd_decode::run(&args),
        Commands::Validate(args) => cmd_validate::run(&args),
        Commands::Encode(args) => cmd_encode::run(&args),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

/// `RUST_LOG` wins when set; otherwise `-v` selects debug and the default
/// is warn.
fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()))
        .init();
}
