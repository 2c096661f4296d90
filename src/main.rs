//! gbjson - GenBank ⇄ JSON converter
//!
//! ## Usage
//!
//! ```bash
//! gbjson record.gb record.json       # GenBank to JSON
//! gbjson record.json record.gb       # JSON to GenBank
//! gbjson -f json dump.txt            # Force input format, write to stdout
//! ```

// Use jemalloc for better memory management (returns memory to OS)
#[cfg(not(windows))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use gbjson::formats::{convert_file_with_options, is_same_path, write_output, FileFormat};
use gbjson::JsonStyle;

/// File format specification for command line
#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    /// GenBank flat file
    Genbank,
    /// JSON document
    Json,
    /// Auto-detect from extension and content
    Auto,
}

impl From<FormatArg> for Option<FileFormat> {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Genbank => Some(FileFormat::GenBank),
            FormatArg::Json => Some(FileFormat::Json),
            FormatArg::Auto => None,
        }
    }
}

/// gbjson - Convert GenBank flat files to JSON and back
///
/// The direction follows the input: GenBank input is written as JSON, JSON
/// input is written as GenBank.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// File to convert (GenBank or JSON)
    input: PathBuf,

    /// Output file (default: standard output)
    output: Option<PathBuf>,

    /// Force the input format (overrides auto-detection)
    #[arg(short = 'f', long = "from", value_enum, default_value = "auto")]
    from: FormatArg,

    /// Allow OUTPUT to overwrite INPUT
    #[arg(long)]
    force: bool,

    /// Write JSON on a single line
    #[arg(long)]
    compact: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Some(output) = &args.output {
        if !args.force && is_same_path(&args.input, output) {
            anyhow::bail!(
                "Input and output are the same file: {} (use --force to overwrite)",
                output.display()
            );
        }
    }

    let style = if args.compact {
        JsonStyle::Compact
    } else {
        JsonStyle::Pretty
    };

    let conversion = convert_file_with_options(&args.input, args.from.into(), style)
        .with_context(|| format!("Failed to convert {}", args.input.display()))?;

    write_output(args.output.as_deref(), &conversion.output)?;

    if let Some(output) = &args.output {
        eprintln!(
            "Wrote {} to {}",
            conversion.from.target(),
            output.display()
        );
    }

    Ok(())
}
