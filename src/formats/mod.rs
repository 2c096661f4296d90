//! GenBank and JSON conversion.
//!
//! Supports automatic format detection for:
//! - GenBank (.gb, .gbk, .genbank, .gbff)
//! - JSON (.json)
//!
//! Format detection priority:
//! 1. Explicit format specification (-f option)
//! 2. File extension
//! 3. Content-based detection
//!
//! The conversion direction follows the input format: GenBank input becomes
//! JSON and JSON input becomes GenBank.

pub mod genbank;
pub mod json;

use std::ffi::OsStr;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::{ConvertError, ConvertResult};
use genbank::{emit_genbank, parse_genbank};
use json::{from_json, to_json, JsonStyle};

/// Detected file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    GenBank,
    Json,
}

impl FileFormat {
    /// Format produced when converting from this one.
    pub fn target(self) -> FileFormat {
        match self {
            FileFormat::GenBank => FileFormat::Json,
            FileFormat::Json => FileFormat::GenBank,
        }
    }
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileFormat::GenBank => write!(f, "GenBank"),
            FileFormat::Json => write!(f, "JSON"),
        }
    }
}

/// Result of converting a file.
#[derive(Debug, Clone)]
pub struct Conversion {
    /// Format the input was read as
    pub from: FileFormat,
    /// Converted text, in `from.target()` format
    pub output: String,
}

/// Detects format from file extension.
pub fn detect_format_from_extension<P: AsRef<Path>>(path: P) -> Option<FileFormat> {
    let ext = path.as_ref().extension().and_then(OsStr::to_str)?;
    match ext.to_lowercase().as_str() {
        "gb" | "gbk" | "genbank" | "gbff" => Some(FileFormat::GenBank),
        "json" => Some(FileFormat::Json),
        _ => None,
    }
}

/// Detects the file format by examining the content.
pub fn detect_format_from_content(content: &str) -> Option<FileFormat> {
    let line = content
        .split(|c| c == '\n' || c == '\r')
        .find(|line| !line.trim().is_empty())?;

    // JSON: first non-blank character opens an array
    if line.trim_start().starts_with('[') {
        return Some(FileFormat::Json);
    }
    // GenBank: first non-empty line is a LOCUS line, unindented
    line.starts_with("LOCUS").then_some(FileFormat::GenBank)
}

/// Reads a whole file as text, replacing invalid UTF-8.
pub fn read_input<P: AsRef<Path>>(path: P) -> ConvertResult<String> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| ConvertError::io(path, e))?;
    debug!(path = %path.display(), bytes = bytes.len(), "Read input");
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Writes `text` to `path`, or to standard output when no path is given.
pub fn write_output(path: Option<&Path>, text: &str) -> ConvertResult<()> {
    match path {
        Some(path) => fs::write(path, text).map_err(|e| ConvertError::io(path, e)),
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(text.as_bytes())
                .and_then(|_| handle.flush())
                .map_err(|e| ConvertError::io("<stdout>", e))
        }
    }
}

/// Returns true when both paths name the same file.
///
/// Paths that do not exist yet are compared as written.
pub fn is_same_path<P: AsRef<Path>, Q: AsRef<Path>>(a: P, b: Q) -> bool {
    let (a, b) = (a.as_ref(), b.as_ref());
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Converts GenBank text to JSON text.
pub fn gb_to_json(text: &str, style: JsonStyle) -> ConvertResult<String> {
    to_json(&parse_genbank(text)?, style)
}

/// Converts JSON text to GenBank text.
pub fn json_to_gb(text: &str) -> ConvertResult<String> {
    emit_genbank(&from_json(text)?)
}

/// Converts content read as `from` into the other format.
pub fn convert_str(content: &str, from: FileFormat, style: JsonStyle) -> ConvertResult<String> {
    match from {
        FileFormat::GenBank => gb_to_json(content, style),
        FileFormat::Json => json_to_gb(content),
    }
}

/// Converts a file with optional format specification.
///
/// Detection priority:
/// 1. Explicit format (if provided)
/// 2. File extension
/// 3. Content-based detection
///
/// When the extension names one format but the content clearly is the
/// other, the content wins.
pub fn convert_file_with_options<P: AsRef<Path>>(
    path: P,
    forced_format: Option<FileFormat>,
    style: JsonStyle,
) -> ConvertResult<Conversion> {
    let path = path.as_ref();
    let content = read_input(path)?;

    // 1. Use explicit format if provided
    if let Some(from) = forced_format {
        return convert_as(&content, from, style);
    }

    let by_content = detect_format_from_content(&content);

    // 2. Try to detect from extension
    if let Some(from) = detect_format_from_extension(path) {
        match by_content {
            Some(other) if other != from => {
                warn!(extension = %from, content = %other, "Extension and content disagree, using content");
            }
            _ => return convert_as(&content, from, style),
        }
    }

    // 3. Content-based detection
    match by_content {
        Some(from) => convert_as(&content, from, style),
        None => Err(ConvertError::UnknownFormat {
            path: path.to_path_buf(),
        }),
    }
}

/// Converts a file, automatically detecting the format.
/// Convenience wrapper around convert_file_with_options.
pub fn convert_file<P: AsRef<Path>>(path: P, style: JsonStyle) -> ConvertResult<Conversion> {
    convert_file_with_options(path, None, style)
}

fn convert_as(content: &str, from: FileFormat, style: JsonStyle) -> ConvertResult<Conversion> {
    info!(from = %from, to = %from.target(), "Converting");
    let output = convert_str(content, from, style)?;
    Ok(Conversion { from, output })
}
