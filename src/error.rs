//! Error types shared by the parser, the emitter and the JSON codec.
//!
//! Every core error is fatal to the conversion that raised it: callers never
//! receive partial output alongside an error.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// The half of the pipeline in which an error was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// GenBank text to document.
    Parse,
    /// Structured text to GenBank.
    Emit,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Parse => write!(f, "parse"),
            Stage::Emit => write!(f, "emit"),
        }
    }
}

/// Errors that can occur while converting between GenBank and JSON.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed input ({stage}){}: {message}", line_suffix(.line))]
    MalformedInput {
        stage: Stage,
        line: Option<usize>,
        message: String,
    },

    #[error("Could not determine the format of {}.\n\
             Hint: Use -f/--from to specify the input format explicitly:\n  \
             gbjson -f genbank <file>   # GenBank flat file\n  \
             gbjson -f json <file>      # JSON document", .path.display())]
    UnknownFormat { path: PathBuf },

    #[error("Invalid document ({stage}) at {path}: {message}")]
    Validation {
        stage: Stage,
        path: String,
        message: String,
    },
}

fn line_suffix(line: &Option<usize>) -> String {
    match line {
        Some(n) => format!(" at line {}", n),
        None => String::new(),
    }
}

impl ConvertError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConvertError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(stage: Stage, line: Option<usize>, message: impl Into<String>) -> Self {
        ConvertError::MalformedInput {
            stage,
            line,
            message: message.into(),
        }
    }

    pub(crate) fn validation(stage: Stage, path: impl Into<String>, message: impl Into<String>) -> Self {
        ConvertError::Validation {
            stage,
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns the pipeline stage for core errors, `None` for I/O and
    /// detection failures.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            ConvertError::Io { .. } | ConvertError::UnknownFormat { .. } => None,
            ConvertError::MalformedInput { stage, .. } | ConvertError::Validation { stage, .. } => {
                Some(*stage)
            }
        }
    }
}

/// Result type for conversion operations.
pub type ConvertResult<T> = Result<T, ConvertError>;
