//! # gbjson - GenBank ⇄ JSON converter
//!
//! Converts GenBank flat files to a structured JSON document and back,
//! round-tripping as losslessly as the fixed-column format allows.
//!
//! ## Architecture
//!
//! - `model`: the document tree (records, keywords, features, origin)
//! - `formats::genbank`: line classification, parsing, wrapping and emission
//! - `formats::json`: JSON encoding of the document tree
//! - `formats`: format detection and file I/O
//! - `error`: the error taxonomy shared by every stage
//!
//! ## Example
//!
//! ```
//! use gbjson::{gb_to_json, json_to_gb, JsonStyle};
//!
//! let gb = "LOCUS       X 4 bp\nORIGIN\n        1 acgt\n//\n";
//! let json = gb_to_json(gb, JsonStyle::Compact).unwrap();
//! assert_eq!(json_to_gb(&json).unwrap(), gb);
//! ```

pub mod error;
pub mod formats;
pub mod model;

pub use error::{ConvertError, ConvertResult, Stage};
pub use formats::genbank::{emit_genbank, parse_genbank};
pub use formats::json::{from_json, to_json, JsonStyle};
pub use formats::{gb_to_json, json_to_gb, FileFormat};
pub use model::Document;
