//! GenBank flat-file format.
//!
//! - `lines`: line splitting and fixed-column classification
//! - `parser`: GenBank text to [`Document`](crate::model::Document)
//! - `wrap`: fixed-column reflow of long values
//! - `emitter`: [`Document`](crate::model::Document) to GenBank text
//!
//! Parsing and emitting are inverses up to the soft-space rule: text that
//! the parser produced comes back unchanged after emitting and re-parsing.

pub mod emitter;
pub mod lines;
pub mod parser;
pub mod wrap;

pub use emitter::emit_genbank;
pub use parser::parse_genbank;
