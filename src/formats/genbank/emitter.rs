//! GenBank text emitter.
//!
//! Walks a [`Document`] and writes fixed-column GenBank text. The writer
//! keeps track of the current output column so that values starting after a
//! key of arbitrary length (qualifiers in particular) wrap at the right
//! place.
//!
//! Output is all-or-nothing: the text is built in memory and only returned
//! once every record has been written.

use tracing::{debug, warn};

use super::lines::{FEATURE_VALUE_COLUMN, KEYWORD_VALUE_COLUMN};
use super::wrap::{wrap, LINE_WIDTH};
use crate::error::{ConvertError, ConvertResult, Stage};
use crate::model::{
    Depth, Document, Feature, FeatureTable, KeywordNode, Leaf, Origin, OriginBody, Record,
    Section,
};

/// Residues per sequence line.
const SEQUENCE_LINE_LENGTH: usize = 60;
/// Residues per space-separated group.
const SEQUENCE_GROUP_LENGTH: usize = 10;
/// Width of the right-justified coordinate in front of each sequence line.
const SEQUENCE_COORDINATE_WIDTH: usize = 9;
/// Indent of feature keys.
const FEATURE_INDENT: usize = 5;

/// Renders a document as GenBank text.
///
/// # Examples
///
/// ```
/// use gbjson::model::{Document, Origin, Record, Section};
/// use gbjson::emit_genbank;
///
/// let mut record = Record::new("X 4 bp");
/// record.sections.push(Section::Origin(Origin::sequence(None, Some("acgt".into()))));
/// let text = emit_genbank(&Document::new(vec![record])).unwrap();
/// assert_eq!(text, "LOCUS       X 4 bp\nORIGIN\n        1 acgt\n//\n");
/// ```
pub fn emit_genbank(doc: &Document) -> ConvertResult<String> {
    let mut writer = GenbankWriter::new();
    for (index, record) in doc.records.iter().enumerate() {
        writer.record(record, index)?;
    }
    debug!(records = doc.record_count(), bytes = writer.out.len(), "Emitted GenBank text");
    Ok(writer.out)
}

/// Output buffer plus the byte column the next character will land in.
///
/// Columns are counted in bytes, the same unit the parser slices by.
struct GenbankWriter {
    out: String,
    column: usize,
}

impl GenbankWriter {
    fn new() -> Self {
        Self {
            out: String::new(),
            column: 0,
        }
    }

    fn record(&mut self, record: &Record, index: usize) -> ConvertResult<()> {
        let record_path = format!("/{}", index);
        self.locus(&record.locus, &format!("{}/0", record_path))?;

        // Paths follow the JSON layout, where an origin takes two entries
        let mut entry = 1;
        for section in &record.sections {
            let path = format!("{}/{}", record_path, entry);
            match section {
                Section::Keyword(keyword) => keyword.emit(self, Depth::Top, &path)?,
                Section::Features(table) => self.features(table, &path)?,
                Section::Origin(origin) => {
                    self.origin(origin, &path)?;
                    entry += 1;
                }
            }
            entry += 1;
        }

        self.out.push_str("//\n");
        self.column = 0;
        Ok(())
    }

    /// Writes `text` and pads with spaces up to `column`.
    ///
    /// Text that already reaches past `column` is left unpadded.
    fn key(&mut self, indent: usize, text: &str, column: usize) {
        self.pad(indent);
        self.out.push_str(text);
        self.column += text.len();
        if self.column < column {
            let fill = column - self.column;
            self.pad(fill);
        }
    }

    fn pad(&mut self, n: usize) {
        self.out.extend(std::iter::repeat(' ').take(n));
        self.column += n;
    }

    /// Writes a value through the wrap engine, continuing the current line.
    fn wrapped(&mut self, value: &str, leader: usize, path: &str) -> ConvertResult<()> {
        let offset = self.column.saturating_sub(leader);
        let block = wrap(value, LINE_WIDTH, leader, offset);
        if block.is_empty() {
            warn!(path, column = self.column, "No room left on the line for value");
            return Err(ConvertError::validation(
                Stage::Emit,
                path,
                format!("key ends at column {}, leaving no room for its value", self.column),
            ));
        }
        self.out.push_str(&block);
        self.column = 0;
        Ok(())
    }

    fn single_line(&mut self, text: &str, path: &str, what: &str) -> ConvertResult<()> {
        if text.contains(|c| c == '\n' || c == '\r') {
            return Err(ConvertError::validation(
                Stage::Emit,
                path,
                format!("{} text must fit on a single line", what),
            ));
        }
        self.out.push_str(text);
        self.out.push('\n');
        self.column = 0;
        Ok(())
    }

    fn locus(&mut self, locus: &str, path: &str) -> ConvertResult<()> {
        self.key(0, "LOCUS", KEYWORD_VALUE_COLUMN);
        self.single_line(locus, path, "LOCUS")
    }

    fn keyword(&mut self, name: &str, text: &str, depth: Depth, path: &str) -> ConvertResult<()> {
        self.key(depth.indent(), name, KEYWORD_VALUE_COLUMN);
        self.wrapped(text, KEYWORD_VALUE_COLUMN, path)
    }

    fn features(&mut self, table: &FeatureTable, path: &str) -> ConvertResult<()> {
        self.key(0, "FEATURES", FEATURE_VALUE_COLUMN);
        self.out.push_str("Location/Qualifiers\n");
        self.column = 0;

        for (index, feature) in table.features.iter().enumerate() {
            self.feature(feature, &format!("{}/{}", path, index))?;
        }
        Ok(())
    }

    fn feature(&mut self, feature: &Feature, path: &str) -> ConvertResult<()> {
        self.key(FEATURE_INDENT, &feature.name, FEATURE_VALUE_COLUMN);
        self.wrapped(&feature.location, FEATURE_VALUE_COLUMN, path)?;

        for (index, qualifier) in feature.qualifiers.iter().enumerate() {
            self.pad(FEATURE_VALUE_COLUMN);
            self.out.push('/');
            self.out.push_str(&qualifier.key);
            self.column += 1 + qualifier.key.len();

            match &qualifier.value {
                Some(value) => {
                    self.out.push('=');
                    self.column += 1;
                    self.wrapped(value, FEATURE_VALUE_COLUMN, &format!("{}/{}", path, index + 1))?;
                }
                None => {
                    self.out.push('\n');
                    self.column = 0;
                }
            }
        }
        Ok(())
    }

    fn origin(&mut self, origin: &Origin, path: &str) -> ConvertResult<()> {
        self.out.push_str("ORIGIN");
        self.single_line(origin.text.as_deref().unwrap_or_default(), path, "ORIGIN")?;

        match &origin.body {
            OriginBody::Sequence(Some(sequence)) => self.sequence(sequence),
            OriginBody::Sequence(None) => {}
            OriginBody::Contig(contig) => {
                self.key(0, "CONTIG", KEYWORD_VALUE_COLUMN);
                match contig {
                    Some(text) => self.wrapped(text, KEYWORD_VALUE_COLUMN, path)?,
                    None => {
                        self.out.push('\n');
                        self.column = 0;
                    }
                }
            }
        }
        Ok(())
    }

    /// Writes residues as numbered 60-residue lines of 10-residue groups.
    fn sequence(&mut self, sequence: &str) {
        let residues: Vec<char> = sequence.chars().collect();

        for (line_index, line) in residues.chunks(SEQUENCE_LINE_LENGTH).enumerate() {
            let start = line_index * SEQUENCE_LINE_LENGTH + 1;
            self.out.push_str(&format!(
                "{:>width$} ",
                start,
                width = SEQUENCE_COORDINATE_WIDTH
            ));

            for (group_index, group) in line.chunks(SEQUENCE_GROUP_LENGTH).enumerate() {
                if group_index > 0 {
                    self.out.push(' ');
                }
                self.out.extend(group);
            }
            self.out.push('\n');
        }
        self.column = 0;
    }
}

/// Keyword levels the emitter can write.
trait EmitLevel {
    fn emit(&self, writer: &mut GenbankWriter, depth: Depth, path: &str) -> ConvertResult<()>;
}

impl EmitLevel for Leaf {
    fn emit(&self, _writer: &mut GenbankWriter, _depth: Depth, _path: &str) -> ConvertResult<()> {
        match *self {}
    }
}

impl<C: EmitLevel> EmitLevel for KeywordNode<C> {
    fn emit(&self, writer: &mut GenbankWriter, depth: Depth, path: &str) -> ConvertResult<()> {
        writer.keyword(&self.name, &self.text, depth, path)?;

        if let Some(child_depth) = depth.child() {
            for (index, child) in self.children.iter().enumerate() {
                child.emit(writer, child_depth, &format!("{}/{}", path, index))?;
            }
        }
        Ok(())
    }
}
