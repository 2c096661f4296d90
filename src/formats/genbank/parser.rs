//! GenBank record parser.
//!
//! A recursive-descent parser over classified lines. The top loop dispatches
//! on the kind of the current line; each section parser consumes exactly the
//! lines that belong to it and leaves the cursor on the first line it does
//! not own.
//!
//! ## GenBank Layout
//!
//! ```text
//! LOCUS       SCU49845     5028 bp    DNA             PLN       21-JUN-1999
//! DEFINITION  Saccharomyces cerevisiae TCP1-beta gene, partial cds, and Axl2p
//!             (AXL2) and Rev7p (REV7) genes, complete cds.
//! SOURCE      Saccharomyces cerevisiae (baker's yeast)
//!   ORGANISM  Saccharomyces cerevisiae
//! FEATURES             Location/Qualifiers
//!      gene            <1..206
//!                      /gene="TCP1-beta"
//! ORIGIN
//!         1 gatcctccat atacaacggt atctccacct caggtttaga tctcaacaac ggaaccattg
//! //
//! ```
//!
//! Multi-line values are joined with the soft-space rule (see
//! [`push_soft`]): keyword and contig lines are separated by `\n`, feature
//! locations and qualifiers are concatenated directly.

use tracing::{debug, trace};

use super::lines::{
    classify, columns, is_continuation, is_contig, is_feature, is_keyword, is_keyword_at,
    is_qualifier, is_sequence, push_soft, split_lines, LineKind, FEATURE_VALUE_COLUMN,
    KEYWORD_NAME_WIDTH, KEYWORD_VALUE_COLUMN, ORIGIN_END_COLUMN, SEQUENCE_PREFIX_WIDTH,
};
use crate::error::{ConvertError, ConvertResult, Stage};
use crate::model::{
    Depth, Document, Feature, FeatureTable, KeywordNode, Leaf, Origin, OriginBody, Qualifier,
    Record, Section, SubKeyword,
};

/// Parses GenBank text into a document.
///
/// Every record must run from a `LOCUS` line to a `//` line. Lines outside
/// any recognised section are skipped.
///
/// # Examples
///
/// ```
/// use gbjson::parse_genbank;
///
/// let doc = parse_genbank("LOCUS       X 4 bp\nORIGIN\n        1 acgt\n//\n").unwrap();
/// assert_eq!(doc.record_count(), 1);
/// ```
pub fn parse_genbank(text: &str) -> ConvertResult<Document> {
    RecordParser::new(text).parse()
}

/// Read position over the input lines.
struct Cursor<'a> {
    lines: Vec<&'a str>,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: split_lines(text),
            pos: 0,
        }
    }

    fn current(&self) -> Option<&'a str> {
        self.lines.get(self.pos).copied()
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    /// 1-based number of the current line.
    fn line_number(&self) -> usize {
        self.pos + 1
    }

    /// Current line, if it is a continuation line.
    fn continuation(&self) -> Option<&'a str> {
        self.current().filter(|line| is_continuation(line))
    }

    /// Tail of the current line, if it is a continuation carrying a qualifier.
    fn qualifier_tail(&self) -> Option<&'a str> {
        self.continuation()
            .map(|line| columns(line, FEATURE_VALUE_COLUMN, None))
            .filter(|tail| is_qualifier(tail))
    }

    /// Tail of the current line, if it continues a feature value.
    fn feature_value_tail(&self) -> Option<&'a str> {
        self.continuation()
            .map(|line| columns(line, FEATURE_VALUE_COLUMN, None))
            .filter(|tail| !is_qualifier(tail))
    }
}

/// A record that has seen its `LOCUS` line but not yet its `//`.
struct OpenRecord {
    record: Record,
    line: usize,
}

struct RecordParser<'a> {
    cursor: Cursor<'a>,
    records: Vec<Record>,
    open: Option<OpenRecord>,
}

impl<'a> RecordParser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            cursor: Cursor::new(text),
            records: Vec::new(),
            open: None,
        }
    }

    fn parse(mut self) -> ConvertResult<Document> {
        while let Some(line) = self.cursor.current() {
            match classify(line) {
                LineKind::Locus => self.open_record(line)?,
                LineKind::End => self.close_record()?,
                LineKind::Origin => {
                    self.require_open("ORIGIN")?;
                    let origin = parse_origin(&mut self.cursor);
                    self.push_section(Section::Origin(origin));
                }
                LineKind::FeatureHeader => {
                    self.require_open("FEATURES")?;
                    let table = parse_features(&mut self.cursor);
                    self.push_section(Section::Features(table));
                }
                // A CONTIG line outside an origin block is an ordinary keyword
                LineKind::Keyword | LineKind::Contig if is_keyword(line) => {
                    self.require_open("keyword")?;
                    let keyword = parse_keyword::<SubKeyword>(&mut self.cursor, Depth::Top);
                    self.push_section(Section::Keyword(keyword));
                }
                _ => self.cursor.advance(),
            }
        }

        if let Some(open) = self.open {
            return Err(ConvertError::malformed(
                Stage::Parse,
                Some(open.line),
                format!(
                    "record '{}' is not terminated by '//'",
                    open.record.locus.trim()
                ),
            ));
        }

        debug!(records = self.records.len(), "Parsed GenBank document");
        Ok(Document::new(self.records))
    }

    fn open_record(&mut self, line: &str) -> ConvertResult<()> {
        let line_number = self.cursor.line_number();
        if let Some(open) = &self.open {
            return Err(ConvertError::malformed(
                Stage::Parse,
                Some(line_number),
                format!(
                    "LOCUS line before the record opened at line {} was terminated",
                    open.line
                ),
            ));
        }

        let locus = columns(line, KEYWORD_VALUE_COLUMN, None);
        trace!(line = line_number, locus = locus.trim(), "Opening record");
        self.open = Some(OpenRecord {
            record: Record::new(locus),
            line: line_number,
        });
        self.cursor.advance();
        Ok(())
    }

    fn close_record(&mut self) -> ConvertResult<()> {
        let open = self.open.take().ok_or_else(|| {
            ConvertError::malformed(
                Stage::Parse,
                Some(self.cursor.line_number()),
                "record terminator '//' without a preceding LOCUS line",
            )
        })?;

        debug!(
            locus = open.record.locus.trim(),
            sections = open.record.sections.len(),
            "Parsed record"
        );
        self.records.push(open.record);
        self.cursor.advance();
        Ok(())
    }

    fn require_open(&self, what: &str) -> ConvertResult<()> {
        if self.open.is_some() {
            Ok(())
        } else {
            Err(ConvertError::malformed(
                Stage::Parse,
                Some(self.cursor.line_number()),
                format!("{} outside of a record (missing LOCUS line)", what),
            ))
        }
    }

    fn push_section(&mut self, section: Section) {
        if let Some(open) = self.open.as_mut() {
            open.record.sections.push(section);
        }
    }
}

/// Keyword levels the parser can build as children.
trait ParseLevel: Sized {
    /// Parses the run of keywords at `depth` that follows their parent.
    fn parse_children(cursor: &mut Cursor<'_>, depth: Depth) -> Vec<Self>;
}

impl ParseLevel for Leaf {
    fn parse_children(_cursor: &mut Cursor<'_>, _depth: Depth) -> Vec<Self> {
        Vec::new()
    }
}

impl<C: ParseLevel> ParseLevel for KeywordNode<C> {
    fn parse_children(cursor: &mut Cursor<'_>, depth: Depth) -> Vec<Self> {
        let mut children = Vec::new();
        while cursor.current().is_some_and(|line| is_keyword_at(line, depth)) {
            children.push(parse_keyword::<C>(cursor, depth));
        }
        children
    }
}

/// Parses a keyword at `depth`, its continuation lines and its children.
fn parse_keyword<C: ParseLevel>(cursor: &mut Cursor<'_>, depth: Depth) -> KeywordNode<C> {
    let line = cursor.current().unwrap_or_default();
    let name = columns(line, 0, Some(KEYWORD_NAME_WIDTH)).trim().to_string();

    let mut text = String::new();
    push_soft(&mut text, columns(line, KEYWORD_VALUE_COLUMN, None));
    cursor.advance();

    while let Some(line) = cursor.current() {
        let fragment = if is_continuation(line) {
            columns(line, KEYWORD_VALUE_COLUMN, None)
        } else if depth == Depth::SubSub && is_deeper_than_subsub(line) {
            // There is no fourth level; fold it into the text
            line.trim_start()
        } else {
            break;
        };
        text.push('\n');
        push_soft(&mut text, fragment);
        cursor.advance();
    }

    let children = match depth.child() {
        Some(child_depth) => C::parse_children(cursor, child_depth),
        None => Vec::new(),
    };

    trace!(name = name.as_str(), ?depth, children = children.len(), "Parsed keyword");
    KeywordNode {
        name,
        text,
        children,
    }
}

fn is_deeper_than_subsub(line: &str) -> bool {
    line.len() > 4
        && line.as_bytes()[..4].iter().all(|&b| b == b' ')
        && !line.trim_start().is_empty()
}

/// Parses the feature table; the cursor is on the `FEATURES` line.
fn parse_features(cursor: &mut Cursor<'_>) -> FeatureTable {
    cursor.advance();

    let mut features = Vec::new();
    while cursor.current().is_some_and(is_feature) {
        features.push(parse_feature(cursor));
    }

    trace!(features = features.len(), "Parsed feature table");
    FeatureTable::new(features)
}

fn parse_feature(cursor: &mut Cursor<'_>) -> Feature {
    let line = cursor.current().unwrap_or_default();
    let name = columns(line, 0, Some(FEATURE_VALUE_COLUMN)).trim().to_string();
    let mut location = columns(line, FEATURE_VALUE_COLUMN, None).trim_end().to_string();
    cursor.advance();

    while let Some(tail) = cursor.feature_value_tail() {
        push_soft(&mut location, tail);
        cursor.advance();
    }

    let mut qualifiers = Vec::new();
    while let Some(tail) = cursor.qualifier_tail() {
        qualifiers.push(parse_qualifier(cursor, tail));
    }

    Feature {
        name,
        location,
        qualifiers,
    }
}

/// Parses one qualifier starting at `tail` (which begins with `/`).
fn parse_qualifier(cursor: &mut Cursor<'_>, tail: &str) -> Qualifier {
    let mut buffer = String::new();
    push_soft(&mut buffer, tail);
    cursor.advance();

    while let Some(tail) = cursor.feature_value_tail() {
        push_soft(&mut buffer, tail);
        cursor.advance();
    }

    split_qualifier(&buffer)
}

/// Splits `/key=value` at the first `=`.
///
/// Without an `=`, or with `=` as the last character, everything after the
/// slash is the key and the qualifier is a flag.
fn split_qualifier(buffer: &str) -> Qualifier {
    let body = buffer.strip_prefix('/').unwrap_or(buffer);
    match body.find('=') {
        Some(eq) if eq + 1 < body.len() => Qualifier::new(&body[..eq], &body[eq + 1..]),
        _ => Qualifier::flag(body),
    }
}

/// Parses an `ORIGIN` line and the sequence or contig block below it.
fn parse_origin(cursor: &mut Cursor<'_>) -> Origin {
    let line = cursor.current().unwrap_or_default();
    let text = columns(line, 6, Some(ORIGIN_END_COLUMN)).trim_end();
    let text = (!text.is_empty()).then(|| text.to_string());
    cursor.advance();

    let body = match cursor.current() {
        Some(next) if is_contig(next) => OriginBody::Contig(parse_contig(cursor)),
        Some(next) if is_sequence(next) => OriginBody::Sequence(parse_sequence(cursor)),
        _ => OriginBody::Sequence(None),
    };

    trace!(
        contig = matches!(body, OriginBody::Contig(_)),
        "Parsed origin"
    );
    Origin { text, body }
}

fn parse_sequence(cursor: &mut Cursor<'_>) -> Option<String> {
    let mut sequence = String::new();
    while let Some(line) = cursor.current().filter(|line| is_sequence(line)) {
        sequence.extend(
            columns(line, SEQUENCE_PREFIX_WIDTH, None)
                .chars()
                .filter(|&c| c != ' '),
        );
        cursor.advance();
    }
    (!sequence.is_empty()).then_some(sequence)
}

fn parse_contig(cursor: &mut Cursor<'_>) -> Option<String> {
    let line = cursor.current().unwrap_or_default();
    let mut contig = String::new();
    push_soft(&mut contig, columns(line, KEYWORD_VALUE_COLUMN, None));
    cursor.advance();

    while let Some(line) = cursor.continuation() {
        contig.push('\n');
        push_soft(&mut contig, columns(line, KEYWORD_VALUE_COLUMN, None));
        cursor.advance();
    }
    (!contig.is_empty()).then_some(contig)
}
