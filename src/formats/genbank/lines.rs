//! Line splitting and classification for GenBank text.
//!
//! GenBank is a fixed-column format; what a line means is decided almost
//! entirely by its first dozen bytes. The predicates here look at one line in
//! isolation. Several of them overlap (`FEATURES` is also a valid top-level
//! keyword line), so callers test them in the order of [`LineKind`].

use crate::model::Depth;

/// Column where keyword text starts.
pub const KEYWORD_VALUE_COLUMN: usize = 12;
/// Column where feature locations and qualifiers start.
pub const FEATURE_VALUE_COLUMN: usize = 21;
/// Width of the keyword name field.
pub const KEYWORD_NAME_WIDTH: usize = 10;
/// Width of the coordinate field of a sequence line, including its separator.
pub const SEQUENCE_PREFIX_WIDTH: usize = 10;
/// Last column read from an `ORIGIN` line.
pub const ORIGIN_END_COLUMN: usize = 79;

/// Classification of a single line, in dispatch priority order.
///
/// Sequence lines overlap with the keyword shapes once coordinates reach
/// seven digits; inside an origin block, test with [`is_sequence`] directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Locus,
    End,
    Origin,
    Contig,
    FeatureHeader,
    Keyword,
    SubKeyword,
    SubSubKeyword,
    Continuation,
    Feature,
    Sequence,
    Other,
}

/// Classifies a line, checking the predicates in priority order.
pub fn classify(line: &str) -> LineKind {
    if is_locus(line) {
        LineKind::Locus
    } else if is_end(line) {
        LineKind::End
    } else if is_origin(line) {
        LineKind::Origin
    } else if is_contig(line) {
        LineKind::Contig
    } else if is_feature_header(line) {
        LineKind::FeatureHeader
    } else if is_keyword(line) {
        LineKind::Keyword
    } else if is_subkeyword(line) {
        LineKind::SubKeyword
    } else if is_subsubkeyword(line) {
        LineKind::SubSubKeyword
    } else if is_continuation(line) {
        LineKind::Continuation
    } else if is_feature(line) {
        LineKind::Feature
    } else if is_sequence(line) {
        LineKind::Sequence
    } else {
        LineKind::Other
    }
}

fn byte_at(line: &str, idx: usize) -> Option<u8> {
    line.as_bytes().get(idx).copied()
}

fn is_space(b: Option<u8>) -> bool {
    matches!(b, Some(b) if b.is_ascii_whitespace())
}

fn is_non_space(b: Option<u8>) -> bool {
    matches!(b, Some(b) if !b.is_ascii_whitespace())
}

fn has_spaces(line: &str, n: usize) -> bool {
    line.len() >= n && line.as_bytes()[..n].iter().all(|&b| b == b' ')
}

pub fn is_locus(line: &str) -> bool {
    line.len() >= 13 && line.starts_with("LOCUS") && is_non_space(byte_at(line, 12))
}

pub fn is_end(line: &str) -> bool {
    line.starts_with("//")
}

pub fn is_origin(line: &str) -> bool {
    line.starts_with("ORIGIN")
}

pub fn is_contig(line: &str) -> bool {
    line.starts_with("CONTIG")
}

/// Top-level keyword: a letter in column 0 and something past column 12.
pub fn is_keyword(line: &str) -> bool {
    line.len() >= 13 && matches!(byte_at(line, 0), Some(b) if b.is_ascii_alphabetic())
}

pub fn is_feature_header(line: &str) -> bool {
    line.starts_with("FEATURES")
}

pub fn is_subkeyword(line: &str) -> bool {
    has_spaces(line, 2) && is_non_space(byte_at(line, 2))
}

pub fn is_subsubkeyword(line: &str) -> bool {
    has_spaces(line, 3) && is_non_space(byte_at(line, 3))
}

pub fn is_continuation(line: &str) -> bool {
    has_spaces(line, 11)
}

pub fn is_feature(line: &str) -> bool {
    has_spaces(line, 5) && is_non_space(byte_at(line, 5))
}

/// Qualifier marker, tested on the part of a feature line after column 21.
pub fn is_qualifier(tail: &str) -> bool {
    tail.starts_with('/')
}

/// Sequence data line: a right-justified coordinate, one space, residues.
pub fn is_sequence(line: &str) -> bool {
    if line.len() < 11 {
        return false;
    }
    let Some(coordinate) = line.get(3..9) else {
        return false;
    };
    let coordinate = coordinate.trim_start();
    !coordinate.is_empty()
        && coordinate.bytes().all(|b| b.is_ascii_digit())
        && is_space(byte_at(line, 9))
        && is_non_space(byte_at(line, 10))
}

/// Whether a line opens a keyword at the given depth.
pub fn is_keyword_at(line: &str, depth: Depth) -> bool {
    match depth {
        Depth::Top => is_keyword(line),
        Depth::Sub => is_subkeyword(line),
        Depth::SubSub => is_subsubkeyword(line),
    }
}

/// Saturating byte-column slice `line[start..end]`.
///
/// Boundaries inside a multi-byte character move forward to the next
/// character boundary.
pub fn columns(line: &str, start: usize, end: Option<usize>) -> &str {
    let start = ceil_char_boundary(line, start);
    let end = end.map_or(line.len(), |e| ceil_char_boundary(line, e));
    if start >= end {
        ""
    } else {
        &line[start..end]
    }
}

fn ceil_char_boundary(line: &str, idx: usize) -> usize {
    if idx >= line.len() {
        return line.len();
    }
    let mut idx = idx;
    while !line.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}

/// Splits text into lines, accepting `\n`, `\r\n` and `\r` as terminators.
///
/// A last line without a terminator is kept; the empty fragment after a
/// final terminator is not.
pub fn split_lines(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                lines.push(&text[start..i]);
                i += 1;
                start = i;
            }
            b'\r' => {
                lines.push(&text[start..i]);
                i += 1;
                if bytes.get(i) == Some(&b'\n') {
                    i += 1;
                }
                start = i;
            }
            _ => i += 1,
        }
    }

    if start < bytes.len() {
        lines.push(&text[start..]);
    }
    lines
}

/// Appends a fragment using the soft-space rule.
///
/// The fragment is right-trimmed before it is appended. If the raw fragment
/// ended in whitespace, exactly one space is kept so that a word boundary
/// that fell on the line end is not lost. Two or more trailing spaces still
/// collapse to one; this is a known fidelity limitation of the format.
pub fn push_soft(buffer: &mut String, fragment: &str) {
    let trimmed = fragment.trim_end();
    buffer.push_str(trimmed);
    if trimmed.len() != fragment.len() {
        buffer.push(' ');
    }
}
