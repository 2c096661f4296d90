//! Fixed-column text reflow.
//!
//! Values are cut strictly at the column limit, never at word boundaries:
//! the parser joins wrapped lines back together without inserting anything,
//! so any smarter wrapping would change the value on the next round trip.

/// Total line width of GenBank output.
pub const LINE_WIDTH: usize = 79;

/// Reflows `value` into indented lines.
///
/// * `width` - Maximum line width
/// * `leader` - Indent of every line after the first
/// * `offset` - Columns past `leader` already used on the first line
///
/// The first line receives `width - leader - offset` characters and no
/// indent (the caller has already written the key). Every embedded `\n`
/// starts a new segment that is wrapped on its own; an empty segment becomes
/// a line holding only the indent.
///
/// Returns an empty string when the parameters leave no room to write.
pub fn wrap(value: &str, width: usize, leader: usize, offset: usize) -> String {
    if width == 0 || leader >= width || offset >= width - leader {
        return String::new();
    }

    let span = width - leader;
    let indent = " ".repeat(leader);
    let mut out = String::with_capacity(value.len() + value.len() / span * (leader + 1) + 1);

    let mut segments = value
        .split('\n')
        .map(|segment| segment.strip_suffix('\r').unwrap_or(segment));

    // First segment continues the line the key was written on
    let first: Vec<char> = segments.next().unwrap_or("").chars().collect();
    let head = (span - offset).min(first.len());
    out.extend(&first[..head]);
    out.push('\n');
    for chunk in first[head..].chunks(span) {
        out.push_str(&indent);
        out.extend(chunk);
        out.push('\n');
    }

    for segment in segments {
        let chars: Vec<char> = segment.chars().collect();
        if chars.is_empty() {
            out.push_str(&indent);
            out.push('\n');
            continue;
        }
        for chunk in chars.chunks(span) {
            out.push_str(&indent);
            out.extend(chunk);
            out.push('\n');
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_value_single_line() {
        assert_eq!(wrap("Saccharomyces cerevisiae.", 79, 12, 0), "Saccharomyces cerevisiae.\n");
    }

    #[test]
    fn test_empty_value_is_just_newline() {
        assert_eq!(wrap("", 79, 12, 0), "\n");
    }

    #[test]
    fn test_wraps_at_fixed_column() {
        let value = "a".repeat(70);
        let block = wrap(&value, 79, 12, 0);
        let lines: Vec<&str> = block.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "a".repeat(67));
        assert_eq!(lines[1], format!("{}{}", " ".repeat(12), "aaa"));
    }

    #[test]
    fn test_no_word_boundary_awareness() {
        let value = format!("{} tail", "x".repeat(65));
        let block = wrap(&value, 79, 12, 0);
        let lines: Vec<&str> = block.lines().collect();
        assert_eq!(lines[0], format!("{} t", "x".repeat(65)));
        assert_eq!(lines[1], format!("{}ail", " ".repeat(12)));
    }

    #[test]
    fn test_offset_shortens_first_line() {
        let value = "b".repeat(60);
        // "/gene=" after column 21: offset 6 leaves 52 characters
        let block = wrap(&value, 79, 21, 6);
        let lines: Vec<&str> = block.lines().collect();
        assert_eq!(lines[0].len(), 52);
        assert_eq!(lines[1], format!("{}{}", " ".repeat(21), "b".repeat(8)));
    }

    #[test]
    fn test_embedded_newlines_wrap_independently() {
        let block = wrap("first\nsecond\n\nfourth", 79, 12, 0);
        let pad = " ".repeat(12);
        assert_eq!(
            block,
            format!("first\n{pad}second\n{pad}\n{pad}fourth\n")
        );
    }

    #[test]
    fn test_long_embedded_segment() {
        let value = format!("head\n{}", "c".repeat(100));
        let block = wrap(&value, 79, 12, 0);
        let lines: Vec<&str> = block.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].trim_start().len(), 67);
        assert_eq!(lines[2].trim_start().len(), 33);
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let value = "é".repeat(70);
        let block = wrap(&value, 79, 12, 0);
        let lines: Vec<&str> = block.lines().collect();
        assert_eq!(lines[0].chars().count(), 67);
        assert_eq!(lines[1].trim_start().chars().count(), 3);
    }

    #[test]
    fn test_degenerate_parameters() {
        assert_eq!(wrap("abc", 0, 0, 0), "");
        assert_eq!(wrap("abc", 79, 79, 0), "");
        assert_eq!(wrap("abc", 79, 90, 0), "");
        assert_eq!(wrap("abc", 79, 21, 58), "");
    }

    #[test]
    fn test_exact_fit_has_no_extra_line() {
        let value = "d".repeat(67);
        assert_eq!(wrap(&value, 79, 12, 0), format!("{}\n", value));
    }
}
