// src/annotate/location.rs

use std::sync::LazyLock;

use regex::Regex;

use crate::ui::Span;

/// `<anything>:<digits>:<digits>:<anything>`, shortest possible prefix.
static LOCATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(.*?):(\d+):(\d+):.*").expect("location pattern is a valid regex")
});

/// A `file:line:col` reference found in one line of output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationReference {
    /// 0-based line in the script.
    pub line: usize,
    /// 0-based column in the script.
    pub column: usize,
    /// Where the match sits in the accumulated output, in characters.
    pub span: Span,
}

impl LocationReference {
    /// Whether a caret at `caret` counts as being on this reference.
    /// Both ends are inclusive so a caret right after the text still hits.
    pub fn contains(&self, caret: usize) -> bool {
        self.span.start <= caret && caret <= self.span.end
    }
}

/// Parse one output line (without its newline) that starts at character
/// `offset` of the accumulated output.
///
/// Numbers in the text are 1-based; the returned position is 0-based.
/// Numbers too large for `usize` are not treated as references.
pub fn parse_line(line: &str, offset: usize) -> Option<LocationReference> {
    let caps = LOCATION_PATTERN.captures(line)?;
    let whole = caps.get(0)?;

    let line_no: usize = caps[2].parse().ok()?;
    let col_no: usize = caps[3].parse().ok()?;

    let start = offset + line[..whole.start()].chars().count();
    let end = start + whole.as_str().chars().count();

    Some(LocationReference {
        line: line_no.saturating_sub(1),
        column: col_no.saturating_sub(1),
        span: start..end,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiler_diagnostic_is_recognised() {
        let line = "foo.kt:12:5: error: unresolved reference: printn";
        let loc = parse_line(line, 0).unwrap();
        assert_eq!((loc.line, loc.column), (11, 4));
        assert_eq!(loc.span, 0..line.chars().count());
    }

    #[test]
    fn span_is_shifted_by_offset() {
        let loc = parse_line("a.kts:1:1: warning", 40).unwrap();
        assert_eq!(loc.span.start, 40);
        assert_eq!((loc.line, loc.column), (0, 0));
    }

    #[test]
    fn plain_output_is_not_a_reference() {
        assert!(parse_line("2", 0).is_none());
        assert!(parse_line("time 12:30:00", 0).is_none());
        assert!(parse_line("foo.kt:12:5 missing trailing colon", 0).is_none());
    }

    #[test]
    fn zero_based_conversion_saturates() {
        let loc = parse_line("x.kts:0:0: odd", 0).unwrap();
        assert_eq!((loc.line, loc.column), (0, 0));
    }

    #[test]
    fn oversized_numbers_are_ignored() {
        assert!(parse_line("x.kts:99999999999999999999999:1: boom", 0).is_none());
    }

    #[test]
    fn windows_drive_prefix_still_matches() {
        let loc = parse_line(r"C:\work\script.kts:3:7: error: x", 0).unwrap();
        assert_eq!((loc.line, loc.column), (2, 6));
    }

    #[test]
    fn contains_is_inclusive_at_both_ends() {
        let loc = parse_line("a.kts:2:2: e", 10).unwrap();
        assert!(loc.contains(10));
        assert!(loc.contains(loc.span.end));
        assert!(!loc.contains(9));
        assert!(!loc.contains(loc.span.end + 1));
    }
}
