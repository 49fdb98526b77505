//! Helpers shared by the `html` integration tests.

pub mod chunk;
pub mod fixtures;

use std::fmt::Write;

pub use chunk::{ChunkPlan, ChunkPlanCase, build_chunk_plans};
pub use fixtures::{FixtureFormat, SanitizeCase, load_sanitize_cases, parse_sanitize_cases};

const CONTEXT_LINES: usize = 2;
/// Width of `"> 1234  expected: "`.
const LINE_PREFIX_WIDTH: usize = 18;

/// One converter output line with the characters that are easy to misread
/// spelled out: stray `\r`/`\n` left inside a CRLF-split line, tabs,
/// controls, no-break spaces and replacement characters.
fn visible(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    for ch in line.chars() {
        match ch {
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\u{A0}' | '\u{FFFD}' | '\u{FEFF}' => {
                let _ = write!(out, "\\u{{{:X}}}", ch as u32);
            }
            ch if ch.is_control() => {
                let _ = write!(out, "\\u{{{:02X}}}", ch as u32);
            }
            ch => out.push(ch),
        }
    }
    out
}

/// Character column of the first difference between two lines.
fn first_column(expected: &str, actual: &str) -> usize {
    expected
        .chars()
        .zip(actual.chars())
        .take_while(|(a, b)| a == b)
        .count()
}

/// Describe how `actual` converter output differs from `expected`.
///
/// Output is split on the writer's `\r\n` line ends, so a bare `\n` or `\r`
/// shows up escaped inside its line instead of as a line break. The report
/// shows the first mismatching line with a caret under the first differing
/// character, plus a little surrounding context.
pub fn diff_output(expected: &str, actual: &str) -> String {
    let expected: Vec<&str> = expected.split("\r\n").collect();
    let actual: Vec<&str> = actual.split("\r\n").collect();
    let missing = "<missing>";
    let line = |lines: &[&str], index: usize| lines.get(index).map(|l| visible(l));

    let mut out = String::new();
    let Some(index) = (0..expected.len().max(actual.len()))
        .find(|&i| expected.get(i) != actual.get(i))
    else {
        out.push_str("outputs are identical\n");
        return out;
    };

    let start = index.saturating_sub(CONTEXT_LINES);
    let end = (index + CONTEXT_LINES + 1).min(expected.len().max(actual.len()));
    let _ = writeln!(out, "first mismatch on output line {}:", index + 1);
    for i in start..end {
        let marker = if i == index { ">" } else { " " };
        let left = line(&expected, i).unwrap_or_else(|| missing.to_string());
        let right = line(&actual, i).unwrap_or_else(|| missing.to_string());
        let _ = writeln!(out, "{marker} {:>4}  expected: {left}", i + 1);
        let _ = writeln!(out, "{marker} {:>4}    actual: {right}", i + 1);
        if i == index {
            if let (Some(left), Some(right)) = (expected.get(i), actual.get(i)) {
                let column = first_column(left, right);
                let prefix: String = left.chars().take(column).collect();
                let indent = LINE_PREFIX_WIDTH + visible(&prefix).chars().count();
                let _ = writeln!(out, "{}^ column {}", " ".repeat(indent), column + 1);
            }
        }
    }
    let _ = writeln!(
        out,
        "expected {} lines, actual {} lines",
        expected.len(),
        actual.len()
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_the_first_differing_line_and_column() {
        let report = diff_output("<div>\r\na b\r\n</div>", "<div>\r\na c\r\n</div>");
        assert!(report.contains("first mismatch on output line 2"), "{report}");
        assert!(report.contains("column 3"), "{report}");
    }

    #[test]
    fn bare_line_feeds_are_spelled_out() {
        let report = diff_output("a\r\nb", "a\nb");
        assert!(report.contains("actual: a\\nb"), "{report}");
        assert!(report.contains("expected 2 lines, actual 1 lines"), "{report}");
    }

    #[test]
    fn invisible_characters_are_spelled_out() {
        assert_eq!(visible("a\u{A0}b\u{FFFD}\t"), "a\\u{A0}b\\u{FFFD}\\t");
        assert_eq!(diff_output("same", "same"), "outputs are identical\n");
    }
}
