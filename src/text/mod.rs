//! # Text Formatting
//!
//! Greedy line breaking for drawn text. Break opportunities come from UAX#14;
//! character widths come from the caller, so the same breaker serves the real
//! font context and fixed-advance test canvases.
//!
//! This only decides where drawn lines end. Vertical space consumed by a
//! block is estimated separately in [`crate::layout::estimate_height`].

use unicode_linebreak::{linebreaks, BreakOpportunity};

/// One line of wrapped text.
#[derive(Debug, Clone, PartialEq)]
pub struct WrappedLine {
    pub text: String,
    /// Width of `text` in points, trailing whitespace excluded.
    pub width: f64,
}

/// Compute UAX#14 break opportunities indexed by char position.
///
/// Returns a vec of length `text.chars().count()`. Each entry is the break
/// opportunity *before* that character position. Index 0 is always `None`.
fn compute_break_opportunities(text: &str) -> Vec<Option<BreakOpportunity>> {
    let char_count = text.chars().count();
    let mut result = vec![None; char_count];

    // linebreaks() yields the byte offset of the start of the next segment.
    let mut byte_to_char = vec![0usize; text.len() + 1];
    let mut char_idx = 0;
    for (byte_idx, _) in text.char_indices() {
        byte_to_char[byte_idx] = char_idx;
        char_idx += 1;
    }
    byte_to_char[text.len()] = char_idx;

    for (byte_offset, opp) in linebreaks(text) {
        let char_idx = byte_to_char[byte_offset];
        if char_idx < char_count {
            result[char_idx] = Some(opp);
        }
    }

    result
}

fn is_newline(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

fn make_line(chars: &[char], widths: &[f64]) -> WrappedLine {
    let mut end = chars.len();
    while end > 0 && (chars[end - 1].is_whitespace() || is_newline(chars[end - 1])) {
        end -= 1;
    }
    let mut text = String::with_capacity(end);
    let mut width = 0.0;
    for (ch, w) in chars[..end].iter().zip(&widths[..end]) {
        if !is_newline(*ch) {
            text.push(*ch);
            width += w;
        }
    }
    WrappedLine { text, width }
}

/// Break `text` into lines no wider than `max_width`.
///
/// Lines end at the last UAX#14 opportunity before the overflow. A run with
/// no opportunity is split at the overflowing character. Newlines force a
/// break. Empty text yields no lines.
pub fn wrap_lines<F>(text: &str, max_width: f64, char_width: F) -> Vec<WrappedLine>
where
    F: Fn(char) -> f64,
{
    if text.is_empty() {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    let widths: Vec<f64> = chars
        .iter()
        .map(|&ch| if is_newline(ch) { 0.0 } else { char_width(ch) })
        .collect();
    let break_opps = compute_break_opportunities(text);

    let mut lines = Vec::new();
    let mut line_start = 0;
    let mut line_width = 0.0;
    // Index of the first char of the next line if we break at the last opportunity.
    let mut last_break: Option<usize> = None;

    for i in 0..chars.len() {
        if i > 0 {
            match break_opps[i] {
                Some(BreakOpportunity::Mandatory) => {
                    lines.push(make_line(&chars[line_start..i], &widths[line_start..i]));
                    line_start = i;
                    line_width = 0.0;
                    last_break = None;
                }
                Some(BreakOpportunity::Allowed) => last_break = Some(i),
                None => {}
            }
        }

        // Trailing spaces may hang past the edge.
        if chars[i].is_whitespace() {
            line_width += widths[i];
            continue;
        }

        if line_width + widths[i] > max_width && line_start < i {
            let break_at = match last_break {
                Some(bp) if bp > line_start => bp,
                _ => i,
            };
            lines.push(make_line(
                &chars[line_start..break_at],
                &widths[line_start..break_at],
            ));
            line_start = break_at;
            line_width = widths[break_at..i].iter().sum();
            last_break = None;
        }

        line_width += widths[i];
    }

    if line_start < chars.len() {
        lines.push(make_line(&chars[line_start..], &widths[line_start..]));
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(_: char) -> f64 {
        1.0
    }

    #[test]
    fn test_short_text_single_line() {
        let lines = wrap_lines("Hello world", 100.0, unit);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "Hello world");
        assert_eq!(lines[0].width, 11.0);
    }

    #[test]
    fn test_breaks_at_word_boundary() {
        let lines = wrap_lines("aaa bbb ccc", 7.0, unit);
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["aaa bbb", "ccc"]);
    }

    #[test]
    fn test_trailing_space_not_counted() {
        let lines = wrap_lines("aaa bbb", 4.0, unit);
        assert_eq!(lines[0].text, "aaa");
        assert_eq!(lines[0].width, 3.0);
        assert_eq!(lines[1].text, "bbb");
    }

    #[test]
    fn test_long_word_is_split() {
        let lines = wrap_lines("abcdefghij", 4.0, unit);
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_newline_forces_break() {
        let lines = wrap_lines("one\ntwo", 100.0, unit);
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "two"]);
    }

    #[test]
    fn test_empty_text_has_no_lines() {
        assert!(wrap_lines("", 10.0, unit).is_empty());
    }

    #[test]
    fn test_multibyte_text() {
        let lines = wrap_lines("• café au lait", 6.0, unit);
        assert_eq!(lines[0].text, "• café");
        assert_eq!(lines[1].text, "au");
    }
}
