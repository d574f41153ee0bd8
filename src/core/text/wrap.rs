//! Word wrapping that never splits inside an escape sequence and reopens active styles on
//! continuation lines.

use unicode_segmentation::UnicodeSegmentation;

use super::ansi::{extract_ansi_code, StyleTracker};
use super::width::{grapheme_width, next_escape_or_end, visible_width};

const ANSI_RESET: &str = "\x1b[0m";

/// Wraps `text` to `width` columns. Embedded newlines always start a new line.
pub fn wrap_text_with_ansi(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut tracker = StyleTracker::default();
    let mut lines = Vec::new();
    for logical in text.split('\n') {
        wrap_logical_line(logical.trim_end_matches('\r'), width, &mut tracker, &mut lines);
    }
    lines
}

/// Hard-wraps plain text by grapheme, with no word breaking. Used for the input editor where the
/// cursor must map onto exact cells.
pub fn wrap_graphemes(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = vec![String::new()];
    let mut current_width = 0;
    for grapheme in text.graphemes(true) {
        let w = grapheme_width(grapheme);
        if current_width + w > width && current_width > 0 {
            lines.push(String::new());
            current_width = 0;
        }
        if let Some(last) = lines.last_mut() {
            last.push_str(grapheme);
        }
        current_width += w;
    }
    lines
}

fn wrap_logical_line(line: &str, width: usize, tracker: &mut StyleTracker, out: &mut Vec<String>) {
    let mut current = tracker.active_codes();
    let mut current_width = 0;
    // Byte offset just past the last whitespace in `current`, with the style active there.
    let mut break_at: Option<(usize, StyleTracker)> = None;

    let mut idx = 0;
    while idx < line.len() {
        if let Some(code) = extract_ansi_code(line, idx) {
            tracker.process(code.code);
            current.push_str(code.code);
            idx += code.len();
            continue;
        }
        let end = next_escape_or_end(line, idx);
        for grapheme in line[idx..end].graphemes(true) {
            let w = grapheme_width(grapheme);
            let is_space = grapheme.trim().is_empty();
            if current_width + w > width && current_width > 0 {
                if is_space {
                    push_line(out, std::mem::take(&mut current), tracker);
                    current = tracker.active_codes();
                    current_width = 0;
                    break_at = None;
                    continue;
                }
                if let Some((pos, style)) = break_at.take() {
                    let rest = current.split_off(pos);
                    push_line(out, std::mem::take(&mut current), &style);
                    current_width = visible_width(&rest);
                    current = format!("{}{rest}", style.active_codes());
                }
                if current_width + w > width && current_width > 0 {
                    push_line(out, std::mem::take(&mut current), tracker);
                    current = tracker.active_codes();
                    current_width = 0;
                }
            }
            current.push_str(grapheme);
            current_width += w;
            if is_space {
                break_at = Some((current.len(), tracker.clone()));
            }
        }
        idx = end;
    }
    push_line(out, current, tracker);
}

fn push_line(out: &mut Vec<String>, mut line: String, style: &StyleTracker) {
    if !style.is_plain() {
        line.push_str(ANSI_RESET);
    }
    out.push(line);
}

#[cfg(test)]
mod tests {
    use super::{wrap_graphemes, wrap_text_with_ansi};
    use crate::core::text::width::visible_width;

    #[test]
    fn breaks_at_word_boundaries() {
        let lines = wrap_text_with_ansi("alpha beta gamma", 11);
        assert_eq!(lines, vec!["alpha beta ", "gamma"]);
    }

    #[test]
    fn long_words_are_hard_broken() {
        let lines = wrap_text_with_ansi("abcdefghij", 4);
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn styles_are_reopened_on_continuation_lines() {
        let lines = wrap_text_with_ansi("\x1b[31maaaa bbbb\x1b[0m", 5);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("\x1b[0m"));
        assert!(lines[1].starts_with("\x1b[31m"));
        assert!(lines.iter().all(|line| visible_width(line) <= 5));
    }

    #[test]
    fn newlines_always_split() {
        assert_eq!(wrap_text_with_ansi("a\n\nb", 10), vec!["a", "", "b"]);
    }

    #[test]
    fn grapheme_wrap_keeps_exact_cells() {
        assert_eq!(wrap_graphemes("abcde", 2), vec!["ab", "cd", "e"]);
        assert_eq!(wrap_graphemes("", 2), vec![""]);
    }
}
