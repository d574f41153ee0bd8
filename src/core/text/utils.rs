//! Truncation, padding and character-class helpers.

use unicode_segmentation::UnicodeSegmentation;

use super::ansi::extract_ansi_code;
use super::width::{grapheme_width, next_escape_or_end, visible_width};

const ANSI_RESET: &str = "\x1b[0m";

/// Word characters for word-jump and word-delete motions.
pub fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Cuts `text` to `max_width` columns, keeping escape codes, and appends `ellipsis` when cut.
pub fn truncate_to_width(text: &str, max_width: usize, ellipsis: &str, pad: bool) -> String {
    if max_width == 0 {
        return String::new();
    }

    let text_width = visible_width(text);
    if text_width <= max_width {
        if pad {
            return format!("{text}{}", " ".repeat(max_width - text_width));
        }
        return text.to_string();
    }

    let ellipsis_width = visible_width(ellipsis);
    let target_width = max_width.saturating_sub(ellipsis_width);
    if target_width == 0 {
        return ellipsis.chars().take(max_width).collect();
    }

    let mut truncated = String::with_capacity(text.len());
    let mut current_width = 0;
    let mut idx = 0;
    'scan: while idx < text.len() {
        if let Some(code) = extract_ansi_code(text, idx) {
            truncated.push_str(code.code);
            idx += code.len();
            continue;
        }
        let end = next_escape_or_end(text, idx);
        for grapheme in text[idx..end].graphemes(true) {
            let width = grapheme_width(grapheme);
            if current_width + width > target_width {
                break 'scan;
            }
            truncated.push_str(grapheme);
            current_width += width;
        }
        idx = end;
    }

    truncated.push_str(ANSI_RESET);
    truncated.push_str(ellipsis);
    if pad {
        let width = visible_width(&truncated);
        if width < max_width {
            truncated.push_str(&" ".repeat(max_width - width));
        }
    }
    truncated
}

/// Pads `text` with spaces up to `width` visible columns.
pub fn pad_to_width(text: &str, width: usize) -> String {
    let visible = visible_width(text);
    if visible >= width {
        return text.to_string();
    }
    format!("{text}{}", " ".repeat(width - visible))
}

#[cfg(test)]
mod tests {
    use super::{is_word_char, pad_to_width, truncate_to_width};
    use crate::core::text::width::visible_width;

    #[test]
    fn truncate_returns_original_when_shorter() {
        assert_eq!(truncate_to_width("hello", 6, "…", false), "hello");
    }

    #[test]
    fn truncate_keeps_style_and_resets_before_ellipsis() {
        let truncated = truncate_to_width("\x1b[31mhello", 4, "...", false);
        assert_eq!(truncated, "\x1b[31mh\x1b[0m...");
        assert_eq!(visible_width(&truncated), 4);
    }

    #[test]
    fn truncate_never_splits_wide_graphemes() {
        let truncated = truncate_to_width("日本語", 4, "…", false);
        assert_eq!(truncated, "日\x1b[0m…");
        assert_eq!(visible_width(&truncated), 3);
    }

    #[test]
    fn padding_counts_visible_columns() {
        assert_eq!(pad_to_width("\x1b[1mab\x1b[0m", 4), "\x1b[1mab\x1b[0m  ");
        assert!(is_word_char('_'));
        assert!(!is_word_char('-'));
    }
}
