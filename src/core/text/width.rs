//! Display width of graphemes and styled strings.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthChar;

use super::ansi::extract_ansi_code;

const TAB_WIDTH: usize = 4;

pub fn grapheme_width(grapheme: &str) -> usize {
    if grapheme.is_empty() {
        return 0;
    }
    if grapheme == "\t" {
        return TAB_WIDTH;
    }
    if grapheme.chars().count() > 1 && emojis::get(grapheme).is_some() {
        return 2;
    }
    grapheme
        .chars()
        .map(|ch| UnicodeWidthChar::width(ch).unwrap_or(0))
        .sum()
}

pub fn char_width(ch: char) -> usize {
    if ch == '\t' {
        return TAB_WIDTH;
    }
    UnicodeWidthChar::width(ch).unwrap_or(0)
}

/// Width in terminal columns, ignoring escape sequences.
pub fn visible_width(input: &str) -> usize {
    let mut width = 0;
    let mut idx = 0;
    while idx < input.len() {
        if let Some(code) = extract_ansi_code(input, idx) {
            idx += code.len();
            continue;
        }
        let end = next_escape_or_end(input, idx);
        width += input[idx..end].graphemes(true).map(grapheme_width).sum::<usize>();
        idx = end;
    }
    width
}

pub(crate) fn next_escape_or_end(input: &str, from: usize) -> usize {
    let mut idx = from;
    while idx < input.len() {
        if input.as_bytes()[idx] == 0x1b && extract_ansi_code(input, idx).is_some() {
            break;
        }
        idx += input[idx..].chars().next().map_or(1, char::len_utf8);
    }
    idx
}

#[cfg(test)]
mod tests {
    use super::{char_width, visible_width};

    #[test]
    fn ansi_is_ignored() {
        assert_eq!(visible_width("hi\x1b[31m!!\x1b[0m"), 4);
    }

    #[test]
    fn wide_and_emoji_graphemes() {
        assert_eq!(visible_width("日本"), 4);
        assert_eq!(visible_width("👍🏽"), 2);
        assert_eq!(char_width('a'), 1);
    }
}
