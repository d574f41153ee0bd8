//! Edit-line state: text, cursor, history and the collapsed-paste chip.

use tracing::debug;

use crate::core::actions::{EditKey, InputAction};
use crate::core::text::utils::is_word_char;

/// Summary shown instead of a large paste until it is submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollapsedPaste {
    pub line_count: usize,
    pub char_count: usize,
    pub full_text: String,
    pub truncated: bool,
}

impl CollapsedPaste {
    fn new(full_text: String, truncated: bool) -> Self {
        Self {
            line_count: full_text.lines().count().max(1),
            char_count: full_text.chars().count(),
            full_text,
            truncated,
        }
    }
}

/// Edit-line contents set aside while a capture borrows the input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedLine {
    text: Vec<char>,
    cursor: usize,
    collapsed: Option<CollapsedPaste>,
}

/// What the caller should do after an edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditIntent {
    None,
    Render,
    Submit(String),
    Queue(String),
}

#[derive(Debug)]
pub struct InputBuffer {
    text: Vec<char>,
    cursor: usize,
    render_offset: usize,
    history: Vec<String>,
    /// -1 when not browsing; otherwise an index into `history` (oldest first).
    history_index: isize,
    draft: Option<Vec<char>>,
    collapsed: Option<CollapsedPaste>,
    streaming: bool,
    collapse_min_chars: usize,
    history_limit: Option<usize>,
}

impl InputBuffer {
    pub fn new(collapse_min_chars: usize) -> Self {
        Self {
            text: Vec::new(),
            cursor: 0,
            render_offset: 0,
            history: Vec::new(),
            history_index: -1,
            draft: None,
            collapsed: None,
            streaming: false,
            collapse_min_chars,
            history_limit: None,
        }
    }

    /// Bound history to `limit` entries, dropping the oldest.
    pub fn with_history_limit(mut self, limit: Option<usize>) -> Self {
        self.history_limit = limit.map(|limit| limit.max(1));
        self
    }

    pub fn text(&self) -> String {
        self.text.iter().collect()
    }

    pub fn chars(&self) -> &[char] {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn collapsed(&self) -> Option<&CollapsedPaste> {
        self.collapsed.as_ref()
    }

    /// True when there is nothing to submit.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.collapsed.is_none()
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn history_index(&self) -> isize {
        self.history_index
    }

    pub fn render_offset(&self) -> usize {
        self.render_offset
    }

    pub fn set_streaming(&mut self, streaming: bool) {
        self.streaming = streaming;
    }

    /// Scroll so that wrapped row `cursor_row` stays inside a window of `max_rows`.
    pub fn ensure_row_visible(&mut self, cursor_row: usize, total_rows: usize, max_rows: usize) {
        let max_rows = max_rows.max(1);
        if cursor_row < self.render_offset {
            self.render_offset = cursor_row;
        } else if cursor_row >= self.render_offset + max_rows {
            self.render_offset = cursor_row + 1 - max_rows;
        }
        let max_offset = total_rows.saturating_sub(max_rows);
        self.render_offset = self.render_offset.min(max_offset);
    }

    pub fn apply(&mut self, action: &InputAction) -> EditIntent {
        match action {
            InputAction::InsertChar(ch) => {
                self.insert_str(&ch.to_string());
                EditIntent::Render
            }
            InputAction::InsertText(text) => {
                self.insert_str(text);
                EditIntent::Render
            }
            InputAction::Paste { text, truncated } => {
                self.paste(text, *truncated);
                EditIntent::Render
            }
            InputAction::Submit => self.submit(true),
            InputAction::Key(key) => self.apply_key(*key),
            InputAction::Interrupt | InputAction::EndOfInput | InputAction::Toggle(_) => {
                EditIntent::None
            }
        }
    }

    /// Submit the buffer. A collapsed paste submits its full text. Whitespace-only input is
    /// ignored. While streaming the text is handed back as `Queue` instead of `Submit`.
    pub fn submit(&mut self, record_history: bool) -> EditIntent {
        let text = match self.collapsed.take() {
            Some(collapsed) => collapsed.full_text,
            None => self.text().trim_end().to_string(),
        };
        if text.trim().is_empty() {
            self.clear();
            return EditIntent::Render;
        }
        if record_history {
            self.push_history(&text);
        }
        self.clear();
        if self.streaming {
            EditIntent::Queue(text)
        } else {
            EditIntent::Submit(text)
        }
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
        self.render_offset = 0;
        self.collapsed = None;
        self.history_index = -1;
        self.draft = None;
    }

    /// Empty the line, returning its text, cursor and chip for `restore_line`.
    pub fn take_line(&mut self) -> SavedLine {
        let saved = SavedLine {
            text: std::mem::take(&mut self.text),
            cursor: self.cursor,
            collapsed: self.collapsed.take(),
        };
        self.clear();
        saved
    }

    pub fn restore_line(&mut self, saved: SavedLine) {
        self.clear();
        self.cursor = saved.cursor.min(saved.text.len());
        self.text = saved.text;
        self.collapsed = saved.collapsed;
    }

    pub fn set_buffer(&mut self, text: &str, cursor: usize) {
        self.collapsed = None;
        self.history_index = -1;
        self.draft = None;
        self.text = normalize_newlines(text).chars().collect();
        self.cursor = cursor.min(self.text.len());
    }

    fn push_history(&mut self, text: &str) {
        if self.history.last().map(|last| last == text).unwrap_or(false) {
            return;
        }
        self.history.push(text.to_string());
        if let Some(limit) = self.history_limit {
            let excess = self.history.len().saturating_sub(limit);
            self.history.drain(..excess);
        }
    }

    fn insert_str(&mut self, text: &str) {
        if let Some(collapsed) = self.collapsed.take() {
            debug!(chars = collapsed.char_count, "collapsed paste expanded by typing");
            self.text = collapsed.full_text.chars().collect();
            self.cursor = self.text.len();
        }
        self.history_index = -1;
        let normalized = normalize_newlines(text);
        let inserted: Vec<char> = normalized.chars().collect();
        let count = inserted.len();
        self.text.splice(self.cursor..self.cursor, inserted);
        self.cursor += count;
    }

    fn paste(&mut self, text: &str, truncated: bool) {
        let cleaned = clean_paste(text);
        if cleaned.is_empty() {
            return;
        }
        self.history_index = -1;

        if let Some(collapsed) = self.collapsed.take() {
            let mut full_text = collapsed.full_text;
            full_text.push_str(&cleaned);
            self.collapsed = Some(CollapsedPaste::new(full_text, collapsed.truncated || truncated));
            return;
        }

        let line_count = cleaned.lines().count();
        let char_count = cleaned.chars().count();
        if line_count > 1 || char_count >= self.collapse_min_chars || truncated {
            let before: String = self.text[..self.cursor].iter().collect();
            let after: String = self.text[self.cursor..].iter().collect();
            let collapsed = CollapsedPaste::new(format!("{before}{cleaned}{after}"), truncated);
            debug!(
                lines = collapsed.line_count,
                chars = collapsed.char_count,
                truncated,
                "paste collapsed"
            );
            self.collapsed = Some(collapsed);
            self.text.clear();
            self.cursor = 0;
            self.render_offset = 0;
            return;
        }
        self.insert_str(&cleaned);
    }

    fn apply_key(&mut self, key: EditKey) -> EditIntent {
        if self.collapsed.is_some() {
            return match key {
                EditKey::Backspace | EditKey::Delete | EditKey::KillToStart => {
                    debug!("collapsed paste discarded");
                    self.collapsed = None;
                    EditIntent::Render
                }
                _ => EditIntent::None,
            };
        }

        let len = self.text.len();
        match key {
            EditKey::Left => self.cursor = self.cursor.saturating_sub(1),
            EditKey::Right => self.cursor = (self.cursor + 1).min(len),
            EditKey::Home => self.cursor = self.line_start(),
            EditKey::End => self.cursor = self.line_end(),
            EditKey::WordLeft => self.cursor = self.word_left(),
            EditKey::WordRight => self.cursor = self.word_right(),
            EditKey::Backspace => {
                if self.cursor == 0 {
                    return EditIntent::None;
                }
                self.cursor -= 1;
                self.text.remove(self.cursor);
            }
            EditKey::Delete => {
                if self.cursor >= len {
                    return EditIntent::None;
                }
                self.text.remove(self.cursor);
            }
            EditKey::DeleteWordBackward => {
                let start = self.word_left();
                self.text.drain(start..self.cursor);
                self.cursor = start;
            }
            EditKey::KillToEnd => {
                let end = self.line_end();
                self.text.drain(self.cursor..end);
            }
            EditKey::KillToStart => {
                let start = self.line_start();
                self.text.drain(start..self.cursor);
                self.cursor = start;
            }
            EditKey::Up => self.navigate_history(1),
            EditKey::Down => self.navigate_history(-1),
            EditKey::Tab | EditKey::Escape | EditKey::ExpandToolResult | EditKey::Suspend => {
                return EditIntent::None;
            }
        }
        EditIntent::Render
    }

    /// `direction` 1 = older, -1 = newer. Stepping past the newest entry restores the draft.
    fn navigate_history(&mut self, direction: isize) {
        if self.history.is_empty() {
            return;
        }
        let len = self.history.len() as isize;
        let next = if self.history_index == -1 {
            if direction > 0 {
                len - 1
            } else {
                return;
            }
        } else {
            self.history_index - direction
        };

        if next >= len {
            self.history_index = -1;
            let draft = self.draft.take().unwrap_or_default();
            self.cursor = draft.len();
            self.text = draft;
            return;
        }
        let next = next.max(0);
        if self.history_index == -1 {
            self.draft = Some(self.text.clone());
        }
        self.history_index = next;
        self.text = self.history[next as usize].chars().collect();
        self.cursor = self.text.len();
    }

    fn line_start(&self) -> usize {
        self.text[..self.cursor]
            .iter()
            .rposition(|ch| *ch == '\n')
            .map_or(0, |idx| idx + 1)
    }

    fn line_end(&self) -> usize {
        self.text[self.cursor..]
            .iter()
            .position(|ch| *ch == '\n')
            .map_or(self.text.len(), |idx| self.cursor + idx)
    }

    fn word_left(&self) -> usize {
        let mut idx = self.cursor;
        while idx > 0 && !is_word_char(self.text[idx - 1]) {
            idx -= 1;
        }
        while idx > 0 && is_word_char(self.text[idx - 1]) {
            idx -= 1;
        }
        idx
    }

    fn word_right(&self) -> usize {
        let len = self.text.len();
        let mut idx = self.cursor;
        while idx < len && !is_word_char(self.text[idx]) {
            idx += 1;
        }
        while idx < len && is_word_char(self.text[idx]) {
            idx += 1;
        }
        idx
    }
}

fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

fn clean_paste(text: &str) -> String {
    normalize_newlines(text)
        .replace('\t', "    ")
        .chars()
        .filter(|ch| *ch == '\n' || !ch.is_control())
        .collect()
}
