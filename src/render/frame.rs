//! The painted overlay frame.

/// Lines of the pinned region plus where the terminal cursor sits inside it.
///
/// A frame is replaced wholesale on every repaint and compared by value to skip no-op repaints.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct OverlayFrame {
    pub lines: Vec<String>,
    pub cursor_row: usize,
    pub cursor_col: usize,
}

impl OverlayFrame {
    pub fn new(lines: Vec<String>, cursor_row: usize, cursor_col: usize) -> Self {
        let cursor_row = cursor_row.min(lines.len().saturating_sub(1));
        Self {
            lines,
            cursor_row,
            cursor_col,
        }
    }

    pub fn height(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
