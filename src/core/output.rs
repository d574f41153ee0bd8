//! Typed terminal output commands and a single output gate.
//!
//! Invariant: all terminal writes flow through `OutputGate::flush(..)`, and one flush is exactly
//! one `Terminal::write(..)` call so a repaint can never be observed half-written.

use crate::core::terminal::Terminal;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalCmd {
    /// Raw bytes/control sequences (UTF-8 string) to be written to the terminal.
    Bytes(String),
    /// Static raw bytes/control sequences.
    BytesStatic(&'static str),

    /// Cursor visibility.
    HideCursor,
    ShowCursor,

    /// Cursor motion.
    CarriageReturn,
    MoveUp(u16),
    MoveDown(u16),
    /// 1-based absolute column.
    ColumnAbs(u16),

    /// Erase the whole current line.
    ClearLine,

    /// Protocol toggles.
    BracketedPasteEnable,
    BracketedPasteDisable,
}

impl TerminalCmd {
    pub fn bytes(data: impl Into<String>) -> Self {
        Self::Bytes(data.into())
    }

    fn encode_into(&self, out: &mut String) {
        match self {
            TerminalCmd::Bytes(data) => out.push_str(data),
            TerminalCmd::BytesStatic(data) => out.push_str(data),
            TerminalCmd::HideCursor => out.push_str("\x1b[?25l"),
            TerminalCmd::ShowCursor => out.push_str("\x1b[?25h"),
            TerminalCmd::CarriageReturn => out.push('\r'),
            TerminalCmd::MoveUp(0) | TerminalCmd::MoveDown(0) => {}
            TerminalCmd::MoveUp(n) => out.push_str(&format!("\x1b[{n}A")),
            TerminalCmd::MoveDown(n) => out.push_str(&format!("\x1b[{n}B")),
            TerminalCmd::ColumnAbs(col) => out.push_str(&format!("\x1b[{}G", (*col).max(1))),
            TerminalCmd::ClearLine => out.push_str("\x1b[2K"),
            TerminalCmd::BracketedPasteEnable => out.push_str("\x1b[?2004h"),
            TerminalCmd::BracketedPasteDisable => out.push_str("\x1b[?2004l"),
        }
    }
}

#[derive(Debug, Default)]
pub struct OutputGate {
    cmds: Vec<TerminalCmd>,
}

impl OutputGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, cmd: TerminalCmd) {
        self.cmds.push(cmd);
    }

    pub fn extend<I>(&mut self, cmds: I)
    where
        I: IntoIterator<Item = TerminalCmd>,
    {
        self.cmds.extend(cmds);
    }

    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }

    pub fn clear(&mut self) {
        self.cmds.clear();
    }

    /// Encode the buffered commands without writing them.
    pub fn encode(&self) -> String {
        let mut out = String::new();
        for cmd in &self.cmds {
            cmd.encode_into(&mut out);
        }
        out
    }

    /// Flush buffered commands to the terminal as a single write.
    ///
    /// This is the single write gate: `Terminal::write(..)` must not be called
    /// from anywhere else. Returns the number of bytes written.
    pub fn flush<T: Terminal + ?Sized>(&mut self, term: &mut T) -> usize {
        let out = self.encode();
        self.cmds.clear();
        if out.is_empty() {
            return 0;
        }
        term.write(&out);
        out.len()
    }
}
