//! Classified input vocabulary shared by the classifier, editor and menu controller.

/// Persistent mode flipped by a toggle hotkey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToggleKind {
    AutoContinue,
    CriticalApproval,
    Thinking,
}

impl ToggleKind {
    pub const ALL: [ToggleKind; 3] = [
        ToggleKind::AutoContinue,
        ToggleKind::CriticalApproval,
        ToggleKind::Thinking,
    ];

    /// Key label shown next to the toggle in the overlay.
    pub fn hotkey_label(self) -> &'static str {
        match self {
            ToggleKind::AutoContinue => "⌥A",
            ToggleKind::CriticalApproval => "⌥V",
            ToggleKind::Thinking => "⌥T",
        }
    }

    /// Code point emitted by macOS terminals when Option sends Unicode.
    pub fn option_char(self) -> char {
        match self {
            ToggleKind::AutoContinue => 'å',
            ToggleKind::CriticalApproval => '√',
            ToggleKind::Thinking => '†',
        }
    }

    /// Letter sent after ESC when Option/Alt is configured as meta.
    pub fn meta_letter(self) -> char {
        match self {
            ToggleKind::AutoContinue => 'a',
            ToggleKind::CriticalApproval => 'v',
            ToggleKind::Thinking => 't',
        }
    }

    pub fn from_option_char(ch: char) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.option_char() == ch)
    }

    pub fn from_meta_letter(ch: char) -> Option<Self> {
        let lower = ch.to_ascii_lowercase();
        Self::ALL.into_iter().find(|kind| kind.meta_letter() == lower)
    }
}

/// Navigation and editing keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKey {
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    WordLeft,
    WordRight,
    Backspace,
    Delete,
    DeleteWordBackward,
    KillToEnd,
    KillToStart,
    Tab,
    Escape,
    /// ctrl+o
    ExpandToolResult,
    /// ctrl+z
    Suspend,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputAction {
    /// ctrl+c
    Interrupt,
    /// ctrl+d
    EndOfInput,
    Toggle(ToggleKind),
    /// Fast-path keystroke.
    InsertChar(char),
    /// Keystrokes that were held back while a burst was suspected and turned out not to be one.
    InsertText(String),
    Paste {
        text: String,
        truncated: bool,
    },
    Submit,
    Key(EditKey),
}
