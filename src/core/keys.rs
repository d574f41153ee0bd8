//! Decoding of escape sequences and control characters into [`InputAction`]s.
//!
//! Only legacy (non-kitty) encodings are recognised; anything else decodes to `None` and is
//! dropped by the classifier.

use crate::core::actions::{EditKey, InputAction, ToggleKind};

pub const PASTE_BEGIN: &str = "\x1b[200~";
pub const PASTE_END: &str = "\x1b[201~";

const LEGACY_UP: [&str; 2] = ["\x1b[A", "\x1bOA"];
const LEGACY_DOWN: [&str; 2] = ["\x1b[B", "\x1bOB"];
const LEGACY_RIGHT: [&str; 2] = ["\x1b[C", "\x1bOC"];
const LEGACY_LEFT: [&str; 2] = ["\x1b[D", "\x1bOD"];
const LEGACY_HOME: [&str; 4] = ["\x1b[H", "\x1bOH", "\x1b[1~", "\x1b[7~"];
const LEGACY_END: [&str; 4] = ["\x1b[F", "\x1bOF", "\x1b[4~", "\x1b[8~"];
const LEGACY_DELETE: [&str; 1] = ["\x1b[3~"];
const WORD_LEFT: [&str; 5] = ["\x1b[1;5D", "\x1b[1;3D", "\x1bOd", "\x1bb", "\x1bB"];
const WORD_RIGHT: [&str; 5] = ["\x1b[1;5C", "\x1b[1;3C", "\x1bOc", "\x1bf", "\x1bF"];

/// Decode one complete escape sequence.
pub fn sequence_action(seq: &str) -> Option<InputAction> {
    let key = |key: EditKey| Some(InputAction::Key(key));

    if seq == "\x1b" || seq == "\x1b\x1b" {
        return key(EditKey::Escape);
    }
    if LEGACY_UP.contains(&seq) {
        return key(EditKey::Up);
    }
    if LEGACY_DOWN.contains(&seq) {
        return key(EditKey::Down);
    }
    if LEGACY_RIGHT.contains(&seq) {
        return key(EditKey::Right);
    }
    if LEGACY_LEFT.contains(&seq) {
        return key(EditKey::Left);
    }
    if LEGACY_HOME.contains(&seq) {
        return key(EditKey::Home);
    }
    if LEGACY_END.contains(&seq) {
        return key(EditKey::End);
    }
    if LEGACY_DELETE.contains(&seq) {
        return key(EditKey::Delete);
    }
    if WORD_LEFT.contains(&seq) {
        return key(EditKey::WordLeft);
    }
    if WORD_RIGHT.contains(&seq) {
        return key(EditKey::WordRight);
    }
    if seq == "\x1b\x7f" || seq == "\x1b\x08" {
        return key(EditKey::DeleteWordBackward);
    }

    // Meta + letter: ESC followed by exactly one char.
    let mut chars = seq.chars();
    if chars.next() == Some('\x1b') {
        if let (Some(letter), None) = (chars.next(), chars.next()) {
            return ToggleKind::from_meta_letter(letter).map(InputAction::Toggle);
        }
    }
    None
}

/// Decode a C0 control character (or DEL) that arrived outside any escape sequence.
pub fn control_action(ch: char) -> Option<InputAction> {
    let key = |key: EditKey| Some(InputAction::Key(key));
    match ch {
        '\x03' => Some(InputAction::Interrupt),
        '\x04' => Some(InputAction::EndOfInput),
        '\x01' => key(EditKey::Home),
        '\x05' => key(EditKey::End),
        '\x02' => key(EditKey::Left),
        '\x06' => key(EditKey::Right),
        '\x10' => key(EditKey::Up),
        '\x0e' => key(EditKey::Down),
        '\x08' | '\x7f' => key(EditKey::Backspace),
        '\x0b' => key(EditKey::KillToEnd),
        '\x15' => key(EditKey::KillToStart),
        '\x17' => key(EditKey::DeleteWordBackward),
        '\x0f' => key(EditKey::ExpandToolResult),
        '\x1a' => key(EditKey::Suspend),
        _ => None,
    }
}

/// Characters that form paste/typing text: everything printable plus line breaks and tab.
pub fn is_text_char(ch: char) -> bool {
    matches!(ch, '\r' | '\n' | '\t') || !ch.is_control()
}

#[cfg(test)]
mod tests {
    use super::{control_action, is_text_char, sequence_action};
    use crate::core::actions::{EditKey, InputAction, ToggleKind};

    #[test]
    fn arrows_and_word_motion() {
        assert_eq!(sequence_action("\x1b[A"), Some(InputAction::Key(EditKey::Up)));
        assert_eq!(sequence_action("\x1bOD"), Some(InputAction::Key(EditKey::Left)));
        assert_eq!(
            sequence_action("\x1b[1;5C"),
            Some(InputAction::Key(EditKey::WordRight))
        );
        assert_eq!(sequence_action("\x1bb"), Some(InputAction::Key(EditKey::WordLeft)));
    }

    #[test]
    fn meta_letters_map_to_toggles() {
        assert_eq!(
            sequence_action("\x1ba"),
            Some(InputAction::Toggle(ToggleKind::AutoContinue))
        );
        assert_eq!(
            sequence_action("\x1bV"),
            Some(InputAction::Toggle(ToggleKind::CriticalApproval))
        );
        assert_eq!(
            sequence_action("\x1bt"),
            Some(InputAction::Toggle(ToggleKind::Thinking))
        );
        assert_eq!(sequence_action("\x1bq"), None);
    }

    #[test]
    fn unknown_sequences_decode_to_none() {
        assert_eq!(sequence_action("\x1b[99;99~"), None);
        assert_eq!(sequence_action("\x1b]0;title\x07"), None);
    }

    #[test]
    fn control_chars() {
        assert_eq!(control_action('\x7f'), Some(InputAction::Key(EditKey::Backspace)));
        assert_eq!(control_action('\x0f'), Some(InputAction::Key(EditKey::ExpandToolResult)));
        assert_eq!(control_action('\x00'), None);
        assert!(is_text_char('\n'));
        assert!(!is_text_char('\x1b'));
    }
}
