//! Status, toggle and shortcut lines at the bottom of the overlay.

use crate::core::actions::ToggleKind;
use crate::core::state::{StatusMeta, ToggleState};
use crate::core::text::style;

const SEPARATOR: &str = " · ";

/// `model · ctx 42% · profile · dir`, or `None` when nothing is known.
pub fn status_line(meta: &StatusMeta) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(model) = meta.model.as_deref().filter(|m| !m.is_empty()) {
        parts.push(style::cyan(model));
    }
    if let Some(percent) = meta.context_percent {
        let text = format!("ctx {percent}%");
        parts.push(match percent {
            0..=69 => style::gray(&text),
            70..=89 => style::yellow(&text),
            _ => style::red(&text),
        });
    }
    if let Some(profile) = meta.profile.as_deref().filter(|p| !p.is_empty()) {
        parts.push(style::gray(profile));
    }
    if let Some(directory) = meta.directory.as_deref().filter(|d| !d.is_empty()) {
        parts.push(style::gray(directory));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(&style::dim(SEPARATOR)))
    }
}

fn toggle_value(kind: ToggleKind, toggles: &ToggleState) -> (&'static str, String) {
    match kind {
        ToggleKind::AutoContinue => ("auto", toggles.auto_continue.label().to_string()),
        ToggleKind::CriticalApproval => ("approval", toggles.approval.label().to_string()),
        ToggleKind::Thinking => ("thinking", toggles.thinking.clone()),
    }
}

pub fn toggle_line(toggles: &ToggleState, queued: usize) -> String {
    let mut parts: Vec<String> = ToggleKind::ALL
        .iter()
        .map(|kind| {
            let (name, value) = toggle_value(*kind, toggles);
            format!("{} {name}: {}", style::dim(kind.hotkey_label()), style::bold(&value))
        })
        .collect();
    if toggles.debug {
        parts.push(style::magenta("debug"));
    }
    if queued > 0 {
        parts.push(style::yellow(&format!("{queued} queued")));
    }
    parts.join(&style::dim(SEPARATOR))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutContext {
    Idle,
    Streaming,
    Menu,
}

const IDLE_SHORTCUTS: &[(&str, &str)] = &[
    ("enter", "send"),
    ("⌥A", "auto"),
    ("/", "commands"),
    ("ctrl+o", "expand"),
    ("ctrl+c", "clear"),
    ("ctrl+d", "exit"),
];

const STREAMING_SHORTCUTS: &[(&str, &str)] = &[
    ("enter", "queue"),
    ("⌥T", "thinking"),
    ("ctrl+c", "interrupt"),
    ("ctrl+o", "expand"),
];

const MENU_SHORTCUTS: &[(&str, &str)] = &[("↑↓", "navigate"), ("enter", "select"), ("esc", "cancel")];

/// Shortcut hints for `context`, skipping any key already printed in `shown`.
pub fn shortcut_line(context: ShortcutContext, shown: &str) -> String {
    let table = match context {
        ShortcutContext::Idle => IDLE_SHORTCUTS,
        ShortcutContext::Streaming => STREAMING_SHORTCUTS,
        ShortcutContext::Menu => MENU_SHORTCUTS,
    };
    let hints: Vec<String> = table
        .iter()
        .filter(|(keys, _)| !shown.contains(keys))
        .map(|(keys, label)| format!("{keys} {label}"))
        .collect();
    style::dim(&hints.join(SEPARATOR))
}

#[cfg(test)]
mod tests {
    use super::{shortcut_line, status_line, toggle_line, ShortcutContext};
    use crate::core::state::{StatusMeta, ToggleState};
    use crate::core::text::ansi::strip_ansi;

    #[test]
    fn status_line_joins_known_fields() {
        assert_eq!(status_line(&StatusMeta::default()), None);
        let meta = StatusMeta {
            model: Some("gpt-5".to_string()),
            context_percent: Some(42),
            directory: Some("~/src".to_string()),
            ..StatusMeta::default()
        };
        assert_eq!(
            strip_ansi(&status_line(&meta).expect("line")),
            "gpt-5 · ctx 42% · ~/src"
        );
    }

    #[test]
    fn shortcuts_skip_hotkeys_in_toggle_line() {
        let toggles = toggle_line(&ToggleState::default(), 2);
        let plain = strip_ansi(&toggles);
        assert!(plain.starts_with("⌥A auto: off · ⌥V approval: ask · ⌥T thinking: normal"));
        assert!(plain.ends_with("2 queued"));

        let shortcuts = strip_ansi(&shortcut_line(ShortcutContext::Idle, &toggles));
        assert!(!shortcuts.contains("⌥A"));
        assert!(shortcuts.starts_with("enter send · / commands"));

        let streaming = strip_ansi(&shortcut_line(ShortcutContext::Streaming, ""));
        assert!(streaming.contains("⌥T thinking"));
    }
}
