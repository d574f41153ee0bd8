//! Pure composition of the pinned overlay.
//!
//! `compose` turns a borrowed snapshot of engine state into an [`OverlayFrame`]. It never touches
//! the terminal; the painter decides whether and how the frame reaches the screen.
//!
//! Order, top to bottom: activity line, divider, input rows, divider, panel or menu, suggestions,
//! status line, toggle line, shortcut line.
//!
//! A frame is never taller than the terminal. When space runs out the panel or menu shrinks
//! first, then the input rows, then the suggestion list.

use std::borrow::Cow;
use std::ops::Range;
use std::time::Duration;

use crate::core::input_buffer::CollapsedPaste;
use crate::core::state::{StatusMeta, ToggleState};
use crate::core::suggestions::CommandSpec;
use crate::core::text::style;
use crate::core::text::utils::truncate_to_width;
use crate::core::text::width::{char_width, visible_width};
use crate::render::frame::OverlayFrame;
use crate::runtime::menu::MenuState;
use crate::widgets::menu_list::{cap_lines, render_menu};
use crate::widgets::spinner::{accent_glyph, format_elapsed, spinner_glyph};
use crate::widgets::status_line::{shortcut_line, status_line, toggle_line, ShortcutContext};

const MASK_CHAR: char = '•';

/// The edit line as the overlay sees it.
#[derive(Debug, Clone, Copy)]
pub struct InputView<'a> {
    pub prompt: &'a str,
    pub chars: &'a [char],
    pub cursor: usize,
    pub collapsed: Option<&'a CollapsedPaste>,
    pub masked: bool,
    pub render_offset: usize,
    pub max_rows: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ActivityView<'a> {
    pub streaming: bool,
    pub spinner_frame: usize,
    pub accent_frame: usize,
    pub message: Option<&'a str>,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Copy, Default)]
pub enum PanelView<'a> {
    #[default]
    Empty,
    Lines(&'a [String]),
    Menu(&'a MenuState),
}

#[derive(Debug, Clone)]
pub struct OverlaySnapshot<'a> {
    pub width: usize,
    pub rows: usize,
    pub input: InputView<'a>,
    pub activity: ActivityView<'a>,
    pub panel: PanelView<'a>,
    pub max_panel_lines: usize,
    pub suggestions: Vec<&'a CommandSpec>,
    pub selected_suggestion: usize,
    pub meta: &'a StatusMeta,
    pub toggles: &'a ToggleState,
    pub queued: usize,
}

/// Wrapped rows of the edit line, as char ranges, plus the cursor position in row/column terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputLayout {
    pub rows: Vec<Range<usize>>,
    pub cursor_row: usize,
    pub cursor_col: usize,
}

/// Wrap `chars` into rows of at most `width` columns. Newlines always break a row. A cursor that
/// sits after a full row is placed at the start of the next one.
pub fn layout_input(chars: &[char], cursor: usize, width: usize) -> InputLayout {
    let width = width.max(1);
    let cursor = cursor.min(chars.len());
    let mut rows = Vec::new();
    let mut start = 0;
    let mut col = 0;
    let mut cursor_at = None;

    for (idx, ch) in chars.iter().enumerate() {
        if *ch == '\n' {
            if idx == cursor {
                cursor_at = Some((rows.len(), col));
            }
            rows.push(start..idx);
            start = idx + 1;
            col = 0;
            continue;
        }
        let w = char_width(*ch);
        if col + w > width && col > 0 {
            rows.push(start..idx);
            start = idx;
            col = 0;
        }
        if idx == cursor {
            cursor_at = Some((rows.len(), col));
        }
        col += w;
    }

    if cursor == chars.len() {
        if col >= width {
            rows.push(start..chars.len());
            start = chars.len();
            col = 0;
        }
        cursor_at = Some((rows.len(), col));
    }
    rows.push(start..chars.len());

    let (cursor_row, cursor_col) = cursor_at.unwrap_or((0, 0));
    InputLayout {
        rows,
        cursor_row,
        cursor_col,
    }
}

/// The chars the edit line displays: the text itself, or one mask char per char.
pub fn display_chars(chars: &[char], masked: bool) -> Cow<'_, [char]> {
    if masked {
        Cow::Owned(vec![MASK_CHAR; chars.len()])
    } else {
        Cow::Borrowed(chars)
    }
}

/// First visible row of a `max_rows` window that keeps `cursor_row` on screen.
pub fn visible_window_start(offset: usize, cursor_row: usize, total_rows: usize, max_rows: usize) -> usize {
    let max_rows = max_rows.max(1);
    let mut start = offset;
    if cursor_row < start {
        start = cursor_row;
    } else if cursor_row >= start + max_rows {
        start = cursor_row + 1 - max_rows;
    }
    start.min(total_rows.saturating_sub(max_rows))
}

pub fn collapsed_label(collapsed: &CollapsedPaste) -> String {
    let mut label = format!(
        "[Pasted text: {} lines, {} chars]",
        collapsed.line_count, collapsed.char_count
    );
    if collapsed.truncated {
        label.push_str(" (truncated)");
    }
    label
}

fn divider(width: usize) -> String {
    style::dim(&"─".repeat(width))
}

fn activity_line(activity: &ActivityView<'_>) -> Option<String> {
    if !activity.streaming {
        return activity
            .message
            .filter(|message| !message.is_empty())
            .map(style::dim);
    }
    let message = activity
        .message
        .filter(|message| !message.is_empty())
        .unwrap_or("Working");
    let elapsed = format_elapsed(activity.elapsed.as_secs());
    let elapsed = match activity.accent_frame % 4 {
        0 => style::gray(&elapsed),
        1 | 3 => style::cyan(&elapsed),
        _ => style::magenta(&elapsed),
    };
    Some(format!(
        "{} {message}… {} {elapsed} {}",
        style::cyan(spinner_glyph(activity.spinner_frame)),
        style::dim(accent_glyph(activity.accent_frame)),
        style::dim("· ctrl+c to interrupt"),
    ))
}

fn render_row(chars: &[char], range: Range<usize>, cursor: Option<usize>) -> String {
    let mut out = String::new();
    for idx in range.clone() {
        let ch = chars[idx];
        if Some(idx) == cursor {
            out.push_str(&style::reverse(&ch.to_string()));
        } else {
            out.push(ch);
        }
    }
    if cursor.is_some_and(|cursor| cursor >= range.end) {
        out.push_str(&style::reverse(" "));
    }
    out
}

/// Input rows (at most `max_rows`) plus the cursor's (row, column) relative to the first
/// returned row.
fn input_rows(input: &InputView<'_>, width: usize, max_rows: usize) -> (Vec<String>, usize, usize) {
    let prefix_width = visible_width(input.prompt);
    let indent = " ".repeat(prefix_width);

    if let Some(collapsed) = input.collapsed {
        let label = style::cyan(&collapsed_label(collapsed));
        let line = format!("{}{label} {}", input.prompt, style::reverse(" "));
        let col = prefix_width + visible_width(&collapsed_label(collapsed)) + 1;
        return (vec![line], 0, col.min(width.saturating_sub(1)));
    }

    // One column is reserved for the cursor block at the end of a full row.
    let text_width = width.saturating_sub(prefix_width + 1).max(1);
    let chars = display_chars(input.chars, input.masked);
    let layout = layout_input(&chars, input.cursor, text_width);
    let max_rows = max_rows.max(1);
    let start = visible_window_start(
        input.render_offset,
        layout.cursor_row,
        layout.rows.len(),
        max_rows,
    );
    let end = (start + max_rows).min(layout.rows.len());

    let mut lines = Vec::with_capacity(end - start);
    for (row_idx, range) in layout.rows[start..end].iter().enumerate() {
        let row = start + row_idx;
        let cursor = (row == layout.cursor_row).then_some(input.cursor);
        let lead = if row == 0 { input.prompt } else { indent.as_str() };
        lines.push(format!("{lead}{}", render_row(&chars, range.clone(), cursor)));
    }
    (
        lines,
        layout.cursor_row - start,
        prefix_width + layout.cursor_col,
    )
}

fn suggestion_lines(snapshot: &OverlaySnapshot<'_>) -> Vec<String> {
    let command_width = snapshot
        .suggestions
        .iter()
        .map(|spec| visible_width(&spec.command))
        .max()
        .unwrap_or(0);
    snapshot
        .suggestions
        .iter()
        .enumerate()
        .map(|(idx, spec)| {
            let pad = " ".repeat(command_width - visible_width(&spec.command));
            let description = style::dim(&spec.description);
            if idx == snapshot.selected_suggestion {
                format!("{} {pad} {description}", style::cyan(&format!("→ {}", spec.command)))
            } else {
                format!("  {}{pad}  {description}", spec.command)
            }
        })
        .collect()
}

/// Keep at most `room` suggestions, sliding the window so the selected one stays listed.
fn window_suggestions(mut lines: Vec<String>, selected: usize, room: usize) -> Vec<String> {
    if lines.len() <= room {
        return lines;
    }
    let start = (selected + 1).saturating_sub(room).min(lines.len() - room);
    lines.drain(..start);
    lines.truncate(room);
    lines
}

fn panel_lines(snapshot: &OverlaySnapshot<'_>, width: usize, cap: usize) -> Vec<String> {
    match snapshot.panel {
        PanelView::Empty => Vec::new(),
        PanelView::Lines(panel) => cap_lines(panel, cap, width),
        PanelView::Menu(menu) => render_menu(menu, width, cap),
    }
}

/// Panel or menu lines that fit in `room` rows, re-rendering with a smaller cap so the
/// `… N more` line survives when it can.
fn fit_panel(snapshot: &OverlaySnapshot<'_>, width: usize, room: usize) -> Vec<String> {
    if room == 0 {
        return Vec::new();
    }
    let mut cap = snapshot.max_panel_lines.min(room).max(1);
    loop {
        let mut lines = panel_lines(snapshot, width, cap);
        if lines.len() <= room || cap == 1 {
            lines.truncate(room);
            return lines;
        }
        cap -= 1;
    }
}

pub fn compose(snapshot: &OverlaySnapshot<'_>) -> OverlayFrame {
    let width = snapshot.width.max(1);
    let height = snapshot.rows.max(1);
    let menu_open = matches!(snapshot.panel, PanelView::Menu(_));

    let activity = activity_line(&snapshot.activity);
    let status = status_line(snapshot.meta);
    let toggles = toggle_line(snapshot.toggles, snapshot.queued);
    let context = if menu_open {
        ShortcutContext::Menu
    } else if snapshot.activity.streaming {
        ShortcutContext::Streaming
    } else {
        ShortcutContext::Idle
    };
    let shortcuts = shortcut_line(context, &toggles);

    // Dividers, toggle line and shortcut line always take a row each.
    let fixed = 4 + usize::from(activity.is_some()) + usize::from(status.is_some());
    let budget = height.saturating_sub(fixed);

    let max_input_rows = snapshot.input.max_rows.max(1);
    let wanted_input = input_rows(&snapshot.input, width, max_input_rows).0.len();
    let suggestions = if menu_open {
        Vec::new()
    } else {
        suggestion_lines(snapshot)
    };
    let panel = fit_panel(
        snapshot,
        width,
        budget.saturating_sub(wanted_input + suggestions.len()),
    );
    let input_room = budget
        .saturating_sub(panel.len() + suggestions.len())
        .clamp(1, max_input_rows);
    let (rows, cursor_row, cursor_col) = input_rows(&snapshot.input, width, input_room);
    let suggestions = window_suggestions(
        suggestions,
        snapshot.selected_suggestion,
        budget.saturating_sub(panel.len() + rows.len()),
    );

    let mut lines = Vec::new();
    lines.extend(activity);
    lines.push(divider(width));
    let input_top = lines.len();
    lines.extend(rows);
    lines.push(divider(width));
    lines.extend(panel);
    lines.extend(suggestions);
    lines.extend(status);
    lines.push(toggles);
    lines.push(shortcuts);

    // Terminals too short for even the fixed rows: keep a window around the cursor.
    let mut cursor_row = input_top + cursor_row;
    if lines.len() > height {
        let start = (cursor_row + 1).saturating_sub(height);
        lines.drain(..start);
        lines.truncate(height);
        cursor_row -= start;
    }

    let lines = lines
        .into_iter()
        .map(|line| truncate_to_width(&line, width, "", false))
        .collect();
    OverlayFrame::new(lines, cursor_row, cursor_col)
}

#[cfg(test)]
mod tests {
    use super::{compose, layout_input, ActivityView, InputView, OverlaySnapshot, PanelView};
    use crate::core::input_buffer::CollapsedPaste;
    use crate::core::state::{StatusMeta, ToggleState};
    use crate::core::suggestions::CommandSpec;
    use crate::core::text::ansi::strip_ansi;
    use crate::runtime::menu::{MenuController, MenuItem};
    use std::time::Duration;

    fn chars(text: &str) -> Vec<char> {
        text.chars().collect()
    }

    fn input<'a>(chars: &'a [char], cursor: usize) -> InputView<'a> {
        InputView {
            prompt: "❯ ",
            chars,
            cursor,
            collapsed: None,
            masked: false,
            render_offset: 0,
            max_rows: 8,
        }
    }

    fn snapshot<'a>(
        input: InputView<'a>,
        meta: &'a StatusMeta,
        toggles: &'a ToggleState,
    ) -> OverlaySnapshot<'a> {
        OverlaySnapshot {
            width: 40,
            rows: 24,
            input,
            activity: ActivityView::default(),
            panel: PanelView::Empty,
            max_panel_lines: 12,
            suggestions: Vec::new(),
            selected_suggestion: 0,
            meta,
            toggles,
            queued: 0,
        }
    }

    fn plain(lines: &[String]) -> Vec<String> {
        lines.iter().map(|line| strip_ansi(line)).collect()
    }

    #[test]
    fn layout_wraps_and_breaks_on_newlines() {
        let text = chars("abcdef\ngh");
        let layout = layout_input(&text, 9, 4);
        assert_eq!(layout.rows, vec![0..4, 4..6, 7..9]);
        assert_eq!((layout.cursor_row, layout.cursor_col), (2, 2));

        let layout = layout_input(&text, 6, 4);
        assert_eq!((layout.cursor_row, layout.cursor_col), (1, 2));
    }

    #[test]
    fn cursor_after_full_row_moves_to_next_row() {
        let text = chars("abcd");
        let layout = layout_input(&text, 4, 4);
        assert_eq!(layout.rows, vec![0..4, 4..4]);
        assert_eq!((layout.cursor_row, layout.cursor_col), (1, 0));
    }

    #[test]
    fn wide_chars_wrap_before_overflowing() {
        let text = chars("a界b");
        let layout = layout_input(&text, 2, 2);
        assert_eq!(layout.rows, vec![0..1, 1..2, 2..3]);
        assert_eq!((layout.cursor_row, layout.cursor_col), (2, 0));
    }

    #[test]
    fn idle_frame_order_and_cursor() {
        let meta = StatusMeta {
            model: Some("gpt-5".to_string()),
            ..StatusMeta::default()
        };
        let toggles = ToggleState::default();
        let text = chars("hi");
        let frame = compose(&snapshot(input(&text, 2), &meta, &toggles));
        let lines = plain(&frame.lines);
        assert!(lines[0].starts_with("───"));
        assert_eq!(lines[1], "❯ hi ");
        assert!(lines[2].starts_with("───"));
        assert_eq!(lines[3], "gpt-5");
        assert!(lines[4].starts_with("⌥A auto: off"));
        assert!(lines[5].starts_with("enter send"));
        assert_eq!(frame.cursor_row, 1);
        assert_eq!(frame.cursor_col, 4);
        assert!(frame.lines[1].contains("\x1b[7m \x1b[27m"));
    }

    #[test]
    fn streaming_adds_activity_line() {
        let meta = StatusMeta::default();
        let toggles = ToggleState::default();
        let text = chars("");
        let mut snap = snapshot(input(&text, 0), &meta, &toggles);
        snap.activity = ActivityView {
            streaming: true,
            spinner_frame: 0,
            accent_frame: 1,
            message: Some("Thinking"),
            elapsed: Duration::from_secs(65),
        };
        let frame = compose(&snap);
        let lines = plain(&frame.lines);
        assert!(lines[0].starts_with("⠋ Thinking…"));
        assert!(lines[0].contains("1m 05s"));
        assert_eq!(frame.cursor_row, 2);
        assert!(lines.last().is_some_and(|line| line.starts_with("enter queue")));
    }

    #[test]
    fn collapsed_paste_renders_chip() {
        let meta = StatusMeta::default();
        let toggles = ToggleState::default();
        let collapsed = CollapsedPaste {
            line_count: 3,
            char_count: 18,
            full_text: "line1\nline2\nline3\n".to_string(),
            truncated: false,
        };
        let mut view = input(&[], 0);
        view.collapsed = Some(&collapsed);
        let frame = compose(&snapshot(view, &meta, &toggles));
        assert_eq!(
            plain(&frame.lines)[1],
            "❯ [Pasted text: 3 lines, 18 chars]  "
        );
    }

    #[test]
    fn masked_input_hides_characters() {
        let meta = StatusMeta::default();
        let toggles = ToggleState::default();
        let text = chars("hunter2");
        let mut view = input(&text, 7);
        view.masked = true;
        view.prompt = "Password: ";
        let frame = compose(&snapshot(view, &meta, &toggles));
        assert_eq!(plain(&frame.lines)[1], "Password: ••••••• ");
        assert_eq!(frame.cursor_col, 17);
    }

    #[test]
    fn panel_is_capped_and_suggestions_listed() {
        let meta = StatusMeta::default();
        let toggles = ToggleState::default();
        let text = chars("/h");
        let panel: Vec<String> = (0..20).map(|idx| format!("help {idx}")).collect();
        let help = CommandSpec::new("/help", "Show help", "general");
        let hint = CommandSpec::new("/hint", "Get a hint", "general");
        let mut snap = snapshot(input(&text, 2), &meta, &toggles);
        snap.panel = PanelView::Lines(&panel);
        snap.suggestions = vec![&help, &hint];
        snap.selected_suggestion = 1;
        let lines = plain(&compose(&snap).lines);
        assert_eq!(lines[3], "help 0");
        assert_eq!(lines[14], "  … 9 more");
        assert_eq!(lines[15], "  /help  Show help");
        assert_eq!(lines[16], "→ /hint  Get a hint");
    }

    #[test]
    fn long_input_scrolls_to_keep_cursor_visible() {
        let meta = StatusMeta::default();
        let toggles = ToggleState::default();
        let text = chars("1\n2\n3\n4\n5");
        let mut view = input(&text, text.len());
        view.max_rows = 2;
        let frame = compose(&snapshot(view, &meta, &toggles));
        let lines = plain(&frame.lines);
        assert_eq!(lines[1], "  4");
        assert_eq!(lines[2], "  5 ");
        assert_eq!(frame.cursor_row, 2);
    }

    #[test]
    fn masked_wide_chars_lay_out_as_mask_width() {
        let meta = StatusMeta::default();
        let toggles = ToggleState::default();
        let text = chars("界界界");
        let mut view = input(&text, 3);
        view.masked = true;
        let frame = compose(&snapshot(view, &meta, &toggles));
        assert_eq!(plain(&frame.lines)[1], "❯ ••• ");
        assert_eq!(frame.cursor_col, 5);
    }

    #[test]
    fn tall_content_shrinks_to_terminal_height() {
        let meta = StatusMeta {
            model: Some("sonnet".to_string()),
            ..StatusMeta::default()
        };
        let toggles = ToggleState::default();
        let words = vec!["word"; 100].join(" ");
        let text = chars(&words);
        let mut menu = MenuController::default();
        let items = (0..30)
            .map(|idx| MenuItem::new(format!("{idx}"), format!("Item {idx}")))
            .collect();
        menu.open(items, Some("Pick".to_string()), Box::new(|_| {}))
            .expect("open");

        let mut snap = snapshot(input(&text, text.len()), &meta, &toggles);
        snap.panel = PanelView::Menu(menu.state().expect("open"));
        for rows in [24, 12, 8, 6] {
            snap.rows = rows;
            let frame = compose(&snap);
            assert!(frame.height() <= rows, "height {} rows {rows}", frame.height());
            let lines = plain(&frame.lines);
            assert!(lines[frame.cursor_row].ends_with(' '), "rows {rows}: {lines:?}");
        }

        snap.rows = 12;
        let lines = plain(&compose(&snap).lines);
        assert!(lines.iter().any(|line| line == "sonnet"));
        assert!(lines.iter().any(|line| line.contains("enter select")));
    }

    #[test]
    fn suggestion_window_keeps_selection() {
        let meta = StatusMeta::default();
        let toggles = ToggleState::default();
        let text = chars("/");
        let specs: Vec<CommandSpec> = (0..5)
            .map(|idx| CommandSpec::new(format!("/c{idx}"), "cmd", "general"))
            .collect();
        let mut snap = snapshot(input(&text, 1), &meta, &toggles);
        snap.suggestions = specs.iter().collect();
        snap.selected_suggestion = 4;
        snap.rows = 7;
        let lines = plain(&compose(&snap).lines);
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[3], "  /c3  cmd");
        assert_eq!(lines[4], "→ /c4  cmd");
    }

    #[test]
    fn every_line_fits_width() {
        let meta = StatusMeta {
            model: Some("a-very-long-model-name-that-overflows".to_string()),
            directory: Some("/some/deeply/nested/working/directory".to_string()),
            ..StatusMeta::default()
        };
        let toggles = ToggleState::default();
        let text = chars("x");
        let mut snap = snapshot(input(&text, 1), &meta, &toggles);
        snap.width = 20;
        for line in compose(&snap).lines {
            assert!(crate::core::text::width::visible_width(&line) <= 20, "{line:?}");
        }
    }
}
