//! Menu and panel line rendering for the overlay.

use crate::core::text::style;
use crate::core::text::utils::truncate_to_width;
use crate::runtime::menu::MenuState;

fn single_line(text: &str) -> String {
    text.split(['\n', '\r'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Keep at most `max` lines, replacing the tail with `… N more`.
pub fn cap_lines(lines: &[String], max: usize, width: usize) -> Vec<String> {
    let max = max.max(1);
    if lines.len() <= max {
        return lines
            .iter()
            .map(|line| truncate_to_width(line, width, "…", false))
            .collect();
    }
    let keep = max - 1;
    let mut out: Vec<String> = lines[..keep]
        .iter()
        .map(|line| truncate_to_width(line, width, "…", false))
        .collect();
    out.push(style::dim(&format!("  … {} more", lines.len() - keep)));
    out
}

/// Title, then a window of items around the selection of at most `max_lines` rows.
pub fn render_menu(menu: &MenuState, width: usize, max_lines: usize) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(title) = menu.title.as_deref().filter(|title| !title.is_empty()) {
        lines.push(style::bold(&truncate_to_width(title, width, "…", false)));
    }
    if menu.items.is_empty() {
        lines.push(style::dim("  (no options)"));
        return lines;
    }

    let visible = max_lines.max(2).saturating_sub(1).min(menu.items.len());
    let start = if menu.items.len() <= visible {
        0
    } else {
        menu.selected
            .saturating_sub(visible / 2)
            .min(menu.items.len() - visible)
    };
    let end = start + visible;

    for (idx, item) in menu.items.iter().enumerate().take(end).skip(start) {
        let marker = if item.is_active { " ✓" } else { "" };
        let mut text = format!("{}{marker}", item.label);
        if let Some(description) = item.description.as_deref() {
            let description = single_line(description);
            if !description.is_empty() {
                text.push_str("  ");
                text.push_str(&style::dim(&description));
            }
        }
        let line = if idx == menu.selected {
            style::cyan(&format!("→ {text}"))
        } else if item.disabled {
            style::dim(&format!("  {text}"))
        } else {
            format!("  {text}")
        };
        lines.push(truncate_to_width(&line, width, "…", false));
    }

    let hidden = menu.items.len() - (end - start);
    if hidden > 0 {
        lines.push(style::dim(&format!(
            "  … {hidden} more ({}/{})",
            menu.selected + 1,
            menu.items.len()
        )));
    }
    lines
}
