//! Scrollback formatting for queued events.

use std::time::Instant;

use crate::core::text::style;
use crate::core::text::utils::truncate_to_width;
use crate::core::text::width::visible_width;
use crate::core::text::wrap::{wrap_graphemes, wrap_text_with_ansi};
use crate::runtime::scrollback::{CollapsedToolResult, EventKind, UiEvent};

const INTERNAL_MARKERS: [&str; 3] = ["<|", "[[route", "@@internal"];
const RESULT_LEAD: &str = "  ⎿ ";
const RESULT_INDENT: &str = "    ";

/// True for model output that should never reach the transcript: leaked routing markers, or
/// text that is almost entirely punctuation.
pub fn is_garbage(content: &str) -> bool {
    let trimmed = content.trim_start();
    if INTERNAL_MARKERS
        .iter()
        .any(|marker| trimmed.starts_with(marker))
    {
        return true;
    }
    let visible: Vec<char> = content.chars().filter(|ch| !ch.is_whitespace()).collect();
    if visible.len() < 3 {
        return false;
    }
    let alnum = visible.iter().filter(|ch| ch.is_alphanumeric()).count();
    alnum * 10 < visible.len()
}

#[derive(Debug, Default)]
pub struct FormattedEvent {
    pub lines: Vec<String>,
    pub collapsed: Option<CollapsedToolResult>,
}

/// Word-wrap `content` with `first` before the first line and `rest` before the others.
fn prefixed(content: &str, width: usize, first: &str, rest: &str) -> Vec<String> {
    let inner = width.saturating_sub(visible_width(first)).max(1);
    wrap_text_with_ansi(content.trim_end_matches('\n'), inner)
        .into_iter()
        .enumerate()
        .map(|(idx, line)| {
            let lead = if idx == 0 { first } else { rest };
            format!("{lead}{line}")
        })
        .collect()
}

/// Hard-wrap each output line; tool output is not word-wrapped.
fn result_lines<'a>(lines: impl Iterator<Item = &'a str>, width: usize) -> Vec<String> {
    let inner = width.saturating_sub(visible_width(RESULT_INDENT)).max(1);
    let mut out = Vec::new();
    for line in lines {
        for wrapped in wrap_graphemes(&line.replace('\t', "    "), inner) {
            let lead = if out.is_empty() { RESULT_LEAD } else { RESULT_INDENT };
            out.push(format!("{lead}{wrapped}"));
        }
    }
    out
}

fn tool_name(summary: &str) -> String {
    summary
        .split(|ch: char| ch == '(' || ch.is_whitespace())
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or("tool")
        .to_string()
}

/// Formats events into scrollback lines, remembering the last tool call so its result can be
/// collapsed under the right name.
#[derive(Debug)]
pub struct TranscriptFormatter {
    preview_lines: usize,
    last_tool: Option<String>,
}

impl TranscriptFormatter {
    pub fn new(preview_lines: usize) -> Self {
        Self {
            preview_lines: preview_lines.max(1),
            last_tool: None,
        }
    }

    pub fn format(&mut self, event: &UiEvent, width: usize) -> FormattedEvent {
        let width = width.max(4);
        let content = event.content.as_str();
        match event.kind {
            EventKind::Thought | EventKind::Response | EventKind::Stream if is_garbage(content) => {
                FormattedEvent::default()
            }
            EventKind::Prompt => FormattedEvent {
                lines: prefixed(content, width, &style::bold(&style::cyan("❯ ")), "  ")
                    .into_iter()
                    .map(|line| style::bold(&line))
                    .collect(),
                collapsed: None,
            },
            EventKind::Thought => FormattedEvent {
                lines: prefixed(content, width, "  ", "  ")
                    .into_iter()
                    .map(|line| style::dim(&style::italic(&line)))
                    .collect(),
                collapsed: None,
            },
            EventKind::Response | EventKind::Stream => FormattedEvent {
                lines: prefixed(content, width, "● ", "  "),
                collapsed: None,
            },
            EventKind::Tool => {
                let summary = content.lines().next().unwrap_or_default().trim().to_string();
                self.last_tool = Some(tool_name(&summary));
                let line = format!("{} {}", style::green("⏺"), style::bold(&summary));
                FormattedEvent {
                    lines: vec![truncate_to_width(&line, width, "…", false)],
                    collapsed: None,
                }
            }
            EventKind::ToolResult => self.format_tool_result(content, width),
            EventKind::Build => FormattedEvent {
                lines: prefixed(content, width, "⚒ ", "  ")
                    .into_iter()
                    .map(|line| style::yellow(&line))
                    .collect(),
                collapsed: None,
            },
            EventKind::Test => FormattedEvent {
                lines: prefixed(content, width, "◆ ", "  ")
                    .into_iter()
                    .map(|line| style::magenta(&line))
                    .collect(),
                collapsed: None,
            },
            EventKind::Error => FormattedEvent {
                lines: prefixed(content, width, "✗ ", "  ")
                    .into_iter()
                    .map(|line| style::red(&line))
                    .collect(),
                collapsed: None,
            },
        }
    }

    fn format_tool_result(&mut self, content: &str, width: usize) -> FormattedEvent {
        let content = content.trim_end_matches('\n');
        if content.trim().is_empty() {
            return FormattedEvent {
                lines: vec![format!("{RESULT_LEAD}{}", style::dim("(no output)"))],
                collapsed: None,
            };
        }
        let total = content.lines().count();
        if total <= self.preview_lines {
            return FormattedEvent {
                lines: result_lines(content.lines(), width),
                collapsed: None,
            };
        }

        let hidden = total - self.preview_lines;
        let mut lines = result_lines(content.lines().take(self.preview_lines), width);
        lines.push(format!(
            "{RESULT_INDENT}{}",
            style::dim(&format!("… +{hidden} lines (ctrl+o to expand)"))
        ));
        let tool_name = self.last_tool.clone().unwrap_or_else(|| "tool".to_string());
        FormattedEvent {
            lines,
            collapsed: Some(CollapsedToolResult {
                short_summary: format!("{tool_name}: {total} lines"),
                tool_name,
                full_content: content.to_string(),
                created_at: Instant::now(),
            }),
        }
    }
}

/// Full rendering of a previously collapsed tool result.
pub fn format_expanded(result: &CollapsedToolResult, width: usize) -> Vec<String> {
    let mut lines = vec![format!(
        "{} {}",
        style::green("⏺"),
        style::bold(&format!("{} (expanded)", result.short_summary))
    )];
    lines.extend(result_lines(result.full_content.lines(), width.max(4)));
    lines
}

/// One-line stand-in when formatting an event failed.
pub fn fallback_line(kind: EventKind) -> String {
    style::red(&format!("✗ failed to render {kind:?} event"))
}

#[cfg(test)]
mod tests {
    use super::{format_expanded, is_garbage, TranscriptFormatter};
    use crate::core::text::ansi::strip_ansi;
    use crate::runtime::scrollback::{EventKind, UiEvent};

    fn plain(lines: &[String]) -> Vec<String> {
        lines.iter().map(|line| strip_ansi(line)).collect()
    }

    #[test]
    fn garbage_detection() {
        assert!(is_garbage("<|assistant|>"));
        assert!(is_garbage("  [[route:tools]]"));
        assert!(is_garbage("@@internal ping"));
        assert!(is_garbage("...,,,;;;---!!!"));
        assert!(!is_garbage("ok"));
        assert!(!is_garbage("fn main() {}"));
        assert!(!is_garbage(".."));
    }

    #[test]
    fn response_wraps_with_hanging_indent() {
        let mut formatter = TranscriptFormatter::new(3);
        let event = UiEvent::new(EventKind::Response, "alpha beta gamma");
        let lines = plain(&formatter.format(&event, 12).lines);
        assert_eq!(lines, vec!["● alpha beta", "  gamma"]);
    }

    #[test]
    fn garbage_response_is_suppressed() {
        let mut formatter = TranscriptFormatter::new(3);
        let event = UiEvent::new(EventKind::Response, "<|im_end|>");
        assert!(formatter.format(&event, 80).lines.is_empty());
        let tool = UiEvent::new(EventKind::ToolResult, "<|not filtered|>");
        assert!(!formatter.format(&tool, 80).lines.is_empty());
    }

    #[test]
    fn long_tool_result_collapses_under_last_tool_name() {
        let mut formatter = TranscriptFormatter::new(3);
        let call = formatter.format(&UiEvent::new(EventKind::Tool, "Bash(ls -la)"), 80);
        assert_eq!(plain(&call.lines), vec!["⏺ Bash(ls -la)"]);

        let output = (1..=10).map(|n| format!("file{n}")).collect::<Vec<_>>().join("\n");
        let result = formatter.format(&UiEvent::new(EventKind::ToolResult, output.clone()), 80);
        assert_eq!(
            plain(&result.lines),
            vec![
                "  ⎿ file1",
                "    file2",
                "    file3",
                "    … +7 lines (ctrl+o to expand)"
            ]
        );
        let collapsed = result.collapsed.expect("collapsed");
        assert_eq!(collapsed.tool_name, "Bash");
        assert_eq!(collapsed.full_content, output);

        let expanded = plain(&format_expanded(&collapsed, 80));
        assert_eq!(expanded[0], "⏺ Bash: 10 lines (expanded)");
        assert_eq!(expanded.len(), 11);
    }

    #[test]
    fn short_tool_result_is_not_collapsed() {
        let mut formatter = TranscriptFormatter::new(3);
        let result = formatter.format(&UiEvent::new(EventKind::ToolResult, "a\nb"), 80);
        assert!(result.collapsed.is_none());
        assert_eq!(plain(&result.lines), vec!["  ⎿ a", "    b"]);
        let empty = formatter.format(&UiEvent::new(EventKind::ToolResult, ""), 80);
        assert_eq!(plain(&empty.lines), vec!["  ⎿ (no output)"]);
    }

    #[test]
    fn error_and_prompt_prefixes() {
        let mut formatter = TranscriptFormatter::new(3);
        let error = formatter.format(&UiEvent::new(EventKind::Error, "boom"), 80);
        assert_eq!(plain(&error.lines), vec!["✗ boom"]);
        let prompt = formatter.format(&UiEvent::new(EventKind::Prompt, "hello"), 80);
        assert_eq!(plain(&prompt.lines), vec!["❯ hello"]);
    }
}
