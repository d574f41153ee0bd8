//! Scrollback event queue and the collapsed tool-result stack.
//!
//! Prompts jump ahead of everything except earlier prompts. Adjacent response/thought events are
//! merged when drained. A drained event identical to the last one handed out is dropped.

use std::collections::VecDeque;
use std::time::Instant;

use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Prompt,
    Thought,
    Stream,
    Tool,
    ToolResult,
    Build,
    Test,
    Response,
    Error,
}

impl EventKind {
    fn coalesces(self) -> bool {
        matches!(self, EventKind::Response | EventKind::Thought)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiEvent {
    pub kind: EventKind,
    pub content: String,
    pub timestamp: Instant,
}

impl UiEvent {
    pub fn new(kind: EventKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            timestamp: Instant::now(),
        }
    }
}

/// Join two chunks with a newline only when neither side already has one at the seam.
pub fn join_chunks(left: &str, right: &str) -> String {
    if left.is_empty() || left.ends_with('\n') || right.starts_with('\n') {
        format!("{left}{right}")
    } else {
        format!("{left}\n{right}")
    }
}

#[derive(Debug, Default)]
pub struct ScrollbackQueue {
    pending: VecDeque<UiEvent>,
    last_rendered: Option<(EventKind, String)>,
    stream: String,
}

impl ScrollbackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Queue an event. Returns false when it was absorbed into the stream buffer.
    pub fn enqueue(&mut self, event: UiEvent) -> bool {
        if event.kind == EventKind::Stream {
            self.stream.push_str(&event.content);
            return false;
        }
        if event.kind == EventKind::Prompt {
            let at = self
                .pending
                .iter()
                .position(|queued| queued.kind != EventKind::Prompt)
                .unwrap_or(self.pending.len());
            self.pending.insert(at, event);
        } else {
            self.pending.push_back(event);
        }
        true
    }

    pub fn stream_buffer(&self) -> &str {
        &self.stream
    }

    /// Turn accumulated stream text into a queued response.
    pub fn flush_stream(&mut self) -> bool {
        if self.stream.trim().is_empty() {
            self.stream.clear();
            return false;
        }
        let text = std::mem::take(&mut self.stream);
        self.enqueue(UiEvent::new(EventKind::Response, text))
    }

    /// Pop the next event, merged with any following events of the same coalescing kind.
    /// A merged event equal to the previously popped one is skipped.
    pub fn pop_next(&mut self) -> Option<UiEvent> {
        loop {
            let event = self.pop_merged()?;
            let key = (event.kind, event.content.clone());
            if self.last_rendered.as_ref() == Some(&key) {
                trace!(kind = ?event.kind, "duplicate scrollback event dropped");
                continue;
            }
            self.last_rendered = Some(key);
            return Some(event);
        }
    }

    fn pop_merged(&mut self) -> Option<UiEvent> {
        let mut event = self.pending.pop_front()?;
        if event.kind.coalesces() {
            while self
                .pending
                .front()
                .is_some_and(|next| next.kind == event.kind)
            {
                if let Some(next) = self.pending.pop_front() {
                    event.content = join_chunks(&event.content, &next.content);
                }
            }
        }
        Some(event)
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.stream.clear();
        self.last_rendered = None;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollapsedToolResult {
    pub tool_name: String,
    pub full_content: String,
    pub short_summary: String,
    pub created_at: Instant,
}

/// Bounded stack of collapsed tool results; the oldest entry is evicted first.
#[derive(Debug)]
pub struct ToolResultStack {
    entries: VecDeque<CollapsedToolResult>,
    capacity: usize,
}

impl ToolResultStack {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, entry: CollapsedToolResult) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn pop(&mut self) -> Option<CollapsedToolResult> {
        self.entries.pop_back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{
        join_chunks, CollapsedToolResult, EventKind, ScrollbackQueue, ToolResultStack, UiEvent,
    };
    use std::time::Instant;

    fn kinds(queue: &mut ScrollbackQueue) -> Vec<(EventKind, String)> {
        std::iter::from_fn(|| queue.pop_next())
            .map(|event| (event.kind, event.content))
            .collect()
    }

    #[test]
    fn prompts_jump_ahead_but_stay_ordered() {
        let mut queue = ScrollbackQueue::new();
        queue.enqueue(UiEvent::new(EventKind::Tool, "Read(a)"));
        queue.enqueue(UiEvent::new(EventKind::Prompt, "first"));
        queue.enqueue(UiEvent::new(EventKind::Build, "ok"));
        queue.enqueue(UiEvent::new(EventKind::Prompt, "second"));
        assert_eq!(
            kinds(&mut queue),
            vec![
                (EventKind::Prompt, "first".to_string()),
                (EventKind::Prompt, "second".to_string()),
                (EventKind::Tool, "Read(a)".to_string()),
                (EventKind::Build, "ok".to_string()),
            ]
        );
    }

    #[test]
    fn adjacent_responses_coalesce() {
        let mut queue = ScrollbackQueue::new();
        queue.enqueue(UiEvent::new(EventKind::Response, "one"));
        queue.enqueue(UiEvent::new(EventKind::Response, "two\n"));
        queue.enqueue(UiEvent::new(EventKind::Response, "three"));
        queue.enqueue(UiEvent::new(EventKind::Thought, "hmm"));
        queue.enqueue(UiEvent::new(EventKind::Tool, "Bash(ls)"));
        queue.enqueue(UiEvent::new(EventKind::Tool, "Bash(pwd)"));
        assert_eq!(
            kinds(&mut queue),
            vec![
                (EventKind::Response, "one\ntwo\nthree".to_string()),
                (EventKind::Thought, "hmm".to_string()),
                (EventKind::Tool, "Bash(ls)".to_string()),
                (EventKind::Tool, "Bash(pwd)".to_string()),
            ]
        );
    }

    #[test]
    fn join_respects_existing_newlines() {
        assert_eq!(join_chunks("a", "b"), "a\nb");
        assert_eq!(join_chunks("a\n", "b"), "a\nb");
        assert_eq!(join_chunks("a", "\nb"), "a\nb");
    }

    #[test]
    fn duplicate_of_last_drained_is_dropped() {
        let mut queue = ScrollbackQueue::new();
        queue.enqueue(UiEvent::new(EventKind::Build, "ok"));
        queue.enqueue(UiEvent::new(EventKind::Build, "ok"));
        queue.enqueue(UiEvent::new(EventKind::Test, "ok"));
        queue.enqueue(UiEvent::new(EventKind::Build, "ok"));
        assert_eq!(queue.len(), 4);
        assert_eq!(
            kinds(&mut queue),
            vec![
                (EventKind::Build, "ok".to_string()),
                (EventKind::Test, "ok".to_string()),
                (EventKind::Build, "ok".to_string()),
            ]
        );
    }

    #[test]
    fn identical_response_chunks_merge_instead_of_dropping() {
        let mut queue = ScrollbackQueue::new();
        queue.enqueue(UiEvent::new(EventKind::Response, "ha"));
        queue.enqueue(UiEvent::new(EventKind::Response, "ha"));
        assert_eq!(kinds(&mut queue), vec![(EventKind::Response, "ha\nha".to_string())]);
    }

    #[test]
    fn repeat_after_drain_is_dropped() {
        let mut queue = ScrollbackQueue::new();
        queue.enqueue(UiEvent::new(EventKind::Response, "done"));
        assert!(queue.pop_next().is_some());
        queue.enqueue(UiEvent::new(EventKind::Response, "done"));
        assert!(queue.pop_next().is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn stream_chunks_flush_as_one_response() {
        let mut queue = ScrollbackQueue::new();
        queue.enqueue(UiEvent::new(EventKind::Stream, "Hel"));
        queue.enqueue(UiEvent::new(EventKind::Stream, "lo"));
        assert!(queue.is_empty());
        assert_eq!(queue.stream_buffer(), "Hello");
        assert!(queue.flush_stream());
        assert!(!queue.flush_stream());
        assert_eq!(kinds(&mut queue), vec![(EventKind::Response, "Hello".to_string())]);
    }

    #[test]
    fn tool_stack_evicts_oldest() {
        let mut stack = ToolResultStack::new(2);
        for idx in 0..3 {
            stack.push(CollapsedToolResult {
                tool_name: format!("tool{idx}"),
                full_content: String::new(),
                short_summary: String::new(),
                created_at: Instant::now(),
            });
        }
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.pop().map(|entry| entry.tool_name), Some("tool2".to_string()));
        assert_eq!(stack.pop().map(|entry| entry.tool_name), Some("tool1".to_string()));
        assert!(stack.pop().is_none());
    }
}
