//! Splits raw terminal input into text runs and complete escape sequences.
//!
//! A chunk may end in the middle of a sequence (`ESC`, `ESC [`, half an OSC). The incomplete tail
//! is held until the next chunk completes it or `timeout` passes, at which point it is flushed as
//! a sequence on its own; a lone `ESC` flushed this way is the Escape key.

use std::time::{Duration, Instant};

const ESC: char = '\x1b';
/// Tails longer than this are never a real key sequence.
const MAX_PENDING_BYTES: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Printable text and C0 controls, in arrival order.
    Text(String),
    /// One escape sequence (complete, or a tail flushed after the timeout).
    Escape(String),
}

enum SequenceLen {
    Complete(usize),
    Incomplete,
}

#[derive(Debug)]
pub struct EscapeSplitter {
    pending: String,
    pending_since: Option<Instant>,
    timeout: Duration,
}

impl EscapeSplitter {
    pub fn new(timeout: Duration) -> Self {
        Self {
            pending: String::new(),
            pending_since: None,
            timeout,
        }
    }

    pub fn split(&mut self, chunk: &str, now: Instant) -> Vec<Segment> {
        let mut data = std::mem::take(&mut self.pending);
        data.push_str(chunk);
        self.pending_since = None;

        let mut out = Vec::new();
        let mut text = String::new();
        let mut idx = 0;
        while idx < data.len() {
            let rest = &data[idx..];
            if !rest.starts_with(ESC) {
                let Some(ch) = rest.chars().next() else {
                    break;
                };
                text.push(ch);
                idx += ch.len_utf8();
                continue;
            }
            if !text.is_empty() {
                out.push(Segment::Text(std::mem::take(&mut text)));
            }
            match sequence_len(rest) {
                SequenceLen::Complete(len) => {
                    out.push(Segment::Escape(rest[..len].to_string()));
                    idx += len;
                }
                SequenceLen::Incomplete if rest.len() > MAX_PENDING_BYTES => {
                    out.push(Segment::Escape(rest.to_string()));
                    idx = data.len();
                }
                SequenceLen::Incomplete => {
                    self.pending = rest.to_string();
                    self.pending_since = Some(now);
                    idx = data.len();
                }
            }
        }
        if !text.is_empty() {
            out.push(Segment::Text(text));
        }
        out
    }

    /// Flush a held tail once its timeout has elapsed.
    pub fn flush_due(&mut self, now: Instant) -> Option<Segment> {
        let since = self.pending_since?;
        if now.duration_since(since) < self.timeout {
            return None;
        }
        self.pending_since = None;
        Some(Segment::Escape(std::mem::take(&mut self.pending)))
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending_since.map(|since| since + self.timeout)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.pending_since = None;
    }
}

fn sequence_len(data: &str) -> SequenceLen {
    let mut chars = data.char_indices().skip(1);
    let Some((_, introducer)) = chars.next() else {
        return SequenceLen::Incomplete;
    };
    match introducer {
        '[' => {
            if data[2..].starts_with('M') {
                // X10 mouse: ESC [ M b x y
                return match data.char_indices().nth(6) {
                    Some((end, _)) => SequenceLen::Complete(end),
                    None if data.chars().count() == 6 => SequenceLen::Complete(data.len()),
                    None => SequenceLen::Incomplete,
                };
            }
            for (pos, ch) in data.char_indices().skip(2) {
                match ch {
                    '\x40'..='\x7e' => return SequenceLen::Complete(pos + 1),
                    '\x20'..='\x3f' => {}
                    // Malformed: cut before the stray char so it is not swallowed.
                    _ => return SequenceLen::Complete(pos),
                }
            }
            SequenceLen::Incomplete
        }
        ']' | 'P' | '_' => string_terminated_len(data),
        'O' => match chars.next() {
            Some((pos, ch)) => SequenceLen::Complete(pos + ch.len_utf8()),
            None => SequenceLen::Incomplete,
        },
        ESC if matches!(data[1..].chars().nth(1), Some('[' | 'O')) => {
            match sequence_len(&data[1..]) {
                SequenceLen::Complete(len) => SequenceLen::Complete(len + 1),
                SequenceLen::Incomplete => SequenceLen::Incomplete,
            }
        }
        other => SequenceLen::Complete(1 + other.len_utf8()),
    }
}

fn string_terminated_len(data: &str) -> SequenceLen {
    let bytes = data.as_bytes();
    let mut idx = 2;
    while idx < bytes.len() {
        match bytes[idx] {
            0x07 => return SequenceLen::Complete(idx + 1),
            0x1b if bytes.get(idx + 1) == Some(&b'\\') => return SequenceLen::Complete(idx + 2),
            _ => idx += 1,
        }
    }
    SequenceLen::Incomplete
}
