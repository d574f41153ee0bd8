//! Raw input classifier.
//!
//! Every chunk read from the terminal goes through [`InputClassifier::feed`] before anything else
//! looks at it. Classification order:
//!
//! 1. A chunk starting with ctrl+c / ctrl+d is `Interrupt` / `EndOfInput`. The rest of the chunk
//!    is discarded and any paste state is reset, even mid-capture.
//! 2. Toggle hotkeys (Option-key code points, or ESC + letter) are stripped from text. They fire
//!    only when they arrive as ordinary typing; inside a paste they are dropped silently.
//! 3. Bracketed paste markers switch capture on and off.
//! 4. Without markers, a chunk is a paste when it carries more than one text unit, when the char
//!    count over the trailing burst window exceeds the burst threshold, or when a newline arrives
//!    while other chars are still inside that window.
//! 5. A lone printable char with no burst in progress is `InsertChar`, with no delay.
//! 6. Escape sequences and control chars decode to keys; unknown ones are dropped.
//!
//! Time is always passed in, so the heuristics are deterministic under test.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::config::PasteTuning;
use crate::core::actions::{EditKey, InputAction, ToggleKind};
use crate::core::keys::{control_action, is_text_char, sequence_action, PASTE_BEGIN, PASTE_END};
use crate::platform::escape_splitter::{EscapeSplitter, Segment};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureSource {
    Bracketed,
    Heuristic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasteCapture {
    pub source: CaptureSource,
    pub buffer: String,
    chars: usize,
    pub overflow: bool,
    deadline: Instant,
}

/// Paste detection phase. Exactly one is active at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PastePhase {
    Idle,
    /// Keystrokes held back while a burst is suspected. Released as `InsertText` when the input
    /// goes quiet, or folded into a capture if the burst crosses the threshold.
    BurstDetecting { pending: String, deadline: Instant },
    Capturing(PasteCapture),
}

/// Arrivals inside the trailing burst window.
#[derive(Debug, Default)]
struct BurstWindow {
    /// `(arrival, chars, non-newline chars)`, oldest first.
    arrivals: VecDeque<(Instant, usize, usize)>,
}

impl BurstWindow {
    /// Record an arrival and return the char count over the trailing window.
    fn record(&mut self, now: Instant, text: &str, tuning: &PasteTuning) -> usize {
        self.expire(now, tuning);
        let chars = text.chars().count();
        let text_chars = text.chars().filter(|ch| !matches!(ch, '\r' | '\n')).count();
        self.arrivals.push_back((now, chars, text_chars));
        self.arrivals.iter().map(|(_, chars, _)| chars).sum()
    }

    /// Non-newline chars that arrived within the trailing window.
    fn recent_text(&self, now: Instant, tuning: &PasteTuning) -> usize {
        self.arrivals
            .iter()
            .filter(|(at, _, _)| within(now, *at, tuning.burst_window))
            .map(|(_, _, text_chars)| text_chars)
            .sum()
    }

    fn expire(&mut self, now: Instant, tuning: &PasteTuning) {
        while self
            .arrivals
            .front()
            .is_some_and(|(at, _, _)| !within(now, *at, tuning.burst_window))
        {
            self.arrivals.pop_front();
        }
    }

    fn reset(&mut self) {
        self.arrivals.clear();
    }
}

fn within(now: Instant, at: Instant, window: Duration) -> bool {
    now.saturating_duration_since(at) <= window
}

#[derive(Debug)]
pub struct InputClassifier {
    tuning: PasteTuning,
    splitter: EscapeSplitter,
    phase: PastePhase,
    window: BurstWindow,
}

impl InputClassifier {
    pub fn new(tuning: PasteTuning, escape_timeout: Duration) -> Self {
        Self {
            tuning,
            splitter: EscapeSplitter::new(escape_timeout),
            phase: PastePhase::Idle,
            window: BurstWindow::default(),
        }
    }

    pub fn phase(&self) -> &PastePhase {
        &self.phase
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self.phase, PastePhase::Capturing(_))
    }

    /// Classify one raw chunk.
    pub fn feed(&mut self, chunk: &str, now: Instant) -> Vec<InputAction> {
        let mut actions = Vec::new();
        match chunk.chars().next() {
            None => return actions,
            Some('\x03') => {
                self.reset();
                actions.push(InputAction::Interrupt);
                return actions;
            }
            Some('\x04') => {
                self.reset();
                actions.push(InputAction::EndOfInput);
                return actions;
            }
            Some(_) => {}
        }

        let segments = self.splitter.split(chunk, now);
        let units = text_units(&segments);
        for segment in segments {
            self.process_segment(segment, units, now, &mut actions);
        }
        if !actions.is_empty() {
            trace!(?actions, "classified chunk");
        }
        actions
    }

    /// Commit whatever timers have expired: held escape tails, held keystrokes, and idle captures.
    pub fn poll(&mut self, now: Instant) -> Vec<InputAction> {
        let mut actions = Vec::new();
        if let Some(segment) = self.splitter.flush_due(now) {
            self.process_segment(segment, 1, now, &mut actions);
        }
        let due = match &self.phase {
            PastePhase::Idle => false,
            PastePhase::BurstDetecting { deadline, .. } => now >= *deadline,
            PastePhase::Capturing(capture) => now >= capture.deadline,
        };
        if due {
            self.commit(&mut actions);
        }
        actions
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        let phase = match &self.phase {
            PastePhase::Idle => None,
            PastePhase::BurstDetecting { deadline, .. } => Some(*deadline),
            PastePhase::Capturing(capture) => Some(capture.deadline),
        };
        match (phase, self.splitter.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Drop all paste state without emitting anything.
    pub fn reset(&mut self) {
        if !matches!(self.phase, PastePhase::Idle) {
            debug!("paste state reset");
        }
        self.phase = PastePhase::Idle;
        self.window.reset();
        self.splitter.clear();
    }

    fn process_segment(
        &mut self,
        segment: Segment,
        units: usize,
        now: Instant,
        actions: &mut Vec<InputAction>,
    ) {
        if let PastePhase::Capturing(capture) = &mut self.phase {
            if capture.source == CaptureSource::Bracketed {
                match segment {
                    Segment::Escape(seq) if seq == PASTE_END => self.commit(actions),
                    Segment::Escape(seq) => trace!(?seq, "escape dropped inside bracketed paste"),
                    Segment::Text(text) => {
                        let deadline = now + self.tuning.bracketed_idle_timeout;
                        append_capture(capture, &text, &self.tuning, deadline);
                    }
                }
                return;
            }
        }

        match segment {
            Segment::Escape(seq) => {
                self.commit(actions);
                if seq == PASTE_BEGIN {
                    debug!("bracketed paste begin");
                    self.phase = PastePhase::Capturing(PasteCapture {
                        source: CaptureSource::Bracketed,
                        buffer: String::new(),
                        chars: 0,
                        overflow: false,
                        deadline: now + self.tuning.bracketed_idle_timeout,
                    });
                } else if seq == PASTE_END {
                    trace!("stray bracketed paste end marker");
                } else if let Some(action) = sequence_action(&seq) {
                    actions.push(action);
                } else {
                    trace!(?seq, "unknown escape sequence dropped");
                }
            }
            Segment::Text(text) => self.process_text(&text, units, now, actions),
        }
    }

    fn process_text(
        &mut self,
        text: &str,
        units: usize,
        now: Instant,
        actions: &mut Vec<InputAction>,
    ) {
        let mut run = String::new();
        for ch in text.chars() {
            if let Some(kind) = ToggleKind::from_option_char(ch) {
                if units <= 1 && !self.is_capturing() {
                    actions.push(InputAction::Toggle(kind));
                }
                continue;
            }
            if is_text_char(ch) {
                run.push(ch);
                continue;
            }
            self.flush_run(&mut run, units, now, actions);
            self.commit(actions);
            match control_action(ch) {
                Some(action) => actions.push(action),
                None => trace!(code = ch as u32, "control char dropped"),
            }
        }
        self.flush_run(&mut run, units, now, actions);
    }

    fn flush_run(
        &mut self,
        run: &mut String,
        units: usize,
        now: Instant,
        actions: &mut Vec<InputAction>,
    ) {
        if run.is_empty() {
            return;
        }
        let text = std::mem::take(run);
        let mut chars = text.chars();
        match (chars.next(), chars.next(), units) {
            (Some(ch), None, 1) => self.single_char(ch, now, actions),
            _ => {
                self.window.record(now, &text, &self.tuning);
                self.extend_capture(&text, now);
            }
        }
    }

    fn single_char(&mut self, ch: char, now: Instant, actions: &mut Vec<InputAction>) {
        let is_newline = matches!(ch, '\r' | '\n');
        let recent_text = self.window.recent_text(now, &self.tuning);
        let count = self.window.record(now, ch.encode_utf8(&mut [0; 4]), &self.tuning);
        let tuning = &self.tuning;

        match &mut self.phase {
            PastePhase::Capturing(_) => {
                self.extend_capture(&ch.to_string(), now);
            }
            PastePhase::BurstDetecting { pending, deadline } => {
                if is_newline || count > tuning.burst_threshold {
                    let mut text = std::mem::take(pending);
                    text.push(ch);
                    self.phase = PastePhase::Idle;
                    debug!(chars = count, "keystroke burst promoted to paste");
                    self.extend_capture(&text, now);
                } else {
                    pending.push(ch);
                    *deadline = now + tuning.idle_debounce;
                }
            }
            PastePhase::Idle => {
                if is_newline {
                    if recent_text > 0 {
                        self.extend_capture("\n", now);
                    } else {
                        actions.push(InputAction::Submit);
                    }
                } else if ch == '\t' {
                    actions.push(InputAction::Key(EditKey::Tab));
                } else if count > tuning.burst_threshold {
                    self.extend_capture(&ch.to_string(), now);
                } else if count >= tuning.suspect_threshold {
                    self.phase = PastePhase::BurstDetecting {
                        pending: ch.to_string(),
                        deadline: now + tuning.idle_debounce,
                    };
                } else {
                    actions.push(InputAction::InsertChar(ch));
                }
            }
        }
    }

    /// Append to the heuristic capture, starting one (and absorbing held keystrokes) if needed.
    fn extend_capture(&mut self, text: &str, now: Instant) {
        let deadline = now + self.tuning.idle_debounce;
        let phase = std::mem::replace(&mut self.phase, PastePhase::Idle);
        let mut capture = match phase {
            PastePhase::Capturing(capture) => capture,
            PastePhase::BurstDetecting { pending, .. } => {
                let mut capture = new_capture(CaptureSource::Heuristic, deadline);
                append_capture(&mut capture, &pending, &self.tuning, deadline);
                capture
            }
            PastePhase::Idle => {
                debug!("heuristic paste capture begin");
                new_capture(CaptureSource::Heuristic, deadline)
            }
        };
        append_capture(&mut capture, text, &self.tuning, deadline);
        self.phase = PastePhase::Capturing(capture);
    }

    /// Emit whatever the current phase is holding and return to idle.
    fn commit(&mut self, actions: &mut Vec<InputAction>) {
        match std::mem::replace(&mut self.phase, PastePhase::Idle) {
            PastePhase::Idle => {}
            PastePhase::BurstDetecting { pending, .. } => {
                if !pending.is_empty() {
                    actions.push(InputAction::InsertText(pending));
                }
            }
            PastePhase::Capturing(capture) => {
                debug!(
                    source = ?capture.source,
                    chars = capture.chars,
                    overflow = capture.overflow,
                    "paste committed"
                );
                self.window.reset();
                if !capture.buffer.is_empty() {
                    actions.push(InputAction::Paste {
                        text: capture.buffer,
                        truncated: capture.overflow,
                    });
                }
            }
        }
    }
}

fn new_capture(source: CaptureSource, deadline: Instant) -> PasteCapture {
    PasteCapture {
        source,
        buffer: String::new(),
        chars: 0,
        overflow: false,
        deadline,
    }
}

fn append_capture(capture: &mut PasteCapture, text: &str, tuning: &PasteTuning, deadline: Instant) {
    capture.deadline = deadline;
    for ch in text.chars() {
        if ToggleKind::from_option_char(ch).is_some() {
            continue;
        }
        if !is_text_char(ch) {
            continue;
        }
        if capture.chars >= tuning.capture_limit {
            if !capture.overflow {
                debug!(limit = tuning.capture_limit, "paste capture overflow");
            }
            capture.overflow = true;
            return;
        }
        capture.buffer.push(ch);
        capture.chars += 1;
    }
}

/// Text units in a chunk: text chars outside escape sequences, excluding toggle code points.
fn text_units(segments: &[Segment]) -> usize {
    segments
        .iter()
        .filter_map(|segment| match segment {
            Segment::Text(text) => Some(
                text.chars()
                    .filter(|ch| is_text_char(*ch) && ToggleKind::from_option_char(*ch).is_none())
                    .count(),
            ),
            Segment::Escape(_) => None,
        })
        .sum()
}
