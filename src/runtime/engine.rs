//! The pinned-overlay engine.
//!
//! `TuiEngine` owns every piece of mutable UI state. Input chunks, resize/resume signals,
//! animation ticks and collaborator commands all arrive through one wake queue and are applied
//! on the engine loop; events leave through an mpsc channel. Nothing calls back into the engine
//! while it is working, so repaints can never nest.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use crate::config::EngineConfig;
use crate::core::actions::{EditKey, InputAction, ToggleKind};
use crate::core::classifier::InputClassifier;
use crate::core::input_buffer::{EditIntent, InputBuffer};
use crate::core::output::{OutputGate, TerminalCmd};
use crate::core::state::{StatusMeta, StatusMetaUpdate, ToggleState, ToggleUpdate};
use crate::core::suggestions::{CommandSpec, SuggestionEngine};
use crate::core::terminal::Terminal;
use crate::core::text::width::visible_width;
use crate::error::{EngineError, EngineResult};
use crate::render::frame::OverlayFrame;
use crate::render::overlay::{
    compose, display_chars, layout_input, ActivityView, InputView, OverlaySnapshot, PanelView,
};
use crate::render::painter::Painter;
use crate::render::transcript::{fallback_line, format_expanded, TranscriptFormatter};
use crate::runtime::animation::AnimationClock;
use crate::runtime::capture::{ActiveCapture, CaptureHandle, CaptureOptions, CaptureReply};
use crate::runtime::events::{EngineEvent, EngineMode};
use crate::runtime::handle::{EngineCommand, EngineHandle};
use crate::runtime::menu::{MenuController, MenuItem, MenuOutcome, MenuResolve};
use crate::runtime::scrollback::{EventKind, ScrollbackQueue, ToolResultStack, UiEvent};
use crate::runtime::throttle::RepaintThrottle;
use crate::runtime::wake::RuntimeWake;

const STOP_DRAIN_MAX_MS: u64 = 1000;
const STOP_DRAIN_IDLE_MS: u64 = 50;

#[derive(Debug, Default)]
struct CrashCleanup {
    ran: AtomicBool,
}

impl CrashCleanup {
    fn run<T: Terminal + ?Sized>(&self, terminal: &mut T) {
        if self.ran.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut output = OutputGate::new();
        output.push(TerminalCmd::ShowCursor);
        output.push(TerminalCmd::BracketedPasteDisable);
        output.flush(terminal);
    }

    #[cfg(all(unix, not(test)))]
    fn run_best_effort(&self) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            let mut terminal = crate::platform::process_terminal::HookTerminal::new();
            self.run(&mut terminal);
        }));
    }
}

fn toggle_event(kind: ToggleKind) -> EngineEvent {
    match kind {
        ToggleKind::AutoContinue => EngineEvent::ToggleAutoContinue,
        ToggleKind::CriticalApproval => EngineEvent::ToggleCriticalApproval,
        ToggleKind::Thinking => EngineEvent::ToggleThinking,
    }
}

fn earliest(a: Option<Instant>, b: Option<Instant>) -> Option<Instant> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

pub struct TuiEngine<T: Terminal> {
    terminal: T,
    config: EngineConfig,
    output: OutputGate,
    painter: Painter,
    throttle: RepaintThrottle,
    force_repaint: bool,

    classifier: InputClassifier,
    buffer: InputBuffer,
    suggestions: SuggestionEngine,

    scrollback: ScrollbackQueue,
    transcript: TranscriptFormatter,
    tool_results: ToolResultStack,

    menu: MenuController,
    menu_open: Arc<AtomicBool>,
    panel: Vec<String>,
    status_message: Option<String>,
    meta: StatusMeta,
    toggles: ToggleState,

    mode: EngineMode,
    streaming_since: Option<Instant>,
    queued: Vec<String>,
    capture: Option<ActiveCapture>,
    animation: AnimationClock,

    wake: Arc<RuntimeWake>,
    events: Sender<EngineEvent>,
    running: bool,
    disposed: bool,
    #[cfg(all(unix, not(test)))]
    signal_hook_guard: Option<crate::platform::SignalHookGuard>,
    #[cfg(all(unix, not(test)))]
    panic_hook_guard: Option<crate::platform::PanicHookGuard>,
}

impl<T: Terminal> TuiEngine<T> {
    pub fn new(
        terminal: T,
        config: EngineConfig,
        catalog: Vec<CommandSpec>,
    ) -> (Self, Receiver<EngineEvent>) {
        let (events, receiver) = mpsc::channel();
        let wake = Arc::new(RuntimeWake::default());
        let tick_wake = Arc::clone(&wake);
        let animation = AnimationClock::new(
            config.animation_interval,
            Some(Arc::new(move || tick_wake.tick())),
        );
        let mut toggles = ToggleState::default();
        toggles.debug = config.debug;

        let engine = Self {
            terminal,
            output: OutputGate::new(),
            painter: Painter::new(),
            throttle: RepaintThrottle::new(config.min_repaint_interval),
            force_repaint: false,
            classifier: InputClassifier::new(config.paste.clone(), config.escape_timeout),
            buffer: InputBuffer::new(config.paste.collapse_min_chars)
                .with_history_limit(config.history_limit),
            suggestions: SuggestionEngine::new(catalog, config.max_suggestions),
            scrollback: ScrollbackQueue::new(),
            transcript: TranscriptFormatter::new(config.tool_result_preview_lines),
            tool_results: ToolResultStack::new(config.tool_result_capacity),
            menu: MenuController::default(),
            menu_open: Arc::new(AtomicBool::new(false)),
            panel: Vec::new(),
            status_message: None,
            meta: StatusMeta::default(),
            toggles,
            mode: EngineMode::Idle,
            streaming_since: None,
            queued: Vec::new(),
            capture: None,
            animation,
            wake,
            events,
            running: false,
            disposed: false,
            #[cfg(all(unix, not(test)))]
            signal_hook_guard: None,
            #[cfg(all(unix, not(test)))]
            panic_hook_guard: None,
            config,
        };
        (engine, receiver)
    }

    /// A cloneable, thread-safe handle for collaborators.
    pub fn handle(&self) -> EngineHandle {
        EngineHandle {
            wake: Arc::clone(&self.wake),
            menu_open: Arc::clone(&self.menu_open),
        }
    }

    pub fn terminal(&self) -> &T {
        &self.terminal
    }

    pub fn mode(&self) -> EngineMode {
        self.mode
    }

    pub fn buffer(&self) -> &InputBuffer {
        &self.buffer
    }

    pub fn toggles(&self) -> &ToggleState {
        &self.toggles
    }

    pub fn status_meta(&self) -> &StatusMeta {
        &self.meta
    }

    pub fn queued(&self) -> &[String] {
        &self.queued
    }

    pub fn is_menu_open(&self) -> bool {
        self.menu.is_open()
    }

    pub fn menu_selection(&self) -> Option<usize> {
        self.menu.selected_index()
    }

    pub fn suggestions(&self) -> &SuggestionEngine {
        &self.suggestions
    }

    pub fn is_capturing_input(&self) -> bool {
        self.capture.is_some()
    }

    pub fn pending_events(&self) -> usize {
        self.scrollback.len()
    }

    /// The frame currently on screen.
    pub fn painted_frame(&self) -> Option<&OverlayFrame> {
        self.painter.previous()
    }

    pub fn start(&mut self) -> EngineResult<()> {
        if self.disposed {
            return Err(EngineError::Disposed);
        }
        if self.running {
            return Ok(());
        }
        self.output.clear();
        self.wake.reset_for_start();
        self.running = true;

        #[cfg(all(unix, not(test)))]
        self.install_cleanup_hooks();

        let wake_input = Arc::clone(&self.wake);
        let wake_resize = Arc::clone(&self.wake);
        let wake_resume = Arc::clone(&self.wake);
        if let Err(err) = self.terminal.start(
            Box::new(move |data| wake_input.enqueue_input(data)),
            Box::new(move || wake_resize.signal_resize()),
            Box::new(move || wake_resume.signal_resume()),
        ) {
            self.running = false;
            #[cfg(all(unix, not(test)))]
            self.uninstall_cleanup_hooks();
            return Err(err.into());
        }

        self.output.push(TerminalCmd::BracketedPasteEnable);
        self.output.push(TerminalCmd::HideCursor);
        self.output.flush(&mut self.terminal);
        debug!(
            columns = self.terminal.columns(),
            rows = self.terminal.rows(),
            "engine started"
        );
        self.render_now();
        Ok(())
    }

    /// Run the loop until the engine is stopped through a handle or disposed.
    pub fn run(&mut self) {
        while self.run_once() {}
    }

    /// Wait for work (or the next timer), apply it, and repaint if due. Returns false once the
    /// engine has stopped.
    pub fn run_once(&mut self) -> bool {
        if !self.running {
            return false;
        }
        let deadline = self.next_deadline(Instant::now());
        if !self.wake.wait_for_event_timeout(deadline) {
            return false;
        }
        self.process_wake(Instant::now());
        self.poll_timers(Instant::now());
        true
    }

    fn next_deadline(&self, now: Instant) -> Option<Instant> {
        let mut deadline = self.classifier.next_deadline();
        if !self.scrollback.is_empty() {
            deadline = Some(now);
        }
        if self.throttle.is_dirty() {
            deadline = earliest(deadline, Some(self.throttle.next_deadline().unwrap_or(now)));
        }
        if self.mode == EngineMode::Streaming {
            // The elapsed-time readout changes once a second even without ticks.
            deadline = earliest(deadline, Some(now + Duration::from_secs(1)));
        }
        deadline
    }

    fn process_wake(&mut self, now: Instant) {
        let batch = self.wake.take_batch();
        if batch.resume {
            self.handle_resume();
        }
        if batch.resize {
            self.handle_resize();
        }
        for input in batch.inputs {
            self.handle_input_at(&input, now);
        }
        for command in batch.commands {
            self.apply_command(command);
        }
        if batch.tick {
            self.request_repaint();
        }
    }

    fn apply_command(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::AddEvent(event) => self.push_event(event),
            EngineCommand::SetStatus(message) => self.set_status(message),
            EngineCommand::UpdateStatusMeta(update) => self.update_status_meta(update),
            EngineCommand::UpdateToggles(update) => self.update_toggles(update),
            EngineCommand::OpenMenu {
                items,
                title,
                on_resolve,
            } => {
                if let Err(err) = self.open_menu(items, title, on_resolve) {
                    warn!(error = %err, "queued menu open rejected");
                }
            }
            EngineCommand::CloseMenu => self.close_menu(),
            EngineCommand::SetInlinePanel(lines) => self.set_inline_panel(lines),
            EngineCommand::ClearInlinePanel => self.clear_inline_panel(),
            EngineCommand::Capture { options, reply } => self.begin_capture(options, reply),
            EngineCommand::ExpandLastToolResult => self.expand_last_tool_result(),
            EngineCommand::SetMode(mode) => self.set_mode(mode),
        }
    }

    /// Classify and apply one raw input chunk read at `now`.
    pub fn handle_input_at(&mut self, chunk: &str, now: Instant) {
        for action in self.classifier.feed(chunk, now) {
            self.dispatch(action);
        }
        self.render_if_due(now);
    }

    /// Fire expired timers (escape tails, paste commits), drain one scrollback event, and repaint
    /// if due.
    pub fn poll_timers(&mut self, now: Instant) {
        for action in self.classifier.poll(now) {
            self.dispatch(action);
        }
        self.drain_one_event();
        self.render_if_due(now);
    }

    fn dispatch(&mut self, action: InputAction) {
        trace!(?action, "dispatch");
        match action {
            InputAction::Interrupt => return self.on_interrupt(),
            InputAction::EndOfInput => return self.on_end_of_input(),
            InputAction::Toggle(kind) => {
                self.emit(toggle_event(kind));
                return;
            }
            _ => {}
        }

        if self.menu.is_open() {
            match self.menu.handle_action(&action) {
                MenuOutcome::Consumed | MenuOutcome::Closed => {
                    self.request_repaint();
                    return;
                }
                MenuOutcome::PassThrough => self.request_repaint(),
                MenuOutcome::Ignored => {}
            }
        }

        match action {
            InputAction::Key(EditKey::ExpandToolResult) => {
                self.emit(EngineEvent::ExpandToolResult);
                return;
            }
            InputAction::Key(EditKey::Suspend) => {
                self.suspend();
                return;
            }
            _ => {}
        }

        if self.capture.is_none() && !self.suggestions.is_empty() && self.accept_suggestion(&action) {
            return;
        }

        if action == InputAction::Submit {
            if self.capture.is_some() {
                self.finish_capture();
                return;
            }
            if self.buffer.is_empty() && !self.queued.is_empty() {
                self.flush_queue();
                self.request_repaint();
                return;
            }
        }

        let before = (self.buffer.text(), self.buffer.cursor());
        let intent = self.buffer.apply(&action);
        match intent {
            EditIntent::None => return,
            EditIntent::Render => {}
            EditIntent::Submit(text) => {
                debug!(chars = text.chars().count(), "submit");
                self.emit(EngineEvent::Submit(text));
            }
            EditIntent::Queue(text) => {
                debug!(queued = self.queued.len() + 1, "submit queued while streaming");
                self.queued.push(text);
            }
        }
        self.after_edit(before);
    }

    /// Returns true when the action was used by the suggestion list.
    fn accept_suggestion(&mut self, action: &InputAction) -> bool {
        match action {
            InputAction::Key(EditKey::Up) => {
                self.suggestions.move_selection(-1);
                self.request_repaint();
                true
            }
            InputAction::Key(EditKey::Down) => {
                self.suggestions.move_selection(1);
                self.request_repaint();
                true
            }
            InputAction::Key(EditKey::Tab) => {
                let Some(command) = self.suggestions.selected_spec().map(|s| s.command.clone())
                else {
                    return false;
                };
                let before = (self.buffer.text(), self.buffer.cursor());
                let completed = format!("{command} ");
                self.buffer.set_buffer(&completed, completed.chars().count());
                self.after_edit(before);
                true
            }
            InputAction::Submit => {
                // Enter on a partial command name completes it, then submits normally.
                let text = self.buffer.text();
                let typed = text.trim_end();
                if let Some(command) = self.suggestions.selected_spec().map(|s| s.command.clone()) {
                    if !typed.contains(' ') && typed != command {
                        self.buffer.set_buffer(&command, command.chars().count());
                    }
                }
                false
            }
            _ => false,
        }
    }

    fn after_edit(&mut self, before: (String, usize)) {
        self.refresh_suggestions();
        let text = self.buffer.text();
        let cursor = self.buffer.cursor();
        let masked = self.capture.as_ref().is_some_and(|c| c.options.mask);
        if !masked && (text.as_str(), cursor) != (before.0.as_str(), before.1) {
            self.emit(EngineEvent::Change { text, cursor });
        }
        self.request_repaint();
    }

    fn refresh_suggestions(&mut self) {
        if self.capture.is_some() || self.buffer.collapsed().is_some() {
            self.suggestions.clear();
        } else {
            self.suggestions
                .update(&self.buffer.text(), self.buffer.cursor());
        }
    }

    fn on_interrupt(&mut self) {
        if self.cancel_capture(EngineError::CaptureCancelled) {
            return;
        }
        if self.menu.is_open() {
            self.menu.cancel();
            self.request_repaint();
            return;
        }
        let had_buffer = !self.buffer.is_empty();
        if had_buffer {
            let before = (self.buffer.text(), self.buffer.cursor());
            self.buffer.clear();
            self.after_edit(before);
        }
        self.emit(EngineEvent::CtrlC { had_buffer });
        self.request_repaint();
    }

    fn on_end_of_input(&mut self) {
        if self.cancel_capture(EngineError::CaptureCancelled) {
            return;
        }
        if self.buffer.is_empty() {
            self.emit(EngineEvent::Interrupt);
        }
    }

    fn emit(&self, event: EngineEvent) {
        if self.events.send(event).is_err() {
            trace!("event receiver dropped");
        }
    }

    fn flush_queue(&mut self) {
        if self.queued.is_empty() {
            return;
        }
        let text = self.queued.join("\n");
        self.queued.clear();
        debug!(chars = text.chars().count(), "queued input delivered");
        self.emit(EngineEvent::Queue(text));
    }

    // ---- collaborator API ----

    pub fn add_event(&mut self, kind: EventKind, content: impl Into<String>) {
        self.push_event(UiEvent::new(kind, content));
    }

    fn push_event(&mut self, event: UiEvent) {
        let is_stream = event.kind == EventKind::Stream;
        self.scrollback.enqueue(event);
        if is_stream && self.mode == EngineMode::Idle {
            self.scrollback.flush_stream();
        }
    }

    pub fn set_status(&mut self, message: Option<String>) {
        if self.status_message != message {
            self.status_message = message;
            self.request_repaint();
        }
    }

    pub fn update_status_meta(&mut self, update: StatusMetaUpdate) {
        if self.meta.apply(update) {
            self.request_repaint();
        }
    }

    pub fn update_toggles(&mut self, update: ToggleUpdate) {
        if self.toggles.apply(update) {
            self.request_repaint();
        }
    }

    /// Open a modal menu. `on_resolve` runs exactly once, with the chosen item or `None`.
    pub fn set_menu<F>(
        &mut self,
        items: Vec<MenuItem>,
        title: Option<String>,
        on_resolve: F,
    ) -> EngineResult<()>
    where
        F: FnOnce(Option<MenuItem>) + Send + 'static,
    {
        if self
            .menu_open
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(EngineError::MenuAlreadyOpen);
        }
        self.open_menu(items, title, Box::new(on_resolve))
    }

    fn open_menu(
        &mut self,
        items: Vec<MenuItem>,
        title: Option<String>,
        on_resolve: MenuResolve,
    ) -> EngineResult<()> {
        let flag = Arc::clone(&self.menu_open);
        let on_resolve: MenuResolve = Box::new(move |item| {
            flag.store(false, Ordering::SeqCst);
            on_resolve(item);
        });
        self.menu.open(items, title, on_resolve)?;
        self.suggestions.clear();
        self.request_repaint();
        Ok(())
    }

    pub fn close_menu(&mut self) {
        if self.menu.cancel() {
            self.request_repaint();
        }
    }

    pub fn set_inline_panel(&mut self, lines: Vec<String>) {
        self.panel = lines;
        self.request_repaint();
    }

    pub fn clear_inline_panel(&mut self) {
        if !self.panel.is_empty() {
            self.panel.clear();
            self.request_repaint();
        }
    }

    /// Route the next submitted line to the returned handle instead of `Submit`.
    pub fn capture_input(&mut self, options: CaptureOptions) -> CaptureHandle {
        let (reply, handle) = CaptureHandle::channel();
        self.begin_capture(options, reply);
        handle
    }

    fn begin_capture(&mut self, options: CaptureOptions, reply: CaptureReply) {
        if self.capture.is_some() {
            reply.send(Err(EngineError::CaptureInProgress));
            return;
        }
        let saved = self.buffer.take_line();
        debug!(masked = options.mask, "input capture started");
        self.suggestions.clear();
        self.capture = Some(ActiveCapture {
            options,
            reply,
            saved,
        });
        self.request_repaint();
    }

    fn finish_capture(&mut self) {
        let Some(capture) = self.capture.take() else {
            return;
        };
        match self.buffer.submit(!capture.options.mask) {
            EditIntent::Submit(text) | EditIntent::Queue(text) => {
                debug!("input capture resolved");
                self.buffer.restore_line(capture.saved);
                capture.reply.send(Ok(text));
                self.refresh_suggestions();
            }
            EditIntent::Render | EditIntent::None => {
                // Blank lines do not resolve a capture.
                self.capture = Some(capture);
            }
        }
        self.request_repaint();
    }

    /// Returns whether a capture was active.
    fn cancel_capture(&mut self, reason: EngineError) -> bool {
        let Some(capture) = self.capture.take() else {
            return false;
        };
        debug!(%reason, "input capture cancelled");
        self.buffer.restore_line(capture.saved);
        capture.reply.send(Err(reason));
        self.refresh_suggestions();
        self.request_repaint();
        true
    }

    /// Print the most recently collapsed tool result in full.
    pub fn expand_last_tool_result(&mut self) {
        match self.tool_results.pop() {
            Some(result) => {
                let lines = format_expanded(&result, self.width());
                self.write_scrollback(&lines);
            }
            None => debug!("no collapsed tool result to expand"),
        }
    }

    pub fn set_mode(&mut self, mode: EngineMode) {
        if self.mode == mode {
            return;
        }
        debug!(?mode, "engine mode");
        self.mode = mode;
        match mode {
            EngineMode::Streaming => {
                self.buffer.set_streaming(true);
                self.streaming_since = Some(Instant::now());
                self.animation.start();
            }
            EngineMode::Idle => {
                self.buffer.set_streaming(false);
                self.animation.stop();
                self.streaming_since = None;
                self.scrollback.flush_stream();
                self.flush_queue();
            }
        }
        self.request_repaint();
    }

    // ---- terminal signals ----

    fn handle_resize(&mut self) {
        debug!(columns = self.terminal.columns(), "terminal resized");
        self.force_repaint = true;
        self.render_now();
    }

    fn suspend(&mut self) {
        if !self.running {
            return;
        }
        self.painter.clear(&mut self.output);
        self.output.push(TerminalCmd::ShowCursor);
        self.output.push(TerminalCmd::BracketedPasteDisable);
        self.output.flush(&mut self.terminal);
        debug!("suspending");
        if let Err(err) = self.terminal.suspend() {
            warn!(error = %err, "suspend failed");
            self.handle_resume();
        }
    }

    fn handle_resume(&mut self) {
        debug!("resumed");
        self.output.push(TerminalCmd::BracketedPasteEnable);
        self.output.push(TerminalCmd::HideCursor);
        self.output.flush(&mut self.terminal);
        self.force_repaint = true;
        self.render_now();
        self.emit(EngineEvent::Resume);
    }

    // ---- scrollback ----

    /// Format and print one queued scrollback event. Returns false when the queue was empty.
    pub fn drain_one_event(&mut self) -> bool {
        let Some(event) = self.scrollback.pop_next() else {
            return false;
        };
        let width = self.width();
        #[cfg(all(unix, not(test)))]
        if let Some(guard) = self.panic_hook_guard.as_ref() {
            guard.set_armed(false);
        }
        let transcript = &mut self.transcript;
        let formatted = catch_unwind(AssertUnwindSafe(|| transcript.format(&event, width)));
        #[cfg(all(unix, not(test)))]
        if let Some(guard) = self.panic_hook_guard.as_ref() {
            guard.set_armed(true);
        }

        let lines = match formatted {
            Ok(formatted) => {
                if let Some(collapsed) = formatted.collapsed {
                    self.tool_results.push(collapsed);
                }
                formatted.lines
            }
            Err(_) => {
                warn!(kind = ?event.kind, "formatting scrollback event panicked");
                vec![fallback_line(event.kind)]
            }
        };
        if !lines.is_empty() {
            self.write_scrollback(&lines);
        }
        true
    }

    fn write_scrollback(&mut self, lines: &[String]) {
        if !self.running {
            return;
        }
        let frame = self.compose_frame();
        self.painter.write_above(lines, &frame, &mut self.output);
        self.output.flush(&mut self.terminal);
        self.force_repaint = false;
        self.throttle.painted(Instant::now());
    }

    // ---- painting ----

    fn width(&self) -> usize {
        (self.terminal.columns() as usize).max(1)
    }

    fn request_repaint(&mut self) {
        self.throttle.request();
    }

    fn render_if_due(&mut self, now: Instant) {
        if self.throttle.due(now) {
            self.paint(now);
        }
    }

    /// Repaint immediately, ignoring the throttle. Writes nothing if the frame is unchanged.
    pub fn render_now(&mut self) {
        self.paint(Instant::now());
    }

    fn paint(&mut self, now: Instant) {
        if !self.running {
            return;
        }
        let frame = self.compose_frame();
        let force = std::mem::take(&mut self.force_repaint);
        if self.painter.repaint(&frame, force, &mut self.output) {
            self.output.flush(&mut self.terminal);
        }
        self.throttle.painted(now);
    }

    fn prompt(&self) -> &str {
        self.capture
            .as_ref()
            .and_then(|capture| capture.options.label.as_deref())
            .unwrap_or(&self.config.prompt_glyph)
    }

    fn compose_frame(&mut self) -> OverlayFrame {
        let width = self.width();
        let text_width = width
            .saturating_sub(visible_width(self.prompt()) + 1)
            .max(1);
        let masked = self.capture.as_ref().is_some_and(|c| c.options.mask);
        let layout = {
            let chars = display_chars(self.buffer.chars(), masked);
            layout_input(&chars, self.buffer.cursor(), text_width)
        };
        self.buffer.ensure_row_visible(
            layout.cursor_row,
            layout.rows.len(),
            self.config.max_input_rows,
        );

        let panel = match self.menu.state() {
            Some(menu) => PanelView::Menu(menu),
            None if !self.panel.is_empty() => PanelView::Lines(&self.panel),
            None => PanelView::Empty,
        };
        let snapshot = OverlaySnapshot {
            width,
            rows: (self.terminal.rows() as usize).max(1),
            input: InputView {
                prompt: self.prompt(),
                chars: self.buffer.chars(),
                cursor: self.buffer.cursor(),
                collapsed: self.buffer.collapsed(),
                masked,
                render_offset: self.buffer.render_offset(),
                max_rows: self.config.max_input_rows,
            },
            activity: ActivityView {
                streaming: self.mode == EngineMode::Streaming,
                spinner_frame: self.animation.spinner_frame(),
                accent_frame: self.animation.accent_frame(),
                message: self.status_message.as_deref(),
                elapsed: self
                    .streaming_since
                    .map(|since| since.elapsed())
                    .unwrap_or_default(),
            },
            panel,
            max_panel_lines: self.config.max_panel_lines,
            suggestions: self.suggestions.visible(),
            selected_suggestion: self.suggestions.selected_index(),
            meta: &self.meta,
            toggles: &self.toggles,
            queued: self.queued.len(),
        };
        compose(&snapshot)
    }

    // ---- teardown ----

    /// Restore the terminal and release everything. Each step runs even if an earlier one
    /// failed; the first failure is returned.
    pub fn dispose(&mut self) -> EngineResult<()> {
        if self.disposed {
            return Ok(());
        }
        self.disposed = true;
        self.wake.request_stop();
        let mut first_error: Option<EngineError> = None;

        self.animation.stop();
        if self.menu.is_open() && catch_unwind(AssertUnwindSafe(|| self.menu.cancel())).is_err() {
            warn!("menu resolve callback panicked during dispose");
            self.menu = MenuController::Closed;
        }
        self.menu_open.store(false, Ordering::SeqCst);
        if let Some(capture) = self.capture.take() {
            capture.reply.send(Err(EngineError::Disposed));
        }

        if self.running {
            self.scrollback.flush_stream();
            while self.drain_one_event() {}
            self.painter.clear(&mut self.output);
            self.output.push(TerminalCmd::ShowCursor);
            self.output.push(TerminalCmd::BracketedPasteDisable);
            self.output.flush(&mut self.terminal);
            self.terminal
                .drain_input(STOP_DRAIN_MAX_MS, STOP_DRAIN_IDLE_MS);
            if let Err(err) = self.terminal.stop() {
                warn!(error = %err, "terminal stop failed");
                first_error.get_or_insert(EngineError::Io(err));
            }
            self.running = false;
            #[cfg(all(unix, not(test)))]
            self.uninstall_cleanup_hooks();
        }
        debug!("engine disposed");

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    #[cfg(all(unix, not(test)))]
    fn install_cleanup_hooks(&mut self) {
        let cleanup = Arc::new(CrashCleanup::default());
        let signal_cleanup = Arc::clone(&cleanup);
        let panic_cleanup = Arc::clone(&cleanup);
        match crate::platform::install_signal_handlers(move || signal_cleanup.run_best_effort()) {
            Ok(guard) => self.signal_hook_guard = Some(guard),
            Err(err) => warn!(error = %err, "signal cleanup hooks unavailable"),
        }
        self.panic_hook_guard = Some(crate::platform::install_panic_hook(move || {
            panic_cleanup.run_best_effort()
        }));
    }

    #[cfg(all(unix, not(test)))]
    fn uninstall_cleanup_hooks(&mut self) {
        self.signal_hook_guard = None;
        self.panic_hook_guard = None;
    }
}

impl<T: Terminal> Drop for TuiEngine<T> {
    fn drop(&mut self) {
        if let Err(err) = self.dispose() {
            warn!(error = %err, "dispose on drop failed");
        }
    }
}
