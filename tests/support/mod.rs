#![allow(dead_code)]

use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use pinned_tui::core::text::ansi::strip_ansi;
use pinned_tui::{CommandSpec, EngineConfig, EngineEvent, Terminal, TuiEngine};

#[derive(Default)]
struct TerminalState {
    writes: Vec<String>,
    columns: u16,
    rows: u16,
    started: bool,
    stopped: bool,
    on_input: Option<Box<dyn FnMut(String) + Send>>,
    on_resize: Option<Box<dyn FnMut() + Send>>,
    on_resume: Option<Box<dyn FnMut() + Send>>,
}

/// In-memory terminal that records every write call.
#[derive(Clone)]
pub struct TestTerminal {
    state: Arc<Mutex<TerminalState>>,
}

impl TestTerminal {
    pub fn new(columns: u16, rows: u16) -> Self {
        Self {
            state: Arc::new(Mutex::new(TerminalState {
                columns,
                rows,
                ..TerminalState::default()
            })),
        }
    }

    pub fn write_count(&self) -> usize {
        self.state.lock().expect("terminal state").writes.len()
    }

    pub fn take_writes(&self) -> Vec<String> {
        std::mem::take(&mut self.state.lock().expect("terminal state").writes)
    }

    /// Everything written so far with ANSI sequences removed.
    pub fn plain_output(&self) -> String {
        let state = self.state.lock().expect("terminal state");
        strip_ansi(&state.writes.concat())
    }

    pub fn set_columns(&self, columns: u16) {
        self.state.lock().expect("terminal state").columns = columns;
    }

    pub fn set_rows(&self, rows: u16) {
        self.state.lock().expect("terminal state").rows = rows;
    }

    pub fn is_stopped(&self) -> bool {
        self.state.lock().expect("terminal state").stopped
    }

    pub fn emit_input(&self, data: &str) {
        let mut state = self.state.lock().expect("terminal state");
        if let Some(callback) = state.on_input.as_mut() {
            callback(data.to_string());
        }
    }

    pub fn emit_resize(&self) {
        let mut state = self.state.lock().expect("terminal state");
        if let Some(callback) = state.on_resize.as_mut() {
            callback();
        }
    }

    pub fn emit_resume(&self) {
        let mut state = self.state.lock().expect("terminal state");
        if let Some(callback) = state.on_resume.as_mut() {
            callback();
        }
    }
}

impl Terminal for TestTerminal {
    fn start(
        &mut self,
        on_input: Box<dyn FnMut(String) + Send>,
        on_resize: Box<dyn FnMut() + Send>,
        on_resume: Box<dyn FnMut() + Send>,
    ) -> std::io::Result<()> {
        let mut state = self.state.lock().expect("terminal state");
        state.started = true;
        state.on_input = Some(on_input);
        state.on_resize = Some(on_resize);
        state.on_resume = Some(on_resume);
        Ok(())
    }

    fn stop(&mut self) -> std::io::Result<()> {
        let mut state = self.state.lock().expect("terminal state");
        state.stopped = true;
        state.on_input = None;
        state.on_resize = None;
        state.on_resume = None;
        Ok(())
    }

    fn drain_input(&mut self, _max_ms: u64, _idle_ms: u64) {}

    fn write(&mut self, data: &str) {
        self.state
            .lock()
            .expect("terminal state")
            .writes
            .push(data.to_string());
    }

    fn columns(&self) -> u16 {
        self.state.lock().expect("terminal state").columns
    }

    fn rows(&self) -> u16 {
        self.state.lock().expect("terminal state").rows
    }
}

pub struct Harness {
    pub engine: TuiEngine<TestTerminal>,
    pub terminal: TestTerminal,
    pub events: Receiver<EngineEvent>,
    /// Simulated clock; every keystroke advances it so timing heuristics see slow typing.
    pub now: Instant,
}

impl Harness {
    pub fn new(catalog: Vec<CommandSpec>) -> Self {
        Self::with_config(EngineConfig::default(), catalog)
    }

    pub fn with_config(config: EngineConfig, catalog: Vec<CommandSpec>) -> Self {
        let terminal = TestTerminal::new(60, 24);
        let (mut engine, events) = TuiEngine::new(terminal.clone(), config, catalog);
        engine.start().expect("engine start");
        Self {
            engine,
            terminal,
            events,
            now: Instant::now(),
        }
    }

    pub fn advance(&mut self, ms: u64) -> Instant {
        self.now += Duration::from_millis(ms);
        self.now
    }

    /// Feed one raw chunk well after the previous one.
    pub fn key(&mut self, chunk: &str) {
        let now = self.advance(300);
        self.engine.handle_input_at(chunk, now);
    }

    /// Type each char as its own slow keystroke.
    pub fn type_slowly(&mut self, text: &str) {
        for ch in text.chars() {
            self.key(&ch.to_string());
        }
    }

    /// Let idle timers expire.
    pub fn settle(&mut self) {
        let now = self.advance(1500);
        self.engine.poll_timers(now);
    }

    /// Drain every queued scrollback event.
    pub fn drain_scrollback(&mut self) {
        while self.engine.drain_one_event() {}
    }

    pub fn drain_events(&self) -> Vec<EngineEvent> {
        self.events.try_iter().collect()
    }

    /// Emitted events other than `Change`.
    pub fn actions(&self) -> Vec<EngineEvent> {
        self.drain_events()
            .into_iter()
            .filter(|event| !matches!(event, EngineEvent::Change { .. }))
            .collect()
    }
}
