//! Scripted stand-in for a model run: thinks, calls a tool, then streams an echo of the prompt.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use pinned_tui::{EngineHandle, EngineMode, EventKind, StatusMetaUpdate};
use tracing::debug;

const STEP: Duration = Duration::from_millis(120);

pub struct AgentRun {
    cancel: Arc<AtomicBool>,
    active: Arc<AtomicBool>,
}

impl AgentRun {
    pub fn spawn(handle: EngineHandle, prompt: String, context_percent: u8) -> Self {
        let cancel = Arc::new(AtomicBool::new(false));
        let active = Arc::new(AtomicBool::new(true));
        let (cancel_flag, active_flag) = (Arc::clone(&cancel), Arc::clone(&active));
        thread::spawn(move || {
            debug!(chars = prompt.chars().count(), "agent run started");
            handle.set_mode(EngineMode::Streaming);
            let finished = play(&handle, &prompt, &cancel_flag);
            if !finished {
                handle.add_event(EventKind::Error, "Run interrupted");
            }
            handle.update_status_meta(StatusMetaUpdate {
                context_percent: Some(context_percent),
                ..StatusMetaUpdate::default()
            });
            handle.set_status(None);
            // Cleared before going idle so queued input that arrives next starts a new run.
            active_flag.store(false, Ordering::SeqCst);
            handle.set_mode(EngineMode::Idle);
            debug!(finished, "agent run ended");
        });
        Self { cancel, active }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }
}

/// Sleep one step; false once the run was cancelled.
fn step(cancel: &AtomicBool) -> bool {
    thread::sleep(STEP);
    !cancel.load(Ordering::SeqCst)
}

/// Returns false when cancelled part way.
fn play(handle: &EngineHandle, prompt: &str, cancel: &AtomicBool) -> bool {
    handle.set_status(Some("Thinking".to_string()));
    if !step(cancel) {
        return false;
    }
    handle.add_event(
        EventKind::Thought,
        format!(
            "The user said {} words; echoing them back.",
            prompt.split_whitespace().count()
        ),
    );
    if !step(cancel) {
        return false;
    }

    handle.set_status(Some("Running tool".to_string()));
    handle.add_event(EventKind::Tool, "Bash(ls -1 src)");
    let listing = (1..=12)
        .map(|n| format!("module_{n:02}.rs"))
        .collect::<Vec<_>>()
        .join("\n");
    handle.add_event(EventKind::ToolResult, listing);
    if !step(cancel) {
        return false;
    }
    handle.add_event(EventKind::Build, "cargo build: ok");
    handle.add_event(EventKind::Test, "cargo test: 12 passed");

    handle.set_status(Some("Responding".to_string()));
    for word in format!("You said: {prompt}").split_inclusive(' ') {
        if !step(cancel) {
            return false;
        }
        handle.add_event(EventKind::Stream, word);
    }
    true
}
