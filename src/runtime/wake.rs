//! Wake queue between producer threads (input reader, signal thread, animation clock, engine
//! handles) and the single engine loop.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Instant;

use crate::runtime::handle::EngineCommand;

#[derive(Default)]
struct WakeState {
    pending_inputs: Vec<String>,
    pending_resize: bool,
    pending_resume: bool,
    tick: bool,
    commands: VecDeque<EngineCommand>,
    stop_requested: bool,
}

impl WakeState {
    fn has_work(&self) -> bool {
        !self.pending_inputs.is_empty()
            || self.pending_resize
            || self.pending_resume
            || self.tick
            || !self.commands.is_empty()
    }
}

/// Work taken from the queue in one go.
#[derive(Default)]
pub(crate) struct WakeBatch {
    pub(crate) inputs: Vec<String>,
    pub(crate) resize: bool,
    pub(crate) resume: bool,
    pub(crate) tick: bool,
    pub(crate) commands: Vec<EngineCommand>,
}

#[derive(Default)]
pub(crate) struct RuntimeWake {
    state: Mutex<WakeState>,
    cvar: Condvar,
}

impl RuntimeWake {
    fn lock(&self) -> MutexGuard<'_, WakeState> {
        match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Block until work arrives, `deadline` passes, or a stop is requested. Returns false once
    /// stopped.
    pub(crate) fn wait_for_event_timeout(&self, deadline: Option<Instant>) -> bool {
        let mut state = self.lock();
        while !state.stop_requested && !state.has_work() {
            match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        break;
                    }
                    state = match self.cvar.wait_timeout(state, deadline - now) {
                        Ok((state, _)) => state,
                        Err(poisoned) => poisoned.into_inner().0,
                    };
                }
                None => {
                    state = self
                        .cvar
                        .wait(state)
                        .unwrap_or_else(|poisoned| poisoned.into_inner());
                }
            }
        }
        !state.stop_requested
    }

    pub(crate) fn enqueue_input(&self, data: String) {
        self.lock().pending_inputs.push(data);
        self.cvar.notify_one();
    }

    pub(crate) fn signal_resize(&self) {
        self.lock().pending_resize = true;
        self.cvar.notify_one();
    }

    pub(crate) fn signal_resume(&self) {
        self.lock().pending_resume = true;
        self.cvar.notify_one();
    }

    pub(crate) fn tick(&self) {
        self.lock().tick = true;
        self.cvar.notify_one();
    }

    pub(crate) fn push_command(&self, command: EngineCommand) {
        self.lock().commands.push_back(command);
        self.cvar.notify_one();
    }

    pub(crate) fn take_batch(&self) -> WakeBatch {
        let mut state = self.lock();
        WakeBatch {
            inputs: std::mem::take(&mut state.pending_inputs),
            resize: std::mem::take(&mut state.pending_resize),
            resume: std::mem::take(&mut state.pending_resume),
            tick: std::mem::take(&mut state.tick),
            commands: state.commands.drain(..).collect(),
        }
    }

    pub(crate) fn request_stop(&self) {
        self.lock().stop_requested = true;
        self.cvar.notify_all();
    }

    pub(crate) fn reset_for_start(&self) {
        let mut state = self.lock();
        state.stop_requested = false;
        state.pending_inputs.clear();
        state.pending_resize = false;
        state.pending_resume = false;
        state.tick = false;
    }
}
