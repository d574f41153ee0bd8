//! Reacts to engine events: routes submits to the agent or to slash commands, and owns the toggle
//! modes the overlay displays.

use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;

use pinned_tui::{
    ApprovalMode, AutoContinueMode, CaptureOptions, EngineEvent, EngineHandle, EventKind,
    MenuItem, StatusMetaUpdate, ToggleState, ToggleUpdate,
};
use tracing::{debug, warn};

use crate::agent::AgentRun;
use crate::commands::{help_lines, parse_slash_command, SlashCommand};

const MODELS: [(&str, &str); 4] = [
    ("echo-small", "fast, forgetful"),
    ("echo-large", "slow, thorough"),
    ("echo-legacy", "retired"),
    ("echo-dual", "two models, one answer"),
];
const THINKING_LEVELS: [&str; 3] = ["normal", "deep", "off"];

pub struct Controller {
    handle: EngineHandle,
    toggles: ToggleState,
    run: Option<AgentRun>,
    model: Arc<Mutex<String>>,
    turns: u8,
}

impl Controller {
    pub fn new(handle: EngineHandle, directory: Option<String>) -> Self {
        let model = MODELS[0].0.to_string();
        handle.update_status_meta(StatusMetaUpdate {
            model: Some(model.clone()),
            context_percent: Some(0),
            profile: Some("demo".to_string()),
            directory,
            session: None,
        });
        Self {
            handle,
            toggles: ToggleState::default(),
            run: None,
            model: Arc::new(Mutex::new(model)),
            turns: 0,
        }
    }

    pub fn greet(&self) {
        self.handle.add_event(
            EventKind::Response,
            "echo agent ready. Type a message, or /help for commands.",
        );
    }

    /// Process events until the engine goes away.
    pub fn run(mut self, events: Receiver<EngineEvent>) {
        for event in events {
            self.handle_event(event);
        }
        if let Some(run) = self.run.take() {
            run.cancel();
        }
    }

    fn running(&self) -> bool {
        self.run.as_ref().is_some_and(AgentRun::is_active)
    }

    fn handle_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Submit(text) | EngineEvent::Queue(text) => self.submit(text),
            EngineEvent::CtrlC { had_buffer } => {
                if self.running() {
                    if let Some(run) = self.run.as_ref() {
                        run.cancel();
                    }
                } else if !had_buffer {
                    self.handle
                        .set_status(Some("ctrl+d on an empty line exits".to_string()));
                }
            }
            EngineEvent::Interrupt => self.handle.stop(),
            EngineEvent::ToggleAutoContinue => {
                self.toggles.auto_continue = match self.toggles.auto_continue {
                    AutoContinueMode::Off => AutoContinueMode::On,
                    AutoContinueMode::On => AutoContinueMode::Dual,
                    AutoContinueMode::Dual => AutoContinueMode::Off,
                };
                self.push_toggles();
            }
            EngineEvent::ToggleCriticalApproval => {
                self.toggles.approval = match self.toggles.approval {
                    ApprovalMode::Ask => ApprovalMode::Auto,
                    ApprovalMode::Auto => ApprovalMode::Ask,
                };
                self.push_toggles();
            }
            EngineEvent::ToggleThinking => {
                let next = THINKING_LEVELS
                    .iter()
                    .position(|level| *level == self.toggles.thinking)
                    .map_or(0, |idx| (idx + 1) % THINKING_LEVELS.len());
                self.toggles.thinking = THINKING_LEVELS[next].to_string();
                self.push_toggles();
            }
            EngineEvent::ExpandToolResult => self.handle.expand_last_tool_result(),
            EngineEvent::Change { .. } => {}
            EngineEvent::Resume => debug!("resumed from suspend"),
        }
    }

    fn push_toggles(&self) {
        self.handle.update_toggles(ToggleUpdate {
            auto_continue: Some(self.toggles.auto_continue),
            approval: Some(self.toggles.approval),
            thinking: Some(self.toggles.thinking.clone()),
            debug: None,
        });
    }

    fn submit(&mut self, text: String) {
        self.handle.set_status(None);
        match parse_slash_command(&text) {
            Some(command) => self.command(command),
            None => {
                self.handle.add_event(EventKind::Prompt, text.clone());
                if self.running() {
                    warn!("submit while a run is active");
                    return;
                }
                self.turns = self.turns.saturating_add(1);
                let context = self.turns.saturating_mul(7).min(100);
                self.run = Some(AgentRun::spawn(self.handle.clone(), text, context));
            }
        }
    }

    fn command(&mut self, command: SlashCommand) {
        match command {
            SlashCommand::Help => self.handle.set_inline_panel(help_lines()),
            SlashCommand::Clear => self.handle.clear_inline_panel(),
            SlashCommand::Quit => self.handle.stop(),
            SlashCommand::Model => self.open_model_menu(),
            SlashCommand::Login => self.login(),
            SlashCommand::Unknown(name) => self
                .handle
                .add_event(EventKind::Error, format!("Unknown command {name}")),
        }
    }

    fn open_model_menu(&mut self) {
        let current = lock_unpoisoned(&self.model).clone();
        let items = MODELS
            .iter()
            .map(|(id, description)| {
                MenuItem::new(*id, *id)
                    .description(*description)
                    .disabled(*id == "echo-legacy")
                    .active(*id == current)
            })
            .collect();
        let handle = self.handle.clone();
        let model = Arc::clone(&self.model);
        let opened = self.handle.set_menu(items, Some("Select model".to_string()), move |item| {
            if let Some(item) = item {
                *lock_unpoisoned(&model) = item.id.clone();
                handle.update_status_meta(StatusMetaUpdate {
                    model: Some(item.id.clone()),
                    ..StatusMetaUpdate::default()
                });
                handle.add_event(EventKind::Response, format!("Model set to {}", item.label));
            }
        });
        if let Err(err) = opened {
            warn!(error = %err, "model menu not opened");
        }
    }

    fn login(&self) {
        let capture = self
            .handle
            .capture_input(CaptureOptions::labeled("API key: ").masked());
        let handle = self.handle.clone();
        thread::spawn(move || match capture.wait() {
            Ok(key) => {
                let tail: String = key.chars().skip(key.chars().count().saturating_sub(4)).collect();
                handle.add_event(EventKind::Response, format!("Logged in with key …{tail}"));
            }
            Err(err) => handle.add_event(EventKind::Error, format!("Login aborted: {err}")),
        });
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
