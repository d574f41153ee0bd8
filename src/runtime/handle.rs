//! Thread-safe handle for collaborators. Every call becomes a queued command that the engine
//! applies on its own loop, so no caller ever runs engine code re-entrantly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::core::state::{StatusMetaUpdate, ToggleUpdate};
use crate::error::{EngineError, EngineResult};
use crate::runtime::capture::{CaptureHandle, CaptureOptions, CaptureReply};
use crate::runtime::events::EngineMode;
use crate::runtime::menu::{MenuItem, MenuResolve};
use crate::runtime::scrollback::{EventKind, UiEvent};
use crate::runtime::wake::RuntimeWake;

pub(crate) enum EngineCommand {
    AddEvent(UiEvent),
    SetStatus(Option<String>),
    UpdateStatusMeta(StatusMetaUpdate),
    UpdateToggles(ToggleUpdate),
    OpenMenu {
        items: Vec<MenuItem>,
        title: Option<String>,
        on_resolve: MenuResolve,
    },
    CloseMenu,
    SetInlinePanel(Vec<String>),
    ClearInlinePanel,
    Capture {
        options: CaptureOptions,
        reply: CaptureReply,
    },
    ExpandLastToolResult,
    SetMode(EngineMode),
}

#[derive(Clone)]
pub struct EngineHandle {
    pub(crate) wake: Arc<RuntimeWake>,
    /// Set while a menu is open or an open request is queued.
    pub(crate) menu_open: Arc<AtomicBool>,
}

impl std::fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHandle")
            .field("menu_open", &self.menu_open.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl EngineHandle {
    pub fn add_event(&self, kind: EventKind, content: impl Into<String>) {
        self.wake
            .push_command(EngineCommand::AddEvent(UiEvent::new(kind, content)));
    }

    pub fn set_status(&self, message: Option<String>) {
        self.wake.push_command(EngineCommand::SetStatus(message));
    }

    pub fn update_status_meta(&self, update: StatusMetaUpdate) {
        self.wake
            .push_command(EngineCommand::UpdateStatusMeta(update));
    }

    pub fn update_toggles(&self, update: ToggleUpdate) {
        self.wake.push_command(EngineCommand::UpdateToggles(update));
    }

    /// Open a modal menu. Fails when another menu is open or about to open; `on_resolve` then
    /// is never called.
    pub fn set_menu<F>(&self, items: Vec<MenuItem>, title: Option<String>, on_resolve: F) -> EngineResult<()>
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
        self.wake.push_command(EngineCommand::OpenMenu {
            items,
            title,
            on_resolve: Box::new(on_resolve),
        });
        Ok(())
    }

    pub fn close_menu(&self) {
        self.wake.push_command(EngineCommand::CloseMenu);
    }

    pub fn set_inline_panel(&self, lines: Vec<String>) {
        self.wake.push_command(EngineCommand::SetInlinePanel(lines));
    }

    pub fn clear_inline_panel(&self) {
        self.wake.push_command(EngineCommand::ClearInlinePanel);
    }

    /// The returned handle resolves with the next submitted line, or an error if the capture is
    /// cancelled, another capture is active, or the engine goes away.
    pub fn capture_input(&self, options: CaptureOptions) -> CaptureHandle {
        let (reply, handle) = CaptureHandle::channel();
        self.wake
            .push_command(EngineCommand::Capture { options, reply });
        handle
    }

    pub fn expand_last_tool_result(&self) {
        self.wake.push_command(EngineCommand::ExpandLastToolResult);
    }

    pub fn set_mode(&self, mode: EngineMode) {
        self.wake.push_command(EngineCommand::SetMode(mode));
    }

    /// Ask the engine loop to exit. The owner still calls `dispose` to restore the terminal.
    pub fn stop(&self) {
        self.wake.request_stop();
    }
}
