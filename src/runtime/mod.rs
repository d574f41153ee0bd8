//! Engine runtime: the event loop, its command queue and the state machines it drives.

pub mod animation;
pub mod capture;
pub mod engine;
pub mod events;
pub mod handle;
pub mod menu;
pub mod scrollback;
pub mod throttle;
pub(crate) mod wake;

pub use capture::{CaptureHandle, CaptureOptions};
pub use engine::TuiEngine;
pub use events::{EngineEvent, EngineMode};
pub use handle::EngineHandle;
pub use menu::{MenuController, MenuItem, MenuOutcome, MenuState};
pub use scrollback::{CollapsedToolResult, EventKind, ScrollbackQueue, ToolResultStack, UiEvent};
