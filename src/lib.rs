//! Pinned-overlay terminal engine for streaming coding agents.
//!
//! Invariant: single output gate. Only `core::output::OutputGate::flush(..)` writes to the
//! terminal, and one flush is one write.
//!
//! # Public API Overview
//! - Drive the UI with [`TuiEngine`]; hand [`EngineHandle`] clones to agent threads.
//! - Receive [`EngineEvent`]s (submits, toggles, ctrl+c) from the channel returned by
//!   [`TuiEngine::new`].
//! - Queue transcript output with [`EventKind`]-tagged events; it prints above the overlay.
//! - Open modal menus ([`MenuItem`]) and capture single lines ([`CaptureOptions`]).
//! - Use text and width helpers for ANSI-safe formatting.

#![allow(
    clippy::derivable_impls,
    clippy::needless_range_loop,
    clippy::question_mark,
    clippy::too_many_arguments,
    clippy::type_complexity,
    clippy::unnecessary_map_or
)]

pub mod config;
pub mod error;
pub mod logging;

pub mod core;
pub mod platform;
pub mod render;
pub mod runtime;
pub mod widgets;

/// Configuration.
pub use crate::config::{EngineConfig, EnvConfig, PasteTuning};
/// Errors.
pub use crate::error::{EngineError, EngineResult};

/// Engine, handle and event types.
pub use crate::runtime::{
    CaptureHandle, CaptureOptions, EngineEvent, EngineHandle, EngineMode, EventKind, MenuItem,
    TuiEngine, UiEvent,
};

/// Classified input vocabulary and the classifier.
pub use crate::core::actions::{EditKey, InputAction, ToggleKind};
pub use crate::core::classifier::InputClassifier;

/// Status and toggle state shown in the overlay.
pub use crate::core::state::{
    ApprovalMode, AutoContinueMode, StatusMeta, StatusMetaUpdate, ToggleState, ToggleUpdate,
};
/// Slash-command catalog entries.
pub use crate::core::suggestions::CommandSpec;

/// Terminal interfaces and process-backed implementation.
pub use crate::core::terminal::Terminal;
pub use crate::platform::process_terminal::ProcessTerminal;

/// ANSI-aware wrapping helper.
pub use crate::core::text::wrap::wrap_text_with_ansi;
/// ANSI-aware truncation helper.
pub use crate::core::text::utils::truncate_to_width;
/// Visible width helper that ignores ANSI control sequences.
pub use crate::core::text::width::visible_width;
