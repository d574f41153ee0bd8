//! Platform-specific terminal integrations.

pub mod escape_splitter;
pub mod process_terminal;

#[cfg(unix)]
pub use process_terminal::{
    install_panic_hook, install_signal_handlers, PanicHookGuard, SignalHookGuard,
};
pub use process_terminal::ProcessTerminal;
