//! Engine error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("a menu is already open")]
    MenuAlreadyOpen,

    #[error("an input capture is already in progress")]
    CaptureInProgress,

    #[error("input capture was cancelled")]
    CaptureCancelled,

    #[error("engine has been disposed")]
    Disposed,

    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
