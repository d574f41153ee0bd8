//! One-shot input capture (`captureInput`): the next submitted line is delivered to the caller
//! instead of being routed as a normal submit.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::Duration;

use crate::core::input_buffer::SavedLine;
use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureOptions {
    /// Replaces the prompt glyph while capturing, e.g. `"API key: "`.
    pub label: Option<String>,
    /// Render typed characters as `•` and keep the line out of history.
    pub mask: bool,
}

impl CaptureOptions {
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            mask: false,
        }
    }

    pub fn masked(mut self) -> Self {
        self.mask = true;
        self
    }
}

/// Receiving side of a capture. Resolves exactly once.
#[derive(Debug)]
pub struct CaptureHandle {
    rx: Receiver<EngineResult<String>>,
}

impl CaptureHandle {
    pub(crate) fn channel() -> (CaptureReply, CaptureHandle) {
        let (tx, rx) = mpsc::channel();
        (CaptureReply { tx }, CaptureHandle { rx })
    }

    /// Block until the capture resolves.
    pub fn wait(self) -> EngineResult<String> {
        self.rx.recv().unwrap_or(Err(EngineError::Disposed))
    }

    /// `None` while the capture is still pending.
    pub fn try_recv(&self) -> Option<EngineResult<String>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(EngineError::Disposed)),
        }
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineResult<String>> {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Err(EngineError::Disposed)),
        }
    }
}

/// Sending side held by the engine.
#[derive(Debug)]
pub(crate) struct CaptureReply {
    tx: Sender<EngineResult<String>>,
}

impl CaptureReply {
    /// Consumes the reply so a capture can only resolve once. A dropped receiver is ignored.
    pub(crate) fn send(self, result: EngineResult<String>) {
        let _ = self.tx.send(result);
    }
}

/// Capture in progress plus the draft it displaced.
#[derive(Debug)]
pub(crate) struct ActiveCapture {
    pub(crate) options: CaptureOptions,
    pub(crate) reply: CaptureReply,
    pub(crate) saved: SavedLine,
}

#[cfg(test)]
mod tests {
    use super::CaptureHandle;
    use crate::error::EngineError;
    use std::time::Duration;

    #[test]
    fn resolves_once_and_reports_disposal() {
        let (reply, handle) = CaptureHandle::channel();
        assert!(handle.try_recv().is_none());
        reply.send(Ok("secret".to_string()));
        assert_eq!(handle.wait().ok(), Some("secret".to_string()));

        let (reply, handle) = CaptureHandle::channel();
        drop(reply);
        assert!(matches!(
            handle.recv_timeout(Duration::from_millis(10)),
            Some(Err(EngineError::Disposed))
        ));
    }
}
