//! Messages the engine sends to its collaborator.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineMode {
    #[default]
    Idle,
    Streaming,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// A line the user submitted while idle.
    Submit(String),
    /// Lines typed during streaming, delivered together.
    Queue(String),
    /// Ctrl+C. A non-empty buffer was cleared when `had_buffer` is set.
    CtrlC { had_buffer: bool },
    /// Ctrl+D on an empty buffer.
    Interrupt,
    ToggleAutoContinue,
    ToggleCriticalApproval,
    ToggleThinking,
    Change { text: String, cursor: usize },
    ExpandToolResult,
    /// The process came back from a job-control stop.
    Resume,
}
