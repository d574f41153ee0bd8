//! Terminal trait.

/// Minimal terminal interface for the engine.
///
/// `ProcessTerminal` implements it over the controlling TTY; tests implement it over an in-memory
/// recorder.
pub trait Terminal {
    /// Start the terminal with input, resize and job-control resume handlers.
    fn start(
        &mut self,
        on_input: Box<dyn FnMut(String) + Send>,
        on_resize: Box<dyn FnMut() + Send>,
        on_resume: Box<dyn FnMut() + Send>,
    ) -> std::io::Result<()>;

    /// Stop the terminal and restore state.
    fn stop(&mut self) -> std::io::Result<()>;

    /// Drain stdin before exiting to prevent key release leakage over slow connections.
    fn drain_input(&mut self, max_ms: u64, idle_ms: u64);

    /// Write output to the terminal.
    fn write(&mut self, data: &str);

    /// Terminal dimensions.
    fn columns(&self) -> u16;
    fn rows(&self) -> u16;

    /// Hand the terminal back to the shell and stop the process (ctrl+z). Terminals without job
    /// control ignore it.
    fn suspend(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
