//! A fake coding agent that drives `pinned_tui` the way a real host would.

pub mod agent;
pub mod commands;
pub mod controller;
