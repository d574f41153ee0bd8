//! Core types: input vocabulary, classification, the edit buffer and the output gate.

pub mod actions;
pub mod classifier;
pub mod input_buffer;
pub mod keys;
pub mod output;
pub mod state;
pub mod suggestions;
pub mod terminal;
pub mod text;
