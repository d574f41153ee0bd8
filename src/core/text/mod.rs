//! Text helpers: ANSI scanning, display width, wrapping and truncation.
//!
//! Everything here is pure (string in, string out) so the classifier, the overlay composer and the
//! transcript formatter can share it without touching terminal state.

pub mod ansi;
pub mod style;
pub mod utils;
pub mod width;
pub mod wrap;
