//! Rendering pipeline: overlay composition, in-place repaint and scrollback formatting.

pub mod frame;
pub mod overlay;
pub mod painter;
pub mod transcript;

pub use frame::OverlayFrame;
pub use painter::Painter;
