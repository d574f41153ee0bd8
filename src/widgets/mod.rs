//! Line-producing pieces of the overlay.

pub mod menu_list;
pub mod spinner;
pub mod status_line;
