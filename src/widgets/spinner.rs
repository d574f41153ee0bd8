//! Spinner and accent glyph frames advanced by the animation clock.

pub const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
pub const ACCENT_FRAMES: [&str; 4] = ["·", "•", "●", "•"];

pub fn spinner_glyph(frame: usize) -> &'static str {
    SPINNER_FRAMES[frame % SPINNER_FRAMES.len()]
}

pub fn accent_glyph(frame: usize) -> &'static str {
    ACCENT_FRAMES[frame % ACCENT_FRAMES.len()]
}

/// `42s`, `3m 07s`, `1h 02m`.
pub fn format_elapsed(secs: u64) -> String {
    match secs {
        0..=59 => format!("{secs}s"),
        60..=3599 => format!("{}m {:02}s", secs / 60, secs % 60),
        _ => format!("{}h {:02}m", secs / 3600, (secs % 3600) / 60),
    }
}
