//! Full-region repaint of the pinned overlay.
//!
//! The painter remembers the last frame it wrote. A repaint moves to the top of that region,
//! clears every line it occupied, then writes the new frame in full and parks the cursor inside
//! the input row. Identical frames produce no output at all.

use crate::core::output::{OutputGate, TerminalCmd};
use crate::render::frame::OverlayFrame;

const SYNC_START: &str = "\x1b[?2026h";
const SYNC_END: &str = "\x1b[?2026l";

fn clamp_u16(value: usize) -> u16 {
    value.min(u16::MAX as usize) as u16
}

#[derive(Debug, Default)]
pub struct Painter {
    previous: Option<OverlayFrame>,
}

impl Painter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn previous(&self) -> Option<&OverlayFrame> {
        self.previous.as_ref()
    }

    /// Queue a repaint of `frame`. Returns false, queueing nothing, when `frame` matches the last
    /// painted frame and `force` is not set.
    pub fn repaint(&mut self, frame: &OverlayFrame, force: bool, gate: &mut OutputGate) -> bool {
        if !force && self.previous.as_ref() == Some(frame) {
            return false;
        }
        gate.push(TerminalCmd::BytesStatic(SYNC_START));
        self.erase_previous(gate);
        write_frame(frame, gate);
        gate.push(TerminalCmd::BytesStatic(SYNC_END));
        self.previous = Some(frame.clone());
        true
    }

    /// Print finished scrollback `lines` where the overlay was, then repaint `frame` below them.
    pub fn write_above(&mut self, lines: &[String], frame: &OverlayFrame, gate: &mut OutputGate) {
        gate.push(TerminalCmd::BytesStatic(SYNC_START));
        self.erase_previous(gate);
        for line in lines {
            gate.push(TerminalCmd::bytes(format!("{line}\x1b[0m\r\n")));
        }
        write_frame(frame, gate);
        gate.push(TerminalCmd::BytesStatic(SYNC_END));
        self.previous = Some(frame.clone());
    }

    /// Erase the painted region and forget it.
    pub fn clear(&mut self, gate: &mut OutputGate) {
        self.erase_previous(gate);
        self.previous = None;
    }

    /// Leaves the cursor in column 0 of the first line the previous frame occupied.
    fn erase_previous(&self, gate: &mut OutputGate) {
        let Some(previous) = self.previous.as_ref() else {
            return;
        };
        gate.push(TerminalCmd::CarriageReturn);
        gate.push(TerminalCmd::MoveUp(clamp_u16(previous.cursor_row)));
        let height = previous.height().max(1);
        for idx in 0..height {
            if idx > 0 {
                gate.push(TerminalCmd::MoveDown(1));
            }
            gate.push(TerminalCmd::ClearLine);
        }
        gate.push(TerminalCmd::MoveUp(clamp_u16(height - 1)));
    }
}

fn write_frame(frame: &OverlayFrame, gate: &mut OutputGate) {
    gate.push(TerminalCmd::bytes(frame.lines.join("\r\n")));
    let last = frame.height().saturating_sub(1);
    gate.push(TerminalCmd::MoveUp(clamp_u16(last.saturating_sub(frame.cursor_row))));
    gate.push(TerminalCmd::CarriageReturn);
    gate.push(TerminalCmd::ColumnAbs(clamp_u16(frame.cursor_col + 1)));
}
