//! ANSI escape scanning and SGR style tracking.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnsiCodeKind {
    Csi,
    Osc,
    Apc,
    Dcs,
    Ss3,
}

/// A complete escape sequence found inside a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnsiCode<'a> {
    pub code: &'a str,
    pub kind: AnsiCodeKind,
}

impl AnsiCode<'_> {
    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }
}

/// Returns the escape sequence starting at byte offset `pos`, if one is complete there.
pub fn extract_ansi_code(input: &str, pos: usize) -> Option<AnsiCode<'_>> {
    let bytes = input.as_bytes();
    if bytes.get(pos) != Some(&0x1b) {
        return None;
    }
    let (end, kind) = match bytes.get(pos + 1)? {
        b'[' => {
            let offset = bytes[pos + 2..]
                .iter()
                .position(|b| (0x40..=0x7e).contains(b))?;
            (pos + 2 + offset + 1, AnsiCodeKind::Csi)
        }
        b']' => (string_terminator_end(bytes, pos + 2)?, AnsiCodeKind::Osc),
        b'_' => (string_terminator_end(bytes, pos + 2)?, AnsiCodeKind::Apc),
        b'P' => (string_terminator_end(bytes, pos + 2)?, AnsiCodeKind::Dcs),
        b'O' if pos + 2 < bytes.len() => (pos + 3, AnsiCodeKind::Ss3),
        _ => return None,
    };
    input.get(pos..end).map(|code| AnsiCode { code, kind })
}

fn string_terminator_end(bytes: &[u8], mut idx: usize) -> Option<usize> {
    while idx < bytes.len() {
        match bytes[idx] {
            0x07 => return Some(idx + 1),
            0x1b if bytes.get(idx + 1) == Some(&b'\\') => return Some(idx + 2),
            _ => idx += 1,
        }
    }
    None
}

/// Removes every complete escape sequence from `input`.
pub fn strip_ansi(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut idx = 0;
    while idx < input.len() {
        if let Some(code) = extract_ansi_code(input, idx) {
            idx += code.len();
            continue;
        }
        let Some(ch) = input[idx..].chars().next() else {
            break;
        };
        out.push(ch);
        idx += ch.len_utf8();
    }
    out
}

/// Tracks the SGR attributes active at a point in a styled string so a wrapped continuation line
/// can reopen them.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StyleTracker {
    attrs: Vec<u16>,
    fg: Option<String>,
    bg: Option<String>,
}

impl StyleTracker {
    pub fn process(&mut self, code: &str) {
        let Some(params) = code
            .strip_prefix("\x1b[")
            .and_then(|rest| rest.strip_suffix('m'))
        else {
            return;
        };
        if params.is_empty() {
            self.reset();
            return;
        }

        let parts: Vec<&str> = params.split(';').collect();
        let mut idx = 0;
        while idx < parts.len() {
            let value = parts[idx].parse::<u16>().unwrap_or(0);
            if value == 38 || value == 48 {
                let take = match parts.get(idx + 1).copied() {
                    Some("5") => 3,
                    Some("2") => 5,
                    _ => 1,
                };
                if take > 1 && idx + take <= parts.len() {
                    let color = parts[idx..idx + take].join(";");
                    if value == 38 {
                        self.fg = Some(color);
                    } else {
                        self.bg = Some(color);
                    }
                }
                idx += take;
                continue;
            }
            match value {
                0 => self.reset(),
                1..=9 => {
                    if !self.attrs.contains(&value) {
                        self.attrs.push(value);
                    }
                }
                22 => self.attrs.retain(|attr| *attr != 1 && *attr != 2),
                21 | 23..=29 => {
                    let cleared = if value == 21 { 1 } else { value - 20 };
                    self.attrs.retain(|attr| *attr != cleared);
                }
                30..=37 | 90..=97 => self.fg = Some(value.to_string()),
                39 => self.fg = None,
                40..=47 | 100..=107 => self.bg = Some(value.to_string()),
                49 => self.bg = None,
                _ => {}
            }
            idx += 1;
        }
    }

    /// Feeds every escape sequence found in `text` through [`StyleTracker::process`].
    pub fn scan(&mut self, text: &str) {
        let mut idx = 0;
        while idx < text.len() {
            if let Some(code) = extract_ansi_code(text, idx) {
                self.process(code.code);
                idx += code.len();
            } else {
                idx += text[idx..].chars().next().map_or(1, char::len_utf8);
            }
        }
    }

    pub fn is_plain(&self) -> bool {
        self.attrs.is_empty() && self.fg.is_none() && self.bg.is_none()
    }

    /// SGR sequence that re-establishes the tracked style, or an empty string.
    pub fn active_codes(&self) -> String {
        if self.is_plain() {
            return String::new();
        }
        let mut codes: Vec<String> = self.attrs.iter().map(u16::to_string).collect();
        codes.extend(self.fg.iter().cloned());
        codes.extend(self.bg.iter().cloned());
        format!("\x1b[{}m", codes.join(";"))
    }

    fn reset(&mut self) {
        self.attrs.clear();
        self.fg = None;
        self.bg = None;
    }
}
