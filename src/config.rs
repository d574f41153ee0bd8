//! Environment and engine configuration.
//!
//! The paste heuristics are empirically tuned against real terminals and paste tools. Every
//! threshold is a named field so hosts (and the `PINNED_TUI_*` env overrides) can retune them
//! without touching the classifier.

use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub log_file: Option<String>,
    pub log_filter: Option<String>,
    pub write_log: Option<String>,
    pub debug: bool,
    pub paste_idle_ms: Option<u64>,
    pub burst_window_ms: Option<u64>,
    pub burst_threshold: Option<usize>,
}

impl EnvConfig {
    pub fn from_env() -> Self {
        Self {
            log_file: env_string_opt("PINNED_TUI_LOG"),
            log_filter: env_string_opt("PINNED_TUI_LOG_FILTER"),
            write_log: env_string_opt("PINNED_TUI_WRITE_LOG"),
            debug: env_flag("PINNED_TUI_DEBUG"),
            paste_idle_ms: env_number_opt("PINNED_TUI_PASTE_IDLE_MS"),
            burst_window_ms: env_number_opt("PINNED_TUI_BURST_WINDOW_MS"),
            burst_threshold: env_number_opt("PINNED_TUI_BURST_THRESHOLD"),
        }
    }
}

/// Paste detection thresholds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasteTuning {
    /// Quiet period after which a heuristic capture (or held keystrokes) is committed.
    pub idle_debounce: Duration,
    /// Trailing window used to count rapid single-character arrivals.
    pub burst_window: Duration,
    /// Characters inside `burst_window` above which arrivals are treated as a paste.
    pub burst_threshold: usize,
    /// Characters inside `burst_window` at which single keystrokes start being held back.
    pub suspect_threshold: usize,
    /// Hard cap on captured paste length, in chars. Input past the cap is dropped.
    pub capture_limit: usize,
    /// A bracketed paste whose end marker never arrives is committed after this much silence.
    pub bracketed_idle_timeout: Duration,
    /// Single-line pastes at least this long are collapsed into a chip.
    pub collapse_min_chars: usize,
}

impl Default for PasteTuning {
    fn default() -> Self {
        Self {
            idle_debounce: Duration::from_millis(80),
            burst_window: Duration::from_millis(120),
            burst_threshold: 16,
            suspect_threshold: 4,
            capture_limit: 1024 * 1024,
            bracketed_idle_timeout: Duration::from_millis(1000),
            collapse_min_chars: 500,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub paste: PasteTuning,
    /// How long an incomplete escape tail is held before it is flushed.
    pub escape_timeout: Duration,
    /// Repaint ceiling (~60 fps).
    pub min_repaint_interval: Duration,
    /// Spinner tick while streaming.
    pub animation_interval: Duration,
    pub tool_result_capacity: usize,
    /// Tool results longer than this many lines are collapsed.
    pub tool_result_preview_lines: usize,
    pub max_panel_lines: usize,
    pub max_suggestions: usize,
    pub max_input_rows: usize,
    /// Oldest submissions are dropped past this many. `None` keeps every entry.
    pub history_limit: Option<usize>,
    pub prompt_glyph: String,
    /// Raw terminal write log path.
    pub write_log: Option<String>,
    pub debug: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            paste: PasteTuning::default(),
            escape_timeout: Duration::from_millis(10),
            min_repaint_interval: Duration::from_millis(16),
            animation_interval: Duration::from_millis(100),
            tool_result_capacity: 20,
            tool_result_preview_lines: 3,
            max_panel_lines: 12,
            max_suggestions: 5,
            max_input_rows: 8,
            history_limit: None,
            prompt_glyph: "❯ ".to_string(),
            write_log: None,
            debug: false,
        }
    }
}

impl EngineConfig {
    /// Defaults with the `PINNED_TUI_*` overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_env(&EnvConfig::from_env())
    }

    pub fn with_env(mut self, env: &EnvConfig) -> Self {
        if let Some(ms) = env.paste_idle_ms {
            self.paste.idle_debounce = Duration::from_millis(ms);
        }
        if let Some(ms) = env.burst_window_ms {
            self.paste.burst_window = Duration::from_millis(ms);
        }
        if let Some(threshold) = env.burst_threshold {
            self.paste.burst_threshold = threshold.max(1);
        }
        if env.write_log.is_some() {
            self.write_log = env.write_log.clone();
        }
        self.debug |= env.debug;
        self
    }
}

fn env_flag(key: &str) -> bool {
    env::var(key).map(|value| value == "1").unwrap_or(false)
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}

fn env_number_opt<N: std::str::FromStr>(key: &str) -> Option<N> {
    env_string_opt(key).and_then(|value| value.trim().parse().ok())
}
