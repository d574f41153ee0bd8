//! File-backed tracing setup.
//!
//! stdout belongs to the painted terminal, so log output only ever goes to a file.

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::EnvConfig;

const DEFAULT_FILTER: &str = "pinned_tui=debug";

/// Install a global subscriber writing to `PINNED_TUI_LOG`, filtered by `PINNED_TUI_LOG_FILTER`.
///
/// Returns `false` when no log file is configured, the file cannot be opened, or a subscriber is
/// already installed.
pub fn init(env: &EnvConfig) -> bool {
    let Some(path) = env.log_file.as_deref() else {
        return false;
    };
    let file = match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => file,
        Err(_) => return false,
    };
    let filter = env
        .log_filter
        .as_deref()
        .and_then(|spec| EnvFilter::try_new(spec).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .is_ok()
}

/// [`init`] over the process environment.
pub fn init_from_env() -> bool {
    init(&EnvConfig::from_env())
}

#[cfg(test)]
mod tests {
    use super::init;
    use crate::config::EnvConfig;

    #[test]
    fn no_log_file_is_a_noop() {
        assert!(!init(&EnvConfig::default()));
    }
}
