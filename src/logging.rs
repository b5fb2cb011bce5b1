//! Logging setup for shellcomp
//!
//! Stdout carries the completion protocol, so log output goes to stderr, or
//! is appended to `$BASH_COMP_DEBUG_FILE` when that is set (the same file the
//! shell scripts trace into).

use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter directives, e.g. `SHELLCOMP_LOG=debug`
pub const LOG_ENV: &str = "SHELLCOMP_LOG";
/// Debug file shared with the generated shell scripts
pub const DEBUG_FILE_ENV: &str = "BASH_COMP_DEBUG_FILE";

const DEFAULT_FILTER: &str = "warn";

/// Initialize the global subscriber. A second call fails and keeps the first.
pub fn init_logging() -> Result<(), String> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = fmt().with_env_filter(filter).with_target(false).without_time();

    let debug_file = std::env::var(DEBUG_FILE_ENV)
        .ok()
        .filter(|path| !path.is_empty())
        .and_then(|path| OpenOptions::new().create(true).append(true).open(path).ok());

    let result = match debug_file {
        Some(file) => builder.with_ansi(false).with_writer(Mutex::new(file)).try_init(),
        None => builder.with_writer(std::io::stderr).try_init(),
    };

    result.map_err(|e| format!("failed to initialize logging: {}", e))?;
    debug!("logging initialized");
    Ok(())
}
