// This file implements the installer's logging system.
// It provides macros for the different log levels (INFO, WARN, ERROR, DEBUG).
// Every message goes to the terminal with a colored prefix and is also emitted
// as a `tracing` event, which the file sink set up by `init` persists.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, OnceLock};

/// Environment variable overriding the directory holding the log file.
pub const LOG_DIR_ENV: &str = "LOG_DIR";
/// Directory used when `LOG_DIR` is not set.
pub const DEFAULT_LOG_DIR: &str = "/var/log/bluebanquise";
/// Name of the log file inside the log directory.
pub const LOG_FILE_NAME: &str = "bluebanquise-installer.log";

// `log_info!` for general progress and informational messages.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {{
        let message = format!($($arg)*);
        eprintln!("{} {}", colored::Colorize::bright_green("[INFO]"), message);
        tracing::info!("{}", message);
    }};
}

// `log_warn!` for non-fatal conditions, such as a cleanup step that failed.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {{
        let message = format!($($arg)*);
        eprintln!("{} {}", colored::Colorize::bright_yellow("[WARN]"), message);
        tracing::warn!("{}", message);
    }};
}

// `log_error!` for fatal conditions. The caller aborts right after.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {{
        let message = format!($($arg)*);
        eprintln!("{} {}", colored::Colorize::bright_red("[ERROR]"), message);
        tracing::error!("{}", message);
    }};
}

// `log_debug!` for detailed tracing of commands and decisions.
// Messages only reach the terminal when debug mode is enabled via `--debug`.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {{
        let message = format!($($arg)*);
        if $crate::logger::is_debug_enabled() {
            eprintln!("{} {}", colored::Colorize::dimmed("[DEBUG]"), message);
        }
        tracing::debug!("{}", message);
    }};
}

// Global flag to control debug logging, ensured to be initialized once.
static DEBUG_ENABLED: OnceLock<AtomicBool> = OnceLock::new();

/// Initializes the logger: sets the debug flag and installs the file sink.
/// Called once at startup, before any command runs.
///
/// A log file that cannot be opened is not fatal; the installer continues with
/// terminal output only.
pub fn init(debug: bool) {
    DEBUG_ENABLED
        .get_or_init(|| AtomicBool::new(debug))
        .store(debug, Ordering::Relaxed);

    let configured = std::env::var_os(LOG_DIR_ENV).map(PathBuf::from);
    match open_log_file(configured.as_deref(), debug) {
        Ok(path) => log_debug!("Logging to {}", path.display()),
        Err(e) => log_warn!("File logging disabled: {}", e),
    }

    if debug {
        log_debug!("Logger initialized in DEBUG mode");
    }
}

/// Checks if debug logging is currently enabled.
/// Used primarily by the `log_debug!` macro.
pub fn is_debug_enabled() -> bool {
    DEBUG_ENABLED
        .get()
        .map(|f| f.load(Ordering::Relaxed))
        .unwrap_or(false)
}

/// Picks the log directory: an explicit `LOG_DIR` must be creatable, while the
/// default directory falls back to the system temp directory.
pub fn resolve_log_dir(configured: Option<&Path>) -> std::io::Result<PathBuf> {
    if let Some(dir) = configured {
        fs::create_dir_all(dir)?;
        return Ok(dir.to_path_buf());
    }
    let default_dir = PathBuf::from(DEFAULT_LOG_DIR);
    match fs::create_dir_all(&default_dir) {
        Ok(()) => Ok(default_dir),
        Err(_) => Ok(std::env::temp_dir()),
    }
}

fn open_log_file(configured: Option<&Path>, debug: bool) -> std::io::Result<PathBuf> {
    let dir = resolve_log_dir(configured)?;
    let path = dir.join(LOG_FILE_NAME);
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let level = if debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(level)
        .try_init()
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        log_file = %path.display(),
        "BlueBanquise installer started"
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_log_dir_is_created() {
        let tmp = tempfile::tempdir().unwrap();
        let wanted = tmp.path().join("nested").join("logs");
        let dir = resolve_log_dir(Some(&wanted)).unwrap();
        assert_eq!(dir, wanted);
        assert!(wanted.is_dir());
    }

    #[test]
    fn debug_is_off_until_initialized() {
        // `init` is never called in unit tests.
        assert!(!is_debug_enabled());
    }
}
