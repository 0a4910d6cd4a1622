//! Tracing setup.
//!
//! The terminal UI owns the screen, so interactive runs log to a file under
//! the user's state directory. Headless runs log to stderr, which keeps
//! stdout free for the transcript.

use std::fs::{self, File};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const APP_DIR: &str = "sqlchat";
const LOG_FILE: &str = "sqlchat.log";

/// Used when `RUST_LOG` is unset. sqlx logs every statement at info.
const DEFAULT_FILTER: &str = "info,sqlx=warn";

/// Where log records go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSink {
    /// Truncated file at [`log_path`].
    File,
    Stderr,
}

impl LogSink {
    /// The sink matching the run mode.
    pub fn for_mode(headless: bool) -> Self {
        if headless {
            Self::Stderr
        } else {
            Self::File
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global subscriber for `sink`.
///
/// A log file that cannot be opened leaves logging disabled; writing the
/// failure to the terminal is all that can be done before the UI starts.
pub fn init(sink: LogSink) {
    match sink {
        LogSink::Stderr => tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_writer(io::stderr)
            .init(),
        LogSink::File => match open_log_file() {
            Ok(file) => tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(file)
                .with_ansi(false)
                .init(),
            Err(e) => eprintln!("Warning: logging disabled, cannot open {}: {e}", log_path().display()),
        },
    }
}

fn open_log_file() -> io::Result<File> {
    let path = log_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    File::create(path)
}

/// Log file location.
///
/// `$XDG_STATE_HOME/sqlchat/sqlchat.log` where a state directory exists,
/// the config directory otherwise, the temp directory as a last resort.
pub fn log_path() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::config_dir)
        .map(|dir| dir.join(APP_DIR).join(LOG_FILE))
        .unwrap_or_else(|| std::env::temp_dir().join(LOG_FILE))
}
