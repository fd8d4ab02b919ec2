//! Minimal logging (§10 ambient stack): no logging crate in this
//! dependency graph, matching the teacher's own convention. `--log <path>`
//! redirects the handful of diagnostic lines this crate emits from
//! stderr to a file; without it they go to stderr as usual.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;

static LOG_FILE: OnceCell<Mutex<File>> = OnceCell::new();

/// Open (create/append) `path` and route subsequent [`log_line!`] calls
/// there instead of stderr. Returns an error if the file can't be opened.
pub fn init_log_file(path: &Path) -> std::io::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    // `set` only fails if already initialized; a second `--log` flag
    // would be a user error caught by argument parsing, not here.
    let _ = LOG_FILE.set(Mutex::new(file));
    Ok(())
}

/// Write one already-formatted log line to the configured destination.
pub fn log_line(line: &std::fmt::Arguments<'_>) {
    match LOG_FILE.get() {
        Some(file) => {
            let mut file = file.lock();
            let _ = writeln!(file, "{line}");
        }
        None => eprintln!("{line}"),
    }
}

/// Logs a line to the file set by `--log`, or to stderr otherwise.
#[macro_export]
macro_rules! log_line {
    ($($arg:tt)*) => {
        $crate::util::log::log_line(&format_args!($($arg)*))
    };
}

/// Verbose tracing, gated on the `lsp.trace` config flag (§4.6, §10.1).
/// Unlike [`log_line!`] this is for routine diagnostics a client can
/// opt into, not failures that always get logged.
#[macro_export]
macro_rules! trace_line {
    ($enabled:expr, $($arg:tt)*) => {
        if $enabled {
            $crate::log_line!($($arg)*);
        }
    };
}
