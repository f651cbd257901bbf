//! Diagnostic log setup.
//!
//! Every run writes to `BunnyPad_update_log.<YYYY-MM-DD_HH>.log` in the
//! user's home directory. This is the file users are offered to open after a
//! failed installation. In debug mode (see
//! [`is_debug_mode`](super::messages::macros::is_debug_mode)) events are also
//! mirrored to stderr.
//!
//! The file is written by a background worker. [`shutdown`] flushes it and
//! must run before the process exits without unwinding.

use super::messages::macros::is_debug_mode;
use anyhow::Result;
use chrono::{DateTime, Local};
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

pub const LOG_FILE_PREFIX: &str = "BunnyPad_update_log";

static WORKER_GUARD: Mutex<Option<WorkerGuard>> = parking_lot::const_mutex(None);

/// Location of the open log. Dropping it flushes the file.
pub struct LogHandle {
    pub path: PathBuf,
}

impl Drop for LogHandle {
    fn drop(&mut self) {
        shutdown();
    }
}

/// Flushes pending log lines and stops the background writer.
///
/// Events emitted afterwards are discarded. Calling it again is a no-op.
pub fn shutdown() {
    if let Some(guard) = WORKER_GUARD.lock().take() {
        drop(guard);
    }
}

/// File name of the log for the hour containing `now`.
pub fn log_file_name(now: DateTime<Local>) -> String {
    format!("{}.{}.log", LOG_FILE_PREFIX, now.format("%Y-%m-%d_%H"))
}

/// Directory the log lives in: the home directory, or the working directory
/// when there is none.
pub fn log_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

fn default_filter() -> EnvFilter {
    let level = if is_debug_mode() { "debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("bunnypad_updater={}", level)))
}

/// Installs the global subscriber writing to the dated log file in `dir`.
pub fn init_in(dir: &Path) -> Result<LogHandle> {
    fs::create_dir_all(dir)?;
    let file_name = log_file_name(Local::now());
    let path = dir.join(&file_name);

    let file_appender = tracing_appender::rolling::never(dir, &file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false).with_target(true);
    let console_layer = is_debug_mode().then(|| fmt::layer().with_writer(std::io::stderr).compact().boxed());

    tracing_subscriber::registry()
        .with(default_filter())
        .with(file_layer)
        .with(console_layer)
        .try_init()?;

    *WORKER_GUARD.lock() = Some(guard);
    tracing::debug!(path = %path.display(), "diagnostic log opened");
    Ok(LogHandle { path })
}

pub fn init() -> Result<LogHandle> {
    init_in(&log_dir())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn log_file_name_is_dated_to_the_hour() {
        let now = Local.with_ymd_and_hms(2024, 8, 9, 7, 45, 12).unwrap();
        assert_eq!(log_file_name(now), "BunnyPad_update_log.2024-08-09_07.log");
    }
}
