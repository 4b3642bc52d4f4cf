//! Log setup for the command-line front end.
//!
//! - JSONL to `<config dir>/logs/sandmenu.jsonl`, through a non-blocking writer
//! - compact human-readable lines on stderr
//!
//! `RUST_LOG` overrides the default `info` filter.

use std::fs::{self, File, OpenOptions};
use std::io::IsTerminal;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const LOG_FILE_NAME: &str = "sandmenu.jsonl";

/// Dropping the guard flushes the log file, so keep it alive for all of `main`.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

pub fn init(config_dir: Option<&Path>) -> LoggingGuard {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (json_layer, file_guard) = match config_dir.and_then(open_log_file) {
        Some(file) => {
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = fmt::layer()
                .json()
                .with_writer(writer)
                .with_timer(fmt::time::UtcTime::rfc_3339())
                .with_target(true)
                .with_level(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(stderr_layer)
        .init();

    LoggingGuard {
        _file_guard: file_guard,
    }
}

fn open_log_file(config_dir: &Path) -> Option<File> {
    let log_dir = config_dir.join("logs");
    if let Err(e) = fs::create_dir_all(&log_dir) {
        eprintln!("[logging] failed to create {}: {}", log_dir.display(), e);
        return None;
    }
    let path = log_dir.join(LOG_FILE_NAME);
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .inspect_err(|e| eprintln!("[logging] failed to open {}: {}", path.display(), e))
        .ok()
}
