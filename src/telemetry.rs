//! JSON trace log for recognition and dispatch debugging.
//!
//! Nothing is recorded unless `--logs` is given, and `--no-logs` always wins.
//! Traces always go to a file, never stdout.

use std::env;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::time::UtcTime;

use crate::config::AppConfig;

pub const TRACE_LOG_ENV: &str = "VOICENAV_TRACE_LOG";
const DEFAULT_TRACE_FILE: &str = "voicenav_trace.jsonl";

static INSTALLED: OnceLock<Option<PathBuf>> = OnceLock::new();

/// `$VOICENAV_TRACE_LOG` when set and non-empty, else a file in the temp dir.
#[must_use]
pub fn trace_log_path() -> PathBuf {
    match env::var_os(TRACE_LOG_ENV) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => env::temp_dir().join(DEFAULT_TRACE_FILE),
    }
}

fn logging_requested(config: &AppConfig) -> bool {
    config.logs && !config.no_logs
}

fn open_trace_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

fn install(config: &AppConfig, slot: &OnceLock<Option<PathBuf>>) -> Option<PathBuf> {
    if !logging_requested(config) {
        return None;
    }
    slot.get_or_init(|| {
        let path = trace_log_path();
        let file = open_trace_file(&path).ok()?;
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_max_level(LevelFilter::DEBUG)
            .with_timer(UtcTime::rfc_3339())
            .with_writer(file)
            .with_current_span(false)
            .with_span_list(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .ok()
            .map(|()| path)
    })
    .clone()
}

/// Install the trace subscriber. Returns the log path when tracing is active.
pub fn init_tracing(config: &AppConfig) -> Option<PathBuf> {
    install(config, &INSTALLED)
}
