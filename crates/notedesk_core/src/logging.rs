//! Logging bootstrap.
//!
//! # Responsibility
//! - Initialize file-based rolling logs exactly once per process.
//! - Emit stable, metadata-only diagnostic events from core.
//!
//! # Invariants
//! - Initialization is idempotent for the same level and directory, and
//!   rejected for a conflicting reconfiguration.
//! - Initialization never panics.

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::info;
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};

const LOG_BASENAME: &str = "notedesk";
const ROTATE_AT_BYTES: u64 = 5 * 1024 * 1024;
const KEEP_LOG_FILES: usize = 8;

static ACTIVE: OnceCell<LoggingState> = OnceCell::new();

struct LoggingState {
    level: &'static str,
    log_dir: PathBuf,
    _logger: LoggerHandle,
}

/// Initializes core logging with a level and an absolute log directory.
///
/// Repeated calls with the same configuration are idempotent; a different
/// level or directory is rejected with a human-readable error string.
pub fn init_logging(level: &str, log_dir: &str) -> Result<(), String> {
    let level = normalize_level(level)?;
    let log_dir = normalize_log_dir(log_dir)?;

    let init_dir = log_dir.clone();
    let state = ACTIVE.get_or_try_init(|| start_logger(level, init_dir))?;

    if state.log_dir != log_dir {
        return Err(format!(
            "logging already active at `{}`; cannot switch to `{}`",
            state.log_dir.display(),
            log_dir.display()
        ));
    }
    if state.level != level {
        return Err(format!(
            "logging already active at level `{}`; cannot switch to `{level}`",
            state.level
        ));
    }
    Ok(())
}

fn start_logger(level: &'static str, log_dir: PathBuf) -> Result<LoggingState, String> {
    std::fs::create_dir_all(&log_dir)
        .map_err(|err| format!("cannot create log directory `{}`: {err}", log_dir.display()))?;

    let file_spec = FileSpec::default()
        .directory(log_dir.as_path())
        .basename(LOG_BASENAME);
    let rotation = Criterion::Size(ROTATE_AT_BYTES);

    let logger = Logger::try_with_str(level)
        .map_err(|err| format!("invalid log level `{level}`: {err}"))?
        .log_to_file(file_spec)
        .rotate(rotation, Naming::Numbers, Cleanup::KeepLogFiles(KEEP_LOG_FILES))
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .map_err(|err| format!("cannot start logger: {err}"))?;

    info!(
        "event=core_init module=core status=ok level={level} log_dir={} version={}",
        log_dir.display(),
        env!("CARGO_PKG_VERSION")
    );

    Ok(LoggingState {
        level,
        log_dir,
        _logger: logger,
    })
}

/// Returns `(level, log_dir)` when logging is active.
pub fn logging_status() -> Option<(&'static str, PathBuf)> {
    ACTIVE.get().map(|state| (state.level, state.log_dir.clone()))
}

/// Default log level for the current build mode.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn normalize_level(level: &str) -> Result<&'static str, String> {
    const LEVELS: &[(&str, &str)] = &[
        ("trace", "trace"),
        ("debug", "debug"),
        ("info", "info"),
        ("warn", "warn"),
        ("warning", "warn"),
        ("error", "error"),
    ];
    let wanted = level.trim().to_ascii_lowercase();
    LEVELS
        .iter()
        .find(|(alias, _)| *alias == wanted)
        .map(|(_, canonical)| *canonical)
        .ok_or_else(|| {
            format!("unsupported log level `{wanted}`; expected trace|debug|info|warn|error")
        })
}

fn normalize_log_dir(log_dir: &str) -> Result<PathBuf, String> {
    let trimmed = log_dir.trim();
    if trimmed.is_empty() {
        return Err("log_dir cannot be empty".to_string());
    }
    let path = Path::new(trimmed);
    if !path.is_absolute() {
        return Err(format!("log_dir must be an absolute path, got `{trimmed}`"));
    }
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::{normalize_level, normalize_log_dir};

    #[test]
    fn normalize_level_accepts_aliases_and_rejects_unknown() {
        assert_eq!(normalize_level("INFO").unwrap(), "info");
        assert_eq!(normalize_level(" warning ").unwrap(), "warn");
        assert!(normalize_level("loud").is_err());
    }

    #[test]
    fn normalize_log_dir_requires_absolute_path() {
        assert!(normalize_log_dir("logs/dev").unwrap_err().contains("absolute"));
        assert!(normalize_log_dir("  ").unwrap_err().contains("empty"));
    }
}
