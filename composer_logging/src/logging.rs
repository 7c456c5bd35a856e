use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{DateTime, FixedOffset, Local};
use composer_config::groups::log::ConfigValueGroup as LogConfigGroup;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::constants::{DEFAULT_LOG_FILE_NAME, DEFAULT_LOG_LEVEL_CONSOLE, DEFAULT_LOG_LEVEL_FILE};

#[derive(Clone, Debug, PartialEq)]
pub enum LoggingMode {
    Directory(PathBuf),
    File(PathBuf),
    Console,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoggingConfig {
    pub logging_mode: LoggingMode,
    pub use_json: bool,
    pub file_prefix: String,
    pub version: String,
}

impl LoggingConfig {
    pub fn new(version: impl Into<String>, log_config: &LogConfigGroup) -> LoggingConfig {
        let logging_mode = match log_config.dest.as_deref() {
            None | Some("") => LoggingMode::Console,
            Some(log_dest) => {
                let path = PathBuf::from(log_dest);

                if log_dest.ends_with('/') || log_dest.ends_with('\\') || path.is_dir() {
                    LoggingMode::Directory(path)
                } else {
                    LoggingMode::File(path)
                }
            },
        };

        let use_json = match &log_config.format {
            Some(format) => format.trim().eq_ignore_ascii_case("json"),
            None => logging_mode != LoggingMode::Console,
        };

        Self {
            logging_mode,
            use_json,
            file_prefix: log_config.prefix.clone(),
            version: version.into(),
        }
    }
}

/// The main entry point to set up logging.  Should only be called once.
pub fn init_logging(cfg: LoggingConfig) {
    let maybe_log_file = match &cfg.logging_mode {
        LoggingMode::Directory(log_dir) => Some(log_file_in_dir(log_dir, &cfg.file_prefix)),
        LoggingMode::File(path) => Some(path.clone()),
        LoggingMode::Console => None,
    };

    if let Some(log_file) = maybe_log_file {
        // Attempt logging to a file, but fall back to console logging on error.
        if let Err(e) = init_logging_to_file(&log_file, cfg.use_json) {
            init_logging_to_console(&cfg);
            error!("Error logging to file {log_file:?} ({e}); falling back to console logging.");
        }
    } else {
        init_logging_to_console(&cfg);
    }

    info!("{}, chat composer logging initialized", &cfg.version);
}

fn init_logging_to_console(cfg: &LoggingConfig) {
    let fmt_layer_base = tracing_subscriber::fmt::layer()
        .with_line_number(true)
        .with_file(true)
        .with_target(false);
    let fmt_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_LEVEL_CONSOLE))
        .unwrap_or_default();

    // A subscriber installed earlier (e.g. by a test harness) wins.
    let _ = if cfg.use_json {
        tracing_subscriber::registry()
            .with(fmt_layer_base.json().with_filter(fmt_filter))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(fmt_layer_base.pretty().with_filter(fmt_filter))
            .try_init()
    };
}

fn init_logging_to_file(path: &Path, use_json: bool) -> Result<(), std::io::Error> {
    use tracing_appender::{non_blocking, rolling};

    let (path, file_name) = match path.file_name() {
        Some(name) => (path.to_path_buf(), name.to_owned()),
        None => (path.join(DEFAULT_LOG_FILE_NAME), OsStr::new(DEFAULT_LOG_FILE_NAME).to_owned()),
    };

    let log_directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent)?;
            parent
        },
        _ => Path::new("."),
    };

    // Make sure the log location is writeable so we error early here and dump to stderr on failure.
    std::fs::write(&path, [])?;

    let file_appender = rolling::never(log_directory, file_name);
    let (writer, guard) = non_blocking(file_appender);

    // The guard must outlive the process's logging or buffered lines are lost.
    static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
    let _ = FILE_GUARD.set(guard);

    let fmt_layer_base = tracing_subscriber::fmt::layer()
        .with_line_number(true)
        .with_file(true)
        .with_target(false)
        .with_ansi(false)
        .with_writer(writer);
    let fmt_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_LEVEL_FILE))
        .unwrap_or_default();

    let result = if use_json {
        tracing_subscriber::registry()
            .with(fmt_layer_base.json().with_filter(fmt_filter))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(fmt_layer_base.with_filter(fmt_filter))
            .try_init()
    };

    result.map_err(std::io::Error::other)
}

/// Build `<prefix>_<YYYYMMDD>T<HHMMSS><mmm><+/-HHMM>_<pid>.log` in `dir`.
/// Timestamp is in *local time with numeric offset* (e.g., -0700), filename-safe.
pub fn log_file_in_dir(dir: impl AsRef<Path>, prefix: &str) -> PathBuf {
    let now_local: DateTime<Local> = Local::now();
    let now_fixed: DateTime<FixedOffset> = now_local.with_timezone(now_local.offset());

    let ts = now_fixed.format("%Y%m%dT%H%M%S%3f%z");

    let pid = std::process::id();
    dir.as_ref().join(format!("{prefix}_{ts}_{pid}.log"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_group(dest: Option<&str>, format: Option<&str>) -> LogConfigGroup {
        let mut group = LogConfigGroup::new();
        group.dest = dest.map(str::to_owned);
        group.format = format.map(str::to_owned);
        group
    }

    #[test]
    fn test_console_mode_by_default() {
        let cfg = LoggingConfig::new("test", &log_group(None, None));
        assert_eq!(cfg.logging_mode, LoggingMode::Console);
        assert!(!cfg.use_json);

        let cfg = LoggingConfig::new("test", &log_group(Some(""), None));
        assert_eq!(cfg.logging_mode, LoggingMode::Console);
    }

    #[test]
    fn test_file_and_directory_modes() {
        let dir = tempfile::tempdir().unwrap();
        let dir_str = dir.path().to_str().unwrap();

        let cfg = LoggingConfig::new("test", &log_group(Some(dir_str), None));
        assert_eq!(cfg.logging_mode, LoggingMode::Directory(dir.path().to_path_buf()));
        assert!(cfg.use_json);

        let cfg = LoggingConfig::new("test", &log_group(Some("not/yet/created/"), Some("text")));
        assert_eq!(cfg.logging_mode, LoggingMode::Directory(PathBuf::from("not/yet/created/")));
        assert!(!cfg.use_json);

        let file = dir.path().join("composer.log");
        let cfg = LoggingConfig::new("test", &log_group(file.to_str(), Some(" JSON ")));
        assert_eq!(cfg.logging_mode, LoggingMode::File(file));
        assert!(cfg.use_json);
    }

    #[test]
    fn test_log_file_name_in_dir() {
        let path = log_file_in_dir("/tmp/logs", "chat_composer");
        assert_eq!(path.parent(), Some(Path::new("/tmp/logs")));

        let name = path.file_name().and_then(OsStr::to_str).unwrap();
        let stem = name.strip_prefix("chat_composer_").unwrap().strip_suffix(".log").unwrap();
        let (ts, pid) = stem.rsplit_once('_').unwrap();
        assert_eq!(pid, std::process::id().to_string());
        assert!(DateTime::parse_from_str(ts, "%Y%m%dT%H%M%S%3f%z").is_ok());
    }
}
