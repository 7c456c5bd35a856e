/// Default log level for the library to use. Override using the `RUST_LOG` env variable.
pub(crate) const DEFAULT_LOG_LEVEL_FILE: &str = "info";
pub(crate) const DEFAULT_LOG_LEVEL_CONSOLE: &str = "warn";

/// File name used when the log destination names a directory without a usable file name.
pub(crate) const DEFAULT_LOG_FILE_NAME: &str = "composer.log";
