mod constants;
mod logging;

pub use logging::{LoggingConfig, LoggingMode, init_logging, log_file_in_dir};
