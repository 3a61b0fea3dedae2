use camino::Utf8PathBuf;
use std::env;

use crate::logging::LogFormat;

/// Log filter applied when none is configured.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Log filter applied when none is configured.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Log format applied when none is configured.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Application root used when none is configured: the working directory.
#[must_use]
pub fn default_app_root() -> Utf8PathBuf {
    env::current_dir()
        .ok()
        .and_then(|dir| Utf8PathBuf::from_path_buf(dir).ok())
        .unwrap_or_else(|| Utf8PathBuf::from("."))
}
