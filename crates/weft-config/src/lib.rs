//! Shared configuration for the Weft codemod engine.
//!
//! [`Config`] is loaded through `ortho_config`, which layers built-in defaults,
//! a `weft.toml` configuration file, `WEFT_*` environment variables and
//! command-line flags (in increasing precedence). Every field is optional so a
//! partially specified layer never masks a lower one; the accessor methods
//! apply the documented defaults.

mod defaults;
mod logging;
mod package_manager;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{DEFAULT_LOG_FILTER, default_app_root, default_log_filter, default_log_format};
pub use logging::{LogFormat, LogFormatParseError};
pub use package_manager::{PackageManager, PackageManagerParseError};

/// Engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "WEFT")]
pub struct Config {
    /// `tracing` filter expression, e.g. `info` or `weft_codemods=debug`.
    pub log_filter: Option<String>,
    /// Log output format.
    pub log_format: Option<LogFormat>,
    /// Root directory of the host project.
    pub app_root: Option<Utf8PathBuf>,
    /// Package manager to use instead of detecting one.
    pub package_manager: Option<PackageManager>,
    /// Executable to run in place of the package manager's default program.
    pub package_manager_binary: Option<Utf8PathBuf>,
    /// Stream installer output live instead of buffering it.
    pub verbose_install_output: Option<bool>,
}

impl Config {
    /// Effective log filter.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }

    /// Effective log format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format.unwrap_or_else(default_log_format)
    }

    /// Effective application root.
    #[must_use]
    pub fn app_root(&self) -> Utf8PathBuf {
        self.app_root.clone().unwrap_or_else(default_app_root)
    }

    /// Explicitly configured package manager, if any.
    #[must_use]
    pub const fn package_manager(&self) -> Option<PackageManager> {
        self.package_manager
    }

    /// Explicit package manager executable, if any.
    #[must_use]
    pub fn package_manager_binary(&self) -> Option<&Utf8Path> {
        self.package_manager_binary.as_deref()
    }

    /// Whether installer output is streamed live.
    #[must_use]
    pub fn verbose_install_output(&self) -> bool {
        self.verbose_install_output.unwrap_or(false)
    }
}
