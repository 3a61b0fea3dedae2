//! Structured logging set-up for processes embedding the engine.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::{Subscriber, debug, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use weft_config::{Config, LogFormat};

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

/// Crate whose action reports stay visible under a coarser host filter.
const ENGINE_CRATE: &str = "weft_codemods";

/// Directive added when the configured filter leaves [`ENGINE_CRATE`] to the
/// global level.
const ENGINE_DIRECTIVE: &str = "weft_codemods=info";

/// Tracing target for telemetry set-up.
const TELEMETRY_TARGET: &str = "weft_codemods::telemetry";

/// Handle returned once telemetry is installed.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryHandle;

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The configured log filter expression is invalid.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// The global subscriber could not be installed.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Installs the global `tracing` subscriber described by `config`.
///
/// Only the first call installs anything; later calls return a handle
/// without touching global state.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] for an invalid `log_filter` and
/// [`TelemetryError::Subscriber`] when another subscriber is already
/// installed.
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    TELEMETRY_GUARD
        .get_or_try_init(|| install_subscriber(config))
        .map(|_| TelemetryHandle)
}

/// Filter expression for `configured`, keeping engine events at `info` or
/// finer unless a directive already names the engine crate.
fn engine_filter(configured: &str) -> String {
    let names_engine = configured
        .split(',')
        .any(|directive| directive.trim_start().starts_with(ENGINE_CRATE));
    match configured.trim() {
        _ if names_engine => configured.to_owned(),
        "" => ENGINE_DIRECTIVE.to_owned(),
        base => format!("{base},{ENGINE_DIRECTIVE}"),
    }
}

fn install_subscriber(config: &Config) -> Result<(), TelemetryError> {
    let expression = engine_filter(config.log_filter());
    let filter = EnvFilter::try_new(&expression)
        .map_err(|error| TelemetryError::Filter(error.to_string()))?;

    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_timer(fmt::time::UtcTime::rfc_3339());

    let subscriber: Box<dyn Subscriber + Send + Sync> = match config.log_format() {
        LogFormat::Json => Box::new(builder.json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder.compact().finish()),
    };

    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)?;
    debug!(
        target: TELEMETRY_TARGET,
        filter = expression.as_str(),
        format = %config.log_format(),
        "telemetry installed"
    );
    Ok(())
}
