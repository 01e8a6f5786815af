//! Structured logging for the daemon.
//!
//! Every daemon writes its logs to standard error, either as one JSON object
//! per event or as compact human-readable lines. The subscriber is process
//! global, so only the first call to [`initialise`] installs it.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use fgp_config::{Config, LogFormat};

static SUBSCRIBER_INSTALLED: OnceCell<()> = OnceCell::new();

/// Proof that logging has been configured for this process.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryHandle;

/// Errors encountered while configuring logging.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The configured filter expression did not parse.
    #[error("invalid log filter '{filter}': {message}")]
    Filter {
        /// Filter text as configured.
        filter: String,
        /// Parser diagnostic.
        message: String,
    },
    /// Another subscriber already owns the global default.
    #[error("failed to install log subscriber: {0}")]
    Subscriber(#[source] SetGlobalDefaultError),
}

/// Installs the global subscriber described by `config`.
///
/// Repeated calls return a fresh handle without touching global state, so
/// tests may bootstrap several daemons in one process.
///
/// # Errors
///
/// Returns [`TelemetryError`] when the filter is invalid or another
/// subscriber was installed first.
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    SUBSCRIBER_INSTALLED
        .get_or_try_init(|| install_subscriber(config))
        .map(|()| TelemetryHandle)
}

/// Installs the subscriber with built-in defaults.
///
/// Used when the configured logging could not be set up. Returns `None`
/// when another subscriber already owns the global default.
pub fn initialise_fallback() -> Option<TelemetryHandle> {
    initialise(&Config::default()).ok()
}

#[cfg(test)]
pub(crate) fn is_installed() -> bool {
    SUBSCRIBER_INSTALLED.get().is_some()
}

fn parse_filter(expression: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(expression).map_err(|error| TelemetryError::Filter {
        filter: expression.to_owned(),
        message: error.to_string(),
    })
}

fn install_subscriber(config: &Config) -> Result<(), TelemetryError> {
    let filter = parse_filter(config.log_filter())?;

    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_thread_names(true)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal() && !config.log_format().is_json())
        .with_timer(fmt::time::UtcTime::rfc_3339());

    let subscriber: Box<dyn Subscriber + Send + Sync> = match config.log_format() {
        LogFormat::Json => Box::new(builder.json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder.compact().finish()),
    };

    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
}
