//! Error types surfaced by the service host.

use std::io;
use std::time::Duration;

use thiserror::Error;

use fgp_daemon_types::ErrorCode;

use crate::service::ServiceError;

/// Failures that prevent the host from reaching the ready state.
#[derive(Debug, Error)]
pub enum StartupError {
    /// The factory returned an error.
    #[error("failed to construct service: {source}")]
    Construct {
        /// Error reported by the factory.
        #[source]
        source: ServiceError,
    },
    /// The factory panicked.
    #[error("service constructor panicked: {message}")]
    ConstructPanicked {
        /// Panic payload rendered as text.
        message: String,
    },
    /// `on_start` returned an error.
    #[error("service '{service}' failed to start: {source}")]
    OnStart {
        /// Service name.
        service: String,
        /// Error reported by the hook.
        #[source]
        source: ServiceError,
    },
    /// `on_start` panicked.
    #[error("service '{service}' panicked during start: {message}")]
    OnStartPanicked {
        /// Service name.
        service: String,
        /// Panic payload rendered as text.
        message: String,
    },
}

impl StartupError {
    /// Wire error code associated with startup failures.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::StartupError
    }
}

/// Failures raised while invoking a service method.
#[derive(Debug, Error)]
pub enum InvokeError {
    /// The service returned an error.
    #[error(transparent)]
    Service(#[from] ServiceError),
    /// The handler panicked.
    #[error("handler for '{method}' panicked: {message}")]
    Panicked {
        /// Method being invoked.
        method: String,
        /// Panic payload rendered as text.
        message: String,
    },
    /// The handler did not finish within the configured budget.
    #[error("'{method}' did not complete within {} ms", timeout.as_millis())]
    Timeout {
        /// Method being invoked.
        method: String,
        /// Budget that elapsed.
        timeout: Duration,
    },
    /// The host has stopped and no longer accepts calls.
    #[error("service has stopped")]
    Stopped,
    /// A worker thread for a bounded call could not be spawned.
    #[error("failed to spawn call worker: {source}")]
    Spawn {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}
