//! Defines the unified error surface for daemon launch and supervision.

use std::io;

use thiserror::Error;

use crate::bootstrap::BootstrapError;
use crate::daemon::ServeError;

use super::shutdown::ShutdownError;

/// Errors surfaced while launching or supervising the daemon process.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Bootstrapping the daemon failed.
    #[error("daemon bootstrap failed: {source}")]
    Bootstrap {
        /// Underlying bootstrap error.
        #[source]
        source: BootstrapError,
    },
    /// Installing or waiting on shutdown signals failed.
    #[error("failed to await shutdown signal: {source}")]
    Shutdown {
        /// Underlying shutdown error.
        #[source]
        source: ShutdownError,
    },
    /// The signal watcher thread could not be spawned.
    #[error("failed to spawn signal watcher: {source}")]
    SignalThread {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Serving or shutting down failed.
    #[error("daemon runtime failed: {source}")]
    Serve {
        /// Underlying runtime error.
        #[source]
        source: ServeError,
    },
}

impl From<BootstrapError> for LaunchError {
    fn from(source: BootstrapError) -> Self {
        Self::Bootstrap { source }
    }
}

impl From<ShutdownError> for LaunchError {
    fn from(source: ShutdownError) -> Self {
        Self::Shutdown { source }
    }
}

impl From<ServeError> for LaunchError {
    fn from(source: ServeError) -> Self {
        Self::Serve { source }
    }
}
