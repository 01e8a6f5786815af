//! Shutdown requests from signals and clients.

use std::io;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use thiserror::Error;
use tracing::info;

use super::PROCESS_TARGET;

/// Abstraction over shutdown notification mechanisms.
pub trait ShutdownSignal: Send + 'static {
    /// Blocks until shutdown should proceed.
    ///
    /// # Errors
    ///
    /// Returns [`ShutdownError`] when the notification source fails.
    fn wait(&mut self) -> Result<(), ShutdownError>;
}

/// Errors reported by shutdown signal listeners.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Installing signal handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Shutdown listener that waits for termination signals.
///
/// Handlers are installed on construction so signals arriving before
/// [`ShutdownSignal::wait`] is called are not lost.
pub struct SystemShutdownSignal {
    signals: Signals,
}

impl SystemShutdownSignal {
    /// Installs handlers for `SIGTERM`, `SIGINT`, `SIGQUIT`, and `SIGHUP`.
    ///
    /// # Errors
    ///
    /// Returns [`ShutdownError::Install`] when registration fails.
    pub fn install() -> Result<Self, ShutdownError> {
        let signals = Signals::new([SIGTERM, SIGINT, SIGQUIT, SIGHUP])
            .map_err(|source| ShutdownError::Install { source })?;
        Ok(Self { signals })
    }
}

impl ShutdownSignal for SystemShutdownSignal {
    fn wait(&mut self) -> Result<(), ShutdownError> {
        if let Some(signal) = self.signals.forever().next() {
            info!(
                target: PROCESS_TARGET,
                signal,
                "shutdown signal received"
            );
        }
        Ok(())
    }
}

/// One-shot latch that any component may fire to request shutdown.
#[derive(Debug, Clone, Default)]
pub struct ShutdownTrigger {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl ShutdownTrigger {
    /// Builds an unfired trigger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests shutdown. Firing more than once has no further effect.
    pub fn fire(&self) {
        let (fired, changed) = &*self.inner;
        let mut fired = fired.lock().unwrap_or_else(PoisonError::into_inner);
        if !*fired {
            *fired = true;
            changed.notify_all();
        }
    }

    /// Returns `true` once shutdown has been requested.
    #[must_use]
    pub fn is_fired(&self) -> bool {
        let (fired, _) = &*self.inner;
        *fired.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Blocks until the trigger fires.
    pub fn wait(&self) {
        let (fired, changed) = &*self.inner;
        let guard = fired.lock().unwrap_or_else(PoisonError::into_inner);
        let _fired = changed
            .wait_while(guard, |fired| !*fired)
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Blocks until the trigger fires or `timeout` elapses.
    ///
    /// Returns `true` when the trigger fired.
    #[must_use]
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (fired, changed) = &*self.inner;
        let guard = fired.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = changed
            .wait_timeout_while(guard, timeout, |fired| !*fired)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }
}

impl ShutdownSignal for ShutdownTrigger {
    fn wait(&mut self) -> Result<(), ShutdownError> {
        Self::wait(self);
        Ok(())
    }
}
