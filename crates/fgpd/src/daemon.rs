//! Serving a bootstrapped daemon and shutting it down in order.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use fgp_config::SocketEndpoint;
use fgp_daemon_types::HealthReport;

use crate::bootstrap::Daemon;
use crate::dispatch::{DispatchConnectionHandler, Dispatcher};
use crate::health::{HealthAggregator, Liveness};
use crate::host::ServiceHost;
use crate::process::ShutdownTrigger;
use crate::reporter::LifecycleReporter;
use crate::transport::{ListenerError, ListenerHandle, SocketListener};

const DAEMON_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::daemon");

/// Time allowed for force-closed connections to unwind.
const FORCED_CLOSE_SETTLE: Duration = Duration::from_millis(500);

/// Errors raised while serving.
#[derive(Debug, Error)]
pub enum ServeError {
    /// The socket listener failed to bind, start, or join.
    #[error("socket listener failed: {source}")]
    Listener {
        /// Underlying listener error.
        #[source]
        source: ListenerError,
    },
}

impl From<ListenerError> for ServeError {
    fn from(source: ListenerError) -> Self {
        Self::Listener { source }
    }
}

/// Outcome of the shutdown sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownSummary {
    /// `true` when every connection finished within the grace period.
    pub drained: bool,
    /// Connections closed by the daemon after the grace period expired.
    pub forced_connections: usize,
}

impl Daemon {
    /// Binds the socket and starts accepting clients.
    ///
    /// The hosted service is stopped if the socket cannot be served.
    ///
    /// # Errors
    ///
    /// Returns [`ServeError`] when the listener cannot bind or start.
    pub fn start(self) -> Result<RunningDaemon, ServeError> {
        let Self {
            config,
            endpoint,
            host,
            reporter,
            ..
        } = self;

        let liveness = Liveness::default();
        let trigger = ShutdownTrigger::new();
        let health =
            HealthAggregator::new(Arc::clone(&host), liveness.clone(), config.health_timeout());
        let dispatcher = Dispatcher::new(Arc::clone(&host), health.clone(), trigger.clone());

        let handler = Arc::new(DispatchConnectionHandler::new(dispatcher));
        let listener = match SocketListener::bind(&endpoint).and_then(|bound| bound.start(handler))
        {
            Ok(listener) => listener,
            Err(error) => {
                host.stop();
                return Err(error.into());
            }
        };

        liveness.mark_accepting();
        reporter.listener_ready(&endpoint);
        Ok(RunningDaemon {
            endpoint,
            host,
            health,
            liveness,
            trigger,
            listener,
            grace: config.shutdown_grace(),
            reporter,
        })
    }
}

/// A daemon that is accepting clients.
pub struct RunningDaemon {
    endpoint: SocketEndpoint,
    host: Arc<ServiceHost>,
    health: HealthAggregator,
    liveness: Liveness,
    trigger: ShutdownTrigger,
    listener: ListenerHandle,
    grace: Duration,
    reporter: Arc<dyn LifecycleReporter>,
}

impl RunningDaemon {
    /// Socket clients connect to.
    #[must_use]
    pub const fn endpoint(&self) -> &SocketEndpoint {
        &self.endpoint
    }

    /// The hosted service.
    #[must_use]
    pub const fn host(&self) -> &Arc<ServiceHost> {
        &self.host
    }

    /// Same report the built-in `health` method returns.
    #[must_use]
    pub fn health(&self) -> HealthReport {
        self.health.report()
    }

    /// Number of clients currently connected.
    #[must_use]
    pub fn active_connections(&self) -> usize {
        self.listener.active_connections()
    }

    /// Trigger that begins shutdown when fired.
    ///
    /// The built-in `stop` method fires the same trigger.
    #[must_use]
    pub fn shutdown_trigger(&self) -> ShutdownTrigger {
        self.trigger.clone()
    }

    /// Blocks until shutdown is requested, then shuts down.
    ///
    /// # Errors
    ///
    /// Returns [`ServeError`] when the accept loop cannot be joined.
    pub fn wait(self) -> Result<ShutdownSummary, ServeError> {
        self.trigger.wait();
        self.shut_down()
    }

    /// Requests shutdown and waits for it to complete.
    ///
    /// # Errors
    ///
    /// Returns [`ServeError`] when the accept loop cannot be joined.
    pub fn shutdown(self) -> Result<ShutdownSummary, ServeError> {
        self.trigger.fire();
        self.shut_down()
    }

    fn shut_down(mut self) -> Result<ShutdownSummary, ServeError> {
        self.reporter.shutdown_requested();
        self.liveness.mark_draining();
        self.listener.shutdown();
        let joined = self.listener.join();

        let drained = self.listener.drain(self.grace);
        let mut forced_connections = 0;
        if !drained {
            forced_connections = self.listener.force_close();
            warn!(
                target: DAEMON_TARGET,
                forced_connections,
                grace_ms = u64::try_from(self.grace.as_millis()).unwrap_or(u64::MAX),
                "connections outlived the shutdown grace period; closing them"
            );
            if !self.listener.drain(FORCED_CLOSE_SETTLE) {
                warn!(
                    target: DAEMON_TARGET,
                    remaining = self.listener.active_connections(),
                    "connection handlers still running after forced close"
                );
            }
        }

        self.host.stop();
        joined?;
        info!(
            target: DAEMON_TARGET,
            endpoint = %self.endpoint,
            drained,
            "daemon stopped"
        );
        Ok(ShutdownSummary {
            drained,
            forced_connections,
        })
    }
}

impl std::fmt::Debug for RunningDaemon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunningDaemon")
            .field("endpoint", &self.endpoint)
            .field("host", &self.host)
            .field("grace", &self.grace)
            .finish_non_exhaustive()
    }
}
