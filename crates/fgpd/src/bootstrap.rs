//! Daemon bootstrap orchestration.

use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use thiserror::Error;

use fgp_config::{Config, SocketEndpoint, SocketPreparationError};

use crate::host::{HostOptions, ServiceHost, StartupError};
use crate::reporter::LifecycleReporter;
use crate::service::ServiceFactory;
use crate::telemetry::{self, TelemetryError, TelemetryHandle};

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the daemon configuration.
    ///
    /// # Errors
    ///
    /// Returns the loader error when sources cannot be read or merged.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Loader returning a fixed configuration.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps an already-resolved configuration.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// The service could not be constructed or started.
    #[error("failed to start service: {source}")]
    Startup {
        /// Underlying startup error.
        #[source]
        source: StartupError,
    },
    /// Socket preparation failed.
    #[error("failed to prepare daemon socket: {source}")]
    Socket {
        /// Filesystem error reported while preparing the socket directory.
        #[source]
        source: SocketPreparationError,
    },
}

/// A started service paired with the endpoint it will be served on.
///
/// Call [`Daemon::start`] to bind the socket and begin accepting clients.
pub struct Daemon {
    pub(crate) config: Config,
    pub(crate) endpoint: SocketEndpoint,
    pub(crate) host: Arc<ServiceHost>,
    pub(crate) telemetry: TelemetryHandle,
    pub(crate) reporter: Arc<dyn LifecycleReporter>,
}

impl Daemon {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Socket the daemon will listen on.
    #[must_use]
    pub const fn endpoint(&self) -> &SocketEndpoint {
        &self.endpoint
    }

    /// The started service host.
    #[must_use]
    pub const fn host(&self) -> &Arc<ServiceHost> {
        &self.host
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub const fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }
}

impl std::fmt::Debug for Daemon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Daemon")
            .field("endpoint", &self.endpoint)
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}

/// Bootstraps the daemon using the supplied collaborators.
///
/// Loads configuration, installs telemetry, starts the service, and prepares
/// the socket directory. Each failure is reported before it is returned.
/// Lifecycle reporting starts once logging is installed; when configuration
/// or telemetry fails, logging falls back to the built-in defaults first.
///
/// # Errors
///
/// Returns [`BootstrapError`] describing the first step that failed.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn LifecycleReporter>,
    factory: &dyn ServiceFactory,
) -> Result<Daemon, BootstrapError> {
    let config = match loader.load() {
        Ok(config) => config,
        Err(source) => {
            return Err(report_early_failure(
                reporter.as_ref(),
                BootstrapError::Configuration { source },
            ));
        }
    };

    let telemetry = match telemetry::initialise(&config) {
        Ok(handle) => handle,
        Err(source) => {
            return Err(report_early_failure(
                reporter.as_ref(),
                BootstrapError::Telemetry { source },
            ));
        }
    };
    reporter.bootstrap_starting();

    let options = HostOptions {
        call_timeout: config.call_timeout(),
    };
    let host = match ServiceHost::start(factory, options, Arc::clone(&reporter)) {
        Ok(host) => Arc::new(host),
        Err(source) => {
            let error = BootstrapError::Startup { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    let endpoint = config.socket_for(&host.descriptor().name);
    if let Err(source) = endpoint.prepare_filesystem() {
        host.stop();
        let error = BootstrapError::Socket { source };
        reporter.bootstrap_failed(&error);
        return Err(error);
    }

    reporter.bootstrap_succeeded(&config, &endpoint);
    Ok(Daemon {
        config,
        endpoint,
        host,
        telemetry,
        reporter,
    })
}

/// Reports a failure raised before the configured subscriber exists.
fn report_early_failure(
    reporter: &dyn LifecycleReporter,
    error: BootstrapError,
) -> BootstrapError {
    let _fallback = telemetry::initialise_fallback();
    reporter.bootstrap_starting();
    reporter.bootstrap_failed(&error);
    error
}
