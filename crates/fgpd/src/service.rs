//! Capability contract implemented by hosted services.
//!
//! A service is any value that can name itself and dispatch a method call.
//! Everything else (method listings, lifecycle hooks, health probes) is
//! optional and advertised through [`Capabilities`] so the host only invokes
//! what the service actually provides.

use std::error::Error as StdError;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use fgp_daemon_types::{HealthReport, MethodDescriptor, Params, ServiceDescriptor};

/// Behaviour a daemon hosts behind its socket.
///
/// Handlers receive `&self`. Unless [`Capabilities::reentrant`] is set the
/// host serialises every call, so implementations may rely on exclusive
/// access for read-modify-write sequences.
pub trait Service: Send + Sync + 'static {
    /// Name and version advertised to clients.
    fn descriptor(&self) -> ServiceDescriptor;

    /// Optional behaviours this service implements.
    fn capabilities(&self) -> Capabilities {
        Capabilities::default()
    }

    /// Executes `method` with the supplied parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::MethodNotFound`] for unknown methods,
    /// [`ServiceError::InvalidParams`] when arguments are unusable, and
    /// [`ServiceError::Failed`] for any other handler failure.
    fn dispatch(&self, method: &str, params: &Params) -> Result<Value, ServiceError>;

    /// Methods exposed by the service. Consulted only when
    /// [`Capabilities::method_list`] is set.
    fn method_list(&self) -> Vec<MethodDescriptor> {
        Vec::new()
    }

    /// Runs once after construction, before the socket accepts clients.
    ///
    /// # Errors
    ///
    /// A failure aborts daemon startup.
    fn on_start(&self) -> Result<(), ServiceError> {
        Ok(())
    }

    /// Runs once during shutdown after connections have drained.
    ///
    /// # Errors
    ///
    /// Failures are logged; shutdown continues regardless.
    fn on_stop(&self) -> Result<(), ServiceError> {
        Ok(())
    }

    /// Reports the health of the service's own dependencies.
    ///
    /// # Errors
    ///
    /// A failure is folded into the daemon health report as an unhealthy
    /// entry carrying the error text.
    fn health_check(&self) -> Result<HealthReport, ServiceError> {
        Ok(HealthReport::new())
    }
}

/// Optional behaviours advertised by a [`Service`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// [`Service::method_list`] returns meaningful descriptors.
    pub method_list: bool,
    /// [`Service::on_start`] and [`Service::on_stop`] should be invoked.
    pub lifecycle: bool,
    /// [`Service::health_check`] should be consulted.
    pub health_check: bool,
    /// Handlers tolerate concurrent invocation.
    pub reentrant: bool,
}

impl Capabilities {
    /// Every optional behaviour except reentrancy.
    #[must_use]
    pub const fn full() -> Self {
        Self {
            method_list: true,
            lifecycle: true,
            health_check: true,
            reentrant: false,
        }
    }

    /// Marks the service as safe for concurrent calls.
    #[must_use]
    pub const fn reentrant(mut self) -> Self {
        self.reentrant = true;
        self
    }
}

type BoxedSource = Box<dyn StdError + Send + Sync + 'static>;

/// Failures reported by service handlers and hooks.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No handler is registered under the requested name.
    #[error("unknown method: {method}")]
    MethodNotFound {
        /// Requested method name.
        method: String,
    },
    /// The arguments were missing or had the wrong shape.
    #[error("invalid params: {message}")]
    InvalidParams {
        /// Human-readable description of the problem.
        message: String,
        /// Optional structured context.
        details: Option<Value>,
    },
    /// The handler ran but could not complete.
    #[error("{message}")]
    Failed {
        /// Human-readable failure text.
        message: String,
        /// Optional structured context.
        details: Option<Value>,
        /// Underlying cause, when one exists.
        #[source]
        source: Option<BoxedSource>,
    },
}

impl ServiceError {
    /// Builds a [`ServiceError::MethodNotFound`].
    #[must_use]
    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self::MethodNotFound {
            method: method.into(),
        }
    }

    /// Builds a [`ServiceError::InvalidParams`].
    #[must_use]
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams {
            message: message.into(),
            details: None,
        }
    }

    /// Builds a [`ServiceError::Failed`] without a source.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// Wraps an underlying error as a handler failure.
    #[must_use]
    pub fn from_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Failed {
            message: message.into(),
            details: None,
            source: Some(Box::new(source)),
        }
    }

    /// Attaches structured details. Has no effect on `MethodNotFound`.
    #[must_use]
    pub fn with_details(mut self, value: Value) -> Self {
        match &mut self {
            Self::InvalidParams { details, .. } | Self::Failed { details, .. } => {
                *details = Some(value);
            }
            Self::MethodNotFound { .. } => {}
        }
        self
    }

    /// Structured details carried by the error.
    #[must_use]
    pub const fn details(&self) -> Option<&Value> {
        match self {
            Self::InvalidParams { details, .. } | Self::Failed { details, .. } => details.as_ref(),
            Self::MethodNotFound { .. } => None,
        }
    }
}

/// Produces the service instance a daemon hosts.
pub trait ServiceFactory {
    /// Constructs the service.
    ///
    /// # Errors
    ///
    /// A failure aborts daemon startup.
    fn create(&self) -> Result<Arc<dyn Service>, ServiceError>;
}

impl<F, S> ServiceFactory for F
where
    F: Fn() -> Result<S, ServiceError>,
    S: Service,
{
    fn create(&self) -> Result<Arc<dyn Service>, ServiceError> {
        let service = self()?;
        Ok(Arc::new(service))
    }
}
