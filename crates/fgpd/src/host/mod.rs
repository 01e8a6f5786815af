//! Owns the hosted service instance and mediates every call into it.
//!
//! The host constructs the service, runs its start hook, and afterwards is
//! the only path to the service: method calls, method listings, health
//! probes, and the stop hook all go through it. Calls into a service that is
//! not reentrant are serialised by a single gate so handlers observe
//! linearizable state.

mod call;
mod errors;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, warn};

use fgp_daemon_types::{HealthEntry, HealthReport, MethodDescriptor, Params, ServiceDescriptor};

use crate::reporter::LifecycleReporter;
use crate::service::{Capabilities, Service, ServiceFactory};

use self::call::{Abandoned, bounded, guarded};
pub use self::errors::{InvokeError, StartupError};

const HOST_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::host");

/// Message recorded when a health probe exceeds its budget.
pub const HEALTH_TIMEOUT_MESSAGE: &str = "timeout";

/// Tunables applied to every call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostOptions {
    /// Upper bound on a single method call. `None` waits indefinitely.
    pub call_timeout: Option<Duration>,
}

/// Runtime owner of a started service.
pub struct ServiceHost {
    service: Arc<dyn Service>,
    descriptor: ServiceDescriptor,
    capabilities: Capabilities,
    gate: Option<Arc<Mutex<()>>>,
    options: HostOptions,
    ready: AtomicBool,
    stopped: AtomicBool,
    reporter: Arc<dyn LifecycleReporter>,
}

impl ServiceHost {
    /// Constructs the service and runs its start hook.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError`] when the factory or `on_start` fails or
    /// panics. The failure is reported before it is returned.
    pub fn start(
        factory: &dyn ServiceFactory,
        options: HostOptions,
        reporter: Arc<dyn LifecycleReporter>,
    ) -> Result<Self, StartupError> {
        reporter.service_starting();
        match Self::construct(factory, options, Arc::clone(&reporter)) {
            Ok(host) => {
                reporter.service_ready(&host.descriptor, host.capabilities);
                Ok(host)
            }
            Err(error) => {
                reporter.service_failed(&error);
                Err(error)
            }
        }
    }

    fn construct(
        factory: &dyn ServiceFactory,
        options: HostOptions,
        reporter: Arc<dyn LifecycleReporter>,
    ) -> Result<Self, StartupError> {
        let service = guarded(None, || factory.create())
            .map_err(|message| StartupError::ConstructPanicked { message })?
            .map_err(|source| StartupError::Construct { source })?;
        let descriptor = service.descriptor();
        let capabilities = service.capabilities();

        if capabilities.lifecycle {
            guarded(None, || service.on_start())
                .map_err(|message| StartupError::OnStartPanicked {
                    service: descriptor.name.clone(),
                    message,
                })?
                .map_err(|source| StartupError::OnStart {
                    service: descriptor.name.clone(),
                    source,
                })?;
        }

        let gate = (!capabilities.reentrant).then(|| Arc::new(Mutex::new(())));
        Ok(Self {
            service,
            descriptor,
            capabilities,
            gate,
            options,
            ready: AtomicBool::new(true),
            stopped: AtomicBool::new(false),
            reporter,
        })
    }

    /// Name and version of the hosted service.
    #[must_use]
    pub const fn descriptor(&self) -> &ServiceDescriptor {
        &self.descriptor
    }

    /// Capabilities advertised at construction.
    #[must_use]
    pub const fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Returns `true` until [`ServiceHost::stop`] has been called.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Invokes `method` on the service.
    ///
    /// # Errors
    ///
    /// Returns [`InvokeError`] when the service fails, the handler panics,
    /// the call exceeds the configured timeout, or the host has stopped.
    pub fn invoke(&self, method: &str, params: &Params) -> Result<Value, InvokeError> {
        if !self.is_ready() {
            return Err(InvokeError::Stopped);
        }
        match self.options.call_timeout {
            None => self.invoke_inline(method, params),
            Some(timeout) => self.invoke_bounded(method, params, timeout),
        }
    }

    fn invoke_inline(&self, method: &str, params: &Params) -> Result<Value, InvokeError> {
        guarded(self.gate.as_deref(), || self.service.dispatch(method, params))
            .map_err(|message| InvokeError::Panicked {
                method: method.to_owned(),
                message,
            })?
            .map_err(InvokeError::from)
    }

    fn invoke_bounded(
        &self,
        method: &str,
        params: &Params,
        timeout: Duration,
    ) -> Result<Value, InvokeError> {
        let service = Arc::clone(&self.service);
        let gate = self.gate.clone();
        let owned_method = method.to_owned();
        let owned_params = params.clone();
        let outcome = bounded("fgpd-call", timeout, move || {
            guarded(gate.as_deref(), || service.dispatch(&owned_method, &owned_params))
        });
        match outcome {
            Ok(Ok(result)) => result.map_err(InvokeError::from),
            Ok(Err(message)) => Err(InvokeError::Panicked {
                method: method.to_owned(),
                message,
            }),
            Err(Abandoned::TimedOut) => {
                warn!(
                    target: HOST_TARGET,
                    method,
                    timeout_ms = timeout.as_millis(),
                    "call abandoned after timeout"
                );
                Err(InvokeError::Timeout {
                    method: method.to_owned(),
                    timeout,
                })
            }
            Err(Abandoned::Lost) => Err(InvokeError::Panicked {
                method: method.to_owned(),
                message: "call worker exited without a result".to_owned(),
            }),
            Err(Abandoned::Spawn(source)) => Err(InvokeError::Spawn { source }),
        }
    }

    /// Methods exposed by the service, or an empty list when it does not
    /// advertise them.
    #[must_use]
    pub fn describe_methods(&self) -> Vec<MethodDescriptor> {
        if !self.capabilities.method_list {
            return Vec::new();
        }
        match guarded(self.gate.as_deref(), || self.service.method_list()) {
            Ok(methods) => methods,
            Err(message) => {
                warn!(
                    target: HOST_TARGET,
                    service = %self.descriptor.name,
                    error = %message,
                    "method listing panicked"
                );
                Vec::new()
            }
        }
    }

    /// Runs the service health probe within `timeout`.
    ///
    /// Failures, panics, and timeouts are folded into a single unhealthy
    /// entry keyed by the service name. Services without the health
    /// capability contribute nothing.
    #[must_use]
    pub fn health(&self, timeout: Duration) -> HealthReport {
        if !self.capabilities.health_check {
            return HealthReport::new();
        }
        let service = Arc::clone(&self.service);
        let gate = self.gate.clone();
        let started = Instant::now();
        let outcome = bounded("fgpd-health", timeout, move || {
            guarded(gate.as_deref(), || service.health_check())
        });
        let failure = match outcome {
            Ok(Ok(Ok(report))) => return report,
            Ok(Ok(Err(error))) => error.to_string(),
            Ok(Err(message)) => format!("health check panicked: {message}"),
            Err(Abandoned::TimedOut) => HEALTH_TIMEOUT_MESSAGE.to_owned(),
            Err(Abandoned::Lost) => "health check exited without a result".to_owned(),
            Err(Abandoned::Spawn(error)) => format!("failed to run health check: {error}"),
        };
        debug!(
            target: HOST_TARGET,
            service = %self.descriptor.name,
            error = %failure,
            "health probe failed"
        );
        let entry = HealthEntry::unhealthy(failure).with_latency_ms(elapsed_ms(started));
        HealthReport::from([(self.descriptor.name.clone(), entry)])
    }

    /// Stops the service.
    ///
    /// The stop hook runs at most once across all callers; later calls
    /// return `false` immediately. Failures are reported and swallowed. The
    /// hook does not wait on the call gate, so a handler abandoned after a
    /// timeout cannot block shutdown.
    pub fn stop(&self) -> bool {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.ready.store(false, Ordering::SeqCst);
        self.reporter.service_stopping(&self.descriptor);
        if self.capabilities.lifecycle {
            match guarded(None, || self.service.on_stop()) {
                Ok(Ok(())) => {}
                Ok(Err(error)) => self
                    .reporter
                    .service_stop_failed(&self.descriptor, &error.to_string()),
                Err(message) => self.reporter.service_stop_failed(
                    &self.descriptor,
                    &format!("stop hook panicked: {message}"),
                ),
            }
        }
        self.reporter.service_stopped(&self.descriptor);
        true
    }
}

impl std::fmt::Debug for ServiceHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceHost")
            .field("descriptor", &self.descriptor)
            .field("capabilities", &self.capabilities)
            .field("options", &self.options)
            .field("ready", &self.is_ready())
            .finish_non_exhaustive()
    }
}

/// Milliseconds elapsed since `started`, with sub-millisecond precision.
pub(crate) fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
