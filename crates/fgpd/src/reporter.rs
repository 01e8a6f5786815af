//! Structured reporting for daemon lifecycle events.

use std::sync::Arc;

use fgp_config::{Config, SocketEndpoint};
use fgp_daemon_types::ServiceDescriptor;

use crate::bootstrap::BootstrapError;
use crate::host::StartupError;
use crate::service::Capabilities;

const LIFECYCLE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::lifecycle");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait LifecycleReporter: Send + Sync {
    /// Invoked once logging is installed, before the service is constructed.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config, endpoint: &SocketEndpoint);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked before the service is constructed.
    fn service_starting(&self);

    /// Invoked once the service has started.
    fn service_ready(&self, descriptor: &ServiceDescriptor, capabilities: Capabilities);

    /// Invoked when construction or `on_start` fails.
    fn service_failed(&self, error: &StartupError);

    /// Invoked when the socket starts accepting clients.
    fn listener_ready(&self, endpoint: &SocketEndpoint);

    /// Invoked when a shutdown request is observed.
    fn shutdown_requested(&self);

    /// Invoked before `on_stop` runs.
    fn service_stopping(&self, descriptor: &ServiceDescriptor);

    /// Invoked when `on_stop` fails or panics.
    fn service_stop_failed(&self, descriptor: &ServiceDescriptor, message: &str);

    /// Invoked once the service has stopped.
    fn service_stopped(&self, descriptor: &ServiceDescriptor);
}

impl<T> LifecycleReporter for Arc<T>
where
    T: LifecycleReporter,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config, endpoint: &SocketEndpoint) {
        (**self).bootstrap_succeeded(config, endpoint);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn service_starting(&self) {
        (**self).service_starting();
    }

    fn service_ready(&self, descriptor: &ServiceDescriptor, capabilities: Capabilities) {
        (**self).service_ready(descriptor, capabilities);
    }

    fn service_failed(&self, error: &StartupError) {
        (**self).service_failed(error);
    }

    fn listener_ready(&self, endpoint: &SocketEndpoint) {
        (**self).listener_ready(endpoint);
    }

    fn shutdown_requested(&self) {
        (**self).shutdown_requested();
    }

    fn service_stopping(&self, descriptor: &ServiceDescriptor) {
        (**self).service_stopping(descriptor);
    }

    fn service_stop_failed(&self, descriptor: &ServiceDescriptor, message: &str) {
        (**self).service_stop_failed(descriptor, message);
    }

    fn service_stopped(&self, descriptor: &ServiceDescriptor) {
        (**self).service_stopped(descriptor);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredLifecycleReporter;

impl StructuredLifecycleReporter {
    /// Builds a new reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl LifecycleReporter for StructuredLifecycleReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: LIFECYCLE_TARGET,
            event = "bootstrap_starting",
            "starting daemon bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config, endpoint: &SocketEndpoint) {
        tracing::info!(
            target: LIFECYCLE_TARGET,
            event = "bootstrap_succeeded",
            socket = %endpoint,
            log_filter = %config.log_filter(),
            log_format = %config.log_format(),
            call_timeout = ?config.call_timeout(),
            "daemon bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: LIFECYCLE_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "daemon bootstrap failed"
        );
    }

    fn service_starting(&self) {
        tracing::info!(
            target: LIFECYCLE_TARGET,
            event = "service_starting",
            "constructing service"
        );
    }

    fn service_ready(&self, descriptor: &ServiceDescriptor, capabilities: Capabilities) {
        tracing::info!(
            target: LIFECYCLE_TARGET,
            event = "service_ready",
            service = %descriptor.name,
            version = %descriptor.version,
            reentrant = capabilities.reentrant,
            lifecycle = capabilities.lifecycle,
            health_check = capabilities.health_check,
            "service ready"
        );
    }

    fn service_failed(&self, error: &StartupError) {
        tracing::error!(
            target: LIFECYCLE_TARGET,
            event = "service_failed",
            code = %error.code(),
            error = %error,
            "service failed to start"
        );
    }

    fn listener_ready(&self, endpoint: &SocketEndpoint) {
        tracing::info!(
            target: LIFECYCLE_TARGET,
            event = "listener_ready",
            socket = %endpoint,
            "accepting connections"
        );
    }

    fn shutdown_requested(&self) {
        tracing::info!(
            target: LIFECYCLE_TARGET,
            event = "shutdown_requested",
            "shutdown requested"
        );
    }

    fn service_stopping(&self, descriptor: &ServiceDescriptor) {
        tracing::info!(
            target: LIFECYCLE_TARGET,
            event = "service_stopping",
            service = %descriptor.name,
            "stopping service"
        );
    }

    fn service_stop_failed(&self, descriptor: &ServiceDescriptor, message: &str) {
        tracing::warn!(
            target: LIFECYCLE_TARGET,
            event = "service_stop_failed",
            service = %descriptor.name,
            error = %message,
            "service stop hook failed"
        );
    }

    fn service_stopped(&self, descriptor: &ServiceDescriptor) {
        tracing::info!(
            target: LIFECYCLE_TARGET,
            event = "service_stopped",
            service = %descriptor.name,
            "service stopped"
        );
    }
}
