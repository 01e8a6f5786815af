//! Test double for [`LifecycleReporter`] that records structured events for
//! assertions.

use std::sync::Mutex;

use fgp_config::{Config, SocketEndpoint};
use fgp_daemon_types::ServiceDescriptor;

use crate::bootstrap::BootstrapError;
use crate::host::StartupError;
use crate::reporter::LifecycleReporter;
use crate::service::Capabilities;

/// Lifecycle events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    BootstrapStarting,
    BootstrapSucceeded { socket: String },
    BootstrapFailed(String),
    ServiceStarting,
    ServiceReady(String),
    ServiceFailed(String),
    ListenerReady,
    ShutdownRequested,
    ServiceStopping,
    ServiceStopFailed(String),
    ServiceStopped,
}

/// Records lifecycle events for assertions.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<LifecycleEvent>>,
}

impl RecordingReporter {
    /// Captures a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.events
            .lock()
            .expect("lifecycle reporter mutex poisoned")
            .clone()
    }

    /// Counts events matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&LifecycleEvent) -> bool) -> usize {
        self.events().iter().filter(|event| predicate(event)).count()
    }

    fn record(&self, event: LifecycleEvent) {
        self.events
            .lock()
            .expect("lifecycle reporter mutex poisoned")
            .push(event);
    }
}

impl LifecycleReporter for RecordingReporter {
    fn bootstrap_starting(&self) {
        self.record(LifecycleEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config, endpoint: &SocketEndpoint) {
        self.record(LifecycleEvent::BootstrapSucceeded {
            socket: endpoint.path().to_string(),
        });
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(LifecycleEvent::BootstrapFailed(error.to_string()));
    }

    fn service_starting(&self) {
        self.record(LifecycleEvent::ServiceStarting);
    }

    fn service_ready(&self, descriptor: &ServiceDescriptor, _capabilities: Capabilities) {
        self.record(LifecycleEvent::ServiceReady(descriptor.name.clone()));
    }

    fn service_failed(&self, error: &StartupError) {
        self.record(LifecycleEvent::ServiceFailed(error.to_string()));
    }

    fn listener_ready(&self, _endpoint: &SocketEndpoint) {
        self.record(LifecycleEvent::ListenerReady);
    }

    fn shutdown_requested(&self) {
        self.record(LifecycleEvent::ShutdownRequested);
    }

    fn service_stopping(&self, _descriptor: &ServiceDescriptor) {
        self.record(LifecycleEvent::ServiceStopping);
    }

    fn service_stop_failed(&self, _descriptor: &ServiceDescriptor, message: &str) {
        self.record(LifecycleEvent::ServiceStopFailed(message.to_owned()));
    }

    fn service_stopped(&self, _descriptor: &ServiceDescriptor) {
        self.record(LifecycleEvent::ServiceStopped);
    }
}
