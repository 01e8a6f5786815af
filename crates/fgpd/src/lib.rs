//! Host runtime for FGP daemons.
//!
//! An FGP daemon wraps exactly one [`Service`] and serves it over a Unix
//! socket using newline-delimited JSON. Clients send one request object per
//! line and read one response object per line; requests on a connection are
//! answered in order, and connections are served concurrently.
//!
//! The crate is layered bottom-up:
//!
//! - [`Service`] and [`ServiceFactory`] describe what a hosted service offers,
//!   with [`MethodRegistry`] as a convenience for table-driven services.
//! - [`ServiceHost`] owns the service instance, serialises calls for services
//!   that are not reentrant, contains handler panics, and runs the lifecycle
//!   hooks exactly once.
//! - [`Dispatcher`] maps request envelopes to responses, answering the
//!   built-in `health`, `methods`, and `stop` methods itself.
//! - The transport binds the socket and runs one handler thread per client.
//! - [`bootstrap_with`] and [`run_daemon`] tie configuration, telemetry, and
//!   signal handling together.
//!
//! Every step of the lifecycle is reported through a [`LifecycleReporter`] so
//! operators can see where startup or shutdown went wrong.
//!
//! ```no_run
//! use std::process::ExitCode;
//!
//! fn main() -> ExitCode {
//!     match fgpd::run_daemon(&fgpd::EchoService::create) {
//!         Ok(()) => ExitCode::SUCCESS,
//!         Err(_) => ExitCode::FAILURE,
//!     }
//! }
//! ```

mod bootstrap;
mod daemon;
mod dispatch;
mod echo;
mod health;
mod host;
mod process;
mod registry;
mod reporter;
mod service;
pub mod telemetry;
mod transport;

pub use bootstrap::{
    BootstrapError, ConfigLoader, Daemon, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
pub use daemon::{RunningDaemon, ServeError, ShutdownSummary};
pub use dispatch::{DispatchError, Dispatcher, MalformedRequest, classify};
pub use echo::{ECHO_SERVICE_NAME, ECHO_SERVICE_VERSION, EchoService};
pub use health::{DAEMON_ENTRY, HealthAggregator, Liveness};
pub use host::{HEALTH_TIMEOUT_MESSAGE, HostOptions, InvokeError, ServiceHost, StartupError};
pub use process::{
    LaunchError, ShutdownError, ShutdownSignal, ShutdownTrigger, SystemShutdownSignal, run_daemon,
    run_daemon_with,
};
pub use registry::{MethodRegistry, number_or, require_str, str_or};
pub use reporter::{LifecycleReporter, StructuredLifecycleReporter};
pub use service::{Capabilities, Service, ServiceError, ServiceFactory};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::ListenerError;

#[cfg(test)]
mod tests;
