//! Process entry points: signal handling and the top-level run loop.

mod errors;
pub(crate) mod launch;
pub(crate) mod shutdown;

pub use errors::LaunchError;
pub use launch::{run_daemon, run_daemon_with};
pub use shutdown::{ShutdownError, ShutdownSignal, ShutdownTrigger, SystemShutdownSignal};

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");
