//! Supervises daemon launch sequencing and runtime orchestration.

use std::sync::Arc;
use std::thread;

use tracing::{info, warn};

use crate::bootstrap::{ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::reporter::{LifecycleReporter, StructuredLifecycleReporter};
use crate::service::ServiceFactory;

use super::PROCESS_TARGET;
use super::errors::LaunchError;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};

/// Runs a daemon hosting the service built by `factory` until a termination
/// signal or a `stop` request arrives.
///
/// Configuration is read from the command line, environment, and
/// configuration files.
///
/// # Errors
///
/// Returns [`LaunchError`] when bootstrap, signal installation, or the
/// runtime fails.
pub fn run_daemon(factory: &dyn ServiceFactory) -> Result<(), LaunchError> {
    let signal = SystemShutdownSignal::install()?;
    run_daemon_with(
        &SystemConfigLoader,
        Arc::new(StructuredLifecycleReporter::new()),
        factory,
        signal,
    )
}

/// Runs the daemon with injected collaborators.
///
/// # Errors
///
/// Returns [`LaunchError`] when bootstrap or the runtime fails.
pub fn run_daemon_with<S>(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn LifecycleReporter>,
    factory: &dyn ServiceFactory,
    mut signal: S,
) -> Result<(), LaunchError>
where
    S: ShutdownSignal,
{
    let daemon = bootstrap_with(loader, reporter, factory)?;
    info!(
        target: PROCESS_TARGET,
        service = %daemon.host().descriptor().name,
        socket = %daemon.endpoint(),
        "starting daemon runtime"
    );
    let running = daemon.start()?;

    let trigger = running.shutdown_trigger();
    let spawned = thread::Builder::new()
        .name("fgpd-signals".to_owned())
        .spawn(move || {
            if let Err(error) = signal.wait() {
                warn!(
                    target: PROCESS_TARGET,
                    %error,
                    "shutdown signal source failed; stopping"
                );
            }
            trigger.fire();
        });
    if let Err(source) = spawned {
        running.shutdown_trigger().fire();
        let _summary = running.wait()?;
        return Err(LaunchError::SignalThread { source });
    }

    let summary = running.wait()?;
    info!(
        target: PROCESS_TARGET,
        drained = summary.drained,
        "shutdown sequence completed"
    );
    Ok(())
}
