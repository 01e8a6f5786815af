//! Aggregated health reporting.
//!
//! The daemon answers the built-in `health` method with a report merging the
//! service's own probe results with an entry describing the host itself.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use fgp_daemon_types::{HealthEntry, HealthReport};

use crate::host::ServiceHost;

/// Report key describing the daemon process itself.
pub const DAEMON_ENTRY: &str = "daemon";

/// Shared flag recording whether the listener is accepting clients.
#[derive(Debug, Clone, Default)]
pub struct Liveness(Arc<AtomicBool>);

impl Liveness {
    /// Marks the listener as accepting connections.
    pub fn mark_accepting(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Marks the listener as no longer accepting connections.
    pub fn mark_draining(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    /// Returns `true` while the listener accepts connections.
    #[must_use]
    pub fn is_accepting(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Builds health reports from the host and listener state.
#[derive(Debug, Clone)]
pub struct HealthAggregator {
    host: Arc<ServiceHost>,
    liveness: Liveness,
    timeout: Duration,
}

impl HealthAggregator {
    /// Creates an aggregator bounding each service probe by `timeout`.
    #[must_use]
    pub const fn new(host: Arc<ServiceHost>, liveness: Liveness, timeout: Duration) -> Self {
        Self {
            host,
            liveness,
            timeout,
        }
    }

    /// Produces the merged report.
    ///
    /// The daemon entry always wins over a service entry with the same key.
    #[must_use]
    pub fn report(&self) -> HealthReport {
        let mut report = self.host.health(self.timeout);
        report.insert(DAEMON_ENTRY.to_owned(), self.daemon_entry());
        report
    }

    fn daemon_entry(&self) -> HealthEntry {
        if self.liveness.is_accepting() {
            HealthEntry::healthy().with_message(format!(
                "serving {} {}",
                self.host.descriptor().name,
                self.host.descriptor().version
            ))
        } else {
            HealthEntry::unhealthy("draining")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostOptions;
    use crate::tests::support::{
        HealthMode, PROBE_DEPENDENCY, PROBE_NAME, ProbeConfig, ProbeService, RecordingReporter,
    };

    fn aggregator(config: ProbeConfig) -> (HealthAggregator, Liveness) {
        let (_stats, factory) = ProbeService::factory(config);
        let host = ServiceHost::start(
            &factory,
            HostOptions::default(),
            Arc::new(RecordingReporter::default()),
        )
        .expect("host");
        let liveness = Liveness::default();
        let aggregator =
            HealthAggregator::new(Arc::new(host), liveness.clone(), Duration::from_secs(1));
        (aggregator, liveness)
    }

    #[test]
    fn report_merges_service_and_daemon_entries() {
        let (aggregator, liveness) = aggregator(ProbeConfig::default());
        liveness.mark_accepting();
        let report = aggregator.report();
        assert!(report.get(PROBE_DEPENDENCY).is_some_and(|entry| entry.ok));
        let daemon = report.get(DAEMON_ENTRY).expect("daemon entry");
        assert!(daemon.ok);
        assert_eq!(daemon.message.as_deref(), Some("serving probe 0.1.0"));
    }

    #[test]
    fn draining_daemon_is_unhealthy() {
        let (aggregator, liveness) = aggregator(ProbeConfig::default());
        liveness.mark_accepting();
        liveness.mark_draining();
        let daemon = aggregator.report().remove(DAEMON_ENTRY).expect("daemon entry");
        assert!(!daemon.ok);
    }

    #[test]
    fn failing_service_probe_does_not_hide_daemon_entry() {
        let (aggregator, liveness) = aggregator(ProbeConfig {
            health: HealthMode::Failing,
            ..ProbeConfig::default()
        });
        liveness.mark_accepting();
        let report = aggregator.report();
        assert!(report.get(PROBE_NAME).is_some_and(|entry| !entry.ok));
        assert!(report.get(DAEMON_ENTRY).is_some_and(|entry| entry.ok));
    }
}
