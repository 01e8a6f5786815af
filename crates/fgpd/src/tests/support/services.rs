//! Configurable service used to exercise the host from tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use serde_json::{Number, Value, json};

use fgp_daemon_types::{
    HealthEntry, HealthReport, MethodDescriptor, ParamInfo, Params, ServiceDescriptor,
};

use crate::registry::number_or;
use crate::service::{Capabilities, Service, ServiceError};

pub const PROBE_NAME: &str = "probe";
pub const PROBE_DEPENDENCY: &str = "probe-db";

/// Observations shared between a test and the service it handed to a host.
#[derive(Debug, Default)]
pub struct ProbeStats {
    pub constructed: AtomicUsize,
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
    pub calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl ProbeStats {
    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

/// Behaviour of the probe health check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HealthMode {
    #[default]
    Healthy,
    Failing,
    Slow(Duration),
    Panicking,
}

/// Knobs for [`ProbeService`].
#[derive(Debug, Clone, Copy)]
pub struct ProbeConfig {
    pub capabilities: Capabilities,
    pub fail_construct: bool,
    pub fail_start: bool,
    pub panic_start: bool,
    pub fail_stop: bool,
    pub health: HealthMode,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            capabilities: Capabilities::full(),
            fail_construct: false,
            fail_start: false,
            panic_start: false,
            fail_stop: false,
            health: HealthMode::Healthy,
        }
    }
}

/// Service whose handlers misbehave on request.
pub struct ProbeService {
    config: ProbeConfig,
    stats: Arc<ProbeStats>,
    counter: AtomicU64,
}

impl ProbeService {
    /// Returns shared stats and a factory producing probes with `config`.
    pub fn factory(
        config: ProbeConfig,
    ) -> (
        Arc<ProbeStats>,
        impl Fn() -> Result<Self, ServiceError> + Send + Sync + 'static,
    ) {
        let stats = Arc::new(ProbeStats::default());
        let shared = Arc::clone(&stats);
        let factory = move || {
            if config.fail_construct {
                return Err(ServiceError::failed("probe refused to construct"));
            }
            shared.constructed.fetch_add(1, Ordering::SeqCst);
            Ok(Self {
                config,
                stats: Arc::clone(&shared),
                counter: AtomicU64::new(0),
            })
        };
        (stats, factory)
    }

    /// Non-atomic read-modify-write; only correct when calls are serialised.
    fn bump(&self) -> u64 {
        let current = self.counter.load(Ordering::SeqCst);
        thread::yield_now();
        let next = current + 1;
        self.counter.store(next, Ordering::SeqCst);
        next
    }
}

struct InFlight<'a>(&'a ProbeStats);

impl<'a> InFlight<'a> {
    fn enter(stats: &'a ProbeStats) -> Self {
        let now = stats.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        stats.max_in_flight.fetch_max(now, Ordering::SeqCst);
        Self(stats)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Service for ProbeService {
    fn descriptor(&self) -> ServiceDescriptor {
        ServiceDescriptor::new(PROBE_NAME, "0.1.0")
    }

    fn capabilities(&self) -> Capabilities {
        self.config.capabilities
    }

    fn dispatch(&self, method: &str, params: &Params) -> Result<Value, ServiceError> {
        self.stats.calls.fetch_add(1, Ordering::SeqCst);
        let _in_flight = InFlight::enter(&self.stats);
        match method {
            "probe.bump" => Ok(json!(self.bump())),
            "probe.peek" => Ok(json!(self.counter.load(Ordering::SeqCst))),
            "probe.sleep" => {
                let ms = number_or(params, "ms", Number::from(0))?
                    .as_u64()
                    .ok_or_else(|| ServiceError::invalid_params("ms must be a positive integer"))?;
                thread::sleep(Duration::from_millis(ms));
                Ok(json!({"slept_ms": ms}))
            }
            "probe.panic" => panic!("probe handler panicked"),
            "probe.fail" => Err(ServiceError::failed("probe failure")
                .with_details(json!({"reason": "requested"}))),
            "probe.invalid" => Err(ServiceError::invalid_params("probe rejects these params")),
            other => Err(ServiceError::method_not_found(other)),
        }
    }

    fn method_list(&self) -> Vec<MethodDescriptor> {
        vec![
            MethodDescriptor::new("probe.bump", "Increment the counter"),
            MethodDescriptor::new("probe.peek", "Read the counter"),
            MethodDescriptor::new("probe.sleep", "Sleep for a while")
                .with_param(ParamInfo::required("ms", "integer")),
        ]
    }

    fn on_start(&self) -> Result<(), ServiceError> {
        if self.config.panic_start {
            panic!("probe start panicked");
        }
        if self.config.fail_start {
            return Err(ServiceError::failed("probe start refused"));
        }
        self.stats.starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn on_stop(&self) -> Result<(), ServiceError> {
        self.stats.stops.fetch_add(1, Ordering::SeqCst);
        if self.config.fail_stop {
            return Err(ServiceError::failed("probe stop refused"));
        }
        Ok(())
    }

    fn health_check(&self) -> Result<HealthReport, ServiceError> {
        match self.config.health {
            HealthMode::Healthy => Ok(HealthReport::from([(
                PROBE_DEPENDENCY.to_owned(),
                HealthEntry::healthy().with_latency_ms(0.5),
            )])),
            HealthMode::Failing => Err(ServiceError::failed("database unreachable")),
            HealthMode::Slow(delay) => {
                thread::sleep(delay);
                Ok(HealthReport::new())
            }
            HealthMode::Panicking => panic!("health probe panicked"),
        }
    }
}
