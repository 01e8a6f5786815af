//! Methods answered by the daemon itself.

use serde::Serialize;
use serde_json::Value;

use fgp_daemon_types::{ErrorCode, ErrorEnvelope, MethodDescriptor};

use crate::health::HealthAggregator;
use crate::host::ServiceHost;
use crate::process::ShutdownTrigger;

/// Result of the `methods` built-in.
#[derive(Debug, Serialize)]
struct MethodListing<'a> {
    service: &'a str,
    version: &'a str,
    methods: Vec<MethodDescriptor>,
}

/// Result of the `stop` built-in.
#[derive(Debug, Serialize)]
struct StopAck {
    stopping: bool,
}

/// Built-in method names. These take precedence over service methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Builtin {
    Health,
    Methods,
    Stop,
}

impl Builtin {
    pub(crate) fn parse(method: &str) -> Option<Self> {
        match method {
            "health" => Some(Self::Health),
            "methods" => Some(Self::Methods),
            "stop" => Some(Self::Stop),
            _ => None,
        }
    }

    pub(crate) fn run(
        self,
        host: &ServiceHost,
        health: &HealthAggregator,
        shutdown: &ShutdownTrigger,
    ) -> Result<Value, ErrorEnvelope> {
        match self {
            Self::Health => encode(self, &health.report()),
            Self::Methods => {
                let descriptor = host.descriptor();
                let listing = MethodListing {
                    service: &descriptor.name,
                    version: &descriptor.version,
                    methods: host.describe_methods(),
                };
                encode(self, &listing)
            }
            Self::Stop => {
                shutdown.fire();
                encode(self, &StopAck { stopping: true })
            }
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Health => "health",
            Self::Methods => "methods",
            Self::Stop => "stop",
        }
    }
}

fn encode(builtin: Builtin, value: &impl Serialize) -> Result<Value, ErrorEnvelope> {
    serde_json::to_value(value).map_err(|error| {
        ErrorEnvelope::new(
            ErrorCode::InternalError,
            format!("failed to encode {} result: {error}", builtin.name()),
        )
    })
}
