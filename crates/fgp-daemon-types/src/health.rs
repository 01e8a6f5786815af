//! Health status entries reported by daemons.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Mapping from dependency name to its health.
pub type HealthReport = BTreeMap<String, HealthEntry>;

/// Health of one dependency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthEntry {
    /// Whether the dependency is healthy.
    pub ok: bool,
    /// Observed latency of the probe in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<f64>,
    /// Free-form status text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl HealthEntry {
    /// Entry reporting a healthy dependency.
    #[must_use]
    pub const fn healthy() -> Self {
        Self {
            ok: true,
            latency_ms: None,
            message: None,
        }
    }

    /// Entry reporting an unhealthy dependency with a reason.
    #[must_use]
    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            latency_ms: None,
            message: Some(message.into()),
        }
    }

    /// Attaches a status message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attaches a probe latency.
    #[must_use]
    pub fn with_latency_ms(mut self, latency_ms: f64) -> Self {
        self.latency_ms = Some(latency_ms);
        self
    }
}
