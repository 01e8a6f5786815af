//! Shared configuration for FGP daemons.
//!
//! Configuration is layered by [`ortho_config`]: built-in defaults, then an
//! optional configuration file, then `FGP_*` environment variables, then
//! command-line flags. Built-in defaults are declared at both the
//! `ortho_config` and `serde` level; a bare invocation must resolve without
//! any file, variable, or flag. The daemon socket is optional; when it is not
//! set the daemon derives the conventional per-service path from the hosted
//! service's name (see [`default_socket_endpoint`]).

mod defaults;
mod logging;
mod socket;

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_HEALTH_TIMEOUT_MS, DEFAULT_LOG_FILTER, DEFAULT_SHUTDOWN_GRACE_MS, SOCKET_FILE_NAME,
    default_health_timeout_ms, default_log_filter, default_log_filter_string, default_log_format,
    default_shutdown_grace_ms, default_socket_endpoint,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use socket::{SocketEndpoint, SocketParseError, SocketPreparationError};

/// Resolved daemon configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "FGP")]
pub struct Config {
    /// Socket the daemon listens on; derived from the service name when unset.
    #[serde(default)]
    pub daemon_socket: Option<SocketEndpoint>,
    /// `tracing` filter expression.
    #[ortho_config(default = defaults::default_log_filter_string())]
    #[serde(default = "defaults::default_log_filter_string")]
    pub log_filter: String,
    /// Log output format.
    #[ortho_config(default = defaults::default_log_format())]
    #[serde(default = "defaults::default_log_format")]
    pub log_format: LogFormat,
    /// Upper bound for a single service call; unbounded when unset.
    #[serde(default)]
    pub call_timeout_ms: Option<u64>,
    /// Upper bound for the service health check.
    #[ortho_config(default = DEFAULT_HEALTH_TIMEOUT_MS)]
    #[serde(default = "defaults::default_health_timeout_ms")]
    pub health_timeout_ms: u64,
    /// Time in-flight connections may keep running after a stop request.
    #[ortho_config(default = DEFAULT_SHUTDOWN_GRACE_MS)]
    #[serde(default = "defaults::default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            daemon_socket: None,
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            call_timeout_ms: None,
            health_timeout_ms: DEFAULT_HEALTH_TIMEOUT_MS,
            shutdown_grace_ms: DEFAULT_SHUTDOWN_GRACE_MS,
        }
    }
}

impl Config {
    /// Explicitly configured socket, if any.
    #[must_use]
    pub fn daemon_socket(&self) -> Option<&SocketEndpoint> {
        self.daemon_socket.as_ref()
    }

    /// Socket for the named service: the configured endpoint or the
    /// conventional per-service default.
    #[must_use]
    pub fn socket_for(&self, service: &str) -> SocketEndpoint {
        self.daemon_socket
            .clone()
            .unwrap_or_else(|| default_socket_endpoint(service))
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Per-call timeout, if configured. A zero value disables the timeout.
    #[must_use]
    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_ms
            .filter(|millis| *millis > 0)
            .map(Duration::from_millis)
    }

    /// Health check timeout.
    #[must_use]
    pub fn health_timeout(&self) -> Duration {
        Duration::from_millis(self.health_timeout_ms)
    }

    /// Shutdown grace period.
    #[must_use]
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}
