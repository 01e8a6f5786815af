use camino::Utf8PathBuf;
use std::env;

#[cfg(unix)]
use libc::geteuid;

#[cfg(unix)]
use dirs::home_dir;

use crate::logging::LogFormat;
use crate::socket::SocketEndpoint;

/// Default log filter expression used by the daemon.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default bound on the service health check, in milliseconds.
pub const DEFAULT_HEALTH_TIMEOUT_MS: u64 = 2_000;

/// Default shutdown grace period, in milliseconds.
pub const DEFAULT_SHUTDOWN_GRACE_MS: u64 = 10_000;

/// File name of the socket inside each service directory.
pub const SOCKET_FILE_NAME: &str = "daemon.sock";

const APP_DIRECTORY: &str = ".fgp";
const SERVICES_DIRECTORY: &str = "services";

/// Default log filter expression.
#[must_use]
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format.
#[must_use]
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default health check bound for serde.
#[must_use]
pub fn default_health_timeout_ms() -> u64 {
    DEFAULT_HEALTH_TIMEOUT_MS
}

/// Default shutdown grace period for serde.
#[must_use]
pub fn default_shutdown_grace_ms() -> u64 {
    DEFAULT_SHUTDOWN_GRACE_MS
}

/// Conventional socket for a service: `~/.fgp/services/<service>/daemon.sock`.
///
/// Without a home directory the socket lives under the temporary directory,
/// namespaced by effective user id.
#[must_use]
pub fn default_socket_endpoint(service: &str) -> SocketEndpoint {
    let mut base = services_base_directory();
    base.push(service_directory_name(service));
    base.push(SOCKET_FILE_NAME);
    SocketEndpoint::unix(base)
}

fn service_directory_name(service: &str) -> String {
    let cleaned: String = service
        .trim()
        .chars()
        .map(|ch| if ch == '/' || ch == '\\' { '_' } else { ch })
        .collect();
    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        "default".to_owned()
    } else {
        cleaned
    }
}

#[cfg(unix)]
fn services_base_directory() -> Utf8PathBuf {
    if let Some(mut home) = home_dir().and_then(|path| Utf8PathBuf::from_path_buf(path).ok()) {
        home.push(APP_DIRECTORY);
        home.push(SERVICES_DIRECTORY);
        return home;
    }

    let mut base = fallback_base_directory();
    base.push("fgp");
    base.push(user_namespace());
    base.push(SERVICES_DIRECTORY);
    base
}

#[cfg(not(unix))]
fn services_base_directory() -> Utf8PathBuf {
    let mut base = fallback_base_directory();
    base.push(APP_DIRECTORY);
    base.push(SERVICES_DIRECTORY);
    base
}

fn fallback_base_directory() -> Utf8PathBuf {
    let candidate = env::temp_dir();
    Utf8PathBuf::from_path_buf(candidate).unwrap_or_else(|_| Utf8PathBuf::from("/tmp"))
}

#[cfg(unix)]
fn user_namespace() -> String {
    let uid = unsafe { geteuid() };
    format!("uid-{uid}")
}
