//! Test configuration loaders for scenarios covering success and failure paths.

use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use tempfile::TempDir;

use fgp_config::{Config, SocketEndpoint};

use crate::bootstrap::ConfigLoader;

/// Loader that places the daemon socket under a temporary directory.
pub struct TestConfigLoader {
    dir: TempDir,
    socket: PathBuf,
    config: Config,
}

impl TestConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temporary directory for socket");
        let socket = dir.path().join("services").join("daemon.sock");
        Self {
            dir,
            socket,
            config: Config {
                log_filter: "warn".to_owned(),
                ..Config::default()
            },
        }
    }

    /// Points the socket below a regular file so its directory cannot exist.
    #[must_use]
    pub fn with_blocked_socket_dir(mut self) -> Self {
        let blocker = self.dir.path().join("blocker");
        fs::write(&blocker, b"not a directory").expect("write blocking file");
        self.socket = blocker.join("echo").join("daemon.sock");
        self
    }

    #[must_use]
    pub fn with_call_timeout_ms(mut self, millis: u64) -> Self {
        self.config.call_timeout_ms = Some(millis);
        self
    }

    #[must_use]
    pub fn with_shutdown_grace_ms(mut self, millis: u64) -> Self {
        self.config.shutdown_grace_ms = millis;
        self
    }

    /// Path the daemon will bind.
    pub fn socket_path(&self) -> PathBuf {
        self.socket.clone()
    }

    fn endpoint(&self) -> SocketEndpoint {
        let path = self
            .socket
            .to_str()
            .expect("temporary socket path was not valid UTF-8");
        SocketEndpoint::unix(path)
    }
}

impl Default for TestConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(Config {
            daemon_socket: Some(self.endpoint()),
            ..self.config.clone()
        })
    }
}

/// Loader that intentionally fails by passing an unsupported socket scheme.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("fgpd"),
            OsString::from("--daemon-socket"),
            OsString::from("invalid://socket"),
        ];
        Config::load_from_iter(args)
    }
}
