//! BDD test world: owns the loader, reporter, probe service, and whatever
//! daemon state the steps have produced so far.

use std::cell::RefCell;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use fgp_daemon_types::{HealthReport, Response};

use crate::bootstrap::{BootstrapError, ConfigLoader, Daemon, bootstrap_with};
use crate::daemon::{RunningDaemon, ServeError, ShutdownSummary};

use super::client::TestClient;
use super::config_loader::{FailingConfigLoader, TestConfigLoader};
use super::reporter::RecordingReporter;
use super::services::{ProbeConfig, ProbeService, ProbeStats};

/// Scenario world shared across BDD steps.
pub struct TestWorld {
    loader: Box<dyn ConfigLoader>,
    socket: Option<PathBuf>,
    pub reporter: Arc<RecordingReporter>,
    pub probe: ProbeConfig,
    stats: Option<Arc<ProbeStats>>,
    daemon: Option<Daemon>,
    running: Option<RunningDaemon>,
    bootstrap_error: Option<BootstrapError>,
    serve_error: Option<ServeError>,
    summary: Option<ShutdownSummary>,
    pub clients: Vec<TestClient>,
    pub responses: Vec<Response>,
    pub health: Option<HealthReport>,
}

impl TestWorld {
    /// Builds a world with a successful configuration loader.
    #[must_use]
    pub fn new() -> Self {
        let loader = TestConfigLoader::new();
        Self {
            socket: Some(loader.socket_path()),
            loader: Box::new(loader),
            reporter: Arc::new(RecordingReporter::default()),
            probe: ProbeConfig::default(),
            stats: None,
            daemon: None,
            running: None,
            bootstrap_error: None,
            serve_error: None,
            summary: None,
            clients: Vec::new(),
            responses: Vec::new(),
            health: None,
        }
    }

    /// Installs a loader that always fails.
    pub fn use_failing_loader(&mut self) {
        self.loader = Box::new(FailingConfigLoader);
        self.socket = None;
    }

    /// Installs a loader built from the temporary-directory loader.
    pub fn use_loader(&mut self, loader: TestConfigLoader) {
        self.socket = Some(loader.socket_path());
        self.loader = Box::new(loader);
    }

    /// Runs the bootstrap sequence once.
    pub fn bootstrap(&mut self) {
        if self.daemon.is_some() || self.bootstrap_error.is_some() {
            return;
        }
        let (stats, factory) = ProbeService::factory(self.probe);
        self.stats = Some(stats);
        match bootstrap_with(&*self.loader, self.reporter.clone(), &factory) {
            Ok(daemon) => self.daemon = Some(daemon),
            Err(error) => self.bootstrap_error = Some(error),
        }
    }

    /// Bootstraps if needed, then starts serving.
    pub fn serve(&mut self) {
        self.bootstrap();
        let Some(daemon) = self.daemon.take() else {
            return;
        };
        match daemon.start() {
            Ok(running) => self.running = Some(running),
            Err(error) => self.serve_error = Some(error),
        }
    }

    /// Opens a new client connection and keeps it in the world.
    pub fn connect(&mut self) -> &mut TestClient {
        let path = self.socket.clone().expect("socket path should be known");
        let client = TestClient::connect(&path).expect("connect to daemon");
        self.clients.push(client);
        self.clients.last_mut().expect("client just pushed")
    }

    /// Most recently opened client.
    pub fn client(&mut self) -> &mut TestClient {
        self.clients.last_mut().expect("no client connected")
    }

    /// Blocks until the daemon tracks `expected` connections.
    pub fn await_connections(&self, expected: usize) -> bool {
        let Some(running) = self.running.as_ref() else {
            return false;
        };
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if running.active_connections() >= expected {
                return true;
            }
            thread::sleep(Duration::from_millis(10));
        }
        false
    }

    /// Captures the daemon's current health report.
    pub fn capture_health(&mut self) {
        self.health = self.running.as_ref().map(RunningDaemon::health);
    }

    /// Fires the shutdown trigger and waits for the sequence to finish.
    pub fn shutdown(&mut self) {
        if let Some(running) = self.running.take() {
            self.finish(running.shutdown());
        }
    }

    /// Waits for a shutdown requested by some other party.
    pub fn wait_for_stop(&mut self) {
        if let Some(running) = self.running.take() {
            self.finish(running.wait());
        }
    }

    fn finish(&mut self, outcome: Result<ShutdownSummary, ServeError>) {
        match outcome {
            Ok(summary) => self.summary = Some(summary),
            Err(error) => self.serve_error = Some(error),
        }
    }

    #[must_use]
    pub fn bootstrap_error(&self) -> Option<&BootstrapError> {
        self.bootstrap_error.as_ref()
    }

    #[must_use]
    pub fn serve_error(&self) -> Option<&ServeError> {
        self.serve_error.as_ref()
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running.is_some()
    }

    #[must_use]
    pub const fn summary(&self) -> Option<ShutdownSummary> {
        self.summary
    }

    #[must_use]
    pub fn stats(&self) -> Arc<ProbeStats> {
        Arc::clone(self.stats.as_ref().expect("probe was never constructed"))
    }

    #[must_use]
    pub fn socket_exists(&self) -> bool {
        self.socket.as_ref().is_some_and(|path| path.exists())
    }
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TestWorld {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            let _ = running.shutdown();
        }
    }
}

/// Default test world fixture.
#[must_use]
pub fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::new())
}
