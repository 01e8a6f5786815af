//! Test harness utilities shared by unit and behavioural suites.

mod client;
mod config_loader;
mod reporter;
mod services;
mod world;

pub use client::{TestClient, request};
pub use config_loader::{FailingConfigLoader, TestConfigLoader};
pub use reporter::{LifecycleEvent, RecordingReporter};
pub use services::{
    HealthMode, PROBE_DEPENDENCY, PROBE_NAME, ProbeConfig, ProbeService, ProbeStats,
};
pub use world::{TestWorld, world};
