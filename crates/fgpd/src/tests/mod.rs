//! Test suites for the daemon host.

pub(crate) mod support;
