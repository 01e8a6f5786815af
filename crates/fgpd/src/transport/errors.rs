//! Error types for socket listener operations.

use std::io;

use thiserror::Error;

/// Errors surfaced while binding or running the socket listener.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The handler reported that it cannot serve clients yet.
    #[error("refusing to listen on {path}: service is not ready")]
    NotReady { path: String },
    #[error("failed to enable non-blocking listener: {source}")]
    NonBlocking {
        #[source]
        source: io::Error,
    },
    #[error("failed to bind unix listener at {path}: {source}")]
    BindUnix {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("existing unix socket {path} is already in use")]
    UnixInUse { path: String },
    #[error("unix socket path {path} is not a socket")]
    UnixNotSocket { path: String },
    #[error("failed to read metadata for unix socket {path}: {source}")]
    UnixMetadata {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to connect to existing unix socket {path}: {source}")]
    UnixConnect {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to remove stale unix socket {path}: {source}")]
    UnixCleanup {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to spawn listener thread: {source}")]
    Spawn {
        #[source]
        source: io::Error,
    },
    #[error("listener thread panicked")]
    ThreadPanic,
}
