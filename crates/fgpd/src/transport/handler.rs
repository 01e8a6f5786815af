//! Connection handling abstractions for the daemon listener.

use std::io;
use std::os::unix::net::UnixStream;
use std::time::Duration;

use super::tracker::{ConnectionSlot, DrainSignal};

/// An accepted client connection.
///
/// Dropping the value closes the socket and releases the connection's slot
/// in the listener's tracker.
#[derive(Debug)]
pub(crate) struct ConnectionStream {
    stream: UnixStream,
    drain: DrainSignal,
    _slot: Option<ConnectionSlot>,
}

impl ConnectionStream {
    pub(crate) fn new(stream: UnixStream, drain: DrainSignal, slot: ConnectionSlot) -> Self {
        Self {
            stream,
            drain,
            _slot: Some(slot),
        }
    }

    /// Wraps a stream that is not tracked by any listener.
    #[cfg(test)]
    pub(crate) fn detached(stream: UnixStream) -> Self {
        Self {
            stream,
            drain: DrainSignal::default(),
            _slot: None,
        }
    }

    /// The underlying socket. `&UnixStream` implements both `Read` and
    /// `Write`, so callers can frame input and output independently.
    pub(crate) const fn socket(&self) -> &UnixStream {
        &self.stream
    }

    /// Bounds each blocking read so handlers can observe the drain flag.
    pub(crate) fn set_poll_interval(&self, interval: Duration) -> io::Result<()> {
        self.stream.set_read_timeout(Some(interval))
    }

    /// Returns `true` once the daemon has begun shutting down.
    pub(crate) fn drain_requested(&self) -> bool {
        self.drain.is_raised()
    }
}

/// Handles accepted socket connections.
pub(crate) trait ConnectionHandler: Send + Sync + 'static {
    /// Returns `true` when the handler can serve clients. The listener
    /// refuses to start otherwise.
    fn is_ready(&self) -> bool;

    /// Handles a single connection. Implementations should avoid panicking.
    fn handle(&self, stream: ConnectionStream);
}
