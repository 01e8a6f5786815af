//! Bookkeeping for live connections.
//!
//! Every accepted stream holds a [`ConnectionSlot`] for as long as its
//! handler runs. Shutdown uses the tracker to raise the drain flag, wait for
//! the slot count to reach zero, and force-close stragglers.

use std::collections::HashMap;
use std::net::Shutdown;
use std::os::unix::net::UnixStream;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

use super::LISTENER_TARGET;

#[derive(Debug, Default)]
struct TrackerState {
    connections: Mutex<HashMap<u64, Option<UnixStream>>>,
    idle: Condvar,
    next_id: AtomicU64,
    draining: AtomicBool,
}

impl TrackerState {
    fn connections(&self) -> MutexGuard<'_, HashMap<u64, Option<UnixStream>>> {
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Shared registry of live connections.
#[derive(Debug, Clone, Default)]
pub(crate) struct ConnectionTracker {
    state: Arc<TrackerState>,
}

impl ConnectionTracker {
    /// Registers a connection. `stream` is a clone used only for forced
    /// closure.
    pub(crate) fn acquire(&self, stream: Option<UnixStream>) -> ConnectionSlot {
        let id = self.state.next_id.fetch_add(1, Ordering::Relaxed);
        self.state.connections().insert(id, stream);
        ConnectionSlot {
            id,
            state: Arc::clone(&self.state),
        }
    }

    /// Number of connections whose handlers are still running.
    pub(crate) fn active(&self) -> usize {
        self.state.connections().len()
    }

    /// Asks handlers to finish once their current request is answered.
    pub(crate) fn begin_drain(&self) {
        self.state.draining.store(true, Ordering::SeqCst);
    }

    /// Flag observed by handlers.
    pub(crate) fn drain_signal(&self) -> DrainSignal {
        DrainSignal(Some(Arc::clone(&self.state)))
    }

    /// Blocks until every slot is released or `grace` elapses.
    ///
    /// Returns `true` when all connections closed in time.
    pub(crate) fn wait_idle(&self, grace: Duration) -> bool {
        let deadline = Instant::now() + grace;
        let mut connections = self.state.connections();
        while !connections.is_empty() {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            connections = match self.state.idle.wait_timeout(connections, deadline - now) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
        true
    }

    /// Shuts down every tracked socket so blocked handlers observe EOF.
    pub(crate) fn force_close(&self) -> usize {
        let connections = self.state.connections();
        let mut closed = 0;
        for stream in connections.values().flatten() {
            if stream.shutdown(Shutdown::Both).is_ok() {
                closed += 1;
            }
        }
        debug!(target: LISTENER_TARGET, closed, "force-closed connections");
        closed
    }
}

/// Held by a handler for the lifetime of its connection.
#[derive(Debug)]
pub(crate) struct ConnectionSlot {
    id: u64,
    state: Arc<TrackerState>,
}

impl Drop for ConnectionSlot {
    fn drop(&mut self) {
        let mut connections = self.state.connections();
        connections.remove(&self.id);
        if connections.is_empty() {
            self.state.idle.notify_all();
        }
    }
}

/// Read-only view of the tracker's drain flag.
#[derive(Debug, Clone, Default)]
pub(crate) struct DrainSignal(Option<Arc<TrackerState>>);

impl DrainSignal {
    /// Returns `true` once shutdown has begun.
    pub(crate) fn is_raised(&self) -> bool {
        self.0
            .as_ref()
            .is_some_and(|state| state.draining.load(Ordering::SeqCst))
    }
}
