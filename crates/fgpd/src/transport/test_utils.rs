//! Test helpers for the transport module.

use std::io::Read;
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use super::{ConnectionHandler, ConnectionStream};

/// Counts connections and holds each one open until the client hangs up.
pub(crate) struct CountingHandler {
    count: Arc<AtomicUsize>,
    ready: AtomicBool,
}

impl CountingHandler {
    pub(crate) fn new() -> (Arc<AtomicUsize>, Arc<Self>) {
        Self::with_readiness(true)
    }

    pub(crate) fn with_readiness(ready: bool) -> (Arc<AtomicUsize>, Arc<Self>) {
        let count = Arc::new(AtomicUsize::new(0));
        let handler = Arc::new(Self {
            count: Arc::clone(&count),
            ready: AtomicBool::new(ready),
        });
        (count, handler)
    }
}

impl ConnectionHandler for CountingHandler {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn handle(&self, stream: ConnectionStream) {
        self.count.fetch_add(1, Ordering::SeqCst);
        let mut sink = Vec::new();
        let mut socket = stream.socket();
        // Block until the peer closes or the listener force-closes us.
        let _ignored = socket.read_to_end(&mut sink);
    }
}
