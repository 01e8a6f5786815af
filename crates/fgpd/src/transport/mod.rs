//! Socket listener for the daemon's Unix endpoint.
//!
//! The transport module binds the configured socket, accepts connections in
//! a background thread, and hands each one to a [`ConnectionHandler`] on its
//! own thread. It also tracks live connections so shutdown can drain them.

mod errors;
mod handler;
mod listener;
#[cfg(test)]
mod test_utils;
mod tracker;

pub use self::errors::ListenerError;
pub(crate) use self::handler::{ConnectionHandler, ConnectionStream};
pub(crate) use self::listener::{CONNECTION_POLL_INTERVAL, ListenerHandle, SocketListener};
#[cfg(test)]
pub(crate) use self::tracker::ConnectionTracker;
#[cfg(test)]
pub(crate) use self::test_utils::CountingHandler;

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
