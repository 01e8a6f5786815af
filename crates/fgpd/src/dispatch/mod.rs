//! Request framing and dispatch for daemon clients.
//!
//! Clients write one JSON request per line and read one JSON response per
//! line, in order:
//!
//! ```json
//! {"id":"1","v":1,"method":"echo.ping","params":{}}
//! ```
//!
//! ```json
//! {"id":"1","ok":true,"result":{"pong":true,"count":1},"meta":{"server_ms":0.02,"v":1}}
//! ```
//!
//! The names `health`, `methods`, and `stop` are answered by the daemon
//! itself; everything else is forwarded to the hosted service.

mod builtins;
mod dispatcher;
mod errors;
mod frame;
mod handler;
mod request;
mod response;

pub use self::dispatcher::{Dispatcher, classify};
pub use self::errors::{DispatchError, MalformedRequest};
pub(crate) use self::handler::DispatchConnectionHandler;

const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
