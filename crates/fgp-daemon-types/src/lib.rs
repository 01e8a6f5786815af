//! Wire types shared by FGP daemons and their clients.
//!
//! Every message on an FGP socket is a single JSON object terminated by a
//! newline. Clients send [`Request`] envelopes and the daemon answers each
//! request that carries an `id` with exactly one [`Response`], which holds
//! either a `result` or an [`ErrorEnvelope`], never both.
//!
//! ```json
//! {"id":"1","v":1,"method":"echo.reverse","params":{"text":"abc"}}
//! {"id":"1","ok":true,"result":{"reversed":"cba"},"meta":{"server_ms":0.1,"v":1}}
//! ```

mod descriptor;
mod envelope;
mod error;
mod health;

pub use descriptor::{MethodDescriptor, ParamInfo, ServiceDescriptor};
pub use envelope::{Outcome, Params, Request, Response, ResponseMeta};
pub use error::{ErrorCode, ErrorEnvelope};
pub use health::{HealthEntry, HealthReport};

/// Protocol revision spoken by this crate.
pub const PROTOCOL_VERSION: u8 = 1;
