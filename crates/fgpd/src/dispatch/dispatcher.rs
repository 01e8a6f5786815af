//! Routes decoded requests to built-ins or the hosted service.

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tracing::debug;

use fgp_daemon_types::{
    ErrorCode, ErrorEnvelope, PROTOCOL_VERSION, Params, Request, Response, ResponseMeta,
};

use crate::health::HealthAggregator;
use crate::host::{InvokeError, ServiceHost, elapsed_ms};
use crate::process::ShutdownTrigger;
use crate::service::ServiceError;

use super::DISPATCH_TARGET;
use super::builtins::Builtin;

/// Turns requests into responses.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    host: Arc<ServiceHost>,
    health: HealthAggregator,
    shutdown: ShutdownTrigger,
}

impl Dispatcher {
    /// Creates a dispatcher over `host`.
    #[must_use]
    pub const fn new(
        host: Arc<ServiceHost>,
        health: HealthAggregator,
        shutdown: ShutdownTrigger,
    ) -> Self {
        Self {
            host,
            health,
            shutdown,
        }
    }

    /// The host this dispatcher forwards to.
    #[must_use]
    pub fn host(&self) -> &ServiceHost {
        &self.host
    }

    /// Handles one request.
    ///
    /// Returns `None` when the request carries no id: the work is still
    /// performed but the client asked not to be answered.
    #[must_use]
    pub fn dispatch(&self, request: Request) -> Option<Response> {
        let started = Instant::now();
        let Request {
            id,
            v,
            method,
            params,
        } = request;
        let outcome = self.execute(v, &method, &params);
        let server_ms = elapsed_ms(started);

        match &outcome {
            Ok(_) => debug!(target: DISPATCH_TARGET, %method, server_ms, "request completed"),
            Err(error) => debug!(
                target: DISPATCH_TARGET,
                %method,
                server_ms,
                code = %error.code,
                error = %error.message,
                "request failed"
            ),
        }

        if id.is_none() {
            return None;
        }
        let response = match outcome {
            Ok(result) => Response::success(id, result),
            Err(error) => Response::failure(id, error),
        };
        Some(response.with_meta(ResponseMeta::new(server_ms)))
    }

    fn execute(
        &self,
        version: Option<u8>,
        method: &str,
        params: &Params,
    ) -> Result<Value, ErrorEnvelope> {
        if let Some(version) = version
            && version != PROTOCOL_VERSION
        {
            return Err(ErrorEnvelope::new(
                ErrorCode::ProtocolError,
                format!("unsupported protocol version {version}; expected {PROTOCOL_VERSION}"),
            ));
        }
        if let Some(builtin) = Builtin::parse(method) {
            return builtin.run(&self.host, &self.health, &self.shutdown);
        }
        self.host
            .invoke(method, params)
            .map_err(|error| classify(&error))
    }
}

/// Maps a host failure onto the wire error taxonomy.
#[must_use]
pub fn classify(error: &InvokeError) -> ErrorEnvelope {
    let code = match error {
        InvokeError::Service(ServiceError::MethodNotFound { .. }) => ErrorCode::MethodNotFound,
        InvokeError::Service(ServiceError::InvalidParams { .. }) => ErrorCode::InvalidParams,
        InvokeError::Timeout { .. } => ErrorCode::Timeout,
        InvokeError::Service(ServiceError::Failed { .. })
        | InvokeError::Panicked { .. }
        | InvokeError::Stopped
        | InvokeError::Spawn { .. } => ErrorCode::InternalError,
    };
    let envelope = ErrorEnvelope::new(code, error.to_string());
    match error {
        InvokeError::Service(service) => match service.details() {
            Some(details) => envelope.with_details(details.clone()),
            None => envelope,
        },
        _ => envelope,
    }
}
