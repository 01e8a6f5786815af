//! Request and response envelopes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::PROTOCOL_VERSION;
use crate::error::ErrorEnvelope;

/// Named request parameters.
pub type Params = Map<String, Value>;

/// One unit of client work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Opaque correlation token echoed verbatim in the response.
    ///
    /// A missing or `null` id means the client does not expect a reply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// Protocol revision the client speaks; absent means the current one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v: Option<u8>,
    /// Method name, for example `echo.ping`.
    pub method: String,
    /// Named parameters; defaults to an empty object.
    #[serde(default)]
    pub params: Params,
}

impl Request {
    /// Builds a request without an id or parameters.
    #[must_use]
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            id: None,
            v: Some(PROTOCOL_VERSION),
            method: method.into(),
            params: Params::new(),
        }
    }

    /// Sets the correlation id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<Value>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Replaces the parameters.
    #[must_use]
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Returns `true` when the client expects a correlated reply.
    #[must_use]
    pub const fn expects_reply(&self) -> bool {
        self.id.is_some()
    }
}

/// Result or error carried by a [`Response`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Value returned by the service.
    Result(Value),
    /// Structured failure.
    Error(ErrorEnvelope),
}

/// Timing metadata attached by the daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMeta {
    /// Time spent handling the request, in milliseconds.
    pub server_ms: f64,
    /// Protocol revision of the response.
    pub v: u8,
}

impl ResponseMeta {
    /// Builds metadata for the current protocol revision.
    #[must_use]
    pub const fn new(server_ms: f64) -> Self {
        Self {
            server_ms,
            v: PROTOCOL_VERSION,
        }
    }
}

/// Reply to a single request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Correlation id copied from the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// `true` when the outcome is a result.
    pub ok: bool,
    /// Exactly one of `result` or `error`.
    #[serde(flatten)]
    pub outcome: Outcome,
    /// Optional timing metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

impl Response {
    /// Builds a successful response.
    #[must_use]
    pub const fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            id,
            ok: true,
            outcome: Outcome::Result(result),
            meta: None,
        }
    }

    /// Builds a failed response.
    #[must_use]
    pub const fn failure(id: Option<Value>, error: ErrorEnvelope) -> Self {
        Self {
            id,
            ok: false,
            outcome: Outcome::Error(error),
            meta: None,
        }
    }

    /// Attaches timing metadata.
    #[must_use]
    pub fn with_meta(mut self, meta: ResponseMeta) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Returns the result value when the response succeeded.
    #[must_use]
    pub const fn result(&self) -> Option<&Value> {
        match &self.outcome {
            Outcome::Result(value) => Some(value),
            Outcome::Error(_) => None,
        }
    }

    /// Returns the error envelope when the response failed.
    #[must_use]
    pub const fn error(&self) -> Option<&ErrorEnvelope> {
        match &self.outcome {
            Outcome::Result(_) => None,
            Outcome::Error(error) => Some(error),
        }
    }
}
