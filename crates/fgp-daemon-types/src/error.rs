//! Structured error payloads carried in failed responses.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stable, machine-readable error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Request parameters failed service-level validation.
    InvalidParams,
    /// The service does not recognise the method name.
    MethodNotFound,
    /// Any other failure raised while handling the request.
    InternalError,
    /// The request could not be framed or parsed.
    ProtocolError,
    /// The configured per-call timeout elapsed.
    Timeout,
    /// The service failed to construct or start.
    StartupError,
}

impl ErrorCode {
    /// Returns the wire representation of the code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidParams => "invalid_params",
            Self::MethodNotFound => "method_not_found",
            Self::InternalError => "internal_error",
            Self::ProtocolError => "protocol_error",
            Self::Timeout => "timeout",
            Self::StartupError => "startup_error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Error body of a failed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Error kind.
    pub code: ErrorCode,
    /// Human-readable description.
    pub message: String,
    /// Optional structured context supplied by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorEnvelope {
    /// Builds an envelope without details.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Attaches structured details.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}
