//! Error types for request framing and decoding.

use std::io;

use serde_json::Value;
use thiserror::Error;

/// Failures surfaced while reading, decoding, or writing frames.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A frame grew beyond the per-line limit.
    #[error("request too large: {size} bytes exceeds {max_size} byte limit")]
    RequestTooLarge { size: usize, max_size: usize },

    /// The line is not valid JSON.
    #[error("malformed JSON: {0}")]
    MalformedJson(#[source] serde_json::Error),

    /// The line is JSON but not a request envelope.
    #[error("invalid request envelope: {0}")]
    InvalidEnvelope(#[source] serde_json::Error),

    /// Reading from or writing to the socket failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Response serialization failed.
    #[error("failed to serialize response: {0}")]
    SerializeResponse(#[source] serde_json::Error),
}

impl DispatchError {
    /// Creates a request too large error.
    pub(crate) const fn request_too_large(size: usize, max_size: usize) -> Self {
        Self::RequestTooLarge { size, max_size }
    }
}

/// A line that could not be turned into a request.
///
/// When the line was a JSON object carrying a non-null `id`, the id is kept
/// so the client can be told why its request was rejected.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct MalformedRequest {
    /// Correlation id recovered from the line, if any.
    pub id: Option<Value>,
    /// Reason the line was rejected.
    #[source]
    pub source: DispatchError,
}
