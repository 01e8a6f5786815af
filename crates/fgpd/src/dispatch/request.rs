//! Request decoding for the dispatch loop.

use serde_json::Value;

use fgp_daemon_types::Request;

use super::errors::{DispatchError, MalformedRequest};

/// Parses one framed line into a request.
///
/// Surrounding whitespace, including the newline delimiter, is ignored.
/// Blank lines decode to `Ok(None)`.
///
/// # Errors
///
/// Returns [`MalformedRequest`] when the line is not JSON or does not match
/// the request envelope.
pub(crate) fn decode_request(line: &[u8]) -> Result<Option<Request>, MalformedRequest> {
    let trimmed = line.trim_ascii();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let value: Value = serde_json::from_slice(trimmed).map_err(|source| MalformedRequest {
        id: None,
        source: DispatchError::MalformedJson(source),
    })?;
    let id = value
        .get("id")
        .filter(|candidate| !candidate.is_null())
        .cloned();
    serde_json::from_value(value)
        .map(Some)
        .map_err(|source| MalformedRequest {
            id,
            source: DispatchError::InvalidEnvelope(source),
        })
}
