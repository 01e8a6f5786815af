//! Response serialization for the dispatch loop.

use std::io::Write;

use fgp_daemon_types::Response;

use super::errors::DispatchError;

/// Writer that frames responses as single JSON lines.
pub(crate) struct ResponseWriter<W> {
    writer: W,
}

impl<W: Write> ResponseWriter<W> {
    /// Creates a new response writer wrapping the given output stream.
    pub(crate) const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes one response followed by a newline and flushes it.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub(crate) fn write_response(&mut self, response: &Response) -> Result<(), DispatchError> {
        let mut line =
            serde_json::to_vec(response).map_err(DispatchError::SerializeResponse)?;
        line.push(b'\n');
        self.writer.write_all(&line)?;
        self.writer.flush()?;
        Ok(())
    }
}
